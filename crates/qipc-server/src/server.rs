//! Accept loop and login processing.
//!
//! Each accepted connection gets its own task: login must complete
//! within the configured deadline, then the shared session driver takes
//! over with the server's context. Login failures close the connection
//! without a reply; the client reads that end-of-stream as rejected
//! credentials.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use qipc_core::{IpcReader, IpcWriter, SessionConfig, SessionContext, SessionError, run_session};
use qipc_proto::SymbolContext;
use subtle::ConstantTimeEq;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::net::tcp::OwnedReadHalf;

use crate::error::ServerError;

/// Highest protocol version the server will accept.
pub const MAX_PROTOCOL_VERSION: u8 = 3;

// generous bound on the login line; real credentials are tiny
const MAX_LOGIN_BYTES: u64 = 2048;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on; 0 picks an ephemeral port.
    pub port: u16,
    /// Password required at login; `None` accepts any credentials.
    pub password: Option<String>,
    /// Deadline for completing the login exchange.
    pub login_timeout: Duration,
    /// Per-connection session tuning.
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8890,
            password: None,
            login_timeout: Duration::from_secs(10),
            session: SessionConfig::default(),
        }
    }
}

/// A bound IPC server.
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    context: Arc<dyn SessionContext>,
}

impl Server {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// [`ServerError::Io`] when the port cannot be bound.
    pub async fn bind(
        config: ServerConfig,
        context: Arc<dyn SessionContext>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
        tracing::info!(port = config.port, "opening IPC server");
        Ok(Self { listener, config, context })
    }

    /// Address the server is listening on.
    ///
    /// # Errors
    ///
    /// [`ServerError::Io`] when the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever, one task per connection.
    ///
    /// # Errors
    ///
    /// [`ServerError::Io`] when the accept loop itself fails; individual
    /// connection failures only end that connection.
    pub async fn run(self) -> Result<(), ServerError> {
        let counter = AtomicU64::new(0);
        loop {
            let (stream, remote) = self.listener.accept().await?;
            let qid = format!("q-{}", counter.fetch_add(1, Ordering::Relaxed));
            tracing::debug!(%qid, %remote, "new connection");
            let config = self.config.clone();
            let context = Arc::clone(&self.context);
            tokio::spawn(handle_connection(stream, qid, config, context));
        }
    }
}

async fn handle_connection(
    stream: tokio::net::TcpStream,
    qid: String,
    config: ServerConfig,
    context: Arc<dyn SessionContext>,
) {
    let login = tokio::time::timeout(config.login_timeout, process_login(stream, &qid, &config));
    let (reader, writer) = match login.await {
        Err(_) => {
            tracing::info!(%qid, "closed - login timeout");
            return;
        },
        Ok(Err(SessionError::Credentials)) => {
            tracing::info!(%qid, "login credentials incorrect, closed");
            return;
        },
        Ok(Err(e)) => {
            tracing::info!(%qid, error = %e, "login failed");
            return;
        },
        Ok(Ok(session)) => session,
    };

    match run_session(reader, writer, context).await {
        Ok(()) => tracing::info!(%qid, "connection reached end of stream"),
        Err(SessionError::ConnectionClosed) => {
            tracing::info!(%qid, "connection ended mid-frame");
        },
        Err(e) => tracing::warn!(%qid, error = %e, "session failed"),
    }
}

type LoginSession = (IpcReader<BufReader<OwnedReadHalf>>, IpcWriter);

async fn process_login(
    stream: tokio::net::TcpStream,
    qid: &str,
    config: &ServerConfig,
) -> Result<LoginSession, SessionError> {
    let (read_half, mut write_half) = stream.into_split();
    // the buffered reader stays with the session: bytes an eager client
    // sent behind the login line are already in its buffer
    let mut reader = BufReader::new(read_half);

    let mut line = Vec::new();
    let n = (&mut reader).take(MAX_LOGIN_BYTES).read_until(0, &mut line).await?;
    if n == 0 || line.last() != Some(&0) {
        return Err(SessionError::Protocol("login line missing terminator".to_owned()));
    }

    let (version, user, password) = parse_login(&line)?;
    tracing::info!(
        %qid,
        version,
        user,
        password = if password.is_some() { "***" } else { "-" },
        "process_login"
    );

    if !check_login(config.password.as_deref(), password) {
        return Err(SessionError::Credentials);
    }

    let accepted = version.min(MAX_PROTOCOL_VERSION);
    write_half.write_all(&[accepted]).await?;

    let ctx = Arc::new(SymbolContext::new());
    let writer =
        IpcWriter::new(Box::new(write_half), Arc::clone(&ctx), accepted, config.session.clone());
    Ok((IpcReader::new(reader, ctx), writer))
}

// login line layout: user[:password][version]NUL, where the optional
// version byte is 1..=3 (all below 32, so printable credentials cannot
// be mistaken for it); very old clients send no version byte at all
fn parse_login(line: &[u8]) -> Result<(u8, &str, Option<&str>), SessionError> {
    if line.len() < 2 {
        return Err(SessionError::Protocol(
            "bad login - insufficient bytes before null".to_owned(),
        ));
    }
    let before_nul = &line[..line.len() - 1];
    let (version, auth_bytes) = match before_nul.last() {
        Some(&v) if v < 32 => (v, &before_nul[..before_nul.len() - 1]),
        _ => (0, before_nul),
    };
    let auth = std::str::from_utf8(auth_bytes)
        .map_err(|_| SessionError::Protocol("login credentials not utf-8".to_owned()))?;
    let (user, password) = match auth.split_once(':') {
        Some((user, password)) => (user, Some(password)),
        None => (auth, None),
    };
    Ok((version, user, password))
}

fn check_login(expected: Option<&str>, given: Option<&str>) -> bool {
    match (expected, given) {
        (None, _) => true,
        (Some(_), None) => false,
        // resists timing attacks on the comparison but still leaks the
        // password length
        (Some(expected), Some(given)) => expected.as_bytes().ct_eq(given.as_bytes()).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_login_with_version_byte() {
        let (version, user, password) = parse_login(b"troy:tango\x03\x00").unwrap();
        assert_eq!(version, 3);
        assert_eq!(user, "troy");
        assert_eq!(password, Some("tango"));
    }

    #[test]
    fn parse_login_without_version_byte() {
        let (version, user, password) = parse_login(b"troy\x00").unwrap();
        assert_eq!(version, 0);
        assert_eq!(user, "troy");
        assert_eq!(password, None);
    }

    #[test]
    fn parse_login_splits_password_once() {
        let (_, user, password) = parse_login(b"u:p:q\x01\x00").unwrap();
        assert_eq!(user, "u");
        assert_eq!(password, Some("p:q"));
    }

    #[test]
    fn parse_login_empty_user_with_version() {
        let (version, user, password) = parse_login(b"\x03\x00").unwrap();
        assert_eq!(version, 3);
        assert_eq!(user, "");
        assert_eq!(password, None);
    }

    #[test]
    fn parse_login_rejects_bare_nul() {
        assert!(parse_login(b"\x00").is_err());
    }

    #[test]
    fn check_login_rules() {
        assert!(check_login(None, None));
        assert!(check_login(None, Some("anything")));
        assert!(!check_login(Some("secret"), None));
        assert!(!check_login(Some("secret"), Some("wrong")));
        assert!(!check_login(Some("secret"), Some("secre")));
        assert!(check_login(Some("secret"), Some("secret")));
    }
}
