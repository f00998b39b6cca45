//! Framed session I/O: reader, writer and the per-connection driver.
//!
//! A session owns one [`IpcReader`] driven by [`run_session`] and any
//! number of cloned [`IpcWriter`] handles. Sync requests are matched to
//! responses in strict FIFO order — the wire protocol has no correlation
//! ids — so the writer serializes bytes and appends the completion slot
//! under one lock: queue order always equals byte order.
//!
//! Inbound SYNC/ASYNC frames are forwarded, still in order, to a single
//! dispatcher task. Handlers therefore never block the reader (a handler
//! may issue its own sync request and await it while later frames keep
//! being serviced), yet responses to pipelined peer requests go out in
//! arrival order.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use qipc_proto::codec::MessageHeader;
use qipc_proto::{K, MessageType, SymbolContext, decode, encode, encode_compressed};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot, watch};

use crate::context::SessionContext;
use crate::errors::SessionError;

/// Tuning knobs for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deliver peer error values to sync waiters as
    /// [`SessionError::Remote`] instead of ordinary values.
    pub raise_remote: bool,
    /// Compress outbound payloads at or above this size; `None` writes
    /// everything raw.
    pub compress_from: Option<usize>,
    /// Abort a sync handler after this long, answering the peer with a
    /// remote error; `None` lets handlers run unbounded.
    pub sync_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { raise_remote: true, compress_from: None, sync_timeout: None }
    }
}

/// Framed reader half of a session.
pub struct IpcReader<R> {
    io: R,
    ctx: Arc<SymbolContext>,
}

impl<R: AsyncRead + Unpin> IpcReader<R> {
    /// Wrap a byte stream.
    pub fn new(io: R, ctx: Arc<SymbolContext>) -> Self {
        Self { io, ctx }
    }

    /// Read one complete frame.
    ///
    /// Returns `None` on a clean end-of-stream (between frames). An
    /// end-of-stream in the middle of a frame is
    /// [`SessionError::ConnectionClosed`] and terminal.
    pub async fn read(&mut self) -> Result<Option<(MessageType, K)>, SessionError> {
        let mut frame = vec![0u8; MessageHeader::SIZE];
        let mut filled = 0;
        while filled < MessageHeader::SIZE {
            let n = self.io.read(&mut frame[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(SessionError::ConnectionClosed);
            }
            filled += n;
        }

        let header = MessageHeader::parse(&frame)?;
        tracing::debug!(
            version = header.version,
            msgtype = header.msgtype,
            flags = header.flags,
            msglen = header.msglen,
            "recv frame"
        );
        let msgtype = MessageType::from_u8(header.msgtype).ok_or_else(|| {
            SessionError::Protocol(format!("unknown message type {}", header.msgtype))
        })?;
        let msglen = header.msglen as usize;
        if msglen < MessageHeader::SIZE {
            return Err(SessionError::Protocol(format!("declared frame length {msglen} too small")));
        }

        frame.resize(msglen, 0);
        if let Err(e) = self.io.read_exact(&mut frame[MessageHeader::SIZE..]).await {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                return Err(SessionError::ConnectionClosed);
            }
            return Err(e.into());
        }

        let k = decode(&frame, &self.ctx)?;
        Ok(Some((msgtype, k)))
    }
}

type Completion = oneshot::Sender<Result<K, SessionError>>;

struct Inner {
    sink: Option<Box<dyn AsyncWrite + Send + Unpin>>,
    pending: VecDeque<Completion>,
    closed: bool,
}

struct Shared {
    inner: tokio::sync::Mutex<Inner>,
    closed_tx: watch::Sender<bool>,
    ctx: Arc<SymbolContext>,
    version: u8,
    config: SessionConfig,
}

/// Writer half of a session; cheap to clone, all clones share one sink
/// and one completion queue.
#[derive(Clone)]
pub struct IpcWriter {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for IpcWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpcWriter").finish_non_exhaustive()
    }
}

impl IpcWriter {
    /// Wrap a byte sink.
    ///
    /// `version` is the protocol version negotiated at login.
    pub fn new(
        sink: Box<dyn AsyncWrite + Send + Unpin>,
        ctx: Arc<SymbolContext>,
        version: u8,
        config: SessionConfig,
    ) -> Self {
        let (closed_tx, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                inner: tokio::sync::Mutex::new(Inner {
                    sink: Some(sink),
                    pending: VecDeque::new(),
                    closed: false,
                }),
                closed_tx,
                ctx,
                version,
                config,
            }),
        }
    }

    /// Symbol context shared with the reader half.
    #[must_use]
    pub fn context(&self) -> &Arc<SymbolContext> {
        &self.shared.ctx
    }

    /// Protocol version negotiated at login.
    #[must_use]
    pub fn version(&self) -> u8 {
        self.shared.version
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Whether [`IpcWriter::close`] has taken effect.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.shared.closed_tx.borrow()
    }

    /// Send one framed message of the given type.
    pub async fn write(&self, k: &K, msgtype: MessageType) -> Result<(), SessionError> {
        let mut inner = self.shared.inner.lock().await;
        self.send_locked(&mut inner, k, msgtype).await
    }

    /// Send a fire-and-forget message (msgtype 0); no completion is
    /// registered.
    pub async fn async_send(&self, k: &K) -> Result<(), SessionError> {
        self.write(k, MessageType::Async).await
    }

    /// Send a sync request (msgtype 1) and await the matching response.
    ///
    /// Responses resolve outstanding requests oldest-first. Cancelling
    /// (dropping) this future does not cancel the request already on the
    /// wire: the queue slot stays alive and the eventual response is
    /// discarded.
    pub async fn sync_request(&self, k: &K) -> Result<K, SessionError> {
        let rx = {
            let mut inner = self.shared.inner.lock().await;
            let (tx, rx) = oneshot::channel();
            // slot first, bytes second, same lock: FIFO position of the
            // completion always matches the byte order on the wire
            inner.pending.push_back(tx);
            if let Err(e) = self.send_locked(&mut inner, k, MessageType::Sync).await {
                self.close_locked(&mut inner).await;
                return Err(e);
            }
            rx
        };
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(SessionError::ConnectionClosed),
        }
    }

    /// Close the writer: every outstanding completion resolves with
    /// [`SessionError::ConnectionClosed`] and the sink is shut down.
    pub async fn close(&self) {
        let mut inner = self.shared.inner.lock().await;
        self.close_locked(&mut inner).await;
    }

    /// Wait until the writer has been closed (by [`IpcWriter::close`] or
    /// the reader side shutting down).
    pub async fn wait_closed(&self) {
        let mut rx = self.shared.closed_tx.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    // Resolve the oldest outstanding sync request with `result`. An empty
    // queue is a protocol violation.
    pub(crate) async fn resolve_response(
        &self,
        result: Result<K, SessionError>,
    ) -> Result<(), SessionError> {
        let completion = {
            let mut inner = self.shared.inner.lock().await;
            inner.pending.pop_front()
        };
        match completion {
            Some(tx) => {
                if tx.send(result).is_err() {
                    // waiter cancelled; the response is dropped
                    tracing::debug!("discarding response for a cancelled sync request");
                }
                Ok(())
            },
            None => {
                Err(SessionError::Protocol("response with no outstanding sync request".to_owned()))
            },
        }
    }

    async fn send_locked(
        &self,
        inner: &mut Inner,
        k: &K,
        msgtype: MessageType,
    ) -> Result<(), SessionError> {
        if inner.closed {
            return Err(SessionError::ConnectionClosed);
        }
        let bytes = self.encode_for_wire(k, msgtype)?;
        tracing::debug!(len = bytes.len(), msgtype = msgtype.to_u8(), "send frame");
        let sink = inner.sink.as_mut().ok_or(SessionError::ConnectionClosed)?;
        sink.write_all(&bytes).await?;
        sink.flush().await?;
        Ok(())
    }

    fn encode_for_wire(&self, k: &K, msgtype: MessageType) -> Result<Bytes, SessionError> {
        let raw = encode(k, &self.shared.ctx, msgtype)?;
        let over_threshold =
            self.shared.config.compress_from.is_some_and(|threshold| raw.len() >= threshold);
        if over_threshold {
            return Ok(encode_compressed(k, &self.shared.ctx, msgtype)?);
        }
        Ok(raw)
    }

    async fn close_locked(&self, inner: &mut Inner) {
        if inner.closed {
            return;
        }
        inner.closed = true;
        for tx in inner.pending.drain(..) {
            let _ = tx.send(Err(SessionError::ConnectionClosed));
        }
        if let Some(mut sink) = inner.sink.take() {
            let _ = sink.shutdown().await;
        }
        let _ = self.shared.closed_tx.send(true);
    }
}

struct InboundJob {
    msgtype: MessageType,
    value: K,
}

/// Drive a session until its stream ends.
///
/// RESPONSE frames resolve the writer's completion queue on this task;
/// SYNC and ASYNC frames are forwarded in arrival order to a dispatcher
/// task running `context`'s handlers. When the stream ends (or a decode
/// error makes the connection unusable) the writer is closed, cascading
/// [`SessionError::ConnectionClosed`] into every pending completion, and
/// `closing` fires.
///
/// # Errors
///
/// Decode failures, protocol violations and mid-frame end-of-stream; a
/// clean end-of-stream returns `Ok(())`.
pub async fn run_session<R>(
    mut reader: IpcReader<R>,
    writer: IpcWriter,
    context: Arc<dyn SessionContext>,
) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (jobs_tx, jobs_rx) = mpsc::unbounded_channel::<InboundJob>();
    let worker = tokio::spawn(dispatch_worker(
        jobs_rx,
        writer.clone(),
        Arc::clone(&context),
        writer.config().sync_timeout,
    ));

    let raise_remote = writer.config().raise_remote;
    let result = loop {
        match reader.read().await {
            Ok(Some((MessageType::Response, k))) => {
                let delivery = match k {
                    K::Error(msg) if raise_remote => Err(SessionError::Remote(msg)),
                    k => Ok(k),
                };
                if let Err(e) = writer.resolve_response(delivery).await {
                    break Err(e);
                }
            },
            Ok(Some((msgtype, value))) => {
                if jobs_tx.send(InboundJob { msgtype, value }).is_err() {
                    break Err(SessionError::Protocol("dispatcher stopped".to_owned()));
                }
            },
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    writer.close().await;
    drop(jobs_tx);
    let _ = worker.await;
    context.closing(&writer).await;
    result
}

// Runs handlers off the reader task, one at a time, in arrival order.
async fn dispatch_worker(
    mut jobs: mpsc::UnboundedReceiver<InboundJob>,
    writer: IpcWriter,
    context: Arc<dyn SessionContext>,
    sync_timeout: Option<Duration>,
) {
    context.connected(&writer).await;
    while let Some(job) = jobs.recv().await {
        match job.msgtype {
            MessageType::Sync => {
                let outcome = match sync_timeout {
                    Some(limit) => {
                        match tokio::time::timeout(limit, context.on_sync(job.value, &writer)).await
                        {
                            Ok(result) => result,
                            Err(_) => Err(SessionError::handler("sync handler timed out")),
                        }
                    },
                    None => context.on_sync(job.value, &writer).await,
                };
                let reply = match outcome {
                    Ok(k) => k,
                    Err(e) => {
                        tracing::warn!(error = %e, "sync handler failed");
                        K::error(&e.to_string())
                    },
                };
                if writer.write(&reply, MessageType::Response).await.is_err() {
                    break;
                }
            },
            MessageType::Async => {
                if let Err(e) = context.on_async(job.value, &writer).await {
                    tracing::warn!(error = %e, "async handler failed");
                }
            },
            MessageType::Response => {
                // responses are resolved on the reader task
                tracing::error!("response frame routed to dispatcher");
            },
        }
    }
}
