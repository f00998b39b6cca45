//! qipc server binary.
//!
//! # Usage
//!
//! ```bash
//! # listen on the default port
//! qipc-server
//!
//! # explicit port and password (or QPORT / QPASSWORD from the environment)
//! qipc-server --qport 12345 --qpassword tango
//! ```

use std::sync::Arc;

use clap::Parser;
use qipc_core::NullContext;
use qipc_server::{Server, ServerConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// kdb+ IPC protocol server
#[derive(Parser, Debug)]
#[command(name = "qipc-server")]
#[command(about = "kdb+ IPC protocol server")]
#[command(version)]
struct Args {
    /// Port to listen on for IPC connections
    #[arg(long, env = "QPORT", default_value_t = 8890)]
    qport: u16,

    /// Password required at login
    #[arg(long, env = "QPASSWORD")]
    qpassword: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("qipc server starting");

    let config = ServerConfig {
        port: args.qport,
        password: args.qpassword,
        ..ServerConfig::default()
    };

    let server = Server::bind(config, Arc::new(NullContext)).await?;
    tracing::info!("listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
