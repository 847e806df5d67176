//! valued — the valuegrid daemon.
//!
//! Assembles the intake pipeline in one process:
//! - Durable store (PostgreSQL)
//! - Latest-value cache and notification publisher (Redis)
//! - Startup gate on the store
//! - HTTP API
//!
//! # Usage
//!
//! ```text
//! PGHOST=postgres PGPASSWORD=secret REDIS_HOST=redis valued serve
//! valued serve --config /etc/valued.toml --listen 0.0.0.0:5000
//! valued check --retry-attempts 3
//! ```

mod cli;
mod serve;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Serve(args) => serve::run_serve(args.resolve()?).await,
        Command::Check(args) => serve::run_check(args.resolve()?).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,valued=debug,valuegrid=debug"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}
