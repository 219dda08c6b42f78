use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use seqpool::config::{PoolConfig, ServerConfig};
use seqpool::node::Server;
use seqpool::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "seqpool")]
#[command(version)]
#[command(about = "Runs arithmetic-sequence jobs on a fixed pool of workers")]
struct Args {
    /// Number of jobs executed in parallel
    #[arg(short = 'n', long, default_value = "2", value_parser = clap::value_parser!(u64).range(1..))]
    max_parallel: u64,

    /// Address for the HTTP API
    #[arg(long, default_value = "127.0.0.1:8000")]
    addr: SocketAddr,

    /// Seconds to wait for workers and retention timers on shutdown
    #[arg(long, default_value = "5")]
    shutdown_grace_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let pool = PoolConfig::new(usize::try_from(args.max_parallel)?)
        .with_shutdown_grace(Duration::from_secs(args.shutdown_grace_secs));
    let config = ServerConfig::new(args.addr, pool);

    let shutdown = install_shutdown_handler()?;
    Server::new(config, shutdown).run().await?;

    tracing::info!("Server shut down successfully");
    Ok(())
}
