//! httpmocker - CLI entry point

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use httpmocker::config::load_config;
use httpmocker::lifecycle::{Shutdown, signals};
use httpmocker::mock::{Dispatcher, TracingObserver};
use httpmocker::server::Server;

#[derive(Parser, Debug)]
#[command(
    name = "httpmocker",
    about = "Simple HTTP REST API mocker for integration and end-to-end testing",
    version
)]
struct Args {
    /// HTTP server port
    #[arg(short, long)]
    port: u16,

    /// Path to JSON configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    host: IpAddr,

    /// Validate configuration file and exit (don't start server)
    #[arg(long)]
    validate_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_level(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let table = load_config(&args.config)?;

    if args.validate_config {
        println!("✓ Configuration file '{}' is valid", args.config.display());
        println!("✓ Found {} endpoint(s)", table.len());
        println!("✓ All payload files exist");
        return Ok(());
    }

    let endpoint_count = table.len();
    let shutdown = Shutdown::new();
    let dispatcher = Dispatcher::new(table, Arc::new(TracingObserver), shutdown.subscribe());
    let server = Server::bind(
        SocketAddr::new(args.host, args.port),
        dispatcher,
        shutdown.subscribe(),
    )
    .await?;

    info!(
        port = args.port,
        config = %args.config.display(),
        endpoints = endpoint_count,
        "httpmocker starting up (press Ctrl+C to stop)"
    );

    let run = server.run();
    tokio::pin!(run);

    tokio::select! {
        res = &mut run => {
            res?;
        }

        _ = signals::shutdown_signal() => {
            info!("Shutdown signal received");
            shutdown.trigger();
            run.await?;
        }
    }

    info!("httpmocker shutting down");
    Ok(())
}
