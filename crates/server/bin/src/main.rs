//! Pedidos Order Context Server
//!
//! Composition root: wires storage, broker, cache and the background loops.
//! The command handler is exposed to whatever transport embeds this crate;
//! no HTTP surface lives here.

mod config;
mod startup;

use clap::Parser;

/// CLI arguments for pedidos-server
#[derive(clap::Parser, Debug)]
#[command(name = "pedidos-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pedidos Order Context Server", long_about = None)]
struct Args {
    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    setup_logging(args.debug);

    let config = config::ServerConfig::from_env()?;

    let services = startup::run(config).await?;

    keep_running().await;

    services.shutdown();

    Ok(())
}

/// Setup logging based on debug flag.
fn setup_logging(debug: bool) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let level = if debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Keep the application running until interrupted.
async fn keep_running() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to setup signal handler: {}", e);
    }

    tracing::info!("Shutting down gracefully...");
}
