use anyhow::Result;
use clap::Parser;
use fixtured_core::config::Config;
use tracing::info;

mod app;

#[derive(Parser, Debug)]
#[command(author, version, about = "fixtured - admin test-fixture API for ownCloud acceptance tests", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Port number
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first, its log level is the fallback filter
    let config = if let Some(config_path) = &args.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_default()
    };

    let log_level = if args.verbose {
        "debug"
    } else {
        config.general.log_level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    info!("Starting fixtured v{}", env!("CARGO_PKG_VERSION"));

    // Override with CLI arguments
    let bind_address = args
        .bind
        .unwrap_or_else(|| config.network.bind_address.clone());
    let port = args.port.unwrap_or(config.network.port);

    let full_address = format!("{bind_address}:{port}");

    info!("Server root: {}", config.general.server_root);
    info!("Fixture root: {}", config.fixture_root());
    info!("Database: {}", config.general.db_file);

    app::run(full_address, config).await?;

    Ok(())
}
