//! Storefront server.
//!
//! ```text
//!     Client ──▶ request id ─▶ trace ─▶ body limit ─▶ JSON ─▶ cookies
//!                                                               │
//!                     ┌─────────────────────────────────────────┘
//!                     ▼
//!        /api/{auth,products,cart,coupons,payments,analytics}
//!        /healthz
//!        fallback: 404 (development) | frontend bundle (production)
//!
//!     Background: cache supervisor (reconnects forever), primary store
//! ```

use std::path::PathBuf;

use clap::Parser;

use storefront::cache::RedisConnector;
use storefront::config::{load_config, ProcessEnv};
use storefront::database::MongoConnector;
use storefront::lifecycle::{launch, spawn_signal_handler, Shutdown};
use storefront::observability::logging;
use storefront::routing::{ApiGroups, RouteTable};

#[derive(Debug, Parser)]
#[command(name = "storefront", version, about = "Storefront API and frontend server")]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Load environment variables from this file instead of `./.env`.
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let config = load_config(cli.config.as_deref(), &ProcessEnv)?;
    logging::init(&config.observability, config.mode)?;

    tracing::info!(
        mode = config.mode.as_str(),
        port = config.server.port,
        cache = %format!("{}:{}", config.cache.host, config.cache.port),
        ordering = ?config.startup.ordering,
        "storefront v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let cache = RedisConnector::new(&config.cache)?;
    let database = MongoConnector::new(&config.database);

    let launched = launch(
        &config,
        cache,
        database,
        |_services| RouteTable::storefront(ApiGroups::pending()),
        &shutdown,
    )
    .await?;

    launched.wait().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
