//! Folio MCP server
//!
//! JSON-RPC/MCP front-end over the single tracked portfolio.
//!
//! # Usage
//!
//! ```bash
//! # Start with default configuration (in-memory store)
//! cargo run -p foliod
//!
//! # Start against PostgreSQL
//! cargo run -p foliod --features postgres
//!
//! # Database maintenance (postgres build)
//! foliod db migrate
//! foliod db status
//! ```
//!
//! # Environment Variables
//!
//! - `FOLIO_ENV`: Environment (test, development, production)
//! - `FOLIO_API_HOST`: API host (default: 0.0.0.0)
//! - `FOLIO_API_PORT`: API port (default: 8080)
//! - `FOLIO_DATABASE_URL`: PostgreSQL URL (default: postgres://localhost/folio)
//! - `FOLIO_WEIGHT_SUM_MIN` / `FOLIO_WEIGHT_SUM_MAX`: target-portfolio tolerance
//! - `FOLIO_REPORT_PATH`: markdown report output path

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use folio_store::HoldingStore;
use foliod::{create_router, ApiState, Config, PortfolioService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("foliod=info".parse()?))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        "Folio MCP server"
    );

    #[cfg(feature = "postgres")]
    {
        let store = folio_store::PgStore::connect(&config.database_url).await?;

        let mut args = std::env::args().skip(1);
        match (args.next().as_deref(), args.next().as_deref()) {
            (Some("db"), Some("migrate")) => {
                folio_db::migrate(store.pool()).await?;
                return Ok(());
            },
            (Some("db"), Some("status")) => {
                folio_db::status(store.pool()).await?;
                return Ok(());
            },
            _ => {},
        }

        folio_db::migrate(store.pool()).await?;
        serve(config, Arc::new(store)).await
    }

    #[cfg(not(feature = "postgres"))]
    {
        let store = Arc::new(folio_store::MemoryStore::new());
        serve(config, store).await
    }
}

async fn serve<S: HoldingStore + 'static>(config: Config, store: Arc<S>) -> anyhow::Result<()> {
    let service = Arc::new(PortfolioService::with_policy(
        store.clone(),
        config.portfolio.clone(),
    ));
    let state = Arc::new(ApiState { service, store });
    let router = create_router(state);

    let addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "MCP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Received shutdown signal");
}
