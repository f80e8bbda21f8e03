//! Generate the markdown index report from the live portfolio.
//!
//! Reads every holding through the service's query path and writes the
//! rendered document to `FOLIO_REPORT_PATH`.

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use folio_store::PgStore;
use foliod::{report, Config, PortfolioService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("folio_report=info".parse()?))
        .init();

    let config = Config::from_env()?;

    let store = Arc::new(PgStore::connect(&config.database_url).await?);
    let service = PortfolioService::with_policy(store, config.portfolio.clone());

    let count = report::generate(&service, Path::new(&config.report.output_path)).await?;

    info!(
        holdings = count,
        path = %config.report.output_path,
        "report generated"
    );
    Ok(())
}
