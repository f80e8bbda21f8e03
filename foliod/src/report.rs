//! Markdown index report.
//!
//! Renders the current holdings as a conviction-weighted index document:
//! header, last-updated stamp, numbered holdings with price and commentary,
//! and a methodology footer. Reads through the service's query path only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt::Write as _;
use std::path::Path;

use folio_domain::Holding;
use folio_store::HoldingStore;

use crate::service::PortfolioService;

/// Render the report for the given holdings.
pub fn render(holdings: &[Holding], generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();

    // Header
    out.push_str("# Folio - AI-Curated Stock Index\n\n");
    out.push_str(
        "*An algorithmically-managed portfolio of high-conviction stocks, \
         maintained by an LLM agent with conviction-weighted allocation.*\n\n",
    );

    let _ = writeln!(
        out,
        "**Last Updated:** {}\n",
        generated_at.format("%B %e, %Y at %H:%M UTC")
    );

    // Portfolio overview
    out.push_str("## Portfolio Overview\n\n");
    out.push_str(
        "This index represents a conviction-weighted portfolio with dynamic \
         allocation based on opportunity size, risk assessment, and market \
         analysis. Holdings are selected for fundamentals, performance, \
         sector diversification, and growth potential.\n\n",
    );

    // Holdings list
    out.push_str("## Current Holdings\n\n");

    for (i, holding) in holdings.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. **{} ({})** - {}%",
            i + 1,
            holding.name,
            holding.ticker,
            holding.weight
        );
        if holding.price.as_decimal() > Decimal::ZERO {
            let _ = writeln!(out, "   *Current Price: ${}*", holding.price);
        }
        if let Some(comment) = &holding.comment {
            let _ = writeln!(out, "\n   {}", comment);
        }
        out.push('\n');
    }

    // Footer
    out.push_str("---\n\n");
    out.push_str("## Methodology\n\n");
    out.push_str("This index is maintained through:\n");
    out.push_str(
        "- **Fundamental Analysis**: Financial health, competitive advantages, and growth prospects\n",
    );
    out.push_str("- **Market Intelligence**: Price data and performance tracking\n");
    out.push_str(
        "- **Sector Diversification**: Balanced exposure across technology, healthcare, finance, consumer goods, and energy\n",
    );
    out.push_str(
        "- **Risk Management**: Dynamic weighting with concentration limits to balance conviction with diversification\n\n",
    );

    let _ = writeln!(
        out,
        "*Generated automatically from the portfolio database on {}*",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    out
}

/// Fetch the holdings and write the report to `path`.
///
/// Fails when the portfolio is empty; an empty index report is always a
/// sign something upstream went wrong.
pub async fn generate<S: HoldingStore>(
    service: &PortfolioService<S>,
    path: &Path,
) -> anyhow::Result<usize> {
    let holdings = service.get_holdings().await?;

    if holdings.is_empty() {
        anyhow::bail!("No holdings found in the portfolio");
    }

    let markdown = render(&holdings, Utc::now());

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    std::fs::write(path, markdown)?;

    Ok(holdings.len())
}

// =============================================================================
// Tests
// =============================================================================
