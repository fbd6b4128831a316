use anyhow::{anyhow, Result};
use clap::Args;
use tradingecon_lib::{Collector, MarketCategory};

use crate::output::{print_instruments, print_json, OutputFormat};

#[derive(Args)]
pub struct MarketArgs {
    /// Market panel: forex, indices, commodities, bonds, crypto, stocks, etfs, derivatives
    pub category: String,
}

/// Fetches and prints a single market panel.
pub async fn run(args: &MarketArgs, collector: &Collector, format: &OutputFormat) -> Result<()> {
    let category: MarketCategory = args
        .category
        .parse()
        .map_err(|e: String| anyhow!(e))?;

    let instruments = collector.collect_market(category).await?;
    if instruments.is_empty() {
        tracing::warn!("No {} instruments found", category);
    }

    match format {
        OutputFormat::Json => print_json(&instruments),
        _ => print_instruments(&instruments, format),
    }
    Ok(())
}
