use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use tradingecon_lib::{CollectionReport, Collector, INTERRUPTED};

use crate::output::{print_json, print_summary, write_report, OutputFormat};

/// Runs with this many category errors or more exit with status 1.
pub const ERROR_EXIT_THRESHOLD: usize = 3;

#[derive(Args)]
pub struct CollectArgs {
    /// Write the full report as JSON to this path
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Runs a full collection. Ctrl-C stops the run early; whatever was
/// collected by then is still written, with an "interrupted" error entry.
pub async fn run(
    args: &CollectArgs,
    collector: &Collector,
    format: &OutputFormat,
) -> Result<CollectionReport> {
    let started = Instant::now();
    let mut report = collector.start_report();

    let interrupted = tokio::select! {
        _ = collector.run_into(&mut report) => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        tracing::warn!("Interrupted, keeping partial results");
        report.record_error(INTERRUPTED, "collection interrupted before all categories finished");
    }
    collector.finish(&mut report, started);

    if let Some(ref path) = args.output {
        write_report(&report, path)?;
        tracing::info!("Wrote report to {}", path.display());
    }

    match format {
        OutputFormat::Json if args.output.is_none() => print_json(&report),
        OutputFormat::Json => {}
        _ => print_summary(&report, format),
    }

    Ok(report)
}

/// Whether a finished run should exit non-zero.
pub fn should_fail(report: &CollectionReport) -> bool {
    report.errors.len() >= ERROR_EXIT_THRESHOLD
}
