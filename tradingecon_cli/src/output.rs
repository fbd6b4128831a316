use std::path::Path;

use anyhow::{Context, Result};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tradingecon_lib::{CategoryError, CollectionReport, MarketInstrument};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Markdown,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            "markdown" | "md" => OutputFormat::Markdown,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Records")]
    records: usize,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct InstrumentRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "%")]
    pct_change: String,
}

#[derive(Tabled)]
struct ErrorRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Error")]
    message: String,
}

// -- Row builders --

fn build_summary_rows(report: &CollectionReport) -> Vec<SummaryRow> {
    report
        .summary()
        .into_iter()
        .map(|(category, records)| {
            let failed = report
                .errors
                .iter()
                .any(|e| e.category == category || e.category == error_group(&category));
            let status = if failed {
                "error"
            } else if records == 0 {
                "empty"
            } else {
                "ok"
            };
            SummaryRow {
                category,
                records,
                status: status.to_string(),
            }
        })
        .collect()
}

/// Error category that covers a summary row: the news buckets share one page.
fn error_group(category: &str) -> &str {
    match category {
        "market_headlines" | "earnings_announcements" | "dividend_news" => "news",
        other => other,
    }
}

fn build_instrument_rows(instruments: &[MarketInstrument]) -> Vec<InstrumentRow> {
    instruments
        .iter()
        .map(|i| InstrumentRow {
            symbol: i.symbol.clone(),
            name: i.name.clone(),
            value: format_number(i.value),
            change: format_optional(i.change),
            pct_change: i
                .pct_change
                .map(|p| format!("{:+.2}%", p))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

fn build_error_rows(errors: &[CategoryError]) -> Vec<ErrorRow> {
    errors
        .iter()
        .map(|e| ErrorRow {
            category: e.category.clone(),
            message: e.message.clone(),
        })
        .collect()
}

fn render<T: Tabled>(rows: Vec<T>, format: &OutputFormat) -> String {
    let mut table = Table::new(rows);
    if *format == OutputFormat::Markdown {
        table.with(Style::markdown());
    }
    table.to_string()
}

// -- Table / markdown output --

pub fn print_summary(report: &CollectionReport, format: &OutputFormat) {
    println!("{}", render(build_summary_rows(report), format));
    if !report.errors.is_empty() {
        println!();
        println!("{}", render(build_error_rows(&report.errors), format));
    }
    println!(
        "{} records, {} errors, {:.1}s",
        report.total_items(),
        report.errors.len(),
        report.metadata.duration_seconds
    );
}

pub fn print_instruments(instruments: &[MarketInstrument], format: &OutputFormat) {
    println!("{}", render(build_instrument_rows(instruments), format));
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

/// Writes the report as pretty JSON, creating parent directories as needed.
pub fn write_report(report: &CollectionReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = report.to_json()?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn format_number(value: f64) -> String {
    if value.abs() >= 1000.0 {
        format!("{:.2}", value)
    } else {
        format!("{:.4}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
