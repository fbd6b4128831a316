mod commands;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;
use tradingecon_lib::{Collector, FetchConfig, Fetcher, DEFAULT_BASE_URL};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "tradingecon")]
#[command(about = "Collect market, macro and news data from Trading Economics")]
struct Cli {
    /// Display format: table, markdown or json
    #[arg(long, default_value = "table", global = true)]
    format: String,

    /// Site to collect from
    #[arg(long, env = "TRADINGECON_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Log at debug level
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect every market panel, macro indicators and news
    Collect(commands::collect::CollectArgs),
    /// Fetch a single market panel
    Market(commands::market::MarketArgs),
}

fn init_tracing(verbose: bool) {
    let directive = if verbose { "tradingecon=debug" } else { "tradingecon=info" };
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = directive.parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = OutputFormat::parse(&cli.format);
    let fetcher = Fetcher::new(FetchConfig::from_env())?;
    let collector = Collector::with_base_url(fetcher, &cli.base_url)?;

    match &cli.command {
        Commands::Collect(args) => {
            let report = commands::collect::run(args, &collector, &format).await?;
            if commands::collect::should_fail(&report) {
                tracing::error!("{} categories failed", report.errors.len());
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Market(args) => commands::market::run(args, &collector, &format).await?,
    }

    Ok(ExitCode::SUCCESS)
}
