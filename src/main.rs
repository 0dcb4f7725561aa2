use std::io::BufRead;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use factcheck_scores::analysis;
use factcheck_scores::config::{AppConfig, ChartTheme};
use factcheck_scores::db;
use factcheck_scores::enrich;
use factcheck_scores::monitoring::logger;
use factcheck_scores::paths::ProjectPaths;
use factcheck_scores::processing;
use factcheck_scores::prototype::ClaimAnalyzer;
use factcheck_scores::scrape;

#[derive(Parser)]
#[command(name = "factcheck", version, about = "Fact-check credibility pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect new statements and merge them into the raw table
    Scrape,
    /// Score and normalize the raw table
    Process,
    /// Rebuild the author and party aggregate tables
    Aggregate,
    /// Attach images to the aggregate tables
    Enrich,
    /// Push aggregates into the document store
    Sync,
    /// Print the extremes report and render charts
    Analyze {
        #[arg(long, value_enum)]
        theme: Option<ChartTheme>,
    },
    /// Check a single claim against external sources
    Claim {
        /// Claim text; read from stdin when omitted
        text: Vec<String>,
    },
    /// scrape, process, aggregate, sync
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, secrets) = AppConfig::load()?;

    logger::init_logging(&config.monitoring)?;

    let paths = ProjectPaths::from_config(&config.paths);
    tracing::info!(
        datasets = %paths.datasets_dir().display(),
        "Fact-check pipeline starting"
    );

    match cli.command {
        Command::Scrape => {
            let summary = scrape::run(&config, &paths).await?;
            tracing::info!(new = summary.new_rows, total = summary.total_rows, "Scrape complete");
        }
        Command::Process => {
            processing::run(&paths)?;
        }
        Command::Aggregate => {
            analysis::aggregate_tables(&paths)?;
        }
        Command::Enrich => enrich::run(&config, &paths).await?,
        Command::Sync => db::sync(&config, &paths).await?,
        Command::Analyze { theme } => {
            let theme = theme.unwrap_or(config.analysis.theme);
            let (report, files) = analysis::analyze(&config, &paths, theme)?;
            println!("{report}");
            for file in files {
                println!("{}", file.display());
            }
        }
        Command::Claim { text } => {
            let claim = if text.is_empty() {
                read_claim()?
            } else {
                text.join(" ")
            };
            let analyzer =
                ClaimAnalyzer::from_config(&config.prototype, &config.rate_limit, &secrets)?;
            let analysis = analyzer.analyze(&claim).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&analysis).context("Failed to encode analysis")?
            );
        }
        Command::Run => run_pipeline(&config, &paths).await?,
    }

    Ok(())
}

fn read_claim() -> Result<String> {
    eprint!("Enter the claim to analyze: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read claim from stdin")?;
    Ok(line.trim().to_string())
}

/// Scrape through sync in one go.
async fn run_pipeline(config: &AppConfig, paths: &ProjectPaths) -> Result<()> {
    let summary = scrape::run(config, paths).await?;
    let stats = processing::run(paths)?;
    let tables = analysis::aggregate_tables(paths)?;
    db::sync(config, paths).await?;

    tracing::info!(
        new_statements = summary.new_rows,
        scored = stats.output_rows,
        authors = tables.by_author.len(),
        parties = tables.by_party.len(),
        "Pipeline finished"
    );
    Ok(())
}
