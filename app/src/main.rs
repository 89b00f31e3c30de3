// In app/src/main.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use core_types::{AccountState, Bar, Quote, Scenario};
use engine::{CycleInput, Orchestrator};
use serde::de::DeserializeOwned;
use tracing_subscriber::prelude::*;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Adaptive intraday and swing trade decision engine.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs one decision cycle and prints the result as JSON.
    Evaluate {
        /// The instrument to evaluate (e.g., "XAUUSD").
        #[arg(short, long)]
        symbol: String,

        /// JSON file holding the bar series, oldest first.
        #[arg(short, long)]
        bars: PathBuf,

        /// Optional JSON file with the account snapshot.
        #[arg(short, long)]
        account: Option<PathBuf>,

        /// Optional JSON file with the latest bid/ask quote.
        #[arg(short, long)]
        quote: Option<PathBuf>,

        /// Requested timeframe (M1, M5, M15, H1, H4, D1).
        #[arg(short, long)]
        timeframe: Option<String>,

        /// Which machine runs the cycle; `auto` lets governance choose.
        #[arg(long, value_enum, default_value_t = ScenarioArg::Auto)]
        scenario: ScenarioArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScenarioArg {
    Auto,
    Intraday,
    Swing,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = app_config::load_settings()?;

    let level = settings.app.log_level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            tracing_subscriber::filter::Targets::new()
                .with_target("reqwest", tracing::Level::WARN)
                .with_default(level),
        );
    tracing_subscriber::registry().with(fmt_layer).init();

    let cli = Cli::parse();
    tracing::info!(environment = %settings.app.environment, "Starting decision engine");

    match cli.command {
        Commands::Evaluate { symbol, bars, account, quote, timeframe, scenario } => {
            let bars: Vec<Bar> = read_json(&bars)?;
            let account: AccountState = match account {
                Some(path) => read_json(&path)?,
                None => AccountState::default(),
            };
            let quote: Option<Quote> = quote.as_deref().map(read_json::<Quote>).transpose()?;

            let mut input = CycleInput::new(symbol, bars).with_account(account).with_quote(quote);
            if let Some(timeframe) = timeframe {
                input = input.with_timeframe(timeframe);
            }

            let advisor = engine::build_advisor(&settings.advisor)?;
            let orchestrator = Orchestrator::from_settings(&settings, advisor);

            let output = match scenario {
                ScenarioArg::Auto => serde_json::to_string_pretty(&orchestrator.evaluate_auto(input).await?)?,
                ScenarioArg::Intraday => {
                    serde_json::to_string_pretty(&orchestrator.evaluate(Scenario::Intraday, input).await?)?
                }
                ScenarioArg::Swing => {
                    serde_json::to_string_pretty(&orchestrator.evaluate(Scenario::Swing, input).await?)?
                }
            };
            println!("{output}");
        }
    }

    tracing::info!("Decision engine has finished successfully.");
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
