use std::io::Read;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tariff_models::config::TariffConfig;
use tariff_models::request::CalculationInput;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tariff", about = "Tariff duty calculator")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/tariff.toml")]
    config: String,

    /// Pretty-print the output JSON
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calculate the duty for a CalculationInput JSON document
    Calculate {
        /// Read the input from a file instead of stdin
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Show the MFN and preferential rates in force
    Lookup {
        #[arg(long)]
        importer: String,
        #[arg(long)]
        origin: Option<String>,
        #[arg(long)]
        hs_code: String,
        /// Evaluation date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config: {}", cli.config))?;
    let config: TariffConfig =
        toml::from_str(&config_str).with_context(|| "Failed to parse config")?;

    let calculator = tariff::build_calculator(&config).context("Failed to build calculator")?;

    match cli.command {
        Command::Calculate { input } => {
            let input_json = match &input {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read input: {path}"))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read from stdin")?;
                    buf
                }
            };
            let input: CalculationInput = serde_json::from_str(&input_json)
                .context("Failed to parse CalculationInput JSON")?;

            let result = tariff::calculate(&calculator, &input)
                .await
                .map_err(|e| anyhow::anyhow!("Calculation failed: {e}"))?;
            print_json(&result, cli.pretty)?;
        }
        Command::Lookup {
            importer,
            origin,
            hs_code,
            as_of,
        } => {
            let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
            let lookup = calculator
                .lookup(&importer, origin.as_deref(), &hs_code, as_of)
                .await
                .map_err(|e| anyhow::anyhow!("Lookup failed: {e}"))?;
            print_json(&lookup, cli.pretty)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}
