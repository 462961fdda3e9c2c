//! Payreport CLI - Payment collection reports
//!
//! Usage:
//!   payreport process --file rows.csv --output out.json   Normalize and convert rows
//!   payreport report weekly --file out.json               Weekly report
//!   payreport rate --currency EUR --date 2024-01-15       Show an exchange rate
//!   payreport convert --amount 100 --currency TL          Convert to USD

mod cli;
mod commands;


use anyhow::{Context, Result};
use clap::Parser;
use payreport_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Process { file, output } => {
            commands::cmd_process(&config, &file, output.as_deref()).await
        }
        Commands::Report { report_type } => match report_type {
            ReportType::Weekly { file, year } => {
                commands::cmd_report_weekly(&config, &file, year).await
            }
            ReportType::Monthly { file, year } => {
                commands::cmd_report_monthly(&config, &file, year).await
            }
            ReportType::Yearly { file, year } => {
                commands::cmd_report_yearly(&config, &file, year).await
            }
        },
        Commands::Rate { currency, date } => {
            commands::cmd_rate(&config, &currency, date.as_deref()).await
        }
        Commands::Convert {
            amount,
            currency,
            date,
        } => commands::cmd_convert(&config, &amount, &currency, date.as_deref()).await,
    }
}
