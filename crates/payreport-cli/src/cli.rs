//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Payreport - Payment collection reports in a single reference currency
#[derive(Parser)]
#[command(name = "payreport")]
#[command(about = "Normalize collection exports and report them in USD", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (overrides the per-user config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize, classify and convert a spreadsheet export
    Process {
        /// Export file (.csv, or .json array of rows)
        #[arg(short, long)]
        file: PathBuf,

        /// Write processed records as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate weekly, monthly or yearly reports
    Report {
        #[command(subcommand)]
        report_type: ReportType,
    },

    /// Show the exchange rate used for a currency on a date
    Rate {
        /// Currency code (USD, TL, EUR)
        #[arg(short, long)]
        currency: String,

        /// Date (YYYY-MM-DD or DD/MM/YYYY, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Convert an amount to USD
    Convert {
        /// Amount ("1,250.00" and "₺100" are accepted)
        #[arg(short, long, allow_hyphen_values = true)]
        amount: String,

        /// Currency code (USD, TL, EUR)
        #[arg(short, long)]
        currency: String,

        /// Date (YYYY-MM-DD or DD/MM/YYYY, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Monday-Sunday weeks, split at month boundaries
    Weekly {
        /// Export (.csv) or processed records (.json from `process --output`)
        #[arg(short, long)]
        file: PathBuf,

        /// Only include payments from this year
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Calendar month totals with project and payment-method breakdown
    Monthly {
        /// Export (.csv) or processed records (.json from `process --output`)
        #[arg(short, long)]
        file: PathBuf,

        /// Only include payments from this year
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Calendar year totals with a per-month breakdown
    Yearly {
        /// Export (.csv) or processed records (.json from `process --output`)
        #[arg(short, long)]
        file: PathBuf,

        /// Report a single year
        #[arg(short, long)]
        year: Option<i32>,
    },
}
