//! Shared utilities for commands
//!
//! This module contains:
//! - `build_converter` / `build_processor` - Wire the rate source from config
//! - `read_rows` - Load raw rows from a CSV or JSON export
//! - `load_payments` - Processed records for the report commands
//! - `parse_currency` / `parse_date_arg` - Argument parsing helpers

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use payreport_core::import::{read_json_rows, read_raw_rows};
use payreport_core::normalize::parse_date_text;
use payreport_core::{
    Config, Currency, CurrencyConverter, PaymentProcessor, ProcessedPayment, RateCache,
    RawPaymentRow, TcmbRateSource,
};
use tracing::{info, warn};

/// Converter backed by the configured rate source and a fresh cache
pub fn build_converter(config: &Config) -> Result<CurrencyConverter> {
    let source = TcmbRateSource::new(&config.rates).context("Failed to create rate source")?;
    Ok(CurrencyConverter::new(
        Arc::new(source),
        Arc::new(RateCache::new()),
        &config.rates,
    ))
}

pub fn build_processor(config: &Config) -> Result<PaymentProcessor> {
    Ok(PaymentProcessor::new(build_converter(config)?, config))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Read raw rows, choosing the parser by file extension
pub fn read_rows(path: &Path) -> Result<Vec<RawPaymentRow>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let rows = if is_json(path) {
        read_json_rows(file)
    } else {
        read_raw_rows(file)
    };
    let rows = rows.with_context(|| format!("Failed to read rows from {}", path.display()))?;

    info!(rows = rows.len(), file = %path.display(), "Loaded export");
    Ok(rows)
}

/// Load processed records for reporting
///
/// A `.json` file holds records written by `payreport process --output`.
/// Anything else is treated as a raw export and processed first; rows with
/// problems are left out of the report.
pub async fn load_payments(config: &Config, path: &Path) -> Result<Vec<ProcessedPayment>> {
    if is_json(path) {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let payments: Vec<ProcessedPayment> = serde_json::from_reader(file).with_context(|| {
            format!(
                "{} is not a processed record file (create one with `payreport process --output`)",
                path.display()
            )
        })?;
        return Ok(payments);
    }

    let rows = read_rows(path)?;
    let processor = build_processor(config)?;
    let outcome = processor.process_batch(&rows).await;
    if !outcome.is_clean() {
        warn!(
            errors = outcome.errors.len(),
            "Rows with problems were left out, run `payreport process` for details"
        );
    }
    Ok(outcome.processed)
}

/// Keep only payments dated in `year` (all when `None`)
pub fn filter_year(payments: Vec<ProcessedPayment>, year: Option<i32>) -> Vec<ProcessedPayment> {
    match year {
        Some(year) => payments
            .into_iter()
            .filter(|p| p.payment_date.year() == year)
            .collect(),
        None => payments,
    }
}

pub fn parse_currency(code: &str) -> Result<Currency> {
    code.parse().map_err(|e: String| anyhow::anyhow!(e))
}

/// Parse an optional date argument, defaulting to today
pub fn parse_date_arg(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(text) => parse_date_text(text).with_context(|| format!("Invalid date: {}", text)),
        None => Ok(Utc::now().date_naive()),
    }
}
