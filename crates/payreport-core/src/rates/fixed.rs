//! In-memory rate source
//!
//! Serves rates from a table instead of the network. Useful for tests and for
//! reprocessing exports offline with known rates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::models::Currency;

use super::RateSource;

/// Rate source backed by a fixed table
///
/// Per-day rates take precedence over the fallback rate for a currency.
/// Days with neither fail like a day without a published document.
#[derive(Debug, Default)]
pub struct StaticRateSource {
    daily: HashMap<(NaiveDate, Currency), Decimal>,
    fallback: HashMap<Currency, Decimal>,
    calls: AtomicUsize,
}

impl StaticRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rate for one currency on one day
    pub fn with_rate(mut self, date: NaiveDate, currency: Currency, rate: Decimal) -> Self {
        self.daily.insert((date, currency), rate);
        self
    }

    /// Rate for a currency on every day without a specific entry
    pub fn with_fallback(mut self, currency: Currency, rate: Decimal) -> Self {
        self.fallback.insert(currency, rate);
        self
    }

    /// Number of fetch attempts served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn fetch_rate(&self, date: NaiveDate, currency: Currency) -> Result<Decimal> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        self.daily
            .get(&(date, currency))
            .or_else(|| self.fallback.get(&currency))
            .copied()
            .ok_or_else(|| {
                Error::RateSource(format!("no {} rate published for {}", currency, date))
            })
    }

    fn name(&self) -> &str {
        "static"
    }
}
