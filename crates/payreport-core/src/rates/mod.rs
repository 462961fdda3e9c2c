//! Currency conversion
//!
//! Every report total is expressed in the reference currency. Rates come from
//! a pluggable [`RateSource`] quoting each currency in local units, and are
//! memoized in a shared [`RateCache`].
//!
//! # Architecture
//!
//! - `RateSource` trait: one lookup attempt for exactly one day
//! - `TcmbRateSource`: central bank daily XML documents over HTTP
//! - `StaticRateSource`: in-memory table for tests and offline use
//! - `CurrencyConverter`: weekend/holiday fallback, caching, cross rates
//!
//! # Usage
//!
//! ```rust,ignore
//! let source = Arc::new(TcmbRateSource::new(&config.rates)?);
//! let converter = CurrencyConverter::new(source, Arc::new(RateCache::new()), &config.rates);
//!
//! let conversion = converter.convert_to_reference(amount, Currency::Eur, date).await?;
//! println!("{} USD at {}", conversion.amount_reference, conversion.rate);
//! ```

mod cache;
mod fixed;
pub mod tcmb;

pub use cache::RateCache;
pub use fixed::StaticRateSource;
pub use tcmb::TcmbRateSource;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::RateConfig;
use crate::error::{Error, Result};
use crate::models::Currency;

/// A provider of daily exchange rates
///
/// Rates are local-currency units per one unit of `currency`. A call makes a
/// single attempt for exactly the given day; fallback to earlier days is the
/// converter's job.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rate(&self, date: NaiveDate, currency: Currency) -> Result<Decimal>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Result of converting an amount to the reference currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Conversion {
    pub amount_reference: Decimal,
    /// Rate that was applied (1 for the reference currency)
    pub rate: Decimal,
}

/// Converts amounts into the reference currency
pub struct CurrencyConverter {
    source: Arc<dyn RateSource>,
    cache: Arc<RateCache>,
    search_window_days: u32,
    today: Option<NaiveDate>,
}

impl CurrencyConverter {
    pub fn new(source: Arc<dyn RateSource>, cache: Arc<RateCache>, config: &RateConfig) -> Self {
        Self {
            source,
            cache,
            search_window_days: config.search_window_days.max(1),
            today: None,
        }
    }

    /// Pin "today" (future dates are clamped to it)
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn cache(&self) -> &Arc<RateCache> {
        &self.cache
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Rate of `currency` in local units for `date`
    ///
    /// Future dates use today's rate. Weekends resolve to the preceding
    /// Friday, and days without a published rate fall back one business day
    /// at a time until the search window is exhausted.
    pub async fn get_rate(&self, date: NaiveDate, currency: Currency) -> Result<Decimal> {
        if currency.is_local() {
            return Ok(Decimal::ONE);
        }

        let date = date.min(self.today());

        if let Some(rate) = self.cache.get(date, currency) {
            debug!(%date, %currency, %rate, "Rate cache hit");
            return Ok(rate);
        }

        let mut day = latest_business_day(date);
        for attempt in 0..self.search_window_days {
            if attempt > 0 {
                day = previous_business_day(day);
            }

            match self.source.fetch_rate(day, currency).await {
                Ok(rate) if rate > Decimal::ZERO => {
                    debug!(
                        %date,
                        %currency,
                        published = %day,
                        %rate,
                        source = self.source.name(),
                        "Fetched exchange rate"
                    );
                    return Ok(self.cache.insert(date, currency, rate));
                }
                Ok(rate) => {
                    debug!(%day, %currency, %rate, "Ignoring non-positive rate");
                }
                Err(e) => {
                    debug!(%day, %currency, error = %e, "No rate for day");
                }
            }
        }

        warn!(
            %date,
            %currency,
            window = self.search_window_days,
            "Exchange rate search exhausted"
        );
        Err(Error::RateUnavailable {
            currency,
            date,
            window: self.search_window_days,
        })
    }

    /// Convert `amount` in `currency` to the reference currency
    pub async fn convert_to_reference(
        &self,
        amount: Decimal,
        currency: Currency,
        date: NaiveDate,
    ) -> Result<Conversion> {
        if currency.is_reference() {
            return Ok(Conversion {
                amount_reference: amount,
                rate: Decimal::ONE,
            });
        }

        let reference_rate = self.get_rate(date, Currency::REFERENCE).await?;

        if currency.is_local() {
            return Ok(Conversion {
                amount_reference: checked_div(amount, reference_rate)?,
                rate: reference_rate,
            });
        }

        let currency_rate = self.get_rate(date, currency).await?;
        let local_amount = amount
            .checked_mul(currency_rate)
            .ok_or_else(|| Error::Conversion(format!("{} {} overflows", amount, currency)))?;

        Ok(Conversion {
            amount_reference: checked_div(local_amount, reference_rate)?,
            rate: checked_div(currency_rate, reference_rate)?,
        })
    }
}

fn checked_div(numerator: Decimal, denominator: Decimal) -> Result<Decimal> {
    numerator
        .checked_div(denominator)
        .ok_or_else(|| Error::Conversion(format!("cannot divide {} by {}", numerator, denominator)))
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `date` itself on a weekday, otherwise the preceding Friday
pub fn latest_business_day(date: NaiveDate) -> NaiveDate {
    if is_business_day(date) {
        date
    } else {
        previous_business_day(date)
    }
}

/// The closest weekday strictly before `date`
pub fn previous_business_day(date: NaiveDate) -> NaiveDate {
    let mut day = date;
    loop {
        day = match day.pred_opt() {
            Some(d) => d,
            None => return day,
        };
        if is_business_day(day) {
            return day;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn converter(source: Arc<StaticRateSource>, window: u32) -> CurrencyConverter {
        let config = RateConfig {
            search_window_days: window,
            ..RateConfig::default()
        };
        CurrencyConverter::new(source, Arc::new(RateCache::new()), &config).with_today(d(2024, 1, 19))
    }

    #[test]
    fn test_business_days() {
        // 2024-01-13 is a Saturday
        assert_eq!(latest_business_day(d(2024, 1, 13)), d(2024, 1, 12));
        assert_eq!(latest_business_day(d(2024, 1, 14)), d(2024, 1, 12));
        assert_eq!(latest_business_day(d(2024, 1, 15)), d(2024, 1, 15));
        assert_eq!(previous_business_day(d(2024, 1, 15)), d(2024, 1, 12));
        assert_eq!(previous_business_day(d(2024, 1, 17)), d(2024, 1, 16));
    }

    #[tokio::test]
    async fn test_local_currency_needs_no_lookup() {
        let source = Arc::new(StaticRateSource::new());
        let conv = converter(source.clone(), 30);

        assert_eq!(conv.get_rate(d(2024, 1, 15), Currency::Tl).await.unwrap(), Decimal::ONE);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_reference_identity() {
        let source = Arc::new(StaticRateSource::new());
        let conv = converter(source.clone(), 30);

        let result = conv
            .convert_to_reference(Decimal::from(1000), Currency::Usd, d(2024, 1, 15))
            .await
            .unwrap();
        assert_eq!(result.amount_reference, Decimal::from(1000));
        assert_eq!(result.rate, Decimal::ONE);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_local_and_cross_rate_conversion() {
        let source = Arc::new(
            StaticRateSource::new()
                .with_rate(d(2024, 1, 15), Currency::Usd, Decimal::from(30))
                .with_rate(d(2024, 1, 15), Currency::Eur, Decimal::from(33)),
        );
        let conv = converter(source, 30);

        let tl = conv
            .convert_to_reference(Decimal::from(3000), Currency::Tl, d(2024, 1, 15))
            .await
            .unwrap();
        assert_eq!(tl.amount_reference, Decimal::from(100));
        assert_eq!(tl.rate, Decimal::from(30));

        let eur = conv
            .convert_to_reference(Decimal::from(100), Currency::Eur, d(2024, 1, 15))
            .await
            .unwrap();
        assert_eq!(eur.amount_reference, Decimal::from(110));
        assert_eq!(eur.rate, Decimal::new(11, 1));
    }

    #[tokio::test]
    async fn test_weekend_uses_friday_rate() {
        let source = Arc::new(
            StaticRateSource::new().with_rate(d(2024, 1, 12), Currency::Usd, Decimal::from(30)),
        );
        let conv = converter(source.clone(), 30);

        let rate = conv.get_rate(d(2024, 1, 14), Currency::Usd).await.unwrap();
        assert_eq!(rate, Decimal::from(30));
        assert_eq!(source.calls(), 1);
        // Cached under the requested day
        assert_eq!(conv.cache().get(d(2024, 1, 14), Currency::Usd), Some(Decimal::from(30)));
    }

    #[tokio::test]
    async fn test_holiday_falls_back_one_business_day() {
        let source = Arc::new(
            StaticRateSource::new().with_rate(d(2024, 1, 12), Currency::Usd, Decimal::from(29)),
        );
        let conv = converter(source.clone(), 30);

        // Monday 15th and the weekend have nothing, Friday 12th does
        let rate = conv.get_rate(d(2024, 1, 15), Currency::Usd).await.unwrap();
        assert_eq!(rate, Decimal::from(29));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_source() {
        let source =
            Arc::new(StaticRateSource::new().with_fallback(Currency::Usd, Decimal::from(30)));
        let conv = converter(source.clone(), 30);

        conv.get_rate(d(2024, 1, 15), Currency::Usd).await.unwrap();
        conv.get_rate(d(2024, 1, 15), Currency::Usd).await.unwrap();
        assert_eq!(source.calls(), 1);

        conv.cache().clear();
        conv.get_rate(d(2024, 1, 15), Currency::Usd).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_future_date_clamped_to_today() {
        let source = Arc::new(
            StaticRateSource::new().with_rate(d(2024, 1, 19), Currency::Usd, Decimal::from(31)),
        );
        let conv = converter(source, 30);

        let rate = conv.get_rate(d(2024, 3, 1), Currency::Usd).await.unwrap();
        assert_eq!(rate, Decimal::from(31));
        assert_eq!(conv.cache().get(d(2024, 1, 19), Currency::Usd), Some(Decimal::from(31)));
        assert_eq!(conv.cache().get(d(2024, 3, 1), Currency::Usd), None);
    }

    #[tokio::test]
    async fn test_search_window_exhausted() {
        let source = Arc::new(StaticRateSource::new());
        let conv = converter(source.clone(), 5);

        let err = conv.get_rate(d(2024, 1, 15), Currency::Eur).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RateUnavailable {
                currency: Currency::Eur,
                window: 5,
                ..
            }
        ));
        assert_eq!(source.calls(), 5);
        assert!(conv.cache().is_empty());
    }

    #[tokio::test]
    async fn test_zero_rate_is_skipped() {
        let source = Arc::new(
            StaticRateSource::new()
                .with_rate(d(2024, 1, 15), Currency::Usd, Decimal::ZERO)
                .with_rate(d(2024, 1, 12), Currency::Usd, Decimal::from(30)),
        );
        let conv = converter(source, 30);

        assert_eq!(
            conv.get_rate(d(2024, 1, 15), Currency::Usd).await.unwrap(),
            Decimal::from(30)
        );
    }

    #[tokio::test]
    async fn test_shared_cache_between_converters() {
        let cache = Arc::new(RateCache::new());
        let source =
            Arc::new(StaticRateSource::new().with_fallback(Currency::Usd, Decimal::from(30)));
        let config = RateConfig::default();

        let first = CurrencyConverter::new(source.clone(), cache.clone(), &config)
            .with_today(d(2024, 1, 19));
        let second =
            CurrencyConverter::new(source.clone(), cache, &config).with_today(d(2024, 1, 19));

        first.get_rate(d(2024, 1, 15), Currency::Usd).await.unwrap();
        second.get_rate(d(2024, 1, 15), Currency::Usd).await.unwrap();
        assert_eq!(source.calls(), 1);
    }
}
