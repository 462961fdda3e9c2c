//! Central bank (TCMB) rate source
//!
//! Daily rates are published as one XML document per business day at
//! `{base_url}/{YYYYMM}/{DDMMYYYY}.xml`. Each `Currency` element carries a
//! `CurrencyCode` attribute and a `ForexSelling` rate in lira per `Unit`
//! units of the currency. Weekends and holidays have no document.
//!
//! # Configuration
//!
//! ```toml
//! [rates]
//! base_url = "https://www.tcmb.gov.tr/kurlar"
//! timeout_secs = 10
//! ```

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::config::RateConfig;
use crate::error::{Error, Result};
use crate::models::Currency;

use super::RateSource;

/// HTTP client for the central bank's daily rate documents
#[derive(Clone)]
pub struct TcmbRateSource {
    http_client: Client,
    base_url: String,
}

impl TcmbRateSource {
    pub fn new(config: &RateConfig) -> Result<Self> {
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Document URL for one day
    pub fn document_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/{}/{}.xml",
            self.base_url,
            date.format("%Y%m"),
            date.format("%d%m%Y")
        )
    }
}

#[async_trait]
impl RateSource for TcmbRateSource {
    async fn fetch_rate(&self, date: NaiveDate, currency: Currency) -> Result<Decimal> {
        if currency.is_local() {
            return Ok(Decimal::ONE);
        }

        let url = self.document_url(date);
        debug!(%url, %currency, "Fetching rate document");

        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::RateSource(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        let body = response.text().await?;
        parse_rate_document(&body, currency)
    }

    fn name(&self) -> &str {
        "tcmb"
    }
}

/// Root element of a daily document (`Tarih_Date`)
#[derive(Debug, Deserialize)]
struct RateDocument {
    #[serde(rename = "Currency", default)]
    currencies: Vec<CurrencyEntry>,
}

#[derive(Debug, Deserialize)]
struct CurrencyEntry {
    #[serde(rename = "@CurrencyCode")]
    code: String,
    #[serde(rename = "Unit", default)]
    unit: Option<String>,
    #[serde(rename = "ForexSelling", default)]
    forex_selling: Option<String>,
}

/// Extract the selling rate of `currency` (per one unit) from a daily document
pub fn parse_rate_document(xml: &str, currency: Currency) -> Result<Decimal> {
    let document: RateDocument = quick_xml::de::from_str(xml)?;
    let code = currency.source_code();

    let entry = document
        .currencies
        .iter()
        .find(|c| c.code == code)
        .ok_or_else(|| Error::RateSource(format!("currency {} not found in rate document", code)))?;

    let selling = entry
        .forex_selling
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::RateSource(format!("no forex selling rate available for {}", code)))?;

    let rate = Decimal::from_str(selling)
        .map_err(|_| Error::RateSource(format!("invalid rate '{}' for {}", selling, code)))?;
    if rate <= Decimal::ZERO {
        return Err(Error::RateSource(format!(
            "no forex selling rate available for {}",
            code
        )));
    }

    let unit = entry
        .unit
        .as_deref()
        .and_then(|u| Decimal::from_str(u.trim()).ok())
        .filter(|u| *u > Decimal::ZERO)
        .unwrap_or(Decimal::ONE);

    Ok(rate / unit)
}
