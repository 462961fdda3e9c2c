//! Error types for payreport

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::Currency;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid date format: {0}")]
    DateFormat(String),

    #[error("Rejected date {date}: {reason}")]
    DateRejected { date: NaiveDate, reason: String },

    #[error("Invalid amount: {0}")]
    Amount(String),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Exchange rate unavailable for {currency} on {date} (searched {window} business days)")]
    RateUnavailable {
        currency: Currency,
        date: NaiveDate,
        window: u32,
    },

    #[error("Rate source error: {0}")]
    RateSource(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::RateSource(err.to_string())
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(err: quick_xml::DeError) -> Self {
        Error::RateSource(format!("malformed rate document: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
