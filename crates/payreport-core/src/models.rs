//! Domain models for payreport

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Supported payment currencies
///
/// Rates from the rate source are quoted in the local currency, so the local
/// currency is the base of every lookup and the reference currency is the
/// unit every report is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar (reference currency)
    Usd,
    /// Turkish lira (local currency)
    #[serde(rename = "TL", alias = "TRY")]
    Tl,
    /// Euro (secondary currency)
    Eur,
}

impl Currency {
    pub const REFERENCE: Currency = Currency::Usd;
    pub const LOCAL: Currency = Currency::Tl;
    pub const SECONDARY: Currency = Currency::Eur;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Tl => "TL",
            Self::Eur => "EUR",
        }
    }

    /// Code used by the rate source documents
    pub fn source_code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Tl => "TRY",
            Self::Eur => "EUR",
        }
    }

    pub fn is_reference(&self) -> bool {
        *self == Self::REFERENCE
    }

    pub fn is_local(&self) -> bool {
        *self == Self::LOCAL
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" | "$" => Ok(Self::Usd),
            "TL" | "TRY" | "₺" => Ok(Self::Tl),
            "EUR" | "€" => Ok(Self::Eur),
            _ => Err(format!("Unknown currency: {}", s)),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a payment was collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Check,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [Self::Cash, Self::BankTransfer, Self::Check];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::BankTransfer => "bank_transfer",
            Self::Check => "check",
        }
    }

    /// Label used on printed reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Nakit",
            Self::BankTransfer => "Banka Havalesi",
            Self::Check => "Çek",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" | "nakit" => Ok(Self::Cash),
            "bank_transfer" | "banka havalesi" | "havale" | "transfer" => Ok(Self::BankTransfer),
            "check" | "cheque" | "çek" => Ok(Self::Check),
            _ => Err(format!("Unknown payment method: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Physical location (collection point) of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Market district branch (Çarşı)
    MarketDistrict,
    /// Jewelry district branch (Kuyumcukent)
    JewelryDistrict,
    /// Head office, including the office cash register
    Office,
    /// Received directly into a bank account
    BankTransfer,
    /// Received as a check
    Check,
    /// Account text matched no known location
    Other,
}

impl Location {
    /// Locations that always appear in report location summaries
    pub const REPORTED: [Location; 5] = [
        Self::MarketDistrict,
        Self::JewelryDistrict,
        Self::Office,
        Self::BankTransfer,
        Self::Check,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarketDistrict => "market_district",
            Self::JewelryDistrict => "jewelry_district",
            Self::Office => "office",
            Self::BankTransfer => "bank_transfer",
            Self::Check => "check",
            Self::Other => "other",
        }
    }

    /// Label used on printed reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::MarketDistrict => "ÇARŞI",
            Self::JewelryDistrict => "KUYUMCUKENT",
            Self::Office => "OFİS",
            Self::BankTransfer => "BANKA HAVALESİ",
            Self::Check => "ÇEK",
            Self::Other => "DİĞER",
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Project a payment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Project {
    /// Model Kuyum Merkezi
    Mkm,
    /// Model Sanayi Merkezi
    Msm,
    Unknown,
}

impl Project {
    /// Projects that appear in report summaries
    pub const KNOWN: [Project; 2] = [Self::Mkm, Self::Msm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mkm => "mkm",
            Self::Msm => "msm",
            Self::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Mkm => "MKM",
            Self::Msm => "MSM",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Amount cell as found in a spreadsheet export
///
/// JSON uploads carry numbers, CSV exports carry text such as "₺1,250.00".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(Decimal),
    Text(String),
}

impl Default for RawAmount {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl std::fmt::Display for RawAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A payment row before any normalization (may be malformed)
///
/// Missing fields deserialize as empty text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPaymentRow {
    pub customer_name: String,
    pub date: String,
    /// Free text describing how the payment was collected
    pub collection_method: String,
    /// Account the payment was booked to (drives location)
    pub account_name: String,
    pub amount: RawAmount,
    pub currency: String,
    pub project_name: String,
}

/// A normalized, classified and converted payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedPayment {
    pub customer_name: String,
    pub payment_date: NaiveDate,
    /// Amount in the original currency
    pub amount: Decimal,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub location: Location,
    pub project: Project,
    pub account_name: String,
    /// Amount in the reference currency (always computed by the converter)
    pub amount_reference: Decimal,
    /// Rate applied to obtain `amount_reference`
    pub exchange_rate: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Result of processing a batch of raw rows
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    /// Successfully processed rows, in input order
    pub processed: Vec<ProcessedPayment>,
    /// Human-readable diagnostics, one per failure cause
    pub errors: Vec<String>,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
