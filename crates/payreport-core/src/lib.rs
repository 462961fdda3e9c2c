//! Payreport Core Library
//!
//! Payment collection reporting pipeline:
//! - Rule-based classification of payment method, location and project
//! - Date and amount normalization for spreadsheet exports
//! - Currency conversion with business-day fallback and a shared rate cache
//! - Batch processing with per-row diagnostics
//! - Weekly, monthly and yearly aggregation
//! - CSV import of raw rows and layered TOML configuration

pub mod classify;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod normalize;
pub mod processor;
pub mod rates;
pub mod reports;

/// Test utilities including a mock rate document server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{Config, DuplicatePolicy, RateConfig, ValidationConfig};
pub use error::{Error, Result};
pub use models::{
    BatchOutcome, Currency, Location, PaymentMethod, ProcessedPayment, Project, RawAmount,
    RawPaymentRow,
};
pub use processor::{PaymentProcessor, ValidationIssue};
pub use rates::{
    Conversion, CurrencyConverter, RateCache, RateSource, StaticRateSource, TcmbRateSource,
};
pub use reports::{
    aggregate_months, aggregate_weeks, aggregate_years, yearly_report, MonthlyReport,
    PeriodTotals, WeeklyReport, YearlyReport,
};
