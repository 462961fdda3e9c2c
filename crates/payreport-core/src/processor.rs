//! Payment processing pipeline
//!
//! Turns raw spreadsheet rows into classified, normalized payments with a
//! reference-currency amount. A batch never aborts: every failing row adds
//! diagnostics and processing continues with the next row.

use std::collections::HashMap;

use chrono::{Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::classify::{classify_location, classify_payment_method, classify_project};
use crate::config::{Config, DuplicatePolicy, ValidationConfig};
use crate::error::{Error, Result};
use crate::models::{BatchOutcome, Currency, ProcessedPayment, RawPaymentRow};
use crate::normalize::{amount_from_raw, parse_payment_date, DateRules};
use crate::rates::CurrencyConverter;

/// A semantic problem with an otherwise parseable payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyCustomer,
    NonPositiveAmount(Decimal),
    UnknownProject,
    FutureDate { date: NaiveDate, horizon_days: i64 },
    TooOld { date: NaiveDate, max_age_years: u32 },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCustomer => write!(f, "customer name is required"),
            Self::NonPositiveAmount(amount) => {
                write!(f, "amount must be greater than zero (got {})", amount)
            }
            Self::UnknownProject => write!(f, "unknown project"),
            Self::FutureDate { date, horizon_days } => write!(
                f,
                "payment date {} is more than {} day(s) in the future",
                date, horizon_days
            ),
            Self::TooOld {
                date,
                max_age_years,
            } => write!(
                f,
                "payment date {} is more than {} years old",
                date, max_age_years
            ),
        }
    }
}

/// Converts raw rows into processed payments
pub struct PaymentProcessor {
    converter: CurrencyConverter,
    date_rules: DateRules,
    validation: ValidationConfig,
    duplicates: DuplicatePolicy,
    today: Option<NaiveDate>,
}

impl PaymentProcessor {
    pub fn new(converter: CurrencyConverter, config: &Config) -> Self {
        Self {
            converter,
            date_rules: DateRules::from_config(&config.validation),
            validation: config.validation.clone(),
            duplicates: config.import.duplicates,
            today: None,
        }
    }

    /// Pin "today" for date checks and rate lookups
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self.converter = self.converter.with_today(today);
        self
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Normalize, classify and convert a single row
    pub async fn process(&self, raw: &RawPaymentRow) -> Result<ProcessedPayment> {
        let payment_date = parse_payment_date(&raw.date, self.today(), &self.date_rules)?;

        let payment_method = classify_payment_method(&raw.collection_method);
        let location = classify_location(&raw.account_name);
        let project = classify_project(&raw.project_name);

        let amount = amount_from_raw(&raw.amount)?;
        let currency: Currency = raw
            .currency
            .parse()
            .map_err(|_| Error::UnsupportedCurrency(raw.currency.trim().to_string()))?;

        let conversion = self
            .converter
            .convert_to_reference(amount, currency, payment_date)
            .await?;

        debug!(
            customer = raw.customer_name.trim(),
            date = %payment_date,
            %amount,
            %currency,
            method = %payment_method,
            %location,
            %project,
            amount_reference = %conversion.amount_reference,
            "Processed payment"
        );

        Ok(ProcessedPayment {
            customer_name: raw.customer_name.trim().to_string(),
            payment_date,
            amount,
            currency,
            payment_method,
            location,
            project,
            account_name: raw.account_name.trim().to_string(),
            amount_reference: conversion.amount_reference,
            exchange_rate: conversion.rate,
            created_at: Utc::now(),
        })
    }

    /// Check business rules on a processed payment
    pub fn validate(&self, payment: &ProcessedPayment) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let today = self.today();

        if payment.customer_name.trim().is_empty() {
            issues.push(ValidationIssue::EmptyCustomer);
        }

        if payment.amount <= Decimal::ZERO {
            issues.push(ValidationIssue::NonPositiveAmount(payment.amount));
        }

        if !payment.project.is_known() {
            issues.push(ValidationIssue::UnknownProject);
        }

        let horizon = today
            .checked_add_signed(chrono::Duration::days(self.validation.future_horizon_days))
            .unwrap_or(NaiveDate::MAX);
        if payment.payment_date > horizon {
            issues.push(ValidationIssue::FutureDate {
                date: payment.payment_date,
                horizon_days: self.validation.future_horizon_days,
            });
        }

        let oldest = today
            .checked_sub_months(Months::new(self.validation.max_age_years * 12))
            .unwrap_or(NaiveDate::MIN);
        if payment.payment_date < oldest {
            issues.push(ValidationIssue::TooOld {
                date: payment.payment_date,
                max_age_years: self.validation.max_age_years,
            });
        }

        issues
    }

    /// Process rows in order, collecting per-row diagnostics
    ///
    /// Diagnostics read "Row {n} ({customer}): {cause}" with 1-based row
    /// numbers; a row failing several validation rules yields one line each.
    pub async fn process_batch(&self, rows: &[RawPaymentRow]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (index, row) in rows.iter().enumerate() {
            let row_number = index + 1;
            let customer = row.customer_name.trim();

            let payment = match self.process(row).await {
                Ok(payment) => payment,
                Err(e) => {
                    warn!(row = row_number, customer, error = %e, "Row failed");
                    outcome
                        .errors
                        .push(format!("Row {} ({}): {}", row_number, customer, e));
                    continue;
                }
            };

            let issues = self.validate(&payment);
            if !issues.is_empty() {
                for issue in issues {
                    warn!(row = row_number, customer, %issue, "Row rejected");
                    outcome
                        .errors
                        .push(format!("Row {} ({}): {}", row_number, customer, issue));
                }
                continue;
            }

            if self.duplicates == DuplicatePolicy::SkipExact {
                let fingerprint = payment_fingerprint(&payment);
                if let Some(first) = seen.get(&fingerprint) {
                    debug!(row = row_number, first, "Skipping duplicate row");
                    outcome.errors.push(format!(
                        "Row {} ({}): duplicate of row {}",
                        row_number, customer, first
                    ));
                    continue;
                }
                seen.insert(fingerprint, row_number);
            }

            outcome.processed.push(payment);
        }

        info!(
            rows = rows.len(),
            processed = outcome.processed.len(),
            errors = outcome.errors.len(),
            duplicates = self.duplicates.as_str(),
            "Processed batch"
        );
        outcome
    }
}

/// Identity of a payment for exact-duplicate detection
pub fn payment_fingerprint(payment: &ProcessedPayment) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payment.customer_name.to_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(payment.payment_date.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(payment.amount.normalize().to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(payment.currency.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(payment.account_name.to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, PaymentMethod, Project, RawAmount};
    use crate::rates::{RateCache, StaticRateSource};
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn processor_with(config: Config) -> PaymentProcessor {
        let source = Arc::new(
            StaticRateSource::new()
                .with_fallback(Currency::Usd, Decimal::from(30))
                .with_fallback(Currency::Eur, Decimal::from(33)),
        );
        let converter = CurrencyConverter::new(source, Arc::new(RateCache::new()), &config.rates);
        PaymentProcessor::new(converter, &config).with_today(d(2024, 3, 1))
    }

    fn processor() -> PaymentProcessor {
        processor_with(Config::default())
    }

    fn row(customer: &str, date: &str, amount: &str, currency: &str) -> RawPaymentRow {
        RawPaymentRow {
            customer_name: customer.to_string(),
            date: date.to_string(),
            collection_method: "Nakit".to_string(),
            account_name: "Çarşı Kasa".to_string(),
            amount: RawAmount::Text(amount.to_string()),
            currency: currency.to_string(),
            project_name: "MKM".to_string(),
        }
    }

    #[tokio::test]
    async fn test_process_reference_currency_row() {
        let raw = RawPaymentRow {
            customer_name: "  A  ".into(),
            date: "15/01/2024".into(),
            collection_method: "bank transfer".into(),
            account_name: "Central Bank".into(),
            amount: RawAmount::Number(Decimal::from(1000)),
            currency: "USD".into(),
            project_name: "Model Kuyum Merkezi".into(),
        };

        let payment = processor().process(&raw).await.unwrap();
        assert_eq!(payment.customer_name, "A");
        assert_eq!(payment.payment_date, d(2024, 1, 15));
        assert_eq!(payment.amount_reference, Decimal::from(1000));
        assert_eq!(payment.exchange_rate, Decimal::ONE);
        assert_eq!(payment.payment_method, PaymentMethod::BankTransfer);
        assert_eq!(payment.location, Location::BankTransfer);
        assert_eq!(payment.project, Project::Mkm);
    }

    #[tokio::test]
    async fn test_process_converts_local_currency() {
        let payment = processor()
            .process(&row("B", "15/01/2024", "₺3,000", "TL"))
            .await
            .unwrap();
        assert_eq!(payment.currency, Currency::Tl);
        assert_eq!(payment.amount, Decimal::from(3000));
        assert_eq!(payment.amount_reference, Decimal::from(100));
        assert_eq!(payment.exchange_rate, Decimal::from(30));
    }

    #[tokio::test]
    async fn test_process_errors() {
        let p = processor();

        let err = p.process(&row("C", "not a date", "10", "USD")).await.unwrap_err();
        assert!(matches!(err, Error::DateFormat(_)));

        let err = p.process(&row("C", "15/01/2024", "ten", "USD")).await.unwrap_err();
        assert!(matches!(err, Error::Amount(_)));

        let err = p.process(&row("C", "15/01/2024", "10", "GBP")).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedCurrency(ref c) if c == "GBP"));
    }

    #[tokio::test]
    async fn test_validate_rules() {
        let p = processor();
        let mut payment = p.process(&row("D", "15/01/2024", "10", "USD")).await.unwrap();
        assert!(p.validate(&payment).is_empty());

        payment.customer_name = String::new();
        payment.amount = Decimal::ZERO;
        payment.project = Project::Unknown;
        let issues = p.validate(&payment);
        assert_eq!(issues.len(), 3);
        assert!(issues.contains(&ValidationIssue::EmptyCustomer));
        assert!(issues.contains(&ValidationIssue::UnknownProject));
    }

    #[tokio::test]
    async fn test_validate_date_window() {
        let p = processor();
        let mut payment = p.process(&row("E", "15/01/2024", "10", "USD")).await.unwrap();

        payment.payment_date = d(2024, 3, 2);
        assert!(p.validate(&payment).is_empty());

        payment.payment_date = d(2024, 3, 3);
        assert!(matches!(
            p.validate(&payment)[..],
            [ValidationIssue::FutureDate { .. }]
        ));

        payment.payment_date = d(2014, 3, 1);
        assert!(p.validate(&payment).is_empty());

        payment.payment_date = d(2014, 2, 28);
        assert!(matches!(
            p.validate(&payment)[..],
            [ValidationIssue::TooOld { .. }]
        ));
    }

    #[tokio::test]
    async fn test_batch_unknown_project_single_diagnostic() {
        let mut bad = row("Zeynep", "15/01/2024", "100", "USD");
        bad.project_name = "unknown-gibberish".to_string();
        let rows = vec![row("Ali", "15/01/2024", "100", "USD"), bad];

        let outcome = processor().process_batch(&rows).await;
        assert_eq!(outcome.processed.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("Row 2 (Zeynep)"));
        assert!(outcome.errors[0].contains("project"));
    }

    #[tokio::test]
    async fn test_batch_one_line_per_issue() {
        let mut bad = row("", "15/01/2024", "-5", "USD");
        bad.project_name = "???".to_string();

        let outcome = processor().process_batch(&[bad]).await;
        assert!(outcome.processed.is_empty());
        assert_eq!(outcome.errors.len(), 3);
        assert!(outcome.errors.iter().all(|e| e.starts_with("Row 1 ()")));
    }

    #[tokio::test]
    async fn test_batch_duplicates_allowed_by_default() {
        let rows = vec![
            row("Ali", "15/01/2024", "100", "USD"),
            row("Ali", "15/01/2024", "100", "USD"),
        ];

        let outcome = processor().process_batch(&rows).await;
        assert_eq!(outcome.processed.len(), 2);
        assert!(outcome.is_clean());
    }

    #[tokio::test]
    async fn test_batch_skip_exact_duplicates() {
        let mut config = Config::default();
        config.import.duplicates = DuplicatePolicy::SkipExact;

        let rows = vec![
            row("Ali", "15/01/2024", "100", "USD"),
            row("Ali", "15/01/2024", "100.00", "USD"),
            row("Ali", "16/01/2024", "100", "USD"),
        ];

        let outcome = processor_with(config).process_batch(&rows).await;
        assert_eq!(outcome.processed.len(), 2);
        assert_eq!(outcome.errors, vec!["Row 2 (Ali): duplicate of row 1"]);
    }
}
