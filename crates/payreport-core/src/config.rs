//! Layered configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for an override file (explicit path, else
//!    ~/.local/share/payreport/config.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from an override file keep their default value.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/payreport.toml");

/// Exchange rate source settings
#[derive(Debug, Clone)]
pub struct RateConfig {
    pub base_url: String,
    /// Per-request network timeout
    pub timeout: Duration,
    /// Maximum number of business days tried before giving up
    pub search_window_days: u32,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.tcmb.gov.tr/kurlar".to_string(),
            timeout: Duration::from_secs(10),
            search_window_days: 30,
        }
    }
}

/// A date range whose payments are always rejected
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RejectedRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

impl RejectedRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Date and record validation settings
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub max_future_months: u32,
    pub future_horizon_days: i64,
    pub max_age_years: u32,
    pub rejected_ranges: Vec<RejectedRange>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_future_months: 6,
            future_horizon_days: 1,
            max_age_years: 10,
            rejected_ranges: Vec::new(),
        }
    }
}

/// How repeated rows within one batch are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Every row is kept, identical rows are reported twice
    #[default]
    Allow,
    /// Rows identical to an earlier row of the batch are dropped
    SkipExact,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::SkipExact => "skip_exact",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    pub duplicates: DuplicatePolicy,
}

/// Complete payreport configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub rates: RateConfig,
    pub validation: ValidationConfig,
    pub import: ImportConfig,
    /// File the config was read from (None when using embedded defaults)
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load configuration (override first, then default)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Some(path.to_path_buf())
            }
            None => default_config_path().filter(|p| p.exists()),
        };

        let mut config = match &path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
                parse_config(&content)?
            }
            None => parse_config(DEFAULT_CONFIG)?,
        };
        config.source = path;
        Ok(config)
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("payreport").join("config.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    rates: Option<RawRates>,
    validation: Option<RawValidation>,
    import: Option<RawImport>,
}

#[derive(Debug, Deserialize)]
struct RawRates {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    search_window_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawValidation {
    max_future_months: Option<u32>,
    future_horizon_days: Option<i64>,
    max_age_years: Option<u32>,
    rejected_ranges: Option<Vec<RejectedRange>>,
}

#[derive(Debug, Deserialize)]
struct RawImport {
    duplicates: Option<DuplicatePolicy>,
}

/// Parse config from TOML content
pub fn parse_config(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = Config::default();

    if let Some(rates) = raw.rates {
        if let Some(base_url) = rates.base_url {
            config.rates.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = rates.timeout_secs {
            config.rates.timeout = Duration::from_secs(timeout);
        }
        if let Some(window) = rates.search_window_days {
            if window == 0 {
                return Err(Error::Config(
                    "rates.search_window_days must be at least 1".into(),
                ));
            }
            config.rates.search_window_days = window;
        }
    }

    if let Some(validation) = raw.validation {
        if let Some(months) = validation.max_future_months {
            config.validation.max_future_months = months;
        }
        if let Some(days) = validation.future_horizon_days {
            config.validation.future_horizon_days = days;
        }
        if let Some(years) = validation.max_age_years {
            config.validation.max_age_years = years;
        }
        if let Some(ranges) = validation.rejected_ranges {
            for range in &ranges {
                if range.from > range.to {
                    return Err(Error::Config(format!(
                        "rejected range starts after it ends: {} > {}",
                        range.from, range.to
                    )));
                }
            }
            config.validation.rejected_ranges = ranges;
        }
    }

    if let Some(import) = raw.import {
        if let Some(duplicates) = import.duplicates {
            config.import.duplicates = duplicates;
        }
    }

    Ok(config)
}
