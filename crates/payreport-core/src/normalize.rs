//! Date and amount normalization
//!
//! Spreadsheet exports carry dates as serial numbers, localized month names
//! or a handful of numeric layouts. Formats are tried in a fixed order and the
//! first successful parse wins.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{RejectedRange, ValidationConfig};
use crate::error::{Error, Result};
use crate::models::RawAmount;

/// Serial numbers at or above this are not treated as spreadsheet dates
const MAX_SERIAL: f64 = 100_000.0;

/// Numeric layouts tried after serials and month names, in order
const NUMERIC_FORMATS: [&str; 6] = [
    "%d/%m/%Y",          // 15/01/2024
    "%d-%m-%Y",          // 15-01-2024
    "%Y-%m-%d",          // 2024-01-15
    "%Y-%m-%d %H:%M:%S", // 2024-01-15 00:00:00
    "%Y-%m-%dT%H:%M:%S", // 2024-01-15T00:00:00
    "%d.%m.%Y",          // 15.01.2024
];

/// Month names accepted in "day month year" dates (lower-case)
const MONTH_NAMES: &[(&str, u32)] = &[
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
    ("ocak", 1),
    ("şubat", 2),
    ("subat", 2),
    ("mart", 3),
    ("nisan", 4),
    ("mayıs", 5),
    ("mayis", 5),
    ("haziran", 6),
    ("temmuz", 7),
    ("ağustos", 8),
    ("agustos", 8),
    ("eylül", 9),
    ("eylul", 9),
    ("ekim", 10),
    ("kasım", 11),
    ("kasim", 11),
    ("aralık", 12),
    ("aralik", 12),
];

fn month_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})[\s/.\-]+([^\d\s/.\-]+)[\s/.\-]+(\d{4})$").expect("valid regex")
    })
}

/// Parse a date string in any supported format
///
/// Order: spreadsheet serial, day/month-name/year, DD/MM/YYYY, DD-MM-YYYY,
/// ISO YYYY-MM-DD, DD.MM.YYYY.
pub fn parse_date_text(text: &str) -> Result<NaiveDate> {
    let s = text.trim();

    if let Some(datetime) = parse_serial(s) {
        debug!(input = %s, parsed = %datetime, "Parsed spreadsheet serial date");
        return Ok(datetime.date());
    }

    if let Some(date) = parse_month_name_date(s) {
        return Ok(date);
    }

    for fmt in NUMERIC_FORMATS {
        if !has_four_digit_year(s, fmt) {
            continue;
        }
        if fmt.contains("%H") {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(datetime.date());
            }
        } else if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::DateFormat(text.to_string()))
}

/// chrono's `%Y` also accepts "24" as year 24; exports always carry four digits
fn has_four_digit_year(s: &str, fmt: &str) -> bool {
    let mut fields = s.split(|c: char| !c.is_ascii_digit());
    let year = if fmt.starts_with("%Y") {
        fields.next()
    } else {
        fields.last()
    };
    year.is_some_and(|y| y.len() == 4)
}

/// Decode a spreadsheet serial date (days since 1900-01-01, serial 1 = that day)
///
/// Serials above 59 are shifted back one day to skip the phantom 1900-02-29
/// that spreadsheets count. The fractional part is the time of day.
pub fn parse_serial(text: &str) -> Option<NaiveDateTime> {
    let value: f64 = text.trim().parse().ok()?;
    if !value.is_finite() || !(1.0..MAX_SERIAL).contains(&value) {
        return None;
    }

    let serial = if value > 59.0 { value - 1.0 } else { value };
    let whole = serial.trunc();
    let fraction = serial - whole;

    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)?;
    let date = epoch.checked_add_days(Days::new(whole as u64 - 1))?;

    let seconds = ((fraction * 86_400.0).floor() as u32).min(86_399);
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)?;
    Some(date.and_time(time))
}

/// Parse "15/ocak/2024", "15 January 2024", "1-Şubat-2025" and similar
fn parse_month_name_date(s: &str) -> Option<NaiveDate> {
    let caps = month_name_regex().captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let name = caps[2].to_lowercase().replace("i\u{307}", "i");
    let year: i32 = caps[3].parse().ok()?;

    let month = MONTH_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, m)| *m)?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Sanity rules applied to every parsed payment date
#[derive(Debug, Clone, Default)]
pub struct DateRules {
    /// Dates further ahead than this are treated as swapped day/month fields
    pub max_future_months: u32,
    pub rejected_ranges: Vec<RejectedRange>,
}

impl DateRules {
    pub fn from_config(config: &ValidationConfig) -> Self {
        Self {
            max_future_months: config.max_future_months,
            rejected_ranges: config.rejected_ranges.clone(),
        }
    }

    /// Reject implausible dates relative to `today`
    pub fn check(&self, date: NaiveDate, today: NaiveDate) -> Result<()> {
        let limit = today
            .checked_add_months(Months::new(self.max_future_months))
            .unwrap_or(NaiveDate::MAX);
        if date > limit {
            return Err(Error::DateRejected {
                date,
                reason: format!(
                    "more than {} months in the future (day and month swapped?)",
                    self.max_future_months
                ),
            });
        }

        if let Some(range) = self.rejected_ranges.iter().find(|r| r.contains(date)) {
            let reason = if range.reason.is_empty() {
                format!("inside rejected range {} to {}", range.from, range.to)
            } else {
                range.reason.clone()
            };
            return Err(Error::DateRejected { date, reason });
        }

        Ok(())
    }
}

/// Parse a payment date and apply the sanity rules
pub fn parse_payment_date(text: &str, today: NaiveDate, rules: &DateRules) -> Result<NaiveDate> {
    let date = parse_date_text(text)?;
    rules.check(date, today)?;
    Ok(date)
}

/// Parse an amount string, stripping currency glyphs and thousands separators
pub fn parse_amount(text: &str) -> Result<Decimal> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '₺' | '$' | '€' | ',') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(Error::Amount(format!("empty amount '{}'", text)));
    }

    Decimal::from_str(&cleaned).map_err(|_| Error::Amount(format!("not a number: '{}'", text)))
}

/// Resolve a raw amount cell into a decimal
pub fn amount_from_raw(raw: &RawAmount) -> Result<Decimal> {
    match raw {
        RawAmount::Number(n) => Ok(*n),
        RawAmount::Text(s) => parse_amount(s),
    }
}
