//! Shared exchange rate cache

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::Currency;

/// Rates keyed by (requested date, currency)
///
/// Entries are never overwritten: the first rate stored for a key stays until
/// `clear` is called. Share one cache between converters with `Arc`.
#[derive(Debug, Default)]
pub struct RateCache {
    entries: RwLock<HashMap<(NaiveDate, Currency), Decimal>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: NaiveDate, currency: Currency) -> Option<Decimal> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&(date, currency)).copied()
    }

    /// Store a rate unless one is already cached; returns the cached value
    pub fn insert(&self, date: NaiveDate, currency: Currency, rate: Decimal) -> Decimal {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        *entries.entry((date, currency)).or_insert(rate)
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
