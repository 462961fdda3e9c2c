//! CSV import of raw payment rows
//!
//! Accepts the collection spreadsheet exported as CSV, either with its
//! Turkish headers or with plain English ones. Header matching is
//! case-insensitive and ignores column order.
//!
//! JSON input is an array of row objects using the `RawPaymentRow` field
//! names; amounts may be numbers or text.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{RawAmount, RawPaymentRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Customer,
    Date,
    Method,
    Account,
    Amount,
    Currency,
    Project,
}

impl Column {
    const REQUIRED: [Column; 5] = [
        Self::Customer,
        Self::Date,
        Self::Amount,
        Self::Currency,
        Self::Project,
    ];

    fn name(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Date => "date",
            Self::Method => "method",
            Self::Account => "account",
            Self::Amount => "amount",
            Self::Currency => "currency",
            Self::Project => "project",
        }
    }
}

/// Map a folded header to its column
///
/// The amount header of the Turkish export carries a varying suffix
/// ("Ödenen Tutar(Σ:12.345,00)"), so it is matched by prefix.
fn column_for(header: &str) -> Option<Column> {
    let column = match header {
        "müşteri adi soyadi" | "customer" | "customer_name" => Column::Customer,
        "tarih" | "date" => Column::Date,
        "tahsilat şekli" | "method" | "collection_method" => Column::Method,
        "hesap adi" | "account" | "account_name" => Column::Account,
        "ödenen döviz" | "currency" => Column::Currency,
        "proje adi" | "project" | "project_name" => Column::Project,
        "amount" => Column::Amount,
        h if h.starts_with("ödenen tutar") => Column::Amount,
        _ => return None,
    };
    Some(column)
}

/// Lower-case with Turkish dotted and dotless i folded to a plain i
fn fold_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .replace("i\u{307}", "i")
        .replace('ı', "i")
}

struct ColumnIndex {
    positions: Vec<(Column, usize)>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut positions: Vec<(Column, usize)> = Vec::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(column) = column_for(&fold_header(header)) {
                // First occurrence wins
                if !positions.iter().any(|(c, _)| *c == column) {
                    positions.push((column, i));
                }
            }
        }

        let missing: Vec<&str> = Column::REQUIRED
            .iter()
            .filter(|c| !positions.iter().any(|(p, _)| p == *c))
            .map(|c| c.name())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Import(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Self { positions })
    }

    fn get<'r>(&self, record: &'r StringRecord, column: Column) -> &'r str {
        self.positions
            .iter()
            .find(|(c, _)| *c == column)
            .and_then(|(_, i)| record.get(*i))
            .unwrap_or("")
    }
}

/// Read raw payment rows from CSV
///
/// Rows whose cells are all blank are skipped.
pub fn read_raw_rows<R: Read>(reader: R) -> Result<Vec<RawPaymentRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let index = ColumnIndex::from_headers(&headers)?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        rows.push(RawPaymentRow {
            customer_name: index.get(&record, Column::Customer).to_string(),
            date: index.get(&record, Column::Date).to_string(),
            collection_method: index.get(&record, Column::Method).to_string(),
            account_name: index.get(&record, Column::Account).to_string(),
            amount: RawAmount::Text(index.get(&record, Column::Amount).to_string()),
            currency: index.get(&record, Column::Currency).to_string(),
            project_name: index.get(&record, Column::Project).to_string(),
        });
    }

    debug!(rows = rows.len(), "Read raw payment rows");
    Ok(rows)
}

/// Read raw payment rows from a JSON array
pub fn read_json_rows<R: Read>(reader: R) -> Result<Vec<RawPaymentRow>> {
    let rows: Vec<RawPaymentRow> = serde_json::from_reader(reader)?;
    debug!(rows = rows.len(), "Read raw payment rows from JSON");
    Ok(rows)
}
