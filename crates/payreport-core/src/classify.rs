//! Rule-based field classifiers
//!
//! Each classifier maps a free-text spreadsheet field to one label of a closed
//! set using an ordered table of keyword groups. Matching is a
//! case-insensitive substring test, except for a few short keywords that
//! only match whole words. The first matching group wins and a documented
//! default applies when nothing matches.

use crate::models::{Location, PaymentMethod, Project};

/// One row of a keyword table: any keyword matching selects the label
pub type KeywordRule<L> = (&'static [&'static str], L);

/// Collection-method rules, in priority order (lower-case keywords)
pub const PAYMENT_METHOD_RULES: &[KeywordRule<PaymentMethod>] = &[
    (&["çek", "check", "cheque"], PaymentMethod::Check),
    (
        &["banka havalesi", "havale", "eft", "bank", "transfer"],
        PaymentMethod::BankTransfer,
    ),
    (&["nakit", "kasa", "cash"], PaymentMethod::Cash),
    // Deferred payments are settled by bank transfer
    (&["vadeli", "deferred"], PaymentMethod::BankTransfer),
];

pub const DEFAULT_PAYMENT_METHOD: PaymentMethod = PaymentMethod::Cash;

/// Account-name rules, in priority order (lower-case keywords)
pub const LOCATION_RULES: &[KeywordRule<Location>] = &[
    (&["çarşı", "çarşi", "carsi", "carşı", "market"], Location::MarketDistrict),
    (&["kuyumcukent", "jewel"], Location::JewelryDistrict),
    (
        &["ofis", "office", "kasa", "cash register"],
        Location::Office,
    ),
    (
        &["yapi kredi", "yapı kredi", "banka", "bank", "havale"],
        Location::BankTransfer,
    ),
    (&["çek", "cek", "check", "cheque"], Location::Check),
];

pub const DEFAULT_LOCATION: Location = Location::Other;

/// Project-name rules, in priority order (upper-case keywords)
pub const PROJECT_RULES: &[KeywordRule<Project>] = &[
    (
        &["MODEL KUYUM", "KUYUM MERKEZ", "MKM"],
        Project::Mkm,
    ),
    (
        &["MODEL SANAYI", "MODEL SANAYİ", "SANAYI MERKEZ", "SANAYİ MERKEZ", "MSM", "3. ETAP"],
        Project::Msm,
    ),
];

pub const DEFAULT_PROJECT: Project = Project::Unknown;

/// Keywords that also occur inside ordinary words ("defter")
const WHOLE_WORD_KEYWORDS: &[&str] = &["eft"];

fn keyword_matches(haystack: &str, keyword: &str) -> bool {
    if WHOLE_WORD_KEYWORDS.contains(&keyword) {
        haystack
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == keyword)
    } else {
        haystack.contains(keyword)
    }
}

/// Return the label of the first rule with a keyword found in `haystack`
///
/// `haystack` must already be case-folded the same way as the keywords.
pub fn first_match<L: Copy>(haystack: &str, rules: &[KeywordRule<L>]) -> Option<L> {
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| keyword_matches(haystack, k)))
        .map(|(_, label)| *label)
}

/// Classify the collection-method column
///
/// Only the collection-method text is consulted; the account name never
/// influences the payment method.
pub fn classify_payment_method(collection_method: &str) -> PaymentMethod {
    let text = fold_lower(collection_method);
    first_match(&text, PAYMENT_METHOD_RULES).unwrap_or(DEFAULT_PAYMENT_METHOD)
}

/// Classify the account-name column into a location
pub fn classify_location(account_name: &str) -> Location {
    let text = fold_lower(account_name);
    first_match(&text, LOCATION_RULES).unwrap_or(DEFAULT_LOCATION)
}

/// Classify the project-name column
pub fn classify_project(project_name: &str) -> Project {
    let text = project_name.trim().to_uppercase();
    first_match(&text, PROJECT_RULES).unwrap_or(DEFAULT_PROJECT)
}

/// Location used when aggregating reports
///
/// Checks are always reported under the check location regardless of the
/// account. Accounts that match no location are reported under the office.
pub fn report_location(method: PaymentMethod, account_name: &str) -> Location {
    if method == PaymentMethod::Check {
        return Location::Check;
    }
    match classify_location(account_name) {
        Location::Other => Location::Office,
        location => location,
    }
}

/// Lower-case, mapping the dotted capital İ to a plain i
///
/// `str::to_lowercase` turns "İ" into "i" followed by a combining dot, which
/// would defeat substring matching against plain keywords.
fn fold_lower(s: &str) -> String {
    s.trim().to_lowercase().replace("i\u{307}", "i")
}
