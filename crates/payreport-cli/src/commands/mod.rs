//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (converter wiring, row loading, argument parsing)
//! - `process` - Normalize and convert an export, optionally writing JSON
//! - `rates` - Exchange rate lookup and single-amount conversion
//! - `reports` - Weekly, monthly and yearly report printing

pub mod core;
pub mod process;
pub mod rates;
pub mod reports;

// Re-export command functions for main.rs
pub use core::*;
pub use process::*;
pub use rates::*;
pub use reports::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
