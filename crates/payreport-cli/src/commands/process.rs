//! Process command implementation

use std::path::Path;

use anyhow::{Context, Result};
use payreport_core::{Config, ProcessedPayment};

use super::{build_processor, read_rows, truncate};

pub async fn cmd_process(config: &Config, file: &Path, output: Option<&Path>) -> Result<()> {
    println!("📥 Processing {}...", file.display());

    let rows = read_rows(file)?;
    let processor = build_processor(config)?;
    let outcome = processor.process_batch(&rows).await;

    println!();
    println!("✅ Processing complete!");
    println!("   Rows:       {}", rows.len());
    println!("   Processed:  {}", outcome.processed.len());
    println!("   Problems:   {}", outcome.errors.len());

    if !outcome.errors.is_empty() {
        println!();
        println!("⚠️  Rows with problems:");
        for error in &outcome.errors {
            println!("   • {}", error);
        }
    }

    match output {
        Some(path) => {
            write_payments(path, &outcome.processed)?;
            println!();
            println!(
                "💾 Wrote {} records to {}",
                outcome.processed.len(),
                path.display()
            );
        }
        None => print_payments(&outcome.processed),
    }

    Ok(())
}

/// Write processed records as pretty-printed JSON
pub fn write_payments(path: &Path, payments: &[ProcessedPayment]) -> Result<()> {
    let json = serde_json::to_string_pretty(payments).context("Failed to serialize records")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn print_payments(payments: &[ProcessedPayment]) {
    if payments.is_empty() {
        return;
    }

    println!();
    println!(
        "   {:10} │ {:22} │ {:>12} │ {:3} │ {:>10} │ {:14} │ {:7}",
        "Date", "Customer", "Amount", "Cur", "USD", "Method", "Project"
    );
    println!("   ───────────┼────────────────────────┼──────────────┼─────┼────────────┼────────────────┼────────");
    for p in payments {
        println!(
            "   {:10} │ {:22} │ {:>12.2} │ {:3} │ {:>10.2} │ {:14} │ {:7}",
            p.payment_date.to_string(),
            truncate(&p.customer_name, 22),
            p.amount,
            p.currency.as_str(),
            p.amount_reference,
            p.payment_method.label(),
            p.project.label()
        );
    }
}
