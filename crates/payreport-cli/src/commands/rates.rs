//! Exchange rate command implementations

use anyhow::{Context, Result};
use payreport_core::normalize::parse_amount;
use payreport_core::{Config, Currency};
use rust_decimal::Decimal;

use super::{build_converter, parse_currency, parse_date_arg};

pub async fn cmd_rate(config: &Config, currency: &str, date: Option<&str>) -> Result<()> {
    let currency = parse_currency(currency)?;
    let date = parse_date_arg(date)?;
    let converter = build_converter(config)?;

    let rate = converter
        .get_rate(date, currency)
        .await
        .with_context(|| format!("No {} rate for {}", currency, date))?;

    println!();
    println!("💱 Exchange Rate");
    println!("   Date:      {}", date);
    println!("   Source:    {}", config.rates.base_url);
    println!("   ─────────────────────────────────────");
    println!("   1 {} = {:.4} {}", currency, rate, Currency::LOCAL);

    if !currency.is_reference() {
        let conversion = converter
            .convert_to_reference(Decimal::ONE, currency, date)
            .await
            .context("Failed to convert to USD")?;
        println!(
            "   1 {} = {:.6} {}",
            currency,
            conversion.amount_reference,
            Currency::REFERENCE
        );
    }

    Ok(())
}

pub async fn cmd_convert(
    config: &Config,
    amount: &str,
    currency: &str,
    date: Option<&str>,
) -> Result<()> {
    let amount = parse_amount(amount).with_context(|| format!("Invalid amount: {}", amount))?;
    let currency = parse_currency(currency)?;
    let date = parse_date_arg(date)?;
    let converter = build_converter(config)?;

    let conversion = converter
        .convert_to_reference(amount, currency, date)
        .await
        .with_context(|| format!("Failed to convert {} {}", amount, currency))?;

    println!();
    println!("💱 Conversion ({})", date);
    println!("   ─────────────────────────────────────");
    println!(
        "   {:.2} {} = {:.2} {}",
        amount,
        currency,
        conversion.amount_reference,
        Currency::REFERENCE
    );
    if !currency.is_reference() {
        println!("   Rate:  {:.6}", conversion.rate);
    }

    Ok(())
}
