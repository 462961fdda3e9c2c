//! Report command implementations

use std::path::Path;

use anyhow::Result;
use payreport_core::reports::ProjectPaymentMethods;
use payreport_core::{
    aggregate_months, aggregate_weeks, aggregate_years, yearly_report, Config, Location,
    PaymentMethod, PeriodTotals, Project, YearlyReport,
};

use super::{filter_year, load_payments, truncate};

pub async fn cmd_report_weekly(config: &Config, file: &Path, year: Option<i32>) -> Result<()> {
    let payments = filter_year(load_payments(config, file).await?, year);
    let weeks = aggregate_weeks(&payments);

    if weeks.is_empty() {
        println!("No payments to report.");
        return Ok(());
    }

    for week in &weeks {
        println!();
        match &week.month {
            Some(month) => println!("📅 Week {} ({} part)", week.week_number, month),
            None => println!("📅 Week {}", week.week_number),
        }
        println!("   Period: {} to {}", week.start_date, week.end_date);
        println!("   ─────────────────────────────────────────────────────────────");

        println!("   {:30} │ {:>12}", "Customer", "USD");
        println!("   ───────────────────────────────┼─────────────");
        for (customer, amount) in &week.customer_summary {
            println!("   {:30} │ {:>12.2}", truncate(customer, 30), amount);
        }
        println!();

        print_totals(&week.totals);
    }

    Ok(())
}

pub async fn cmd_report_monthly(config: &Config, file: &Path, year: Option<i32>) -> Result<()> {
    let payments = filter_year(load_payments(config, file).await?, year);
    let months = aggregate_months(&payments);

    if months.is_empty() {
        println!("No payments to report.");
        return Ok(());
    }

    for month in &months {
        println!();
        println!("📊 {}", month.month.format("%B %Y"));
        println!("   ─────────────────────────────────────────────────────────────");
        print_totals(&month.totals);
        print_project_methods(&month.project_payment_methods);

        println!("   {:10} │ {:>12}", "Day", "USD");
        println!("   ───────────┼─────────────");
        for (day, amount) in &month.daily_totals {
            println!("   {:10} │ {:>12.2}", day.to_string(), amount);
        }
    }

    Ok(())
}

pub async fn cmd_report_yearly(config: &Config, file: &Path, year: Option<i32>) -> Result<()> {
    let payments = load_payments(config, file).await?;

    let reports = match year {
        Some(year) => vec![yearly_report(&payments, year)],
        None => aggregate_years(&payments),
    };

    if reports.is_empty() {
        println!("No payments to report.");
        return Ok(());
    }

    for report in &reports {
        print_yearly(report);
    }

    Ok(())
}

fn print_yearly(report: &YearlyReport) {
    println!();
    println!("📈 Year {}", report.year);
    println!("   ─────────────────────────────────────────────────────────────");
    print_totals(&report.totals);
    print_project_methods(&report.project_payment_methods);

    println!(
        "   {:10} │ {:>12} │ {:>8}",
        "Month", "USD", "Payments"
    );
    println!("   ───────────┼──────────────┼──────────");
    for month in &report.monthly {
        println!(
            "   {:10} │ {:>12.2} │ {:>8}",
            month.month.format("%Y-%m").to_string(),
            month.totals.total_reference,
            month.totals.payment_count
        );
    }
}

/// Payment-method, project and location summaries
fn print_totals(totals: &PeriodTotals) {
    println!(
        "   Total: ${:.2} ({} payments)",
        totals.total_reference, totals.payment_count
    );
    println!();

    println!(
        "   {:16} │ {:>12} │ {:>12} │ {:>12}",
        "Payment Method", "TL", "Other (USD)", "Total USD"
    );
    println!("   ─────────────────┼──────────────┼──────────────┼─────────────");
    for method in PaymentMethod::ALL {
        let total = totals.payment_methods.get(&method).copied().unwrap_or_default();
        println!(
            "   {:16} │ {:>12.2} │ {:>12.2} │ {:>12.2}",
            method.label(),
            total.local,
            total.other,
            total.total_reference
        );
    }
    println!();

    println!("   {:16} │ {:>12}", "Project", "USD");
    println!("   ─────────────────┼─────────────");
    for (project, amount) in &totals.projects {
        println!("   {:16} │ {:>12.2}", project.label(), amount);
    }
    println!();

    print!("   {:16}", "Location");
    for project in Project::KNOWN {
        print!(" │ {:>12}", project.label());
    }
    println!(" │ {:>12}", "Total");
    println!("   ─────────────────┼──────────────┼──────────────┼─────────────");
    for location in Location::REPORTED {
        let Some(entry) = totals.locations.get(&location) else {
            continue;
        };
        print!("   {:16}", location.label());
        for project in Project::KNOWN {
            let amount = entry.by_project.get(&project).copied().unwrap_or_default();
            print!(" │ {:>12.2}", amount);
        }
        println!(" │ {:>12.2}", entry.total);
    }
    println!();
}

fn print_project_methods(breakdown: &ProjectPaymentMethods) {
    println!(
        "   {:7} │ {:16} │ {:>12} │ {:>12} │ {:>12}",
        "Project", "Payment Method", "TL", "Other (USD)", "Total USD"
    );
    println!("   ────────┼──────────────────┼──────────────┼──────────────┼─────────────");
    for (project, methods) in breakdown {
        for (method, total) in methods {
            println!(
                "   {:7} │ {:16} │ {:>12.2} │ {:>12.2} │ {:>12.2}",
                project.label(),
                method.label(),
                total.local,
                total.other,
                total.total_reference
            );
        }
    }
    println!();
}
