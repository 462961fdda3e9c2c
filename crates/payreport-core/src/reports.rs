//! Report aggregation
//!
//! Buckets processed payments by week, month and year. Every bucket carries
//! the same totals: per payment method, per project and per location, with
//! fixed labels pre-seeded at zero so exporters always see the full set.
//!
//! Weeks run Monday to Sunday. A week that crosses a month boundary is split
//! into one report per month so monthly rollups never absorb another month's
//! days; each portion displays only the days of its own month.
//!
//! Payments with an unknown project are not aggregated.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::classify::report_location;
use crate::models::{Location, PaymentMethod, ProcessedPayment, Project};

/// Amounts collected through one payment method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PaymentMethodTotal {
    /// Original amounts of local-currency payments
    pub local: Decimal,
    /// Reference amounts of all other payments
    pub other: Decimal,
    /// Reference amounts of every payment
    pub total_reference: Decimal,
}

impl PaymentMethodTotal {
    fn add(&mut self, payment: &ProcessedPayment) {
        if payment.currency.is_local() {
            self.local += payment.amount;
        } else {
            self.other += payment.amount_reference;
        }
        self.total_reference += payment.amount_reference;
    }
}

/// Reference amounts collected at one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationTotal {
    pub by_project: BTreeMap<Project, Decimal>,
    pub total: Decimal,
}

impl Default for LocationTotal {
    fn default() -> Self {
        Self {
            by_project: Project::KNOWN.iter().map(|p| (*p, Decimal::ZERO)).collect(),
            total: Decimal::ZERO,
        }
    }
}

/// Payment-method totals for each known project
pub type ProjectPaymentMethods = BTreeMap<Project, BTreeMap<PaymentMethod, PaymentMethodTotal>>;

fn seeded_methods() -> BTreeMap<PaymentMethod, PaymentMethodTotal> {
    PaymentMethod::ALL
        .iter()
        .map(|m| (*m, PaymentMethodTotal::default()))
        .collect()
}

fn seeded_project_methods() -> ProjectPaymentMethods {
    Project::KNOWN.iter().map(|p| (*p, seeded_methods())).collect()
}

fn add_project_method(breakdown: &mut ProjectPaymentMethods, payment: &ProcessedPayment) {
    if let Some(methods) = breakdown.get_mut(&payment.project) {
        methods
            .entry(payment.payment_method)
            .or_default()
            .add(payment);
    }
}

/// Totals shared by every report granularity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodTotals {
    pub payment_methods: BTreeMap<PaymentMethod, PaymentMethodTotal>,
    pub projects: BTreeMap<Project, Decimal>,
    pub locations: BTreeMap<Location, LocationTotal>,
    pub total_reference: Decimal,
    pub payment_count: usize,
}

impl Default for PeriodTotals {
    fn default() -> Self {
        Self {
            payment_methods: seeded_methods(),
            projects: Project::KNOWN.iter().map(|p| (*p, Decimal::ZERO)).collect(),
            locations: Location::REPORTED
                .iter()
                .map(|l| (*l, LocationTotal::default()))
                .collect(),
            total_reference: Decimal::ZERO,
            payment_count: 0,
        }
    }
}

impl PeriodTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one payment (ignored when its project is unknown)
    pub fn add(&mut self, payment: &ProcessedPayment) {
        if !payment.project.is_known() {
            return;
        }
        let amount = payment.amount_reference;

        self.payment_methods
            .entry(payment.payment_method)
            .or_default()
            .add(payment);

        *self.projects.entry(payment.project).or_default() += amount;

        let location = report_location(payment.payment_method, &payment.account_name);
        let entry = self.locations.entry(location).or_default();
        *entry.by_project.entry(payment.project).or_default() += amount;
        entry.total += amount;

        self.total_reference += amount;
        self.payment_count += 1;
    }

    pub fn from_payments<'a>(payments: impl IntoIterator<Item = &'a ProcessedPayment>) -> Self {
        let mut totals = Self::new();
        for payment in payments {
            totals.add(payment);
        }
        totals
    }
}

/// One week, or the part of a week inside one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReport {
    /// Monday of the calendar week
    pub week_start: NaiveDate,
    /// First day shown (later than `week_start` for a split week's second part)
    pub start_date: NaiveDate,
    /// Last day shown (earlier than Sunday for a split week's first part)
    pub end_date: NaiveDate,
    /// ISO week label, e.g. "2024-W03"
    pub week_number: String,
    /// Month of this portion ("2024-01") when the week was split
    pub month: Option<String>,
    pub customer_summary: BTreeMap<String, Decimal>,
    pub totals: PeriodTotals,
    pub payments: Vec<ProcessedPayment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    /// First day of the month
    pub month: NaiveDate,
    pub totals: PeriodTotals,
    pub project_payment_methods: ProjectPaymentMethods,
    /// Reference amount per day with payments
    pub daily_totals: BTreeMap<NaiveDate, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyReport {
    pub year: i32,
    pub totals: PeriodTotals,
    pub project_payment_methods: ProjectPaymentMethods,
    pub monthly: Vec<MonthlyReport>,
}

/// Monday of the week containing `date` (Sunday belongs to the week before)
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(i64::from(date.day0()))
}

fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .map(|next| next - chrono::Duration::days(1))
        .unwrap_or(NaiveDate::MAX)
}

fn iso_week_label(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

fn known_payments<'a>(
    records: &'a [ProcessedPayment],
) -> impl Iterator<Item = &'a ProcessedPayment> + 'a {
    records.iter().filter(|p| p.project.is_known())
}

/// Weekly reports, split at month boundaries, sorted by week then month
pub fn aggregate_weeks(records: &[ProcessedPayment]) -> Vec<WeeklyReport> {
    // Step 1: group by calendar week
    let mut weeks: BTreeMap<NaiveDate, Vec<&ProcessedPayment>> = BTreeMap::new();
    for payment in known_payments(records) {
        weeks
            .entry(week_start(payment.payment_date))
            .or_default()
            .push(payment);
    }

    // Step 2: split weeks that cross a month boundary
    let mut reports = Vec::new();
    for (start, payments) in weeks {
        let end = start + chrono::Duration::days(6);

        if start.month() == end.month() {
            reports.push(build_weekly(start, start, end, None, &payments));
            continue;
        }

        let mut portions: BTreeMap<NaiveDate, Vec<&ProcessedPayment>> = BTreeMap::new();
        for payment in payments {
            portions
                .entry(month_start(payment.payment_date))
                .or_default()
                .push(payment);
        }

        for (month, payments) in portions {
            let display_start = start.max(month);
            let display_end = end.min(month_end(month));
            let tag = month.format("%Y-%m").to_string();
            reports.push(build_weekly(
                start,
                display_start,
                display_end,
                Some(tag),
                &payments,
            ));
        }
    }

    reports
}

fn build_weekly(
    week_start: NaiveDate,
    start_date: NaiveDate,
    end_date: NaiveDate,
    month: Option<String>,
    payments: &[&ProcessedPayment],
) -> WeeklyReport {
    let mut customer_summary: BTreeMap<String, Decimal> = BTreeMap::new();
    for payment in payments {
        *customer_summary
            .entry(payment.customer_name.clone())
            .or_default() += payment.amount_reference;
    }

    let mut sorted: Vec<ProcessedPayment> = payments.iter().map(|p| (*p).clone()).collect();
    sorted.sort_by(|a, b| {
        a.payment_date
            .cmp(&b.payment_date)
            .then_with(|| a.customer_name.cmp(&b.customer_name))
            .then_with(|| a.amount_reference.cmp(&b.amount_reference))
    });

    WeeklyReport {
        week_start,
        start_date,
        end_date,
        week_number: iso_week_label(week_start),
        month,
        customer_summary,
        totals: PeriodTotals::from_payments(payments.iter().copied()),
        payments: sorted,
    }
}

/// Monthly reports sorted by month
pub fn aggregate_months(records: &[ProcessedPayment]) -> Vec<MonthlyReport> {
    let mut months: BTreeMap<NaiveDate, Vec<&ProcessedPayment>> = BTreeMap::new();
    for payment in known_payments(records) {
        months
            .entry(month_start(payment.payment_date))
            .or_default()
            .push(payment);
    }

    months
        .into_iter()
        .map(|(month, payments)| build_monthly(month, &payments))
        .collect()
}

fn build_monthly(month: NaiveDate, payments: &[&ProcessedPayment]) -> MonthlyReport {
    let mut project_payment_methods = seeded_project_methods();
    let mut daily_totals: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

    for payment in payments {
        add_project_method(&mut project_payment_methods, payment);
        *daily_totals.entry(payment.payment_date).or_default() += payment.amount_reference;
    }

    MonthlyReport {
        month,
        totals: PeriodTotals::from_payments(payments.iter().copied()),
        project_payment_methods,
        daily_totals,
    }
}

/// Yearly reports sorted by year
pub fn aggregate_years(records: &[ProcessedPayment]) -> Vec<YearlyReport> {
    let mut years: BTreeMap<i32, Vec<ProcessedPayment>> = BTreeMap::new();
    for payment in known_payments(records) {
        years
            .entry(payment.payment_date.year())
            .or_default()
            .push(payment.clone());
    }

    years
        .into_iter()
        .map(|(year, payments)| build_yearly(year, &payments))
        .collect()
}

/// Report for one year, with every label present even without payments
pub fn yearly_report(records: &[ProcessedPayment], year: i32) -> YearlyReport {
    let payments: Vec<ProcessedPayment> = known_payments(records)
        .filter(|p| p.payment_date.year() == year)
        .cloned()
        .collect();
    build_yearly(year, &payments)
}

fn build_yearly(year: i32, payments: &[ProcessedPayment]) -> YearlyReport {
    let mut project_payment_methods = seeded_project_methods();
    for payment in payments {
        add_project_method(&mut project_payment_methods, payment);
    }

    YearlyReport {
        year,
        totals: PeriodTotals::from_payments(payments),
        project_payment_methods,
        monthly: aggregate_months(payments),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Currency;
    use chrono::Utc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn payment(customer: &str, date: NaiveDate, amount_reference: i64) -> ProcessedPayment {
        ProcessedPayment {
            customer_name: customer.to_string(),
            payment_date: date,
            amount: Decimal::from(amount_reference),
            currency: Currency::Usd,
            payment_method: PaymentMethod::Cash,
            location: Location::MarketDistrict,
            project: Project::Mkm,
            account_name: "Çarşı Kasa".to_string(),
            amount_reference: Decimal::from(amount_reference),
            exchange_rate: Decimal::ONE,
            created_at: Utc::now(),
        }
    }

    fn sample() -> Vec<ProcessedPayment> {
        let mut tl = payment("Ayşe", d(2024, 1, 16), 100);
        tl.currency = Currency::Tl;
        tl.amount = Decimal::from(3000);
        tl.exchange_rate = Decimal::from(30);
        tl.payment_method = PaymentMethod::BankTransfer;
        tl.account_name = "Yapı Kredi".to_string();

        let mut check = payment("Mehmet", d(2024, 1, 17), 250);
        check.payment_method = PaymentMethod::Check;
        check.project = Project::Msm;
        check.account_name = "Kuyumcukent".to_string();

        let mut eur = payment("Ayşe", d(2024, 1, 18), 110);
        eur.currency = Currency::Eur;
        eur.amount = Decimal::from(100);
        eur.account_name = "Somewhere".to_string();

        vec![payment("Ali", d(2024, 1, 15), 500), tl, check, eur]
    }

    #[test]
    fn test_week_start() {
        assert_eq!(week_start(d(2024, 1, 15)), d(2024, 1, 15));
        assert_eq!(week_start(d(2024, 1, 19)), d(2024, 1, 15));
        // Sunday closes the week that began the previous Monday
        assert_eq!(week_start(d(2024, 1, 21)), d(2024, 1, 15));
        assert_eq!(week_start(d(2024, 2, 1)), d(2024, 1, 29));
    }

    #[test]
    fn test_weekly_partitions_agree() {
        let reports = aggregate_weeks(&sample());
        assert_eq!(reports.len(), 1);
        let week = &reports[0];

        assert_eq!(week.week_number, "2024-W03");
        assert_eq!(week.start_date, d(2024, 1, 15));
        assert_eq!(week.end_date, d(2024, 1, 21));
        assert_eq!(week.month, None);

        let customers: Decimal = week.customer_summary.values().sum();
        let projects: Decimal = week.totals.projects.values().sum();
        let methods: Decimal = week
            .totals
            .payment_methods
            .values()
            .map(|m| m.total_reference)
            .sum();
        let locations: Decimal = week.totals.locations.values().map(|l| l.total).sum();

        assert_eq!(customers, Decimal::from(960));
        assert_eq!(projects, customers);
        assert_eq!(methods, customers);
        assert_eq!(locations, customers);
        assert_eq!(week.customer_summary["Ayşe"], Decimal::from(210));
    }

    #[test]
    fn test_payment_method_columns() {
        let totals = PeriodTotals::from_payments(&sample());

        let transfer = totals.payment_methods[&PaymentMethod::BankTransfer];
        assert_eq!(transfer.local, Decimal::from(3000));
        assert_eq!(transfer.other, Decimal::ZERO);
        assert_eq!(transfer.total_reference, Decimal::from(100));

        let cash = totals.payment_methods[&PaymentMethod::Cash];
        assert_eq!(cash.local, Decimal::ZERO);
        assert_eq!(cash.other, Decimal::from(610));
        assert_eq!(cash.total_reference, Decimal::from(610));
    }

    #[test]
    fn test_locations() {
        let totals = PeriodTotals::from_payments(&sample());
        assert_eq!(totals.locations.len(), Location::REPORTED.len());

        // Checks are reported under the check location whatever the account
        let check = &totals.locations[&Location::Check];
        assert_eq!(check.total, Decimal::from(250));
        assert_eq!(check.by_project[&Project::Msm], Decimal::from(250));
        assert_eq!(totals.locations[&Location::JewelryDistrict].total, Decimal::ZERO);

        // Unmatched accounts land in the office
        assert_eq!(totals.locations[&Location::Office].total, Decimal::from(110));
        assert_eq!(totals.locations[&Location::BankTransfer].total, Decimal::from(100));
        assert_eq!(totals.locations[&Location::MarketDistrict].total, Decimal::from(500));
    }

    #[test]
    fn test_empty_input_and_seeding() {
        assert!(aggregate_weeks(&[]).is_empty());
        assert!(aggregate_months(&[]).is_empty());

        let totals = PeriodTotals::new();
        assert_eq!(totals.payment_methods.len(), 3);
        assert_eq!(totals.projects.len(), 2);
        assert_eq!(totals.locations.len(), 5);
        assert!(totals
            .locations
            .values()
            .all(|l| l.by_project.len() == 2 && l.total.is_zero()));
    }

    #[test]
    fn test_unknown_project_not_aggregated() {
        let mut stray = payment("X", d(2024, 1, 15), 999);
        stray.project = Project::Unknown;

        let reports = aggregate_weeks(&[payment("Ali", d(2024, 1, 15), 10), stray]);
        assert_eq!(reports[0].payments.len(), 1);
        assert_eq!(reports[0].totals.total_reference, Decimal::from(10));
    }

    #[test]
    fn test_cross_month_week_is_split() {
        // Week of Monday 2024-01-29 runs to Sunday 2024-02-04
        let records = vec![
            payment("B", d(2024, 2, 2), 20),
            payment("A", d(2024, 1, 30), 10),
            payment("C", d(2024, 2, 4), 5),
        ];

        let reports = aggregate_weeks(&records);
        assert_eq!(reports.len(), 2);

        let january = &reports[0];
        assert_eq!(january.week_start, d(2024, 1, 29));
        assert_eq!(january.start_date, d(2024, 1, 29));
        assert_eq!(january.end_date, d(2024, 1, 31));
        assert_eq!(january.month.as_deref(), Some("2024-01"));
        assert_eq!(january.totals.total_reference, Decimal::from(10));

        let february = &reports[1];
        assert_eq!(february.week_start, d(2024, 1, 29));
        assert_eq!(february.start_date, d(2024, 2, 1));
        assert_eq!(february.end_date, d(2024, 2, 4));
        assert_eq!(february.month.as_deref(), Some("2024-02"));
        assert_eq!(february.totals.total_reference, Decimal::from(25));
        assert_eq!(january.week_number, february.week_number);
    }

    #[test]
    fn test_split_week_with_one_side_only() {
        let reports = aggregate_weeks(&[payment("A", d(2024, 2, 3), 10)]);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].start_date, d(2024, 2, 1));
        assert_eq!(reports[0].end_date, d(2024, 2, 4));
    }

    #[test]
    fn test_every_record_in_exactly_one_week() {
        let mut records = sample();
        records.push(payment("A", d(2024, 1, 30), 10));
        records.push(payment("B", d(2024, 2, 2), 20));
        records.push(payment("C", d(2024, 3, 31), 30));

        let reports = aggregate_weeks(&records);
        let counted: usize = reports.iter().map(|r| r.payments.len()).sum();
        assert_eq!(counted, records.len());

        let total: Decimal = reports.iter().map(|r| r.totals.total_reference).sum();
        let expected: Decimal = records.iter().map(|r| r.amount_reference).sum();
        assert_eq!(total, expected);
    }

    #[test]
    fn test_order_independent_of_input() {
        let mut records = sample();
        records.push(payment("A", d(2024, 1, 30), 10));
        records.push(payment("B", d(2024, 2, 2), 20));
        records.push(payment("C", d(2023, 12, 29), 30));

        let forward = aggregate_weeks(&records);
        let months_forward = aggregate_months(&records);
        records.reverse();
        let backward = aggregate_weeks(&records);

        assert_eq!(forward, backward);
        assert!(forward
            .windows(2)
            .all(|w| (w[0].week_start, w[0].start_date) < (w[1].week_start, w[1].start_date)));
        assert_eq!(aggregate_months(&records), months_forward);
    }

    #[test]
    fn test_friday_and_monday_share_month() {
        let records = vec![
            payment("A", d(2024, 1, 19), 100),
            payment("A", d(2024, 1, 22), 50),
        ];

        let weeks = aggregate_weeks(&records);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_number, "2024-W03");
        assert_eq!(weeks[1].week_number, "2024-W04");

        let months = aggregate_months(&records);
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].totals.total_reference, Decimal::from(150));
    }

    #[test]
    fn test_monthly_breakdowns() {
        let months = aggregate_months(&sample());
        assert_eq!(months.len(), 1);
        let month = &months[0];

        assert_eq!(month.month, d(2024, 1, 1));
        assert_eq!(month.daily_totals.len(), 4);
        assert_eq!(month.daily_totals[&d(2024, 1, 17)], Decimal::from(250));

        let mkm = &month.project_payment_methods[&Project::Mkm];
        let msm = &month.project_payment_methods[&Project::Msm];
        assert_eq!(mkm.len(), 3);
        assert_eq!(msm[&PaymentMethod::Check].total_reference, Decimal::from(250));
        assert_eq!(mkm[&PaymentMethod::Check].total_reference, Decimal::ZERO);
        assert_eq!(mkm[&PaymentMethod::BankTransfer].local, Decimal::from(3000));
    }

    #[test]
    fn test_years() {
        let mut records = sample();
        records.push(payment("Z", d(2023, 12, 29), 40));
        records.push(payment("Z", d(2024, 6, 3), 60));

        let years = aggregate_years(&records);
        assert_eq!(years.iter().map(|y| y.year).collect::<Vec<_>>(), vec![2023, 2024]);

        let y2024 = &years[1];
        assert_eq!(y2024.totals.total_reference, Decimal::from(1020));
        assert_eq!(y2024.monthly.len(), 2);
        assert_eq!(y2024.monthly[1].month, d(2024, 6, 1));

        assert_eq!(yearly_report(&records, 2024), *y2024);

        let empty = yearly_report(&records, 2020);
        assert!(empty.monthly.is_empty());
        assert_eq!(empty.totals.payment_methods.len(), 3);
        assert_eq!(empty.project_payment_methods.len(), 2);
    }
}
