use chrono::NaiveDate;

use engine::{
    ACCOUNT_TRANSFER, Account, Category, CategoryGroup, Ledger, LedgerData, Money, Month,
    ReportWindow, STARTING_BALANCE, Transaction, TrendExclusions, account_report,
    spending_report, trend_report,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ledger() -> Ledger {
    let mut savings = Category::new("Savings goal", "Goals");
    savings.reportable = false;

    Ledger::from_data(LedgerData {
        accounts: vec![Account::new("Checking"), Account::new("Savings")],
        category_groups: vec![CategoryGroup::new("Everyday"), CategoryGroup::new("Goals")],
        categories: vec![
            Category::new("Groceries", "Everyday"),
            Category::new("Rent", "Everyday"),
            savings,
        ],
        transactions: vec![
            Transaction::new(date(2024, 1, 1), Money::new(200_000), STARTING_BALANCE, "Checking"),
            Transaction::new(date(2024, 1, 10), Money::new(-4_000), "Groceries", "Checking"),
            Transaction::new(date(2024, 1, 20), Money::new(-1_000), "Groceries", "Checking"),
            Transaction::new(date(2024, 1, 28), Money::new(500), "Groceries", "Checking"),
            Transaction::new(date(2024, 3, 1), Money::new(-90_000), "Rent", "Checking"),
            Transaction::new(date(2024, 3, 2), Money::new(-10_000), "Savings goal", "Checking"),
            Transaction::new(date(2024, 3, 5), Money::new(-25_000), ACCOUNT_TRANSFER, "Checking"),
            Transaction::new(date(2024, 3, 5), Money::new(25_000), ACCOUNT_TRANSFER, "Savings"),
        ],
        ..Default::default()
    })
}

#[test]
fn trend_covers_every_month_in_the_dataset() {
    let ledger = ledger();
    let report = trend_report(&ledger, &TrendExclusions::new());

    assert_eq!(report.labels, vec!["January 2024", "February 2024", "March 2024"]);
    assert_eq!(report.series.len(), 3);

    let groceries = &report.series[0];
    assert_eq!(groceries.category, "Groceries");
    assert_eq!(
        groceries.data,
        vec![Money::new(5_000), Money::ZERO, Money::ZERO]
    );
    let rent = &report.series[1];
    assert_eq!(rent.data, vec![Money::ZERO, Money::ZERO, Money::new(90_000)]);
}

#[test]
fn trend_exclusions_zero_a_series_without_removing_it() {
    let ledger = ledger();
    let mut exclusions = TrendExclusions::new();
    exclusions.isolate(
        "Rent",
        ledger.user_categories().iter().map(|c| c.name.as_str()),
    );

    let report = trend_report(&ledger, &exclusions);
    assert_eq!(report.series.len(), 3);
    assert!(report.series[0].excluded);
    assert!(report.series[0].data.iter().all(|m| m.is_zero()));
    assert!(!report.series[1].excluded);
    assert_eq!(report.series[1].data[2], Money::new(90_000));
}

#[test]
fn account_report_defaults_to_first_account() {
    let ledger = ledger();
    let report = account_report(&ledger, None);

    assert_eq!(report.account.as_deref(), Some("Checking"));
    assert_eq!(report.points.len(), 3);

    let jan = &report.points[0];
    assert_eq!(jan.month, Month::new(2024, 1).unwrap());
    assert_eq!(jan.inflow, Money::new(200_500));
    assert_eq!(jan.outflow, Money::new(-5_000));
    assert_eq!(jan.ending_balance, Money::new(195_500));

    let feb = &report.points[1];
    assert_eq!(feb.ending_balance, Money::new(195_500));

    let mar = &report.points[2];
    assert_eq!(mar.transferred, Money::new(-25_000));
    assert_eq!(mar.outflow, Money::new(-100_000));
    assert_eq!(mar.ending_balance, Money::new(70_500));
}

#[test]
fn account_report_for_unused_account_is_empty() {
    let mut ledger = ledger();
    let mut data = LedgerData {
        accounts: ledger.accounts().to_vec(),
        ..Default::default()
    };
    data.accounts.push(Account::new("Wallet"));
    ledger.replace_all(data);

    let report = account_report(&ledger, Some("Wallet"));
    assert_eq!(report.account.as_deref(), Some("Wallet"));
    assert!(report.points.is_empty());
}

#[test]
fn spending_is_sorted_and_limited_to_reportable_categories() {
    let ledger = ledger();

    let all = spending_report(&ledger, None);
    let names: Vec<_> = all.iter().map(|s| s.category.as_str()).collect();
    assert_eq!(names, vec!["Rent", "Groceries"]);
    assert_eq!(all[1].amount, Money::new(5_000));

    let jan = ReportWindow::month(Month::new(2024, 1).unwrap());
    let only_jan = spending_report(&ledger, Some(&jan));
    assert_eq!(only_jan.len(), 1);
    assert_eq!(only_jan[0].category, "Groceries");
}
