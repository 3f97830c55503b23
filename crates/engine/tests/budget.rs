use chrono::NaiveDate;

use engine::{
    ACCOUNT_TRANSFER, AVAILABLE_TO_BUDGET, Account, BALANCE_ADJUSTMENT, BudgetRow,
    BudgetTransaction, Category, CategoryAmounts, CategoryGroup, EngineError, Ledger, LedgerData,
    Money, Month, ReportWindow, RowId, STARTING_BALANCE, Transaction, account_summaries,
    budget_rows, budget_summary, category_amounts, move_between_categories, set_budgeted,
    transfer_between_accounts,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn march() -> ReportWindow {
    ReportWindow::month(Month::new(2024, 3).unwrap())
}

fn april() -> ReportWindow {
    ReportWindow::month(Month::new(2024, 4).unwrap())
}

fn confirmed_tx(row: u32, tx: Transaction) -> Transaction {
    Transaction {
        id: Some(RowId::transaction(row)),
        ..tx
    }
}

fn confirmed_btx(row: u32, tx: BudgetTransaction) -> BudgetTransaction {
    BudgetTransaction {
        id: Some(RowId::budget_transaction(row)),
        ..tx
    }
}

fn groceries_ledger() -> Ledger {
    let mut groceries = Category::new("Groceries", "Everyday");
    groceries.monthly_budget = Some(Money::new(20_000));

    Ledger::from_data(LedgerData {
        accounts: vec![Account::new("Checking"), Account::new("Savings")],
        category_groups: vec![CategoryGroup::new("Everyday")],
        categories: vec![groceries],
        transactions: vec![confirmed_tx(
            9,
            Transaction::new(date(2024, 3, 12), Money::new(-5_000), "Groceries", "Checking"),
        )],
        budget_transactions: vec![confirmed_btx(
            8,
            BudgetTransaction::new(
                date(2024, 3, 1),
                Money::new(20_000),
                AVAILABLE_TO_BUDGET,
                "Groceries",
            )
            .unwrap(),
        )],
    })
}

#[test]
fn groceries_rolls_over_into_next_month() {
    let ledger = groceries_ledger();

    let march = category_amounts(&ledger, &march());
    assert_eq!(
        march["Groceries"],
        CategoryAmounts {
            budgeted: Money::new(20_000),
            activity: Money::new(-5_000),
            available: Money::new(15_000),
        }
    );

    let april = category_amounts(&ledger, &april());
    assert_eq!(april["Groceries"].budgeted, Money::ZERO);
    assert_eq!(april["Groceries"].activity, Money::ZERO);
    assert_eq!(april["Groceries"].available, Money::new(15_000));
}

#[test]
fn available_follows_rollover_across_months() {
    let mut ledger = groceries_ledger();
    ledger
        .append_transaction(Transaction::new(
            date(2024, 4, 3),
            Money::new(-2_500),
            "Groceries",
            "Checking",
        ))
        .unwrap();
    ledger
        .append_budget_transaction(
            BudgetTransaction::new(
                date(2024, 5, 1),
                Money::new(10_000),
                AVAILABLE_TO_BUDGET,
                "Groceries",
            )
            .unwrap(),
        )
        .unwrap();

    let mut month = Month::new(2024, 2).unwrap();
    let mut previous = category_amounts(&ledger, &month.into())
        .get("Groceries")
        .copied()
        .unwrap_or_default();
    for _ in 0..4 {
        month = month.next();
        let current = category_amounts(&ledger, &month.into())
            .get("Groceries")
            .copied()
            .unwrap_or_default();
        assert_eq!(
            current.available,
            previous.available + current.budgeted + current.activity,
            "rollover broken at {month}"
        );
        previous = current;
    }
}

#[test]
fn budget_rows_list_groups_above_members() {
    let mut ledger = groceries_ledger();
    let mut hidden = Category::new("Old", "Everyday");
    hidden.hidden = true;
    let mut data = LedgerData {
        accounts: ledger.accounts().to_vec(),
        category_groups: ledger.category_groups().to_vec(),
        categories: ledger.user_categories().to_vec(),
        transactions: ledger.transactions().iter().cloned().collect(),
        budget_transactions: ledger.budget_transactions().iter().cloned().collect(),
    };
    data.categories.push(hidden);
    data.category_groups.push(CategoryGroup::new("Empty"));
    ledger.replace_all(data);

    let rows = budget_rows(&ledger, &march());
    assert_eq!(rows.len(), 2);
    assert!(rows[0].is_group());
    assert_eq!(rows[0].name(), "Everyday");
    assert_eq!(rows[0].amounts(), rows[1].amounts());
    match &rows[1] {
        BudgetRow::Category { name, progress, .. } => {
            assert_eq!(name, "Groceries");
            assert_eq!(*progress, Some(75));
        }
        BudgetRow::Group { .. } => panic!("expected a category row"),
    }
}

#[test]
fn summary_counts_income_and_budgeting() {
    let mut ledger = groceries_ledger();
    for tx in [
        Transaction::new(date(2024, 1, 1), Money::new(100_000), STARTING_BALANCE, "Checking"),
        Transaction::new(date(2024, 3, 2), Money::new(50_000), AVAILABLE_TO_BUDGET, "Checking"),
        Transaction::new(date(2024, 4, 2), Money::new(70_000), AVAILABLE_TO_BUDGET, "Checking"),
    ] {
        ledger.append_transaction(tx).unwrap();
    }

    let summary = budget_summary(&ledger, &march());
    assert_eq!(summary.to_budget, Money::new(100_000 + 50_000 - 20_000));
    assert_eq!(summary.budgeted, Money::new(20_000));
    assert_eq!(summary.spent, Money::new(-5_000));

    let summary = budget_summary(&ledger, &april());
    assert_eq!(summary.to_budget, Money::new(200_000));
    assert_eq!(summary.budgeted, Money::ZERO);
    assert_eq!(summary.spent, Money::ZERO);
}

#[test]
fn balance_adjustment_skips_credit_and_hidden_accounts() {
    let mut hidden = Account::new("Old");
    hidden.is_hidden = true;
    let ledger = Ledger::from_data(LedgerData {
        accounts: vec![Account::new("Checking"), Account::credit_card("Visa"), hidden],
        transactions: vec![
            Transaction::new(date(2024, 3, 1), Money::new(1_000), BALANCE_ADJUSTMENT, "Checking"),
            Transaction::new(date(2024, 3, 1), Money::new(2_000), BALANCE_ADJUSTMENT, "Visa"),
            Transaction::new(date(2024, 3, 1), Money::new(4_000), BALANCE_ADJUSTMENT, "Old"),
            Transaction::new(date(2024, 3, 1), Money::new(8_000), BALANCE_ADJUSTMENT, "Gone"),
            Transaction::new(date(2024, 3, 1), Money::new(-300), BALANCE_ADJUSTMENT, "Visa"),
        ],
        ..Default::default()
    });

    assert_eq!(budget_summary(&ledger, &march()).to_budget, Money::new(700));
}

#[test]
fn account_transfer_moves_balances_only() {
    let mut ledger = groceries_ledger();
    let before = budget_summary(&ledger, &march());

    let legs = transfer_between_accounts(
        &ledger,
        "Checking",
        "Savings",
        Money::new(3_000),
        date(2024, 3, 20),
        "rainy day",
    )
    .unwrap();
    assert_eq!(legs[0].category, ACCOUNT_TRANSFER);
    assert_eq!(legs[0].amount, Money::new(-3_000));
    assert_eq!(legs[1].amount, Money::new(3_000));
    for leg in legs {
        ledger.append_transaction(leg).unwrap();
    }

    let summaries = account_summaries(&ledger);
    assert_eq!(summaries[0].balance, Money::new(-8_000));
    assert_eq!(summaries[1].balance, Money::new(3_000));
    assert_eq!(summaries[1].last_transaction, Some(date(2024, 3, 20)));
    assert_eq!(budget_summary(&ledger, &march()), before);
}

#[test]
fn set_budgeted_produces_the_delta() {
    let ledger = groceries_ledger();

    let up = set_budgeted(&ledger, "Groceries", &march(), Money::new(25_000), date(2024, 3, 5))
        .unwrap()
        .unwrap();
    assert_eq!(up.from_category, AVAILABLE_TO_BUDGET);
    assert_eq!(up.to_category, "Groceries");
    assert_eq!(up.amount, Money::new(5_000));

    let down = set_budgeted(&ledger, "Groceries", &march(), Money::new(15_000), date(2024, 3, 5))
        .unwrap()
        .unwrap();
    assert_eq!(down.from_category, "Groceries");
    assert_eq!(down.to_category, AVAILABLE_TO_BUDGET);
    assert_eq!(down.amount, Money::new(5_000));

    assert!(
        set_budgeted(&ledger, "Groceries", &march(), Money::new(20_000), date(2024, 3, 5))
            .unwrap()
            .is_none()
    );
    assert!(matches!(
        set_budgeted(&ledger, ACCOUNT_TRANSFER, &march(), Money::new(1), date(2024, 3, 5)),
        Err(EngineError::InvalidId(_))
    ));
}

#[test]
fn move_between_categories_validates() {
    let ledger = groceries_ledger();
    assert!(
        move_between_categories(&ledger, "Groceries", "Nope", Money::new(10), date(2024, 3, 1))
            .is_err()
    );
    assert!(
        move_between_categories(
            &ledger,
            "Groceries",
            AVAILABLE_TO_BUDGET,
            Money::ZERO,
            date(2024, 3, 1)
        )
        .is_err()
    );
    let tx = move_between_categories(
        &ledger,
        "Groceries",
        AVAILABLE_TO_BUDGET,
        Money::new(10),
        date(2024, 3, 1),
    )
    .unwrap();
    assert_eq!(tx.net_for("Groceries"), Money::new(-10));
}

#[test]
fn unknown_references_do_not_break_aggregation() {
    let ledger = Ledger::from_data(LedgerData {
        accounts: vec![Account::new("Checking")],
        category_groups: vec![CategoryGroup::new("Everyday")],
        categories: vec![Category::new("Groceries", "Everyday")],
        transactions: vec![Transaction::new(
            date(2024, 3, 1),
            Money::new(-999),
            "Deleted category",
            "Checking",
        )],
        ..Default::default()
    });

    let rows = budget_rows(&ledger, &march());
    assert_eq!(rows[1].amounts(), CategoryAmounts::default());
    assert_eq!(ledger.dangling_references().len(), 1);
}
