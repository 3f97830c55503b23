//! Typed decoding of sheet rows and encoding of ledger entries back to rows.
//!
//! Cells arrive unformatted: numbers as JSON numbers, text as strings, and
//! trailing empty cells are simply missing. Missing values are tolerated and
//! logged with the row number; values of the wrong shape produce a
//! [`RowError`] and the row is skipped.

use std::str::FromStr;

use chrono::NaiveDate;
use serde_json::Value;

use engine::{
    Account, BudgetTransaction, Category, CategoryGroup, Money, RowId, Transaction,
    TransactionStatus,
};

use crate::{error::RowError, layout, serial};

fn cell(row: &[Value], idx: usize) -> Option<&Value> {
    row.get(idx).filter(|value| match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

fn text(row: &[Value], idx: usize) -> Option<String> {
    cell(row, idx).map(|value| match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    })
}

/// Amount cell in major units folded to minor units. Float artefacts such
/// as `0.30000000000000004` are rounded to the nearest cent.
fn amount(row: &[Value], idx: usize, line: u32) -> Result<Option<Money>, RowError> {
    let Some(value) = cell(row, idx) else {
        return Ok(None);
    };
    let invalid = || RowError::InvalidAmount {
        row: line,
        value: value.to_string(),
    };
    match value {
        Value::Number(n) => {
            if let Ok(money) = Money::from_str(&n.to_string()) {
                return Ok(Some(money));
            }
            let major = n.as_f64().ok_or_else(invalid)?;
            let minor = (major * 100.0).round();
            if !minor.is_finite() || minor.abs() >= i64::MAX as f64 {
                return Err(invalid());
            }
            Ok(Some(Money::new(minor as i64)))
        }
        Value::String(s) => Money::from_str(s.trim()).map(Some).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn date(row: &[Value], idx: usize, line: u32) -> Result<Option<NaiveDate>, RowError> {
    let Some(value) = cell(row, idx) else {
        return Ok(None);
    };
    let invalid = || RowError::InvalidDate {
        row: line,
        value: value.to_string(),
    };
    let serial = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(invalid)?;
    serial::serial_to_date(serial).map(Some).ok_or_else(invalid)
}

fn epoch_date() -> NaiveDate {
    serial::serial_to_date(0.0).unwrap_or(NaiveDate::MIN)
}

fn skip(err: RowError) {
    tracing::warn!("skipping row: {err}");
}

/// Transactions from `Transactions!B9:H`. Only settled and pending rows are
/// kept; excluded and unmarked rows are template rows.
pub fn decode_transactions(values: &[Vec<Value>]) -> Vec<Transaction> {
    let mut out = Vec::new();
    for (line, row) in (layout::TRANSACTIONS_FIRST_ROW..).zip(values) {
        match decode_transaction(line, row) {
            Ok(Some(tx)) => out.push(tx),
            Ok(None) => {}
            Err(err) => skip(err),
        }
    }
    out
}

fn decode_transaction(line: u32, row: &[Value]) -> Result<Option<Transaction>, RowError> {
    let status = match text(row, 6).as_deref() {
        Some(layout::SETTLED) => TransactionStatus::Settled,
        Some(layout::PENDING) => TransactionStatus::Pending,
        _ => return Ok(None),
    };

    let date = date(row, 0, line)?.unwrap_or_else(|| {
        tracing::warn!("row {line} doesn't have a date");
        epoch_date()
    });

    let outflow = amount(row, 1, line)?.filter(|m| !m.is_zero());
    let inflow = amount(row, 2, line)?;
    let amount = match (outflow, inflow) {
        (Some(out), Some(inflow)) if !inflow.is_zero() => {
            tracing::warn!("row {line} has both outflow and inflow, using outflow");
            -out
        }
        (Some(out), _) => -out,
        (None, Some(inflow)) => inflow,
        (None, None) => {
            tracing::warn!("row {line} doesn't have an amount");
            Money::ZERO
        }
    };

    let category = text(row, 3).unwrap_or_else(|| {
        tracing::warn!("row {line} doesn't have a category");
        String::new()
    });
    let account = text(row, 4).unwrap_or_else(|| {
        tracing::warn!("row {line} doesn't have an account");
        String::new()
    });

    Ok(Some(Transaction {
        id: Some(RowId::transaction(line)),
        date,
        amount,
        category,
        account,
        memo: text(row, 5).unwrap_or_default(),
        status,
    }))
}

/// Budget transfers from `Category Transfers!B8:G`.
pub fn decode_budget_transactions(values: &[Vec<Value>]) -> Vec<BudgetTransaction> {
    let mut out = Vec::new();
    for (line, row) in (layout::TRANSFERS_FIRST_ROW..).zip(values) {
        match decode_budget_transaction(line, row) {
            Ok(Some(tx)) => out.push(tx),
            Ok(None) => {}
            Err(err) => skip(err),
        }
    }
    out
}

fn decode_budget_transaction(
    line: u32,
    row: &[Value],
) -> Result<Option<BudgetTransaction>, RowError> {
    if text(row, 5).as_deref() == Some(layout::EXCLUDED) {
        return Ok(None);
    }
    let Some(amount) = amount(row, 1, line)?.filter(|m| !m.is_zero()) else {
        return Ok(None);
    };

    let date = date(row, 0, line)?.unwrap_or_else(|| {
        tracing::warn!("row {line} doesn't have a date");
        epoch_date()
    });
    let mut from = text(row, 2).unwrap_or_default();
    let mut to = text(row, 3).unwrap_or_default();
    // A negative move is the same move in the other direction.
    if amount.is_negative() {
        std::mem::swap(&mut from, &mut to);
    }

    Ok(Some(BudgetTransaction {
        id: Some(RowId::budget_transaction(line)),
        date,
        amount: amount.abs(),
        from_category: from,
        to_category: to,
        memo: text(row, 4).unwrap_or_default(),
    }))
}

/// Accounts from `Configuration!I9:J23`.
pub fn decode_accounts(values: &[Vec<Value>]) -> Vec<Account> {
    let mut out = Vec::new();
    for row in values {
        if let Some(name) = text(row, 0) {
            out.push(Account::new(&name));
        }
        if let Some(name) = text(row, 1) {
            out.push(Account::credit_card(&name));
        }
    }
    out
}

/// Groups and categories from `Configuration!B9:F108`. Groups without any
/// category are dropped.
pub fn decode_categories(values: &[Vec<Value>]) -> (Vec<CategoryGroup>, Vec<Category>) {
    let first_row = 9;
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut categories: Vec<Category> = Vec::new();

    for (line, row) in (first_row..).zip(values) {
        let Some(marker) = text(row, 0) else {
            continue;
        };
        let name = text(row, 1).unwrap_or_default();

        let reportable = match marker.as_str() {
            layout::GROUP => {
                groups.push(CategoryGroup::new(&name));
                continue;
            }
            layout::IGNORED => continue,
            layout::REPORTABLE => true,
            layout::NON_REPORTABLE => false,
            _ => {
                skip(RowError::UnknownMarker {
                    row: line,
                    marker: marker.clone(),
                });
                continue;
            }
        };

        let Some(group) = groups.last() else {
            skip(RowError::CategoryBeforeGroup { row: line, name });
            continue;
        };
        let (monthly, goal) = match (amount(row, 2, line), amount(row, 3, line)) {
            (Ok(monthly), Ok(goal)) => (monthly, goal),
            (Err(err), _) | (_, Err(err)) => {
                skip(err);
                continue;
            }
        };

        let mut category = Category::new(&name, &group.id);
        category.reportable = reportable;
        category.monthly_budget = monthly.filter(|m| !m.is_zero());
        category.goal = goal.filter(|m| !m.is_zero());
        categories.push(category);
    }

    groups.retain(|group| categories.iter().any(|c| c.group == group.id));
    (groups, categories)
}

fn money_cell(amount: Money) -> Value {
    Value::String(amount.to_major_string())
}

/// Row written for a transaction. Exactly one of the outflow/inflow columns
/// is filled.
pub fn encode_transaction(tx: &Transaction) -> Vec<Value> {
    let (outflow, inflow) = if tx.amount.is_negative() {
        (money_cell(-tx.amount), Value::String(String::new()))
    } else {
        (Value::String(String::new()), money_cell(tx.amount))
    };
    let status = match tx.status {
        TransactionStatus::Settled => layout::SETTLED,
        TransactionStatus::Pending => layout::PENDING,
    };
    vec![
        Value::from(serial::date_to_serial(tx.date)),
        outflow,
        inflow,
        Value::String(tx.category.clone()),
        Value::String(tx.account.clone()),
        Value::String(tx.memo.clone()),
        Value::String(status.to_string()),
    ]
}

pub fn encode_budget_transaction(tx: &BudgetTransaction) -> Vec<Value> {
    vec![
        Value::from(serial::date_to_serial(tx.date)),
        money_cell(tx.amount),
        Value::String(tx.from_category.clone()),
        Value::String(tx.to_category.clone()),
        Value::String(tx.memo.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows(value: Value) -> Vec<Vec<Value>> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn transactions_keep_only_settled_and_pending() {
        let values = rows(json!([
            [45352, 12.5, "", "Groceries", "Checking", "weekly", "✅"],
            [45352, "", "", "", "", "template", "*️⃣"],
            [45353, "", 1000, "Available to budget", "Checking", "", "🅿️"],
            [],
            [45354, "oops", "", "Groceries", "Checking", "", "✅"]
        ]));
        let txs = decode_transactions(&values);
        assert_eq!(txs.len(), 2);

        assert_eq!(txs[0].id, Some(RowId::transaction(9)));
        assert_eq!(txs[0].amount, Money::new(-1250));
        assert_eq!(txs[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(txs[0].memo, "weekly");

        assert_eq!(txs[1].id, Some(RowId::transaction(11)));
        assert_eq!(txs[1].amount, Money::new(100_000));
        assert_eq!(txs[1].status, TransactionStatus::Pending);
    }

    #[test]
    fn missing_fields_default_instead_of_dropping_the_row() {
        let values = rows(json!([["", "", "", "", "", "", "✅"]]));
        let txs = decode_transactions(&values);
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].amount, Money::ZERO);
        assert_eq!(txs[0].date, NaiveDate::from_ymd_opt(1899, 12, 30).unwrap());
        assert!(txs[0].category.is_empty());
    }

    #[test]
    fn float_artefacts_are_rounded() {
        let values = rows(json!([[45352, 0.30000000000000004, "", "A", "B", "", "✅"]]));
        assert_eq!(decode_transactions(&values)[0].amount, Money::new(-30));
    }

    #[test]
    fn categories_follow_their_group() {
        let values = rows(json!([
            ["✦", "Everyday"],
            ["✧", "Groceries", 200, 500],
            ["※", "Fees"],
            [],
            ["✦", "Credit Cards"],
            ["◘", "Visa payment"],
            ["?", "Weird"],
            ["✦", "Goals"],
            ["✧", "Trip", "", 1500.5]
        ]));
        let (groups, categories) = decode_categories(&values);
        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Everyday", "Goals"]);

        assert_eq!(categories.len(), 3);
        assert_eq!(categories[0].monthly_budget, Some(Money::new(20_000)));
        assert_eq!(categories[0].goal, Some(Money::new(50_000)));
        assert!(!categories[1].reportable);
        assert_eq!(categories[2].group, "Goals");
        assert_eq!(categories[2].monthly_budget, None);
        assert_eq!(categories[2].goal, Some(Money::new(150_050)));
    }

    #[test]
    fn category_before_group_is_skipped() {
        let values = rows(json!([["✧", "Orphan"], ["✦", "G"], ["✧", "Child"]]));
        let (groups, categories) = decode_categories(&values);
        assert_eq!(groups.len(), 1);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Child");
    }

    #[test]
    fn accounts_split_by_column() {
        let values = rows(json!([["Checking", "Visa"], ["", "Amex"], ["Cash"]]));
        let accounts = decode_accounts(&values);
        let shape: Vec<_> = accounts
            .iter()
            .map(|a| (a.name.as_str(), a.is_credit_card))
            .collect();
        assert_eq!(
            shape,
            vec![("Checking", false), ("Visa", true), ("Amex", true), ("Cash", false)]
        );
    }

    #[test]
    fn budget_transfers_skip_excluded_and_empty_rows() {
        let values = rows(json!([
            [45352, 200, "Available to budget", "Groceries", "March"],
            [45352, 50, "A", "B", "", "*️⃣"],
            [45352, "", "A", "B"],
            [45353, -20, "Groceries", "Available to budget"]
        ]));
        let txs = decode_budget_transactions(&values);
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].id, Some(RowId::budget_transaction(8)));
        assert_eq!(txs[0].amount, Money::new(20_000));
        assert_eq!(txs[1].id, Some(RowId::budget_transaction(11)));
        assert_eq!(txs[1].from_category, "Available to budget");
        assert_eq!(txs[1].to_category, "Groceries");
        assert_eq!(txs[1].amount, Money::new(2_000));
    }

    #[test]
    fn encoded_rows_fill_one_amount_column() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let out = Transaction::new(date, Money::new(-1250), "Groceries", "Checking");
        assert_eq!(
            Value::Array(encode_transaction(&out)),
            json!([45352, "12.50", "", "Groceries", "Checking", "", "✅"])
        );

        let inflow = Transaction::new(date, Money::new(500), "Available to budget", "Checking")
            .with_status(TransactionStatus::Pending);
        assert_eq!(
            Value::Array(encode_transaction(&inflow)),
            json!([45352, "", "5.00", "Available to budget", "Checking", "", "🅿️"])
        );

        let transfer = BudgetTransaction::new(date, Money::new(20_000), "A", "B").unwrap();
        assert_eq!(
            Value::Array(encode_budget_transaction(&transfer)),
            json!([45352, "200.00", "A", "B", ""])
        );
    }
}
