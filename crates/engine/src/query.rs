//! Query/Filter Engine over the transaction list.
//!
//! A [`TransactionQuery`] is a conjunction of typed [`Condition`]s plus an
//! optional free-text search. Running it never mutates the ledger, so it can
//! be re-evaluated on every keystroke.

use std::cmp::Reverse;

use chrono::{Datelike, NaiveDate};
use unicode_normalization::UnicodeNormalization;

use crate::{EntryKey, Ledger, Money, Record, RowId, SyncMark, Transaction, TransactionStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextField {
    Account,
    Category,
    Memo,
}

impl TextField {
    fn get(self, tx: &Transaction) -> &str {
        match self {
            Self::Account => &tx.account,
            Self::Category => &tx.category,
            Self::Memo => &tx.memo,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateGranularity {
    Day,
    Month,
    Year,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateOp {
    Is(DateGranularity),
    Before,
    After,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextOp {
    /// Exact, case-sensitive.
    Is,
    /// Substring, case-insensitive.
    Contains,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberOp {
    Is,
    LessThan,
    GreaterThan,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    Date { op: DateOp, value: NaiveDate },
    Text { field: TextField, op: TextOp, value: String },
    OneOf { field: TextField, values: Vec<String> },
    /// Compared in minor units.
    Amount { op: NumberOp, value: Money },
}

impl Condition {
    pub fn matches(&self, tx: &Transaction) -> bool {
        match self {
            Self::Date { op, value } => match op {
                DateOp::Is(DateGranularity::Day) => tx.date == *value,
                DateOp::Is(DateGranularity::Month) => {
                    tx.date.year() == value.year() && tx.date.month() == value.month()
                }
                DateOp::Is(DateGranularity::Year) => tx.date.year() == value.year(),
                DateOp::Before => tx.date < *value,
                DateOp::After => tx.date > *value,
            },
            Self::Text { field, op, value } => {
                let current = field.get(tx);
                match op {
                    TextOp::Is => current == value,
                    TextOp::Contains => current.to_lowercase().contains(&value.to_lowercase()),
                }
            }
            Self::OneOf { field, values } => {
                let current = field.get(tx);
                values.iter().any(|value| value == current)
            }
            Self::Amount { op, value } => match op {
                NumberOp::Is => tx.amount == *value,
                NumberOp::LessThan => tx.amount < *value,
                NumberOp::GreaterThan => tx.amount > *value,
            },
        }
    }
}

/// Display-ready transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRow {
    pub key: EntryKey,
    pub id: Option<RowId>,
    pub date: NaiveDate,
    pub amount: Money,
    /// Absolute value of a negative amount.
    pub outflow: Option<Money>,
    /// A positive amount.
    pub inflow: Option<Money>,
    pub category: String,
    pub account: String,
    pub memo: String,
    pub status: TransactionStatus,
    pub sync: SyncMark,
}

impl From<&Record<Transaction>> for TransactionRow {
    fn from(record: &Record<Transaction>) -> Self {
        let tx = record.value();
        Self {
            key: record.key(),
            id: tx.id,
            date: tx.date,
            amount: tx.amount,
            outflow: tx.amount.is_negative().then(|| tx.amount.abs()),
            inflow: tx.amount.is_positive().then_some(tx.amount),
            category: tx.category.clone(),
            account: tx.account.clone(),
            memo: tx.memo.clone(),
            status: tx.status,
            sync: record.sync().clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    conditions: Vec<Condition>,
    search: String,
}

impl TransactionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// "is" conditions for navigating from a dashboard or account row.
    pub fn from_link(category: Option<&str>, account: Option<&str>) -> Self {
        let mut query = Self::new();
        if let Some(category) = category {
            query.add_condition(Condition::Text {
                field: TextField::Category,
                op: TextOp::Is,
                value: category.to_string(),
            });
        }
        if let Some(account) = account {
            query.add_condition(Condition::Text {
                field: TextField::Account,
                op: TextOp::Is,
                value: account.to_string(),
            });
        }
        query
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn add_condition(&mut self, condition: Condition) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    pub fn remove_condition(&mut self, index: usize) -> Option<Condition> {
        (index < self.conditions.len()).then(|| self.conditions.remove(index))
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.set_search(search);
        self
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = normalize(search);
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    fn matches_search(&self, tx: &Transaction) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let id = tx.id.map(|id| id.to_string()).unwrap_or_default();
        let date = tx.date.format("%Y-%m-%d").to_string();
        let amount = tx.amount.to_string();
        [
            id.as_str(),
            date.as_str(),
            amount.as_str(),
            tx.category.as_str(),
            tx.account.as_str(),
            tx.memo.as_str(),
            tx.status.as_str(),
        ]
        .into_iter()
        .any(|field| normalize(field).contains(&self.search))
    }

    /// Matching visible transactions, newest first. Same-date rows are
    /// ordered by descending sequence: unconfirmed entries, then higher rows.
    pub fn run(&self, ledger: &Ledger) -> Vec<TransactionRow> {
        let mut rows: Vec<TransactionRow> = ledger
            .transactions()
            .records()
            .filter(|record| {
                let tx = record.value();
                self.conditions.iter().all(|c| c.matches(tx)) && self.matches_search(tx)
            })
            .map(TransactionRow::from)
            .collect();

        rows.sort_by_key(|row| (Reverse(row.date), Reverse(sequence(row))));
        rows
    }
}

fn sequence(row: &TransactionRow) -> (bool, u64) {
    match row.id {
        None => (true, row.key.get()),
        Some(id) => (false, u64::from(id.row())),
    }
}

fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}
