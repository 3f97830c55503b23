//! Transaction primitives.
//!
//! A [`Transaction`] moves money in or out of an account. A
//! [`BudgetTransaction`] moves allocation between two categories and never
//! touches an account.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Transaction,
    BudgetTransaction,
}

impl RowKind {
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Transaction => "tx",
            Self::BudgetTransaction => "btx",
        }
    }
}

/// Identifier assigned by the remote store on commit: a prefix tag plus the
/// sheet row number (`tx-4143`).
///
/// Row numbers grow with insertion order, so the id doubles as a sequence
/// number for tie-breaking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId {
    kind: RowKind,
    row: u32,
}

impl RowId {
    pub const fn transaction(row: u32) -> Self {
        Self {
            kind: RowKind::Transaction,
            row,
        }
    }

    pub const fn budget_transaction(row: u32) -> Self {
        Self {
            kind: RowKind::BudgetTransaction,
            row,
        }
    }

    pub const fn kind(self) -> RowKind {
        self.kind
    }

    pub const fn row(self) -> u32 {
        self.row
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.prefix(), self.row)
    }
}

impl FromStr for RowId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidId(s.to_string());
        let (prefix, row) = s.split_once('-').ok_or_else(invalid)?;
        let kind = match prefix {
            "tx" => RowKind::Transaction,
            "btx" => RowKind::BudgetTransaction,
            _ => return Err(invalid()),
        };
        let row = row.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self { kind, row })
    }
}

impl Serialize for RowId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RowId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Settled,
    Pending,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Settled => "settled",
            Self::Pending => "pending",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// `None` until the remote store confirms the row.
    pub id: Option<RowId>,
    pub date: NaiveDate,
    /// Negative = outflow.
    pub amount: Money,
    pub category: String,
    pub account: String,
    pub memo: String,
    pub status: TransactionStatus,
}

impl Transaction {
    /// New, not yet committed, settled transaction.
    pub fn new(date: NaiveDate, amount: Money, category: &str, account: &str) -> Self {
        Self {
            id: None,
            date,
            amount,
            category: category.to_string(),
            account: account.to_string(),
            memo: String::new(),
            status: TransactionStatus::Settled,
        }
    }

    pub fn with_memo(mut self, memo: &str) -> Self {
        self.memo = memo.to_string();
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    /// Copies every field except the identifier.
    pub fn assign_fields(&mut self, other: &Transaction) {
        self.date = other.date;
        self.amount = other.amount;
        self.category.clone_from(&other.category);
        self.account.clone_from(&other.account);
        self.memo.clone_from(&other.memo);
        self.status = other.status;
    }

    pub fn same_fields(&self, other: &Transaction) -> bool {
        self.date == other.date
            && self.amount == other.amount
            && self.category == other.category
            && self.account == other.account
            && self.memo == other.memo
            && self.status == other.status
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetTransaction {
    pub id: Option<RowId>,
    pub date: NaiveDate,
    /// Always >= 0; direction is given by source and destination.
    pub amount: Money,
    pub from_category: String,
    pub to_category: String,
    pub memo: String,
}

impl BudgetTransaction {
    pub fn new(
        date: NaiveDate,
        amount: Money,
        from_category: &str,
        to_category: &str,
    ) -> ResultEngine<Self> {
        if amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "budget transfer amount must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: None,
            date,
            amount,
            from_category: from_category.to_string(),
            to_category: to_category.to_string(),
            memo: String::new(),
        })
    }

    pub fn with_memo(mut self, memo: &str) -> Self {
        self.memo = memo.to_string();
        self
    }

    /// Net effect on `category`: destination adds, source subtracts.
    pub fn net_for(&self, category: &str) -> Money {
        let mut net = Money::ZERO;
        if self.to_category == category {
            net += self.amount;
        }
        if self.from_category == category {
            net -= self.amount;
        }
        net
    }

    pub fn assign_fields(&mut self, other: &BudgetTransaction) {
        self.date = other.date;
        self.amount = other.amount;
        self.from_category.clone_from(&other.from_category);
        self.to_category.clone_from(&other.to_category);
        self.memo.clone_from(&other.memo);
    }

    pub fn same_fields(&self, other: &BudgetTransaction) -> bool {
        self.date == other.date
            && self.amount == other.amount
            && self.from_category == other.from_category
            && self.to_category == other.to_category
            && self.memo == other.memo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_id_parses_and_displays() {
        let id: RowId = "tx-4143".parse().unwrap();
        assert_eq!(id, RowId::transaction(4143));
        assert_eq!(id.to_string(), "tx-4143");

        let id: RowId = "btx-8".parse().unwrap();
        assert_eq!(id.kind(), RowKind::BudgetTransaction);
        assert_eq!(id.row(), 8);

        assert!("tx-".parse::<RowId>().is_err());
        assert!("foo-1".parse::<RowId>().is_err());
        assert!("".parse::<RowId>().is_err());
    }

    #[test]
    fn budget_transaction_rejects_negative_amount() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(BudgetTransaction::new(date, Money::new(-1), "A", "B").is_err());
    }

    #[test]
    fn net_for_self_transfer_is_zero() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let tx = BudgetTransaction::new(date, Money::new(500), "A", "A").unwrap();
        assert_eq!(tx.net_for("A"), Money::ZERO);
    }
}
