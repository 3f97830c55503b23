use api_types::snapshot::{
    AccountRecord, BudgetTransactionRecord, CategoryGroupRecord, CategoryRecord, LedgerSnapshot,
    TransactionRecord, TransactionStatus as StatusRecord,
};

use crate::{
    Account, BudgetTransaction, Category, CategoryGroup, Ledger, Transaction, TransactionStatus,
};

impl Ledger {
    /// Plain copy of every visible entity, ready for an exporter.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            accounts: self.accounts().iter().map(AccountRecord::from).collect(),
            category_groups: self
                .category_groups()
                .iter()
                .map(CategoryGroupRecord::from)
                .collect(),
            categories: self
                .user_categories()
                .iter()
                .map(CategoryRecord::from)
                .collect(),
            transactions: self
                .transactions()
                .iter()
                .map(TransactionRecord::from)
                .collect(),
            budget_transactions: self
                .budget_transactions()
                .iter()
                .map(BudgetTransactionRecord::from)
                .collect(),
        }
    }
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            credit_card: account.is_credit_card,
            hidden: account.is_hidden,
        }
    }
}

impl From<&CategoryGroup> for CategoryGroupRecord {
    fn from(group: &CategoryGroup) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
        }
    }
}

impl From<&Category> for CategoryRecord {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            group: category.group.clone(),
            reportable: category.reportable,
            hidden: category.hidden,
            monthly_budget_minor: category.monthly_budget.map(|m| m.minor()),
            goal_minor: category.goal.map(|m| m.minor()),
        }
    }
}

impl From<TransactionStatus> for StatusRecord {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Settled => Self::Settled,
            TransactionStatus::Pending => Self::Pending,
        }
    }
}

impl From<&Transaction> for TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.map(|id| id.to_string()).unwrap_or_default(),
            date: tx.date.format("%Y-%m-%d").to_string(),
            amount_minor: tx.amount.minor(),
            category: tx.category.clone(),
            account: tx.account.clone(),
            memo: tx.memo.clone(),
            status: tx.status.into(),
        }
    }
}

impl From<&BudgetTransaction> for BudgetTransactionRecord {
    fn from(tx: &BudgetTransaction) -> Self {
        Self {
            id: tx.id.map(|id| id.to_string()).unwrap_or_default(),
            date: tx.date.format("%Y-%m-%d").to_string(),
            amount_minor: tx.amount.minor(),
            from_category: tx.from_category.clone(),
            to_category: tx.to_category.clone(),
            memo: tx.memo.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{LedgerData, Money, RowId};

    use super::*;

    #[test]
    fn snapshot_normalizes_dates_and_ids() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let mut confirmed = Transaction::new(date, Money::new(-1250), "Groceries", "Checking");
        confirmed.id = Some(RowId::transaction(10));
        let mut ledger = Ledger::from_data(LedgerData {
            accounts: vec![Account::new("Checking")],
            categories: vec![Category::new("Groceries", "Everyday")],
            transactions: vec![confirmed],
            ..Default::default()
        });
        ledger
            .append_transaction(Transaction::new(date, Money::new(300), "Groceries", "Checking"))
            .unwrap();

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.transactions.len(), 2);
        assert_eq!(snapshot.transactions[0].id, "tx-10");
        assert_eq!(snapshot.transactions[0].date, "2024-01-05");
        assert_eq!(snapshot.transactions[0].amount_minor, -1250);
        assert_eq!(snapshot.transactions[1].id, "");

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["transactions"][0]["status"], "settled");
        assert_eq!(json["accounts"][0]["credit_card"], false);
    }
}
