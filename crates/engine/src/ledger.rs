//! Ledger Store: the canonical in-memory collections.
//!
//! The store keeps no derived state. Transactions and budget transactions are
//! wrapped in a [`Record`] that carries a process-local [`EntryKey`], the
//! synchronization mark and the generation of the last local change, which
//! is everything the reconciliation layer needs to merge remote snapshots
//! without losing unsynced edits.

use std::collections::HashMap;

use crate::{
    Account, BudgetTransaction, Category, CategoryGroup, EngineError, ResultEngine, RowId,
    Transaction,
    categories::fixed_categories,
    diagnostics::{self, Diagnostic, EntryRef},
};

/// Process-local handle of an entry. Stable for the lifetime of the entry,
/// never sent to the remote store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey(u64);

impl EntryKey {
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Synchronization state of a single entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SyncMark {
    /// Matches the remote store as far as we know.
    #[default]
    Confirmed,
    /// Local change applied, remote commit in flight.
    Pending,
    /// Remote commit gave up; the local change is kept but unconfirmed.
    Failed(String),
    /// Remote delete in flight. Hidden from every read.
    Deleting,
}

impl SyncMark {
    pub fn is_unsynced(&self) -> bool {
        !matches!(self, Self::Confirmed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record<T> {
    key: EntryKey,
    sync: SyncMark,
    written_at: u64,
    value: T,
}

impl<T> Record<T> {
    pub fn key(&self) -> EntryKey {
        self.key
    }

    pub fn sync(&self) -> &SyncMark {
        &self.sync
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// Ledger generation of the last local change or confirmation.
    pub fn written_at(&self) -> u64 {
        self.written_at
    }

    pub fn is_visible(&self) -> bool {
        self.sync != SyncMark::Deleting
    }
}

/// Entries that can be matched by remote identifier.
pub trait Entry: Clone {
    fn id(&self) -> Option<RowId>;
    fn set_id(&mut self, id: Option<RowId>);
    fn assign_fields(&mut self, other: &Self);
    fn same_fields(&self, other: &Self) -> bool;
}

impl Entry for Transaction {
    fn id(&self) -> Option<RowId> {
        self.id
    }

    fn set_id(&mut self, id: Option<RowId>) {
        self.id = id;
    }

    fn assign_fields(&mut self, other: &Self) {
        Transaction::assign_fields(self, other);
    }

    fn same_fields(&self, other: &Self) -> bool {
        Transaction::same_fields(self, other)
    }
}

impl Entry for BudgetTransaction {
    fn id(&self) -> Option<RowId> {
        self.id
    }

    fn set_id(&mut self, id: Option<RowId>) {
        self.id = id;
    }

    fn assign_fields(&mut self, other: &Self) {
        BudgetTransaction::assign_fields(self, other);
    }

    fn same_fields(&self, other: &Self) -> bool {
        BudgetTransaction::same_fields(self, other)
    }
}

/// Outcome of merging one remote entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
    Unchanged,
    /// A newer local change or an in-flight delete won.
    Skipped,
}

/// Ordered collection of records.
#[derive(Clone, Debug)]
pub struct Entries<T> {
    records: Vec<Record<T>>,
    tombstones: HashMap<RowId, u64>,
    next_key: u64,
}

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            tombstones: HashMap::new(),
            next_key: 1,
        }
    }
}

impl<T: Entry> Entries<T> {
    /// Visible values in collection order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.records().map(|record| &record.value)
    }

    /// Visible records in collection order.
    pub fn records(&self) -> impl Iterator<Item = &Record<T>> + '_ {
        self.records.iter().filter(|record| record.is_visible())
    }

    /// Every record, including the ones being deleted.
    pub fn all_records(&self) -> &[Record<T>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: EntryKey) -> Option<&Record<T>> {
        self.records.iter().find(|record| record.key == key)
    }

    pub fn by_id(&self, id: RowId) -> Option<&Record<T>> {
        self.records
            .iter()
            .find(|record| record.value.id() == Some(id))
    }

    /// `true` when `id` was deleted after `since`.
    pub fn is_tombstoned(&self, id: RowId, since: u64) -> bool {
        self.tombstones.get(&id).is_some_and(|at| *at > since)
    }

    fn position(&self, key: EntryKey) -> Option<usize> {
        self.records.iter().position(|record| record.key == key)
    }

    fn position_by_id(&self, id: RowId) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.value.id() == Some(id))
    }

    fn allocate_key(&mut self) -> EntryKey {
        let key = EntryKey(self.next_key);
        self.next_key += 1;
        key
    }

    fn push(&mut self, value: T, sync: SyncMark, written_at: u64) -> EntryKey {
        let key = self.allocate_key();
        self.records.push(Record {
            key,
            sync,
            written_at,
            value,
        });
        key
    }

    fn replace(&mut self, values: Vec<T>, generation: u64) {
        self.records.clear();
        self.tombstones.clear();
        for value in values {
            self.push(value, SyncMark::Confirmed, generation);
        }
    }

    fn update(&mut self, value: T, generation: u64) -> ResultEngine<EntryKey> {
        let id = value
            .id()
            .ok_or_else(|| EngineError::MissingIdentifier("update needs an id".to_string()))?;
        let idx = self
            .position_by_id(id)
            .filter(|idx| self.records[*idx].is_visible())
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))?;
        let record = &mut self.records[idx];
        record.value.assign_fields(&value);
        record.sync = SyncMark::Pending;
        record.written_at = generation;
        Ok(record.key)
    }

    fn begin_delete(&mut self, id: RowId, generation: u64) -> ResultEngine<EntryKey> {
        let idx = self
            .position_by_id(id)
            .filter(|idx| self.records[*idx].is_visible())
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))?;
        let record = &mut self.records[idx];
        record.sync = SyncMark::Deleting;
        record.written_at = generation;
        Ok(record.key)
    }

    fn mark(&mut self, key: EntryKey, sync: SyncMark, generation: u64) -> bool {
        let Some(idx) = self.position(key) else {
            return false;
        };
        let record = &mut self.records[idx];
        record.sync = sync;
        record.written_at = generation;
        true
    }

    fn confirm(&mut self, key: EntryKey, id: RowId, generation: u64) -> bool {
        if self.position(key).is_none() {
            return false;
        }
        // A re-pull may already have landed the same row; keep the local
        // record and drop the remote copy.
        self.records
            .retain(|record| record.key == key || record.value.id() != Some(id));
        self.tombstones.remove(&id);
        let Some(idx) = self.position(key) else {
            return false;
        };
        let record = &mut self.records[idx];
        record.value.set_id(Some(id));
        if matches!(record.sync, SyncMark::Pending | SyncMark::Failed(_)) {
            record.sync = SyncMark::Confirmed;
        }
        record.written_at = generation;
        true
    }

    fn remove(&mut self, key: EntryKey) -> Option<Record<T>> {
        let idx = self.position(key)?;
        Some(self.records.remove(idx))
    }

    fn purge(&mut self, key: EntryKey, generation: u64) -> Option<Record<T>> {
        let record = self.remove(key)?;
        if let Some(id) = record.value.id() {
            self.tombstones.insert(id, generation);
        }
        Some(record)
    }

    fn merge_remote(
        &mut self,
        value: T,
        anchor: &mut Option<usize>,
        pulled_at: u64,
    ) -> Upsert {
        let Some(id) = value.id() else {
            return Upsert::Skipped;
        };

        if let Some(idx) = self.position_by_id(id) {
            *anchor = Some(idx);
            let record = &mut self.records[idx];
            if record.sync != SyncMark::Confirmed || record.written_at > pulled_at {
                return Upsert::Skipped;
            }
            if record.value.same_fields(&value) {
                return Upsert::Unchanged;
            }
            record.value.assign_fields(&value);
            return Upsert::Updated;
        }

        if self.is_tombstoned(id, pulled_at) {
            return Upsert::Skipped;
        }

        let at = anchor.map_or(0, |idx| idx + 1).min(self.records.len());
        let key = self.allocate_key();
        self.records.insert(
            at,
            Record {
                key,
                sync: SyncMark::Confirmed,
                written_at: pulled_at,
                value,
            },
        );
        *anchor = Some(at);
        Upsert::Inserted
    }

    fn expire_tombstones(&mut self, pulled_at: u64) {
        self.tombstones.retain(|_, at| *at > pulled_at);
    }
}

/// Plain collections as delivered by a full import.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerData {
    pub accounts: Vec<Account>,
    pub category_groups: Vec<CategoryGroup>,
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    pub budget_transactions: Vec<BudgetTransaction>,
}

/// The Ledger Store.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    accounts: Vec<Account>,
    category_groups: Vec<CategoryGroup>,
    categories: Vec<Category>,
    transactions: Entries<Transaction>,
    budget_transactions: Entries<BudgetTransaction>,
    generation: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: LedgerData) -> Self {
        let mut ledger = Self::new();
        ledger.replace_all(data);
        ledger
    }

    /// Monotonic counter bumped on every local change and confirmation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.name == name)
    }

    pub fn category_groups(&self) -> &[CategoryGroup] {
        &self.category_groups
    }

    /// User categories only.
    pub fn user_categories(&self) -> &[Category] {
        &self.categories
    }

    /// User categories followed by the fixed pseudo-categories.
    pub fn categories(&self) -> impl Iterator<Item = &Category> + '_ {
        self.categories.iter().chain(fixed_categories().iter())
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories().find(|category| category.name == name)
    }

    pub fn is_known_category(&self, name: &str) -> bool {
        self.category(name).is_some()
    }

    pub fn is_known_account(&self, name: &str) -> bool {
        self.account(name).is_some()
    }

    pub fn transactions(&self) -> &Entries<Transaction> {
        &self.transactions
    }

    pub fn budget_transactions(&self) -> &Entries<BudgetTransaction> {
        &self.budget_transactions
    }

    /// Replaces every collection wholesale.
    pub fn replace_all(&mut self, data: LedgerData) {
        let generation = self.bump();
        self.accounts = data.accounts;
        self.category_groups = data.category_groups;
        self.categories = data.categories;
        self.transactions.replace(data.transactions, generation);
        self.budget_transactions
            .replace(data.budget_transactions, generation);
    }

    fn check_transaction_refs(&self, tx: &Transaction) -> ResultEngine<()> {
        if !self.is_known_category(&tx.category) {
            return Err(EngineError::KeyNotFound(format!("category {}", tx.category)));
        }
        if !self.is_known_account(&tx.account) {
            return Err(EngineError::KeyNotFound(format!("account {}", tx.account)));
        }
        Ok(())
    }

    fn check_budget_refs(&self, tx: &BudgetTransaction) -> ResultEngine<()> {
        if tx.amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "budget transfer amount must be >= 0".to_string(),
            ));
        }
        for name in [&tx.from_category, &tx.to_category] {
            if !self.is_known_category(name) {
                return Err(EngineError::KeyNotFound(format!("category {name}")));
            }
        }
        Ok(())
    }

    /// Optimistically appends a new transaction. The id is cleared; it is
    /// assigned by [`Ledger::assign_transaction_id`] once the remote store
    /// allocated it.
    pub fn append_transaction(&mut self, mut tx: Transaction) -> ResultEngine<EntryKey> {
        self.check_transaction_refs(&tx)?;
        tx.id = None;
        let generation = self.bump();
        Ok(self.transactions.push(tx, SyncMark::Pending, generation))
    }

    /// Optimistically rewrites the transaction carrying `tx.id`.
    pub fn update_transaction(&mut self, tx: Transaction) -> ResultEngine<EntryKey> {
        self.check_transaction_refs(&tx)?;
        let generation = self.bump();
        self.transactions.update(tx, generation)
    }

    /// Hides the transaction until [`Ledger::purge_transaction`] (remote
    /// delete succeeded) or [`Ledger::mark_transaction`] (delete undone).
    pub fn begin_delete_transaction(&mut self, id: RowId) -> ResultEngine<EntryKey> {
        let generation = self.bump();
        self.transactions.begin_delete(id, generation)
    }

    pub fn append_budget_transaction(
        &mut self,
        mut tx: BudgetTransaction,
    ) -> ResultEngine<EntryKey> {
        self.check_budget_refs(&tx)?;
        tx.id = None;
        let generation = self.bump();
        Ok(self.budget_transactions.push(tx, SyncMark::Pending, generation))
    }

    pub fn update_budget_transaction(&mut self, tx: BudgetTransaction) -> ResultEngine<EntryKey> {
        self.check_budget_refs(&tx)?;
        let generation = self.bump();
        self.budget_transactions.update(tx, generation)
    }

    pub fn begin_delete_budget_transaction(&mut self, id: RowId) -> ResultEngine<EntryKey> {
        let generation = self.bump();
        self.budget_transactions.begin_delete(id, generation)
    }

    /// Back-fills the remote id onto an optimistic transaction. Any other
    /// record already carrying `id` is dropped.
    pub fn assign_transaction_id(&mut self, key: EntryKey, id: RowId) -> bool {
        let generation = self.bump();
        self.transactions.confirm(key, id, generation)
    }

    pub fn assign_budget_transaction_id(&mut self, key: EntryKey, id: RowId) -> bool {
        let generation = self.bump();
        self.budget_transactions.confirm(key, id, generation)
    }

    pub fn mark_transaction(&mut self, key: EntryKey, sync: SyncMark) -> bool {
        let generation = self.bump();
        self.transactions.mark(key, sync, generation)
    }

    pub fn mark_budget_transaction(&mut self, key: EntryKey, sync: SyncMark) -> bool {
        let generation = self.bump();
        self.budget_transactions.mark(key, sync, generation)
    }

    /// Drops a record without remembering it (rollback of an optimistic add).
    pub fn discard_transaction(&mut self, key: EntryKey) -> Option<Transaction> {
        self.bump();
        self.transactions.remove(key).map(|record| record.value)
    }

    pub fn discard_budget_transaction(&mut self, key: EntryKey) -> Option<BudgetTransaction> {
        self.bump();
        self.budget_transactions
            .remove(key)
            .map(|record| record.value)
    }

    /// Finishes a delete: the record goes away and its id is tombstoned so
    /// that a re-pull started earlier cannot bring it back.
    pub fn purge_transaction(&mut self, key: EntryKey) -> Option<Transaction> {
        let generation = self.bump();
        self.transactions
            .purge(key, generation)
            .map(|record| record.value)
    }

    pub fn purge_budget_transaction(&mut self, key: EntryKey) -> Option<BudgetTransaction> {
        let generation = self.bump();
        self.budget_transactions
            .purge(key, generation)
            .map(|record| record.value)
    }

    /// Merges one remote transaction pulled at generation `pulled_at`.
    ///
    /// `anchor` tracks the local position of the previous remote entity so
    /// new rows are inserted following remote order.
    pub fn merge_transaction(
        &mut self,
        tx: Transaction,
        anchor: &mut Option<usize>,
        pulled_at: u64,
    ) -> Upsert {
        self.transactions.merge_remote(tx, anchor, pulled_at)
    }

    pub fn merge_budget_transaction(
        &mut self,
        tx: BudgetTransaction,
        anchor: &mut Option<usize>,
        pulled_at: u64,
    ) -> Upsert {
        self.budget_transactions.merge_remote(tx, anchor, pulled_at)
    }

    pub fn merge_account(&mut self, account: Account, anchor: &mut Option<usize>) -> Upsert {
        upsert_in_order(&mut self.accounts, account, anchor, |a| a.id.as_str())
    }

    pub fn merge_category_group(
        &mut self,
        group: CategoryGroup,
        anchor: &mut Option<usize>,
    ) -> Upsert {
        upsert_in_order(&mut self.category_groups, group, anchor, |g| g.id.as_str())
    }

    pub fn merge_category(&mut self, category: Category, anchor: &mut Option<usize>) -> Upsert {
        upsert_in_order(&mut self.categories, category, anchor, |c| c.id.as_str())
    }

    /// Forgets deletions that a pull started at `pulled_at` already observed.
    pub fn expire_tombstones(&mut self, pulled_at: u64) {
        self.transactions.expire_tombstones(pulled_at);
        self.budget_transactions.expire_tombstones(pulled_at);
    }

    /// Entries referencing unknown categories or accounts. Each one is also
    /// emitted on the log channel.
    pub fn dangling_references(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for record in self.transactions.records() {
            let tx = record.value();
            if !self.is_known_category(&tx.category) {
                out.push(Diagnostic::UnknownCategory {
                    entry: EntryRef::Transaction(record.key()),
                    name: tx.category.clone(),
                });
            }
            if !self.is_known_account(&tx.account) {
                out.push(Diagnostic::UnknownAccount {
                    entry: EntryRef::Transaction(record.key()),
                    name: tx.account.clone(),
                });
            }
        }
        for record in self.budget_transactions.records() {
            let tx = record.value();
            for name in [&tx.from_category, &tx.to_category] {
                if !self.is_known_category(name) {
                    out.push(Diagnostic::UnknownCategory {
                        entry: EntryRef::BudgetTransaction(record.key()),
                        name: name.clone(),
                    });
                }
            }
        }
        out.iter().for_each(diagnostics::report);
        out
    }
}

fn upsert_in_order<T: Clone + PartialEq>(
    items: &mut Vec<T>,
    item: T,
    anchor: &mut Option<usize>,
    id: impl Fn(&T) -> &str,
) -> Upsert {
    if let Some(idx) = items.iter().position(|existing| id(existing) == id(&item)) {
        *anchor = Some(idx);
        if items[idx] == item {
            return Upsert::Unchanged;
        }
        items[idx] = item;
        return Upsert::Updated;
    }
    let at = anchor.map_or(0, |idx| idx + 1).min(items.len());
    items.insert(at, item);
    *anchor = Some(at);
    Upsert::Inserted
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{Money, categories::ACCOUNT_TRANSFER};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn ledger() -> Ledger {
        Ledger::from_data(LedgerData {
            accounts: vec![Account::new("Checking")],
            category_groups: vec![CategoryGroup::new("Everyday")],
            categories: vec![Category::new("Groceries", "Everyday")],
            ..Default::default()
        })
    }

    #[test]
    fn append_checks_references() {
        let mut ledger = ledger();
        let bad_category = Transaction::new(date(), Money::new(-10), "Nope", "Checking");
        assert!(matches!(
            ledger.append_transaction(bad_category),
            Err(EngineError::KeyNotFound(_))
        ));
        let bad_account = Transaction::new(date(), Money::new(-10), "Groceries", "Nope");
        assert!(ledger.append_transaction(bad_account).is_err());

        let fixed = Transaction::new(date(), Money::new(-10), ACCOUNT_TRANSFER, "Checking");
        let key = ledger.append_transaction(fixed).unwrap();
        assert_eq!(ledger.transactions().get(key).unwrap().sync(), &SyncMark::Pending);
    }

    #[test]
    fn update_without_id_fails_fast() {
        let mut ledger = ledger();
        let tx = Transaction::new(date(), Money::new(-10), "Groceries", "Checking");
        assert!(matches!(
            ledger.update_transaction(tx),
            Err(EngineError::MissingIdentifier(_))
        ));
    }

    #[test]
    fn confirm_drops_duplicate_row() {
        let mut ledger = ledger();
        let tx = Transaction::new(date(), Money::new(-10), "Groceries", "Checking");
        let key = ledger.append_transaction(tx.clone()).unwrap();

        let mut remote = tx;
        remote.id = Some(RowId::transaction(12));
        let mut anchor = None;
        let pulled_at = ledger.generation();
        assert_eq!(
            ledger.merge_transaction(remote, &mut anchor, pulled_at),
            Upsert::Inserted
        );
        assert_eq!(ledger.transactions().len(), 2);

        assert!(ledger.assign_transaction_id(key, RowId::transaction(12)));
        assert_eq!(ledger.transactions().len(), 1);
        let record = ledger.transactions().get(key).unwrap();
        assert_eq!(record.value().id, Some(RowId::transaction(12)));
        assert_eq!(record.sync(), &SyncMark::Confirmed);
    }

    #[test]
    fn deleting_records_are_hidden() {
        let mut tx = Transaction::new(date(), Money::new(-10), "Groceries", "Checking");
        tx.id = Some(RowId::transaction(9));
        let mut ledger = Ledger::from_data(LedgerData {
            accounts: vec![Account::new("Checking")],
            categories: vec![Category::new("Groceries", "Everyday")],
            transactions: vec![tx],
            ..Default::default()
        });
        let key = ledger
            .begin_delete_transaction(RowId::transaction(9))
            .unwrap();
        assert!(ledger.transactions().is_empty());
        assert_eq!(ledger.transactions().all_records().len(), 1);

        ledger.purge_transaction(key);
        assert!(ledger.transactions().all_records().is_empty());
        assert!(ledger.transactions().is_tombstoned(RowId::transaction(9), 0));
    }

    #[test]
    fn dangling_references_are_reported() {
        let mut tx = Transaction::new(date(), Money::new(-10), "Gone", "Closed");
        tx.id = Some(RowId::transaction(9));
        let ledger = Ledger::from_data(LedgerData {
            transactions: vec![tx],
            ..Default::default()
        });
        let diagnostics = ledger.dangling_references();
        assert_eq!(diagnostics.len(), 2);
    }
}
