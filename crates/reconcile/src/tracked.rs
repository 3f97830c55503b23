//! The two kinds of entries a session can write, behind one interface.

use async_trait::async_trait;

use engine::{BudgetTransaction, Entry, EntryKey, Ledger, Record, RowId, SyncMark, Transaction};
use sheets::{RemoteLedger, SheetsError};

type ResultEngine<T> = Result<T, engine::EngineError>;

#[async_trait]
pub(crate) trait Tracked: Entry + Send + Sync + 'static {
    const NAME: &'static str;

    fn append(ledger: &mut Ledger, value: Self) -> ResultEngine<EntryKey>;
    fn update(ledger: &mut Ledger, value: Self) -> ResultEngine<EntryKey>;
    fn begin_delete(ledger: &mut Ledger, id: RowId) -> ResultEngine<EntryKey>;
    fn assign_id(ledger: &mut Ledger, key: EntryKey, id: RowId) -> bool;
    fn mark(ledger: &mut Ledger, key: EntryKey, sync: SyncMark) -> bool;
    fn discard(ledger: &mut Ledger, key: EntryKey) -> bool;
    fn purge(ledger: &mut Ledger, key: EntryKey) -> bool;
    fn record(ledger: &Ledger, key: EntryKey) -> Option<&Record<Self>>;
    fn find(ledger: &Ledger, id: RowId) -> Option<&Record<Self>>;

    async fn add(remote: &dyn RemoteLedger, value: &Self) -> Result<RowId, SheetsError>;
    async fn save(remote: &dyn RemoteLedger, id: RowId, value: &Self) -> Result<(), SheetsError>;
    async fn delete(remote: &dyn RemoteLedger, id: RowId) -> Result<(), SheetsError>;
}

#[async_trait]
impl Tracked for Transaction {
    const NAME: &'static str = "transaction";

    fn append(ledger: &mut Ledger, value: Self) -> ResultEngine<EntryKey> {
        ledger.append_transaction(value)
    }

    fn update(ledger: &mut Ledger, value: Self) -> ResultEngine<EntryKey> {
        ledger.update_transaction(value)
    }

    fn begin_delete(ledger: &mut Ledger, id: RowId) -> ResultEngine<EntryKey> {
        ledger.begin_delete_transaction(id)
    }

    fn assign_id(ledger: &mut Ledger, key: EntryKey, id: RowId) -> bool {
        ledger.assign_transaction_id(key, id)
    }

    fn mark(ledger: &mut Ledger, key: EntryKey, sync: SyncMark) -> bool {
        ledger.mark_transaction(key, sync)
    }

    fn discard(ledger: &mut Ledger, key: EntryKey) -> bool {
        ledger.discard_transaction(key).is_some()
    }

    fn purge(ledger: &mut Ledger, key: EntryKey) -> bool {
        ledger.purge_transaction(key).is_some()
    }

    fn record(ledger: &Ledger, key: EntryKey) -> Option<&Record<Self>> {
        ledger.transactions().get(key)
    }

    fn find(ledger: &Ledger, id: RowId) -> Option<&Record<Self>> {
        ledger.transactions().by_id(id)
    }

    async fn add(remote: &dyn RemoteLedger, value: &Self) -> Result<RowId, SheetsError> {
        remote.add_transaction(value).await
    }

    async fn save(remote: &dyn RemoteLedger, id: RowId, value: &Self) -> Result<(), SheetsError> {
        remote.update_transaction(id, value).await
    }

    async fn delete(remote: &dyn RemoteLedger, id: RowId) -> Result<(), SheetsError> {
        remote.delete_transaction(id).await
    }
}

#[async_trait]
impl Tracked for BudgetTransaction {
    const NAME: &'static str = "budget transaction";

    fn append(ledger: &mut Ledger, value: Self) -> ResultEngine<EntryKey> {
        ledger.append_budget_transaction(value)
    }

    fn update(ledger: &mut Ledger, value: Self) -> ResultEngine<EntryKey> {
        ledger.update_budget_transaction(value)
    }

    fn begin_delete(ledger: &mut Ledger, id: RowId) -> ResultEngine<EntryKey> {
        ledger.begin_delete_budget_transaction(id)
    }

    fn assign_id(ledger: &mut Ledger, key: EntryKey, id: RowId) -> bool {
        ledger.assign_budget_transaction_id(key, id)
    }

    fn mark(ledger: &mut Ledger, key: EntryKey, sync: SyncMark) -> bool {
        ledger.mark_budget_transaction(key, sync)
    }

    fn discard(ledger: &mut Ledger, key: EntryKey) -> bool {
        ledger.discard_budget_transaction(key).is_some()
    }

    fn purge(ledger: &mut Ledger, key: EntryKey) -> bool {
        ledger.purge_budget_transaction(key).is_some()
    }

    fn record(ledger: &Ledger, key: EntryKey) -> Option<&Record<Self>> {
        ledger.budget_transactions().get(key)
    }

    fn find(ledger: &Ledger, id: RowId) -> Option<&Record<Self>> {
        ledger.budget_transactions().by_id(id)
    }

    async fn add(remote: &dyn RemoteLedger, value: &Self) -> Result<RowId, SheetsError> {
        remote.add_budget_transaction(value).await
    }

    async fn save(remote: &dyn RemoteLedger, id: RowId, value: &Self) -> Result<(), SheetsError> {
        remote.update_budget_transaction(id, value).await
    }

    async fn delete(remote: &dyn RemoteLedger, id: RowId) -> Result<(), SheetsError> {
        remote.delete_budget_transaction(id).await
    }
}
