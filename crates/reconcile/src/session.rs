//! The synchronization session: owns the ledger's write path and the remote
//! store handle.
//!
//! Every write is applied to the ledger first and committed remotely in a
//! background task. The caller gets a [`Commit`] to await the outcome.
//! Import, re-pull and commits capture the epoch they started in; switching
//! target, changing credentials or logging out starts a new epoch and any
//! result from an older one is dropped as [`SyncError::Stale`].

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard},
    time::Duration,
};

use chrono::NaiveDate;
use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use engine::{BudgetTransaction, EntryKey, Ledger, Money, Record, RowId, SyncMark, Transaction};
use sheets::{Connector, Credentials, RemoteLedger, SheetsError};

use crate::{
    Commit, MergeStats, RetryPolicy, SessionState, SyncError, merge, tracked::Tracked,
};

#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Period of the background re-pull once imported.
    pub repull_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            repull_interval: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Default)]
struct Target {
    epoch: u64,
    credentials: Option<Credentials>,
    remote: Option<Arc<dyn RemoteLedger>>,
    importing: bool,
    repull: Option<JoinHandle<()>>,
}

struct Inner {
    connector: Arc<dyn Connector>,
    options: SessionOptions,
    ledger: RwLock<Ledger>,
    target: Mutex<Target>,
    state: watch::Sender<SessionState>,
}

/// What to do with the local record when a commit fails for good.
#[derive(Clone, Copy, Debug)]
enum Undo {
    /// Optimistic add: drop the record.
    Discard,
    /// Optimistic update: keep it, marked failed.
    Fail,
    /// Optimistic delete: bring the record back.
    Restore,
}

/// Cloneable handle; clones share the same ledger and remote.
#[derive(Clone)]
pub struct SyncSession {
    inner: Arc<Inner>,
}

impl fmt::Debug for SyncSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSession")
            .field("state", &self.state())
            .field("epoch", &self.epoch())
            .finish_non_exhaustive()
    }
}

impl SyncSession {
    pub fn new(connector: Arc<dyn Connector>, options: SessionOptions) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            inner: Arc::new(Inner {
                connector,
                options,
                ledger: RwLock::new(Ledger::new()),
                target: Mutex::new(Target::default()),
                state,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Last-known-consistent ledger. The guard must not be held across an
    /// `.await`.
    pub fn ledger(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner
            .ledger
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> R {
        let mut ledger = self
            .inner
            .ledger
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut ledger)
    }

    fn target(&self) -> MutexGuard<'_, Target> {
        self.inner
            .target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn epoch(&self) -> u64 {
        self.target().epoch
    }

    fn set_state(&self, state: SessionState) {
        let previous = self.inner.state.send_replace(state);
        if previous != state {
            tracing::info!("session {previous} -> {state}");
        }
    }

    fn ensure_epoch(&self, epoch: u64) -> Result<(), SyncError> {
        if self.epoch() == epoch {
            Ok(())
        } else {
            tracing::debug!("dropping result of epoch {epoch}");
            Err(SyncError::Stale)
        }
    }

    fn remote_for(&self, epoch: u64) -> Result<Arc<dyn RemoteLedger>, SyncError> {
        let target = self.target();
        if target.epoch != epoch {
            return Err(SyncError::Stale);
        }
        target.remote.clone().ok_or(SyncError::NotConnected)
    }

    /// Starts a new epoch: stops the re-pull loop and forgets the remote.
    fn reset(&self, credentials: Option<Credentials>) -> u64 {
        let mut target = self.target();
        target.epoch += 1;
        target.credentials = credentials;
        target.remote = None;
        target.importing = false;
        if let Some(handle) = target.repull.take() {
            handle.abort();
        }
        target.epoch
    }

    /// Logs out on an auth failure, otherwise falls back to `state`.
    fn remote_failed(&self, err: SheetsError, state: SessionState) -> SyncError {
        if err.is_auth() {
            tracing::warn!("credential rejected: {err}");
            self.logout();
        } else {
            tracing::error!("remote call failed: {err}");
            self.set_state(state);
        }
        err.into()
    }

    /// Validates `credentials.spreadsheet_id` and imports it.
    ///
    /// Returns [`SessionState::Invalid`] when the target is reachable but is
    /// not a supported budget spreadsheet.
    pub async fn login(&self, credentials: Credentials) -> Result<SessionState, SyncError> {
        let epoch = self.reset(Some(credentials.clone()));
        self.set_state(SessionState::Validating);

        let remote = match self.inner.connector.connect(&credentials) {
            Ok(remote) => remote,
            Err(err) => {
                tracing::error!("cannot connect to {}: {err}", credentials.spreadsheet_id);
                self.set_state(SessionState::Invalid);
                return Err(err.into());
            }
        };
        {
            let mut target = self.target();
            if target.epoch != epoch {
                return Err(SyncError::Stale);
            }
            target.remote = Some(Arc::clone(&remote));
        }

        let verified = remote.verify().await;
        self.ensure_epoch(epoch)?;
        match verified {
            Ok(true) => self.set_state(SessionState::Valid),
            Ok(false) => {
                tracing::warn!(
                    "{} is not a supported budget spreadsheet",
                    credentials.spreadsheet_id
                );
                self.set_state(SessionState::Invalid);
                return Ok(SessionState::Invalid);
            }
            Err(err) => return Err(self.remote_failed(err, SessionState::Invalid)),
        }

        self.import(epoch).await?;
        Ok(self.state())
    }

    /// Re-targets the session, keeping the current token.
    pub async fn switch_target(&self, spreadsheet_id: &str) -> Result<SessionState, SyncError> {
        let token = self
            .target()
            .credentials
            .as_ref()
            .map(|credentials| credentials.token.clone())
            .ok_or(SyncError::NotConnected)?;
        self.login(Credentials {
            token,
            spreadsheet_id: spreadsheet_id.to_string(),
        })
        .await
    }

    /// Drops the credential and stops background work. The ledger keeps its
    /// last-known state.
    pub fn logout(&self) {
        self.reset(None);
        self.set_state(SessionState::Unauthenticated);
    }

    async fn import(&self, epoch: u64) -> Result<(), SyncError> {
        let remote = {
            let mut target = self.target();
            if target.epoch != epoch {
                return Err(SyncError::Stale);
            }
            if target.importing {
                tracing::debug!("import already in flight");
                return Ok(());
            }
            let remote = target.remote.clone().ok_or(SyncError::NotConnected)?;
            target.importing = true;
            remote
        };
        self.set_state(SessionState::Importing);

        let result = remote.import().await;
        {
            let mut target = self.target();
            if target.epoch == epoch {
                target.importing = false;
            }
        }
        self.ensure_epoch(epoch)?;
        let data = result.map_err(|err| self.remote_failed(err, SessionState::Valid))?;

        let dangling = self.write(|ledger| {
            ledger.replace_all(data);
            ledger.dangling_references().len()
        });
        if dangling > 0 {
            tracing::warn!("{dangling} references to unknown categories or accounts");
        }
        self.set_state(SessionState::Idle);
        self.start_repull(epoch);
        Ok(())
    }

    fn start_repull(&self, epoch: u64) {
        let period = self.inner.options.repull_interval.max(Duration::from_millis(10));
        let weak = Arc::downgrade(&self.inner);
        let mut states = self.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(inner) = weak.upgrade() else {
                            break;
                        };
                        let session = SyncSession { inner };
                        match session.repull(epoch).await {
                            Ok(_) => {}
                            Err(SyncError::Stale | SyncError::NotConnected) => break,
                            Err(err) if err.is_auth() => break,
                            Err(err) => tracing::warn!("re-pull failed: {err}"),
                        }
                    }
                    changed = states.changed() => {
                        if changed.is_err() || *states.borrow() == SessionState::Unauthenticated {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("re-pull loop of epoch {epoch} stopped");
        });

        let mut target = self.target();
        if target.epoch == epoch {
            if let Some(previous) = target.repull.replace(handle) {
                previous.abort();
            }
        } else {
            handle.abort();
        }
    }

    async fn repull(&self, epoch: u64) -> Result<MergeStats, SyncError> {
        let remote = self.remote_for(epoch)?;
        let pulled_at = self.ledger().generation();
        let result = remote.import().await;
        self.ensure_epoch(epoch)?;
        let data = result.map_err(|err| self.remote_failed(err, SessionState::Idle))?;

        let stats = self.write(|ledger| merge::merge_remote(ledger, data, pulled_at));
        if stats.changed() {
            tracing::info!("re-pull: {stats}");
        } else {
            tracing::debug!("re-pull: {stats}");
        }
        Ok(stats)
    }

    /// Runs one re-pull now, or retries the import if it never completed.
    pub async fn refresh(&self) -> Result<MergeStats, SyncError> {
        let epoch = self.epoch();
        match self.state() {
            SessionState::Idle => self.repull(epoch).await,
            SessionState::Valid => {
                self.import(epoch).await?;
                Ok(MergeStats::default())
            }
            SessionState::Importing => Ok(MergeStats::default()),
            _ => Err(SyncError::NotConnected),
        }
    }

    fn connected(&self) -> Result<(u64, Arc<dyn RemoteLedger>), SyncError> {
        if self.state() != SessionState::Idle {
            return Err(SyncError::NotConnected);
        }
        let target = self.target();
        let remote = target.remote.clone().ok_or(SyncError::NotConnected)?;
        Ok((target.epoch, remote))
    }

    pub fn add_transaction(&self, tx: Transaction) -> Result<Commit<RowId>, SyncError> {
        self.add(tx)
    }

    pub fn update_transaction(&self, tx: Transaction) -> Result<Commit<()>, SyncError> {
        self.update(tx)
    }

    pub fn delete_transaction(&self, id: RowId) -> Result<Commit<()>, SyncError> {
        self.delete::<Transaction>(id)
    }

    pub fn add_budget_transaction(
        &self,
        tx: BudgetTransaction,
    ) -> Result<Commit<RowId>, SyncError> {
        self.add(tx)
    }

    pub fn update_budget_transaction(
        &self,
        tx: BudgetTransaction,
    ) -> Result<Commit<()>, SyncError> {
        self.update(tx)
    }

    pub fn delete_budget_transaction(&self, id: RowId) -> Result<Commit<()>, SyncError> {
        self.delete::<BudgetTransaction>(id)
    }

    /// Adds both legs of a transfer between two accounts.
    pub fn add_account_transfer(
        &self,
        from: &str,
        to: &str,
        amount: Money,
        date: NaiveDate,
        memo: &str,
    ) -> Result<[Commit<RowId>; 2], SyncError> {
        let [outflow, inflow] =
            engine::transfer_between_accounts(&self.ledger(), from, to, amount, date, memo)?;
        let outflow = self.add(outflow)?;
        let inflow = self.add(inflow)?;
        Ok([outflow, inflow])
    }

    fn add<T: Tracked>(&self, value: T) -> Result<Commit<RowId>, SyncError> {
        let (epoch, remote) = self.connected()?;
        let key = self.write(|ledger| T::append(ledger, value.clone()))?;
        tracing::debug!("{} #{} added locally", T::NAME, key.get());

        let (tx, rx) = oneshot::channel();
        let session = self.clone();
        tokio::spawn(async move {
            let result = session.commit_add(epoch, remote, key, value).await;
            let _ = tx.send(result);
        });
        Ok(Commit::new(key, rx))
    }

    fn update<T: Tracked>(&self, value: T) -> Result<Commit<()>, SyncError> {
        let id = value.id().ok_or_else(|| {
            SyncError::MissingIdentifier(format!("cannot update an unconfirmed {}", T::NAME))
        })?;
        let (epoch, remote) = self.connected()?;
        let (key, written) = self.write(|ledger| {
            if !T::find(ledger, id).is_some_and(Record::is_visible) {
                return Err(SyncError::UnknownEntry(id));
            }
            let key = T::update(ledger, value.clone())?;
            Ok::<_, SyncError>((key, ledger.generation()))
        })?;
        tracing::debug!("{id} updated locally");

        let (tx, rx) = oneshot::channel();
        let session = self.clone();
        tokio::spawn(async move {
            let result = session
                .commit_update(epoch, remote, key, written, id, value)
                .await;
            let _ = tx.send(result);
        });
        Ok(Commit::new(key, rx))
    }

    fn delete<T: Tracked>(&self, id: RowId) -> Result<Commit<()>, SyncError> {
        let (epoch, remote) = self.connected()?;
        let (key, written) = self.write(|ledger| {
            if !T::find(ledger, id).is_some_and(Record::is_visible) {
                return Err(SyncError::UnknownEntry(id));
            }
            let key = T::begin_delete(ledger, id)?;
            Ok::<_, SyncError>((key, ledger.generation()))
        })?;
        tracing::debug!("{id} hidden pending delete");

        let (tx, rx) = oneshot::channel();
        let session = self.clone();
        tokio::spawn(async move {
            let result = session
                .commit_delete::<T>(epoch, remote, key, written, id)
                .await;
            let _ = tx.send(result);
        });
        Ok(Commit::new(key, rx))
    }

    async fn commit_add<T: Tracked>(
        &self,
        epoch: u64,
        remote: Arc<dyn RemoteLedger>,
        key: EntryKey,
        value: T,
    ) -> Result<RowId, SyncError> {
        let result = self
            .inner
            .options
            .retry
            .run(|| T::add(remote.as_ref(), &value))
            .await;
        self.ensure_epoch(epoch)?;
        match result {
            Ok(id) => {
                self.write(|ledger| T::assign_id(ledger, key, id));
                tracing::info!("{} #{} committed as {id}", T::NAME, key.get());
                Ok(id)
            }
            Err(err) => Err(self.commit_failed::<T>(key, None, err, Undo::Discard)),
        }
    }

    async fn commit_update<T: Tracked>(
        &self,
        epoch: u64,
        remote: Arc<dyn RemoteLedger>,
        key: EntryKey,
        written: u64,
        id: RowId,
        value: T,
    ) -> Result<(), SyncError> {
        let result = self
            .inner
            .options
            .retry
            .run(|| T::save(remote.as_ref(), id, &value))
            .await;
        self.ensure_epoch(epoch)?;
        match result {
            Ok(()) => {
                self.write(|ledger| {
                    if T::record(ledger, key).map(Record::written_at) == Some(written) {
                        T::mark(ledger, key, SyncMark::Confirmed);
                    }
                });
                tracing::info!("{id} update committed");
                Ok(())
            }
            Err(err) => Err(self.commit_failed::<T>(key, Some(written), err, Undo::Fail)),
        }
    }

    async fn commit_delete<T: Tracked>(
        &self,
        epoch: u64,
        remote: Arc<dyn RemoteLedger>,
        key: EntryKey,
        written: u64,
        id: RowId,
    ) -> Result<(), SyncError> {
        let result = self
            .inner
            .options
            .retry
            .run(|| T::delete(remote.as_ref(), id))
            .await;
        self.ensure_epoch(epoch)?;
        match result {
            Ok(()) => {
                self.write(|ledger| T::purge(ledger, key));
                tracing::info!("{id} delete committed");
                Ok(())
            }
            Err(err) => Err(self.commit_failed::<T>(key, Some(written), err, Undo::Restore)),
        }
    }

    /// Applies the failure policy to the record behind `key`. `written` is the
    /// generation of the local change being committed; a newer local change
    /// leaves the record alone.
    fn commit_failed<T: Tracked>(
        &self,
        key: EntryKey,
        written: Option<u64>,
        err: SheetsError,
        undo: Undo,
    ) -> SyncError {
        if err.is_auth() {
            tracing::warn!("{} #{} left pending: {err}", T::NAME, key.get());
            self.logout();
            return err.into();
        }

        let transient = err.is_transient();
        self.write(|ledger| {
            let current = T::record(ledger, key).map(Record::written_at);
            if written.is_some_and(|at| current != Some(at)) {
                return;
            }
            match undo {
                _ if transient => {
                    T::mark(ledger, key, SyncMark::Failed(err.to_string()));
                }
                Undo::Discard => {
                    T::discard(ledger, key);
                }
                Undo::Fail => {
                    T::mark(ledger, key, SyncMark::Failed(err.to_string()));
                }
                Undo::Restore => {
                    T::mark(ledger, key, SyncMark::Confirmed);
                }
            }
        });
        if transient {
            tracing::error!("{} #{} gave up after retries: {err}", T::NAME, key.get());
        } else {
            tracing::error!("{} #{} rejected ({undo:?}): {err}", T::NAME, key.get());
        }
        err.into()
    }
}
