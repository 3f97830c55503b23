use tokio::sync::oneshot;

use engine::EntryKey;

use crate::SyncError;

/// Handle to the background remote commit of an optimistic write.
///
/// The local change is already visible when the handle is returned. Dropping
/// the handle does not cancel the commit.
#[derive(Debug)]
pub struct Commit<T> {
    key: EntryKey,
    rx: oneshot::Receiver<Result<T, SyncError>>,
}

impl<T> Commit<T> {
    pub(crate) fn new(key: EntryKey, rx: oneshot::Receiver<Result<T, SyncError>>) -> Self {
        Self { key, rx }
    }

    /// Local key of the written record.
    pub fn key(&self) -> EntryKey {
        self.key
    }

    /// Waits for the remote store's answer.
    pub async fn confirmed(self) -> Result<T, SyncError> {
        self.rx.await.unwrap_or(Err(SyncError::Cancelled))
    }
}
