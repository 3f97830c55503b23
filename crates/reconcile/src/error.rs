//! Errors surfaced by a [`SyncSession`](crate::SyncSession).
//!
//! Local validation problems come through as [`SyncError::Engine`], remote
//! failures as [`SyncError::Remote`]. The rest describe the session itself.
use thiserror::Error;

use engine::{EngineError, RowId};
use sheets::SheetsError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no remote store connected")]
    NotConnected,
    #[error("missing identifier: {0}")]
    MissingIdentifier(String),
    #[error("\"{0}\" not found")]
    UnknownEntry(RowId),
    #[error("remote target changed while the operation was in flight")]
    Stale,
    #[error("commit dropped before completion")]
    Cancelled,
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Remote(#[from] SheetsError),
}

impl SyncError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Remote(err) if err.is_auth())
    }
}
