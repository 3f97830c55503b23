//! Keeps the in-memory ledger synchronized with the remote spreadsheet.

pub use commit::Commit;
pub use error::SyncError;
pub use merge::{MergeStats, merge_remote};
pub use retry::RetryPolicy;
pub use session::{SessionOptions, SyncSession};
pub use state::SessionState;

mod commit;
mod error;
mod merge;
mod retry;
mod session;
mod state;
mod tracked;
