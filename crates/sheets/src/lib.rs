//! Adapter between the in-memory ledger and the budget spreadsheet.

mod client;
mod error;
pub mod layout;
mod remote;
pub mod rows;
pub mod serial;

pub use client::{DEFAULT_BASE_URL, SheetsClient, SheetsClientBuilder};
pub use error::{RowError, SheetsError};
pub use remote::{Connector, Credentials, RemoteLedger, SheetsConnector, SheetsLedger};
