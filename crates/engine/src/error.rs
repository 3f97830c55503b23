//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when an account, category or entry is not found.
//! - [`InvalidAmount`] thrown when an amount cannot be parsed or violates a
//!   sign constraint.
//! - [`MissingIdentifier`] thrown when an operation needs a remote identifier
//!   on an entry that was never confirmed.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`MissingIdentifier`]: EngineError::MissingIdentifier
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid identifier: {0}")]
    InvalidId(String),
    #[error("Missing identifier: {0}")]
    MissingIdentifier(String),
}
