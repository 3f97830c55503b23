use reqwest::StatusCode;
use thiserror::Error;

use engine::RowId;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error(transparent)]
    Row(#[from] RowError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{0} does not address this kind of row")]
    WrongIdentifier(RowId),
}

impl SheetsError {
    /// The credential is missing, invalid or expired.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Worth retrying: network failures, 408, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(err) => !err.is_decode() && !err.is_builder(),
            Self::Api { status, .. } => {
                *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || status.is_server_error()
            }
            _ => false,
        }
    }

    pub(crate) fn from_status(status: StatusCode, message: String) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            Self::Unauthorized(message)
        } else {
            Self::Api { status, message }
        }
    }
}

/// A sheet row that does not have the expected shape.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("row {row}: unknown category marker \"{marker}\"")]
    UnknownMarker { row: u32, marker: String },
    #[error("row {row}: category \"{name}\" appears before any group")]
    CategoryBeforeGroup { row: u32, name: String },
    #[error("row {row}: \"{value}\" is not an amount")]
    InvalidAmount { row: u32, value: String },
    #[error("row {row}: \"{value}\" is not a date serial number")]
    InvalidDate { row: u32, value: String },
    #[error("\"{0}\" is not a cell range")]
    InvalidRange(String),
}
