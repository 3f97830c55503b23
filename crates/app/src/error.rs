use thiserror::Error;

use reconcile::{SessionState, SyncError};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("unknown timezone: {0}")]
    Timezone(String),
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),
    #[error("engine error: {0}")]
    Engine(#[from] engine::EngineError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("spreadsheet not usable (session is {0})")]
    NotReady(SessionState),
}
