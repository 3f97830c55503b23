use std::sync::Arc;

use reconcile::{SessionState, SyncSession};
use sheets::{Credentials, SheetsConnector};

use crate::error::AppError;

mod commands;
mod error;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (settings, command) = settings::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter())
        .with_writer(std::io::stderr)
        .init();

    let timezone = settings.timezone()?;
    let connector = Arc::new(SheetsConnector::new(&settings.base_url));
    let session = SyncSession::new(connector, settings.session_options());

    tracing::info!("opening spreadsheet {}", settings.spreadsheet_id);
    let state = session
        .login(Credentials {
            token: settings.token.clone(),
            spreadsheet_id: settings.spreadsheet_id.clone(),
        })
        .await
        .map_err(AppError::from)?;
    if state != SessionState::Idle {
        return Err(AppError::NotReady(state).into());
    }

    let today = sheets::serial::today(timezone);
    let result = commands::run(&session, command, today).await;
    session.logout();
    result?;

    Ok(())
}
