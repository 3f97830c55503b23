//! Settings for the `rollover` binary.
//!
//! Values are layered: the optional TOML file (`config/rollover.toml` unless
//! `--config` says otherwise), then `ROLLOVER_*` environment variables (use
//! `__` for nested keys, e.g. `ROLLOVER_RETRY__MAX_ATTEMPTS`), then flags.
//! The token is never read from the command line.

use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::Deserialize;

use engine::{Money, RowId};
use reconcile::{RetryPolicy, SessionOptions};

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/rollover.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Retry {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub spreadsheet_id: String,
    pub token: String,
    pub base_url: String,
    pub timezone: String,
    pub repull_interval_secs: u64,
    pub retry: Retry,
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            token: String::new(),
            base_url: sheets::DEFAULT_BASE_URL.to_string(),
            timezone: "Europe/Rome".to_string(),
            repull_interval_secs: 30,
            retry: Retry::default(),
            level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| AppError::Timezone(self.timezone.clone()))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            repull_interval: Duration::from_secs(self.repull_interval_secs),
            retry: RetryPolicy::new(
                self.retry.max_attempts,
                Duration::from_millis(self.retry.base_delay_ms),
            ),
        }
    }

    /// Filter directive covering every crate of the workspace.
    pub fn log_filter(&self) -> String {
        format!(
            "rollover={level},engine={level},sheets={level},reconcile={level}",
            level = self.level
        )
    }

    fn check(&self) -> Result<()> {
        if self.spreadsheet_id.is_empty() {
            return Err(AppError::Missing("spreadsheet_id"));
        }
        if self.token.is_empty() {
            return Err(AppError::Missing("token"));
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
#[command(name = "rollover", about = "Envelope budget on top of a budget spreadsheet")]
pub struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the spreadsheet to open.
    #[arg(long)]
    spreadsheet_id: Option<String>,
    /// Override the API base URL.
    #[arg(long)]
    base_url: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    /// Override log level.
    #[arg(long)]
    level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Budget table and totals for a month.
    Budget {
        /// Month as YYYY-MM; defaults to the current one.
        #[arg(long)]
        month: Option<String>,
    },
    /// Account balances.
    Accounts,
    /// Transactions, newest first.
    Transactions {
        /// Free-text search over every column.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        account: Option<String>,
    },
    /// Spending, trend and account reports.
    Reports {
        /// Account for the account report; defaults to the first one.
        #[arg(long)]
        account: Option<String>,
    },
    /// Adds a transaction and waits for the spreadsheet to confirm it.
    Add {
        /// Signed amount, negative for an outflow (e.g. -12.50).
        #[arg(long, allow_hyphen_values = true)]
        amount: Money,
        #[arg(long)]
        category: String,
        #[arg(long)]
        account: String,
        /// Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        memo: String,
    },
    /// Deletes a transaction or budget transfer by id (`tx-12`, `btx-8`).
    Delete { id: RowId },
    /// Prints the whole ledger as JSON.
    Export,
    /// Keeps the session open and logs every re-pull until interrupted.
    Watch,
}

pub fn load() -> Result<(Settings, Command)> {
    from_args(Args::parse())
}

pub fn from_args(args: Args) -> Result<(Settings, Command)> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(
        config::Environment::with_prefix("ROLLOVER")
            .separator("__")
            .try_parsing(true),
    );
    let mut settings: Settings = builder.build()?.try_deserialize()?;

    if let Some(spreadsheet_id) = args.spreadsheet_id {
        settings.spreadsheet_id = spreadsheet_id;
    }
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(level) = args.level {
        settings.level = level;
    }

    settings.check()?;
    Ok((settings, args.command))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    fn config_file(contents: &str) -> (std::path::PathBuf, String) {
        let dir = std::env::temp_dir().join(format!(
            "rollover-settings-{}-{}",
            std::process::id(),
            contents.len()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rollover.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let arg = path.to_string_lossy().into_owned();
        (dir, arg)
    }

    #[test]
    fn file_values_are_overridden_by_flags() {
        let (dir, path) = config_file(
            r#"
spreadsheet_id = "from-file"
token = "secret"
timezone = "UTC"
repull_interval_secs = 5

[retry]
max_attempts = 7
"#,
        );
        let args = parse(&[
            "rollover",
            "--config",
            &path,
            "--spreadsheet-id",
            "from-flag",
            "accounts",
        ]);

        let (settings, command) = from_args(args).unwrap();
        assert_eq!(command, Command::Accounts);
        assert_eq!(settings.spreadsheet_id, "from-flag");
        assert_eq!(settings.token, "secret");
        assert_eq!(settings.timezone().unwrap(), chrono_tz::UTC);
        assert_eq!(settings.retry.max_attempts, 7);
        assert_eq!(settings.retry.base_delay_ms, 500);
        assert_eq!(settings.base_url, sheets::DEFAULT_BASE_URL);

        let options = settings.session_options();
        assert_eq!(options.repull_interval, Duration::from_secs(5));
        assert_eq!(options.retry.max_attempts, 7);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_token_is_reported() {
        let (dir, path) = config_file("spreadsheet_id = \"abc\"\n");
        let args = parse(&["rollover", "--config", &path, "export"]);
        let err = from_args(args).unwrap_err();
        assert!(matches!(err, AppError::Missing("token")));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn subcommands_parse() {
        let args = parse(&[
            "rollover",
            "add",
            "--amount",
            "-12.50",
            "--category",
            "Groceries",
            "--account",
            "Checking",
            "--date",
            "2024-03-05",
        ]);
        assert_eq!(
            args.command,
            Command::Add {
                amount: Money::new(-1250),
                category: "Groceries".to_string(),
                account: "Checking".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 3, 5),
                memo: String::new(),
            }
        );

        let args = parse(&["rollover", "delete", "btx-8"]);
        assert_eq!(
            args.command,
            Command::Delete {
                id: RowId::budget_transaction(8)
            }
        );

        assert!(Args::try_parse_from(["rollover", "delete", "row-8"]).is_err());
    }

    #[test]
    fn filter_names_every_crate() {
        let settings = Settings {
            level: "debug".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            settings.log_filter(),
            "rollover=debug,engine=debug,sheets=debug,reconcile=debug"
        );
        assert!(
            Settings {
                timezone: "Mars/Olympus".to_string(),
                ..Settings::default()
            }
            .timezone()
            .is_err()
        );
    }
}
