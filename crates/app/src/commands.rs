//! Subcommand handlers. Rendering is split from the session so tables can be
//! written to any sink.

use std::io::{self, Write};

use chrono::NaiveDate;

use engine::{
    BudgetRow, Ledger, Month, ReportWindow, RowKind, SyncMark, Transaction, TransactionQuery,
    TransactionRow, TrendExclusions,
};
use reconcile::{SessionState, SyncSession};

use crate::{error::Result, settings::Command};

pub async fn run(session: &SyncSession, command: Command, today: NaiveDate) -> Result<()> {
    let mut out = io::stdout();
    match command {
        Command::Budget { month } => {
            let month = match month {
                Some(month) => month.parse()?,
                None => Month::of(today),
            };
            render_budget(&mut out, &session.ledger(), month)?;
        }
        Command::Accounts => render_accounts(&mut out, &session.ledger())?,
        Command::Transactions {
            search,
            category,
            account,
        } => {
            let mut query = TransactionQuery::from_link(category.as_deref(), account.as_deref());
            if let Some(search) = search {
                query.set_search(&search);
            }
            render_transactions(&mut out, &query.run(&session.ledger()))?;
        }
        Command::Reports { account } => {
            render_reports(&mut out, &session.ledger(), Month::of(today), account.as_deref())?;
        }
        Command::Add {
            amount,
            category,
            account,
            date,
            memo,
        } => {
            let tx = Transaction::new(date.unwrap_or(today), amount, &category, &account)
                .with_memo(&memo);
            let id = session.add_transaction(tx)?.confirmed().await?;
            writeln!(out, "added {id}")?;
        }
        Command::Delete { id } => {
            let commit = match id.kind() {
                RowKind::Transaction => session.delete_transaction(id)?,
                RowKind::BudgetTransaction => session.delete_budget_transaction(id)?,
            };
            commit.confirmed().await?;
            writeln!(out, "deleted {id}")?;
        }
        Command::Export => {
            let snapshot = session.ledger().snapshot();
            serde_json::to_writer_pretty(&mut out, &snapshot)?;
            writeln!(out)?;
        }
        Command::Watch => watch(session).await?,
    }
    Ok(())
}

/// Logs state changes and re-pull results until Ctrl-C.
async fn watch(session: &SyncSession) -> Result<()> {
    let mut tasks = tokio::task::JoinSet::new();
    let mut states = session.subscribe();
    tasks.spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            tracing::info!("session is {state}");
            if state == SessionState::Unauthenticated {
                break;
            }
        }
    });

    tracing::info!("watching, press Ctrl-C to stop");
    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal?,
        _ = tasks.join_next() => tracing::warn!("session ended"),
    }
    session.logout();
    tasks.shutdown().await;
    Ok(())
}

fn sync_glyph(sync: &SyncMark) -> &'static str {
    match sync {
        SyncMark::Confirmed => " ",
        SyncMark::Pending => "~",
        SyncMark::Failed(_) => "!",
        SyncMark::Deleting => "-",
    }
}

fn amount_or_blank(amount: Option<engine::Money>) -> String {
    amount.map(|amount| amount.to_string()).unwrap_or_default()
}

pub fn render_budget(out: &mut impl Write, ledger: &Ledger, month: Month) -> io::Result<()> {
    let window = ReportWindow::month(month);
    let summary = engine::budget_summary(ledger, &window);
    writeln!(out, "{}", month.label())?;
    writeln!(out, "to budget: {}", summary.to_budget)?;
    writeln!(out, "budgeted:  {}", summary.budgeted)?;
    writeln!(out, "spent:     {}", summary.spent)?;
    writeln!(out)?;
    writeln!(
        out,
        "{:<28} {:>12} {:>12} {:>12}",
        "category", "budgeted", "activity", "available"
    )?;
    for row in engine::budget_rows(ledger, &window) {
        let amounts = row.amounts();
        let name = match &row {
            BudgetRow::Group { name, .. } => name.to_uppercase(),
            BudgetRow::Category { name, .. } => format!("  {name}"),
        };
        writeln!(
            out,
            "{name:<28} {:>12} {:>12} {:>12}",
            amounts.budgeted.to_string(),
            amounts.activity.to_string(),
            amounts.available.to_string()
        )?;
    }
    Ok(())
}

pub fn render_accounts(out: &mut impl Write, ledger: &Ledger) -> io::Result<()> {
    for summary in engine::account_summaries(ledger) {
        let last = summary
            .last_transaction
            .map(|date| date.to_string())
            .unwrap_or_else(|| "never".to_string());
        writeln!(
            out,
            "{:<24} {:>14}  last: {last}",
            summary.name,
            summary.balance.to_string()
        )?;
    }
    Ok(())
}

pub fn render_transactions(out: &mut impl Write, rows: &[TransactionRow]) -> io::Result<()> {
    for row in rows {
        let id = row.id.map(|id| id.to_string()).unwrap_or_default();
        writeln!(
            out,
            "{}{:<9} {} {:>12} {:>12}  {:<20} {:<16} {}",
            sync_glyph(&row.sync),
            id,
            row.date,
            amount_or_blank(row.outflow),
            amount_or_blank(row.inflow),
            row.category,
            row.account,
            row.memo
        )?;
    }
    Ok(())
}

pub fn render_reports(
    out: &mut impl Write,
    ledger: &Ledger,
    month: Month,
    account: Option<&str>,
) -> io::Result<()> {
    writeln!(out, "spending in {}", month.label())?;
    for slice in engine::spending_report(ledger, Some(&ReportWindow::month(month))) {
        writeln!(out, "  {:<24} {:>12}", slice.category, slice.amount.to_string())?;
    }

    let trend = engine::trend_report(ledger, &TrendExclusions::new());
    writeln!(out, "trend: {}", trend.labels.join(", "))?;
    for series in &trend.series {
        let data: Vec<String> = series.data.iter().map(ToString::to_string).collect();
        writeln!(out, "  {:<24} {}", series.category, data.join(" "))?;
    }

    let report = engine::account_report(ledger, account);
    if let Some(account) = &report.account {
        writeln!(out, "account {account}")?;
        for point in &report.points {
            writeln!(
                out,
                "  {:<16} in {:>10} out {:>10} moved {:>10} balance {:>12}",
                point.month.label(),
                point.inflow.to_string(),
                point.outflow.to_string(),
                point.transferred.to_string(),
                point.ending_balance.to_string()
            )?;
        }
    }
    Ok(())
}
