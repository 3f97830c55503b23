pub use accounts::Account;
pub use budget::{
    AccountSummary, BudgetRow, BudgetSummary, CategoryAmounts, Suggestion, SuggestionKind,
    account_summaries, budget_rows, budget_summary, category_amounts, move_between_categories,
    set_budgeted, suggestions, transfer_between_accounts,
};
pub use categories::{
    ACCOUNT_TRANSFER, AVAILABLE_TO_BUDGET, BALANCE_ADJUSTMENT, Category, CategoryGroup,
    FixedCategory, PRESET_GROUP, STARTING_BALANCE, fixed_categories,
};
pub use diagnostics::{Diagnostic, EntryRef};
pub use error::EngineError;
pub use ledger::{Entries, Entry, EntryKey, Ledger, LedgerData, Record, SyncMark, Upsert};
pub use money::Money;
pub use query::{
    Condition, DateGranularity, DateOp, NumberOp, TextField, TextOp, TransactionQuery,
    TransactionRow,
};
pub use reports::{
    AccountReport, AccountReportPoint, SpendingSlice, TrendExclusions, TrendReport, TrendSeries,
    account_report, spending_report, trend_report,
};
pub use transactions::{BudgetTransaction, RowId, RowKind, Transaction, TransactionStatus};
pub use window::{Month, ReportWindow};

mod accounts;
mod budget;
mod categories;
mod diagnostics;
mod error;
mod ledger;
mod money;
mod query;
mod reports;
mod snapshot;
mod transactions;
mod window;

type ResultEngine<T> = Result<T, EngineError>;
