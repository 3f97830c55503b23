//! Where things live in the budget spreadsheet and how rows are marked.

use engine::{RowId, RowKind};

use crate::error::RowError;

pub const TRANSACTIONS_SHEET: &str = "Transactions";
pub const TRANSACTIONS_FIRST_ROW: u32 = 9;
/// Date | Outflow | Inflow | Category | Account | Memo | Status
pub const TRANSACTIONS_COLUMNS: (&str, &str) = ("B", "H");

pub const TRANSFERS_SHEET: &str = "Category Transfers";
pub const TRANSFERS_FIRST_ROW: u32 = 8;
/// Date | Amount | From | To | Memo | Marker. Only B:F are written.
pub const TRANSFERS_READ_COLUMNS: (&str, &str) = ("B", "G");
pub const TRANSFERS_WRITE_COLUMNS: (&str, &str) = ("B", "F");

/// Bank/cash accounts in column I, credit cards in column J.
pub const ACCOUNTS_RANGE: &str = "Configuration!I9:J23";
/// Marker | Name | Monthly | Goal | Emergency fund flag
pub const CATEGORIES_RANGE: &str = "Configuration!B9:F108";
pub const VERSION_RANGE: &str = "BackendData!2:2";
pub const SUPPORTED_VERSIONS: [&str; 2] = ["3.2.0", "3.3.0"];

pub const SETTLED: &str = "✅";
pub const PENDING: &str = "🅿️";
pub const EXCLUDED: &str = "*️⃣";

pub const GROUP: &str = "✦";
pub const REPORTABLE: &str = "✧";
pub const NON_REPORTABLE: &str = "※";
/// Auxiliary rows (credit card payments).
pub const IGNORED: &str = "◘";

/// Everything from the first data row down.
pub fn read_range(kind: RowKind) -> String {
    match kind {
        RowKind::Transaction => {
            let (from, to) = TRANSACTIONS_COLUMNS;
            format!("{TRANSACTIONS_SHEET}!{from}{TRANSACTIONS_FIRST_ROW}:{to}")
        }
        RowKind::BudgetTransaction => {
            let (from, to) = TRANSFERS_READ_COLUMNS;
            format!("{TRANSFERS_SHEET}!{from}{TRANSFERS_FIRST_ROW}:{to}")
        }
    }
}

/// Whole columns, as expected by the append endpoint.
pub fn append_range(kind: RowKind) -> String {
    let (sheet, (from, to)) = write_columns(kind);
    format!("{sheet}!{from}:{to}")
}

/// The exact cells of one row.
pub fn row_range(id: RowId) -> String {
    let (sheet, (from, to)) = write_columns(id.kind());
    let row = id.row();
    format!("{sheet}!{from}{row}:{to}{row}")
}

fn write_columns(kind: RowKind) -> (&'static str, (&'static str, &'static str)) {
    match kind {
        RowKind::Transaction => (TRANSACTIONS_SHEET, TRANSACTIONS_COLUMNS),
        RowKind::BudgetTransaction => (TRANSFERS_SHEET, TRANSFERS_WRITE_COLUMNS),
    }
}

/// Row number of the last cell of an A1 range such as
/// `Transactions!B4143:H4143` or `'Category Transfers'!B120:F120`.
pub fn parse_range_row(range: &str) -> Result<u32, RowError> {
    let invalid = || RowError::InvalidRange(range.to_string());
    let cells = match range.rsplit_once('!') {
        Some((sheet, cells)) if !sheet.trim_matches('\'').is_empty() => cells,
        Some(_) => return Err(invalid()),
        None => range,
    };
    let last = cells.rsplit(':').next().ok_or_else(invalid)?;
    let digits = last.trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '$');
    if digits.is_empty() || digits.len() == last.len() {
        return Err(invalid());
    }
    digits.parse::<u32>().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges() {
        assert_eq!(read_range(RowKind::Transaction), "Transactions!B9:H");
        assert_eq!(read_range(RowKind::BudgetTransaction), "Category Transfers!B8:G");
        assert_eq!(append_range(RowKind::Transaction), "Transactions!B:H");
        assert_eq!(row_range(RowId::transaction(42)), "Transactions!B42:H42");
        assert_eq!(
            row_range(RowId::budget_transaction(12)),
            "Category Transfers!B12:F12"
        );
    }

    #[test]
    fn parses_appended_ranges() {
        assert_eq!(parse_range_row("Transactions!B4143:H4143"), Ok(4143));
        assert_eq!(parse_range_row("'Category Transfers'!B120:F120"), Ok(120));
        assert_eq!(parse_range_row("Transactions!B7"), Ok(7));
        assert!(parse_range_row("Transactions!B:H").is_err());
        assert!(parse_range_row("!B1:H1").is_err());
        assert!(parse_range_row("garbage").is_err());
    }
}
