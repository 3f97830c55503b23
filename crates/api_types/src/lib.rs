use serde::{Deserialize, Serialize};

pub mod snapshot {
    use super::*;

    /// Plain, serialization-ready copy of the whole ledger.
    ///
    /// Dates are ISO calendar strings (`YYYY-MM-DD`) and amounts are signed
    /// minor units. Entries that were never confirmed remotely carry an
    /// empty `id`.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LedgerSnapshot {
        pub accounts: Vec<AccountRecord>,
        pub category_groups: Vec<CategoryGroupRecord>,
        pub categories: Vec<CategoryRecord>,
        pub transactions: Vec<TransactionRecord>,
        pub budget_transactions: Vec<BudgetTransactionRecord>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AccountRecord {
        pub id: String,
        pub name: String,
        pub credit_card: bool,
        pub hidden: bool,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CategoryGroupRecord {
        pub id: String,
        pub name: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CategoryRecord {
        pub id: String,
        pub name: String,
        pub group: String,
        pub reportable: bool,
        pub hidden: bool,
        pub monthly_budget_minor: Option<i64>,
        pub goal_minor: Option<i64>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionStatus {
        Settled,
        Pending,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TransactionRecord {
        pub id: String,
        /// ISO calendar date (`YYYY-MM-DD`).
        pub date: String,
        pub amount_minor: i64,
        pub category: String,
        pub account: String,
        pub memo: String,
        pub status: TransactionStatus,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BudgetTransactionRecord {
        pub id: String,
        /// ISO calendar date (`YYYY-MM-DD`).
        pub date: String,
        /// Always >= 0, direction is given by `from_category`/`to_category`.
        pub amount_minor: i64,
        pub from_category: String,
        pub to_category: String,
        pub memo: String,
    }
}

/// Wire types of the range-addressed spreadsheet API.
pub mod sheets {
    use super::*;

    /// A block of cells. Trailing empty cells and rows are omitted by the
    /// service, so every row may be shorter than the requested range.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ValueRange {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub range: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub major_dimension: Option<String>,
        #[serde(default)]
        pub values: Vec<Vec<serde_json::Value>>,
    }

    impl ValueRange {
        /// Single-row body used for append and update calls.
        pub fn single_row(values: Vec<serde_json::Value>) -> Self {
            Self {
                range: None,
                major_dimension: Some("ROWS".to_string()),
                values: vec![values],
            }
        }
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UpdateValuesResponse {
        #[serde(default)]
        pub spreadsheet_id: Option<String>,
        /// Range actually written, e.g. `Transactions!B4143:H4143`.
        pub updated_range: String,
        #[serde(default)]
        pub updated_rows: Option<u32>,
        #[serde(default)]
        pub updated_columns: Option<u32>,
        #[serde(default)]
        pub updated_cells: Option<u32>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AppendValuesResponse {
        #[serde(default)]
        pub spreadsheet_id: Option<String>,
        #[serde(default)]
        pub table_range: Option<String>,
        pub updates: UpdateValuesResponse,
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ClearValuesResponse {
        #[serde(default)]
        pub spreadsheet_id: Option<String>,
        #[serde(default)]
        pub cleared_range: Option<String>,
    }

    /// Structured error payload returned with non-2xx statuses.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ErrorResponse {
        pub error: ErrorBody,
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ErrorBody {
        #[serde(default)]
        pub code: u16,
        #[serde(default)]
        pub message: String,
        #[serde(default)]
        pub status: Option<String>,
    }
}
