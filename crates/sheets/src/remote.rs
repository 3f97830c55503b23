use std::{fmt, sync::Arc};

use async_trait::async_trait;

use engine::{BudgetTransaction, LedgerData, RowId, RowKind, Transaction};

use crate::{
    client::{DEFAULT_BASE_URL, SheetsClient},
    error::SheetsError,
    layout, rows,
};

/// The remote store of record, as seen by the reconciliation engine.
#[async_trait]
pub trait RemoteLedger: Send + Sync {
    /// Read-only probe of the schema version marker.
    async fn verify(&self) -> Result<bool, SheetsError>;

    /// Every collection, freshly read.
    async fn import(&self) -> Result<LedgerData, SheetsError>;

    /// Appends a row and returns the identifier it was given.
    async fn add_transaction(&self, tx: &Transaction) -> Result<RowId, SheetsError>;
    async fn update_transaction(&self, id: RowId, tx: &Transaction) -> Result<(), SheetsError>;
    async fn delete_transaction(&self, id: RowId) -> Result<(), SheetsError>;

    async fn add_budget_transaction(&self, tx: &BudgetTransaction)
    -> Result<RowId, SheetsError>;
    async fn update_budget_transaction(
        &self,
        id: RowId,
        tx: &BudgetTransaction,
    ) -> Result<(), SheetsError>;
    async fn delete_budget_transaction(&self, id: RowId) -> Result<(), SheetsError>;
}

/// Bearer token plus target spreadsheet.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub spreadsheet_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .finish()
    }
}

/// Builds a fresh [`RemoteLedger`] whenever target or credential change.
pub trait Connector: Send + Sync {
    fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn RemoteLedger>, SheetsError>;
}

#[derive(Clone, Debug)]
pub struct SheetsConnector {
    base_url: String,
}

impl SheetsConnector {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

impl Default for SheetsConnector {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Connector for SheetsConnector {
    fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn RemoteLedger>, SheetsError> {
        let client = SheetsClient::builder()
            .base_url(&self.base_url)
            .spreadsheet_id(&credentials.spreadsheet_id)
            .token(&credentials.token)
            .build()?;
        Ok(Arc::new(SheetsLedger::new(client)))
    }
}

/// [`RemoteLedger`] over the budget spreadsheet layout.
#[derive(Clone, Debug)]
pub struct SheetsLedger {
    client: SheetsClient,
}

impl SheetsLedger {
    pub fn new(client: SheetsClient) -> Self {
        Self { client }
    }

    async fn append(&self, kind: RowKind, row: Vec<serde_json::Value>) -> Result<u32, SheetsError> {
        let range = self.client.append(&layout::append_range(kind), row).await?;
        let row = layout::parse_range_row(&range)?;
        tracing::debug!("appended {range}");
        Ok(row)
    }

    fn expect_kind(id: RowId, kind: RowKind) -> Result<(), SheetsError> {
        if id.kind() == kind {
            Ok(())
        } else {
            Err(SheetsError::WrongIdentifier(id))
        }
    }
}

#[async_trait]
impl RemoteLedger for SheetsLedger {
    async fn verify(&self) -> Result<bool, SheetsError> {
        let values = self.client.values(layout::VERSION_RANGE).await?;
        let version = values
            .first()
            .and_then(|row| row.last())
            .and_then(|cell| cell.as_str());
        tracing::debug!("spreadsheet version: {version:?}");
        Ok(version.is_some_and(|v| layout::SUPPORTED_VERSIONS.contains(&v)))
    }

    async fn import(&self) -> Result<LedgerData, SheetsError> {
        let tx_range = layout::read_range(RowKind::Transaction);
        let transfers_range = layout::read_range(RowKind::BudgetTransaction);
        let (accounts, categories, transactions, transfers) = tokio::try_join!(
            self.client.values(layout::ACCOUNTS_RANGE),
            self.client.values(layout::CATEGORIES_RANGE),
            self.client.values(&tx_range),
            self.client.values(&transfers_range),
        )?;

        let (category_groups, categories) = rows::decode_categories(&categories);
        let data = LedgerData {
            accounts: rows::decode_accounts(&accounts),
            category_groups,
            categories,
            transactions: rows::decode_transactions(&transactions),
            budget_transactions: rows::decode_budget_transactions(&transfers),
        };
        tracing::info!(
            "imported {} accounts, {} categories, {} transactions, {} budget transactions",
            data.accounts.len(),
            data.categories.len(),
            data.transactions.len(),
            data.budget_transactions.len()
        );
        Ok(data)
    }

    async fn add_transaction(&self, tx: &Transaction) -> Result<RowId, SheetsError> {
        let row = self
            .append(RowKind::Transaction, rows::encode_transaction(tx))
            .await?;
        Ok(RowId::transaction(row))
    }

    async fn update_transaction(&self, id: RowId, tx: &Transaction) -> Result<(), SheetsError> {
        Self::expect_kind(id, RowKind::Transaction)?;
        self.client
            .update(&layout::row_range(id), rows::encode_transaction(tx))
            .await?;
        Ok(())
    }

    async fn delete_transaction(&self, id: RowId) -> Result<(), SheetsError> {
        Self::expect_kind(id, RowKind::Transaction)?;
        self.client.clear(&layout::row_range(id)).await?;
        Ok(())
    }

    async fn add_budget_transaction(
        &self,
        tx: &BudgetTransaction,
    ) -> Result<RowId, SheetsError> {
        let row = self
            .append(
                RowKind::BudgetTransaction,
                rows::encode_budget_transaction(tx),
            )
            .await?;
        Ok(RowId::budget_transaction(row))
    }

    async fn update_budget_transaction(
        &self,
        id: RowId,
        tx: &BudgetTransaction,
    ) -> Result<(), SheetsError> {
        Self::expect_kind(id, RowKind::BudgetTransaction)?;
        self.client
            .update(&layout::row_range(id), rows::encode_budget_transaction(tx))
            .await?;
        Ok(())
    }

    async fn delete_budget_transaction(&self, id: RowId) -> Result<(), SheetsError> {
        Self::expect_kind(id, RowKind::BudgetTransaction)?;
        self.client.clear(&layout::row_range(id)).await?;
        Ok(())
    }
}
