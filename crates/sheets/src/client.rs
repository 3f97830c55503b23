use api_types::sheets::{
    AppendValuesResponse, ClearValuesResponse, ErrorResponse, UpdateValuesResponse, ValueRange,
};
use reqwest::{Client, Method, Url, header};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::SheetsError;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Range-addressed client for a single spreadsheet.
///
/// The bearer token is baked into the default headers, so a credential change
/// means building a new client.
#[derive(Clone, Debug)]
pub struct SheetsClient {
    http: Client,
    base_url: Url,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn builder() -> SheetsClientBuilder {
        SheetsClientBuilder::default()
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn url(&self, range: &str, suffix: &str) -> Result<Url, SheetsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SheetsError::Config(format!("invalid base_url: {}", self.base_url)))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{range}{suffix}"));
        Ok(url)
    }

    async fn send<TReq: Serialize + ?Sized, TResp: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&TReq>,
    ) -> Result<TResp, SheetsError> {
        tracing::debug!("{method} {}", url.path());
        let mut req = self.http.request(method, url);
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<TResp>()
                .await
                .map_err(|err| SheetsError::Decode(err.to_string()));
        }

        let message = match resp.json::<ErrorResponse>().await {
            Ok(err) if !err.error.message.is_empty() => err.error.message,
            _ => "unknown api error".to_string(),
        };
        Err(SheetsError::from_status(status, message))
    }

    /// Unformatted values of `range` (e.g. `Transactions!B9:H`).
    pub async fn values(&self, range: &str) -> Result<Vec<Vec<serde_json::Value>>, SheetsError> {
        let mut url = self.url(range, "")?;
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "UNFORMATTED_VALUE");
        let body: ValueRange = self.send::<(), _>(Method::GET, url, None).await?;
        Ok(body.values)
    }

    /// Appends one row after the last row of `range`. Returns the range
    /// actually written.
    pub async fn append(
        &self,
        range: &str,
        row: Vec<serde_json::Value>,
    ) -> Result<String, SheetsError> {
        let mut url = self.url(range, ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        let resp: AppendValuesResponse = self
            .send(Method::POST, url, Some(&ValueRange::single_row(row)))
            .await?;
        Ok(resp.updates.updated_range)
    }

    /// Overwrites the cells of `range` with one row.
    pub async fn update(
        &self,
        range: &str,
        row: Vec<serde_json::Value>,
    ) -> Result<UpdateValuesResponse, SheetsError> {
        let mut url = self.url(range, "")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        self.send(Method::PUT, url, Some(&ValueRange::single_row(row)))
            .await
    }

    /// Empties the cells of `range`, leaving the row in place.
    pub async fn clear(&self, range: &str) -> Result<ClearValuesResponse, SheetsError> {
        let url = self.url(range, ":clear")?;
        self.send(Method::POST, url, Some(&serde_json::json!({})))
            .await
    }
}

#[derive(Debug)]
pub struct SheetsClientBuilder {
    base_url: String,
    spreadsheet_id: String,
    token: String,
}

impl Default for SheetsClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            spreadsheet_id: String::new(),
            token: String::new(),
        }
    }
}

impl SheetsClientBuilder {
    pub fn base_url(mut self, base_url: &str) -> SheetsClientBuilder {
        self.base_url = base_url.to_string();
        self
    }

    pub fn spreadsheet_id(mut self, spreadsheet_id: &str) -> SheetsClientBuilder {
        self.spreadsheet_id = spreadsheet_id.to_string();
        self
    }

    pub fn token(mut self, token: &str) -> SheetsClientBuilder {
        self.token = token.to_string();
        self
    }

    pub fn build(self) -> Result<SheetsClient, SheetsError> {
        if self.spreadsheet_id.is_empty() {
            return Err(SheetsError::Config("missing spreadsheet id".to_string()));
        }
        if self.token.is_empty() {
            return Err(SheetsError::Config("missing token".to_string()));
        }
        let base_url = Url::parse(&self.base_url)
            .map_err(|err| SheetsError::Config(format!("invalid base_url: {err}")))?;

        let mut auth = header::HeaderValue::try_from(format!("Bearer {}", self.token))
            .map_err(|err| SheetsError::Config(format!("invalid auth header value: {err}")))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| SheetsError::Config(format!("failed to build http client: {err}")))?;

        Ok(SheetsClient {
            http,
            base_url,
            spreadsheet_id: self.spreadsheet_id,
        })
    }
}
