use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use super::auth::AccessTokenProvider;
use crate::core::bibs::{BibError, RosterSource};

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Reads the roster from a Google Sheets spreadsheet.
pub struct GoogleSheetsClient {
    client: Client,
    auth: Arc<dyn AccessTokenProvider>,
    base_url: Url,
    spreadsheet_id: String,
}

impl GoogleSheetsClient {
    pub fn new(
        client: Client,
        auth: Arc<dyn AccessTokenProvider>,
        spreadsheet_id: impl Into<String>,
    ) -> Result<Self, BibError> {
        let base_url = Url::parse(SHEETS_BASE_URL).map_err(|e| BibError::Sheets(e.to_string()))?;
        Ok(Self {
            client,
            auth,
            base_url,
            spreadsheet_id: spreadsheet_id.into(),
        })
    }

    fn values_url(&self, sheet_name: &str) -> Result<Url, BibError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BibError::Sheets("Sheets base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&sheet_range(sheet_name));
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "FORMATTED_VALUE");
        Ok(url)
    }
}

/// A1 range covering a whole sheet; quotes are doubled inside the name.
fn sheet_range(sheet_name: &str) -> String {
    format!("'{}'", sheet_name.replace('\'', "''"))
}

fn cell_text(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// The API drops trailing empty cells; pad every row back to the widest one.
fn into_rectangle(values: Vec<Vec<Value>>) -> Vec<Vec<String>> {
    let width = values.iter().map(Vec::len).max().unwrap_or(0);
    values
        .into_iter()
        .map(|row| {
            let mut cells: Vec<String> = row.into_iter().map(cell_text).collect();
            cells.resize(width, String::new());
            cells
        })
        .collect()
}

#[async_trait]
impl RosterSource for GoogleSheetsClient {
    async fn load_roster(&self, sheet_name: &str) -> Result<Vec<Vec<String>>, BibError> {
        let url = self.values_url(sheet_name)?;
        let token = self.auth.access_token().await?;

        tracing::debug!("Reading roster sheet '{}'", sheet_name);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BibError::Sheets(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BibError::Sheets(format!(
                "Failed to read sheet '{}' ({}): {}",
                sheet_name, status, text
            )));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| BibError::Sheets(e.to_string()))?;

        let rows = into_rectangle(range.values);
        tracing::info!("Loaded {} roster row(s) from '{}'", rows.len(), sheet_name);
        Ok(rows)
    }
}
