//! Implements the `Sheet` trait using the `sheets::Client` to interact with a Google sheet.

use crate::api::{Sheet, SheetRange, TokenProvider};
use crate::model::{CellRef, Column};
use crate::Result;
use anyhow::Context;
use sheets::types::{
    BatchUpdateValuesRequest, DateTimeRenderOption, Dimension, InsertDataOption, ValueInputOption,
    ValueRange, ValueRenderOption,
};
use sheets::ClientError;
use tracing::{debug, trace};

/// Implements the `Sheet` trait using the `sheets::Client`. It takes a `TokenProvider`, on which
/// it calls refresh to keep the token up-to-date.
pub(super) struct GoogleSheet {
    spreadsheet_id: String,
    token_provider: TokenProvider,
    client: sheets::Client,
}

impl GoogleSheet {
    pub(super) async fn new(
        spreadsheet_id: String,
        mut token_provider: TokenProvider,
    ) -> Result<Self> {
        let client = create_sheets_client(&mut token_provider).await?;
        Ok(Self {
            spreadsheet_id,
            token_provider,
            client,
        })
    }

    /// Refreshes the sheets client with a new access token if needed
    async fn refresh_client(&mut self) -> Result<()> {
        self.client = create_sheets_client(&mut self.token_provider).await?;
        Ok(())
    }

    /// Fetches the formatted values of `range`, one inner `Vec` per row.
    async fn values(&mut self, range: &str) -> Result<Vec<Vec<String>>> {
        self.refresh_client().await?;
        let response = self
            .client
            .spreadsheets()
            .values_get(
                &self.spreadsheet_id,
                range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch the values of {range}"))?;
        trace!("{range} returned {} rows", response.body.values.len());
        Ok(response.body.values)
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn column(&mut self, sheet_name: &str, column: Column) -> Result<Vec<String>> {
        let range = format!("{sheet_name}!{column}:{column}");
        let rows = self.values(&range).await?;
        // Empty cells in the middle of the column come back as empty rows.
        Ok(rows
            .into_iter()
            .map(|row| row.into_iter().next().unwrap_or_default())
            .collect())
    }

    async fn cell(&mut self, sheet_name: &str, cell: CellRef) -> Result<Option<String>> {
        let range = format!("{sheet_name}!{cell}");
        let rows = self.values(&range).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .filter(|value| !value.is_empty()))
    }

    async fn write_ranges(&mut self, data: &[SheetRange]) -> Result<()> {
        self.refresh_client().await?;
        let value_ranges: Vec<ValueRange> = data
            .iter()
            .map(|sr| ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: sr.range.clone(),
                values: sr.values.clone(),
            })
            .collect();

        let request = BatchUpdateValuesRequest {
            data: value_ranges,
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            value_input_option: Some(ValueInputOption::UserEntered),
        };

        self.client
            .spreadsheets()
            .values_batch_update(&self.spreadsheet_id, &request)
            .await
            .map_err(map_client_error)
            .with_context(|| {
                let ranges: Vec<&str> = data.iter().map(|sr| sr.range.as_str()).collect();
                format!("Failed to write ranges: {ranges:?}")
            })?;
        Ok(())
    }

    async fn append_row(&mut self, sheet_name: &str, values: &[String]) -> Result<()> {
        self.refresh_client().await?;
        // Google finds the table within the range and writes below its last non-empty row.
        let range = table_range(sheet_name, values.len());
        let body = ValueRange {
            major_dimension: Some(Dimension::Rows),
            range: range.clone(),
            values: vec![values.to_vec()],
        };

        let response = self
            .client
            .spreadsheets()
            .values_append(
                &self.spreadsheet_id,
                &range,
                false,
                InsertDataOption::Overwrite,
                DateTimeRenderOption::FormattedString,
                ValueRenderOption::FormattedValue,
                ValueInputOption::UserEntered,
                &body,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to append a row to {range}"))?;
        match response.body.updates {
            Some(updates) => debug!("Appended a row at {}", updates.updated_range),
            None => debug!("Appended a row to {range}"),
        }
        Ok(())
    }
}

/// The columns from A through the last of `width` columns, e.g. `mapping!A:B`.
fn table_range(sheet_name: &str, width: usize) -> String {
    let last = Column::new(width.saturating_sub(1));
    format!("{sheet_name}!{}:{last}", Column::A)
}

/// Creates a new sheets client with a refreshed access token.
async fn create_sheets_client(token_provider: &mut TokenProvider) -> Result<sheets::Client> {
    let access_token = token_provider.token_with_refresh().await?;

    // The sheets crate wants the full set of OAuth client values, but API calls only use the
    // access token. Refreshing is done by `TokenProvider`.
    Ok(sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token.to_string(),
        String::new(),
    ))
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}
