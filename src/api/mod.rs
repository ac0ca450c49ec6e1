//! The external services the categorizer talks to, each behind a small async trait:
//! - `Sheet`: the Google spreadsheet holding transactions and the mapping table
//! - `Chat`: the Telegram conversation with the person who supplies categories
//! - `Notifier`: a webhook that is pinged when a person's attention is needed
//!
//! Each trait has a real implementation and one that needs no network, selected with `Mode`.

mod console;
mod files;
mod notifier;
mod oauth;
mod sheet;
mod sheet_test_client;
mod telegram;

use crate::model::{CellRef, Column};
use crate::{Config, Result};
use anyhow::Context;

pub(crate) use oauth::TokenProvider;
pub(crate) use sheet_test_client::TestSheet;

// OAuth scope required for reading and writing spreadsheet values.
const OAUTH_SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];

/// The environment variable that, when set and non-empty, selects `Mode::Test`.
pub const TEST_MODE_ENV: &str = "EXPENSE_CATEGORIZER_IN_TEST_MODE";

/// Whether the app talks to the real services or runs against in-memory and console stand-ins.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Google,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// A block of values to write, starting at the top-left cell of `range`, e.g. `mapping!A7:B7`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct SheetRange {
    pub(crate) range: String,
    pub(crate) values: Vec<Vec<String>>,
}

/// The spreadsheet operations the workflow needs. Sheets are addressed by tab name.
#[async_trait::async_trait]
pub(crate) trait Sheet: Send {
    /// All values of `column`, top to bottom. Empty cells are `""` and trailing empty cells are
    /// omitted, so index `i` of the result is row `i + 1` of the sheet.
    async fn column(&mut self, sheet_name: &str, column: Column) -> Result<Vec<String>>;

    /// A single cell, `None` when it is empty.
    async fn cell(&mut self, sheet_name: &str, cell: CellRef) -> Result<Option<String>>;

    /// Writes each range with user-entered semantics, so formulas and numbers are interpreted.
    async fn write_ranges(&mut self, data: &[SheetRange]) -> Result<()>;

    /// The last `n` values of `column`, or the whole column when it has fewer.
    async fn column_tail(
        &mut self,
        sheet_name: &str,
        column: Column,
        n: usize,
    ) -> Result<Vec<String>> {
        let mut values = self.column(sheet_name, column).await?;
        let skip = values.len().saturating_sub(n);
        Ok(values.split_off(skip))
    }

    /// Writes `values`, starting in column A, into the row below the last row that has any
    /// non-empty cell. Rows whose first cell is empty still count as taken.
    async fn append_row(&mut self, sheet_name: &str, values: &[String]) -> Result<()>;
}

/// An inbound chat message.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct Reply {
    pub(crate) text: String,
    /// The platform's id for the message, used to reply to it.
    pub(crate) message_id: Option<i32>,
}

impl Reply {
    pub(crate) fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            message_id: None,
        }
    }
}

/// A conversation with one fixed recipient.
#[async_trait::async_trait]
pub(crate) trait Chat: Send {
    async fn send(&mut self, text: &str) -> Result<()>;

    /// Waits for the next text message from the recipient.
    async fn receive(&mut self) -> Result<Reply>;

    /// Answers `to` specifically, where the platform supports it.
    async fn reply(&mut self, _to: &Reply, text: &str) -> Result<()> {
        self.send(text).await
    }
}

/// Alerts a person that the chat needs their attention.
#[async_trait::async_trait]
pub(crate) trait Notifier: Send {
    async fn notify(&mut self) -> Result<()>;
}

/// Returns the `Sheet` implementation for `mode`.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet + Send>> {
    match mode {
        Mode::Google => {
            let token_provider =
                TokenProvider::load(config.client_secret_path(), config.token_path())
                    .await
                    .context("Unable to load the Google credentials")?;
            let spreadsheet_id = config.spreadsheet_id()?.to_string();
            Ok(Box::new(
                sheet::GoogleSheet::new(spreadsheet_id, token_provider).await?,
            ))
        }
        Mode::Test => Ok(Box::new(TestSheet::seeded(config.layout())?)),
    }
}

/// Returns the `Chat` implementation for `mode`.
pub(crate) async fn chat(config: &Config, mode: Mode) -> Result<Box<dyn Chat + Send>> {
    match mode {
        Mode::Google => Ok(Box::new(
            telegram::TelegramChat::connect(config.telegram_token()?, config.chat_id()?).await?,
        )),
        Mode::Test => Ok(Box::new(console::ConsoleChat::new())),
    }
}

/// Returns the `Notifier` implementation for `mode`.
pub(crate) fn notifier(config: &Config, mode: Mode) -> Result<Box<dyn Notifier + Send>> {
    match mode {
        Mode::Google => Ok(Box::new(notifier::WebhookNotifier::new(
            config.notify_url()?.clone(),
        ))),
        Mode::Test => Ok(Box::new(notifier::LogNotifier)),
    }
}
