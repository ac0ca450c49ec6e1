//! These structs provide the command-line and environment interface for the categorize program.

use crate::model::Column;
use clap::Parser;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;
use url::Url;

/// categorize: asks for the categories your expense sheet could not work out.
///
/// The program looks at the most recent rows of the transactions worksheet in your household
/// expense Google sheet. Any row whose category cell reads "not found" is sent to you, one at a
/// time, as a Telegram message. Each answer you send back is appended to the mapping worksheet,
/// where a lookup formula picks it up. The program exits once every question is answered, or
/// immediately if nothing needs an answer.
///
/// Every setting is read from the environment (a `.env` file in the working directory is loaded
/// first). The flags below exist only to override those environment variables.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory that holds the Google credentials. Defaults to ~/expenses
    #[arg(long, env = "EXPENSE_HOME", default_value_t = default_home())]
    home: DisplayPath,

    /// The URL of the expense Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long, env = "SPREADSHEET_URL")]
    sheet_url: Option<String>,

    /// The worksheet (tab) holding this month's transactions.
    #[arg(long, env = "EXPENSE_SHEET", default_value = "current")]
    sheet: String,

    /// The worksheet (tab) that answers are appended to.
    #[arg(long, env = "MAPPING_SHEET", default_value = "mapping")]
    mapping_sheet: String,

    /// The column holding the value that a category is looked up for.
    #[arg(long, env = "VALUE_COLUMN", default_value = "D")]
    value_column: Column,

    /// The column holding the looked-up category.
    #[arg(long, env = "CATEGORY_COLUMN", default_value = "E")]
    category_column: Column,

    /// How many of the most recent rows to inspect.
    #[arg(long, env = "RECENT_ROWS", default_value_t = 20)]
    recent_rows: usize,

    /// The category text that marks a row as needing an answer.
    #[arg(long, env = "MISSING_CATEGORY", default_value = "not found")]
    missing_category: String,

    /// The Telegram bot token.
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    telegram_token: Option<String>,

    /// The Telegram chat that questions are sent to and answers are accepted from.
    #[arg(long, env = "TELEGRAM_CHAT_ID", allow_hyphen_values = true)]
    chat_id: Option<i64>,

    /// The webhook that is called once, with GET, when questions are about to be asked.
    #[arg(long, env = "NOTIFY_URL", hide_env_values = true)]
    notify_url: Option<Url>,

    /// The Google OAuth client credentials. Defaults to $EXPENSE_HOME/.secrets/client_secret.json
    #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
    client_secret: Option<PathBuf>,

    /// The Google OAuth token file. Defaults to $EXPENSE_HOME/.secrets/token.json
    #[arg(long, env = "GOOGLE_TOKEN")]
    token: Option<PathBuf>,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }

    pub fn sheet_url(&self) -> Option<&str> {
        self.sheet_url.as_deref()
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn mapping_sheet(&self) -> &str {
        &self.mapping_sheet
    }

    pub fn value_column(&self) -> Column {
        self.value_column
    }

    pub fn category_column(&self) -> Column {
        self.category_column
    }

    pub fn recent_rows(&self) -> usize {
        self.recent_rows
    }

    pub fn missing_category(&self) -> &str {
        &self.missing_category
    }

    pub fn telegram_token(&self) -> Option<&str> {
        self.telegram_token.as_deref()
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.chat_id
    }

    pub fn notify_url(&self) -> Option<&Url> {
        self.notify_url.as_ref()
    }

    pub fn client_secret(&self) -> Option<&Path> {
        self.client_secret.as_deref()
    }

    pub fn token(&self) -> Option<&Path> {
        self.token.as_deref()
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("expenses"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or EXPENSE_HOME instead of relying on the default \
                directory. If you continue using the program right now, you may have problems!",
            );
            PathBuf::from("expenses")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
