//! Runtime configuration.
//!
//! The `Config` is built once at startup from the parsed `Args` (which in turn come mostly from
//! environment variables). It validates the settings that can be validated without touching the
//! network and resolves the locations of the Google credential files.

use crate::args::Args;
use crate::model::Layout;
use crate::Result;
use anyhow::{ensure, Context};
use std::path::{Path, PathBuf};
use url::Url;

const SECRETS: &str = ".secrets";
const CLIENT_SECRET_JSON: &str = "client_secret.json";
const TOKEN_JSON: &str = "token.json";

/// The validated configuration of the app. Settings that are only needed to talk to Google or
/// Telegram are optional here so that test mode can run without them; the code that builds those
/// clients reports them as missing.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    layout: Layout,
    spreadsheet_id: Option<String>,
    telegram_token: Option<String>,
    chat_id: Option<i64>,
    notify_url: Option<Url>,
    client_secret_path: PathBuf,
    token_path: PathBuf,
}

impl Config {
    /// Validates `args` and resolves file paths against the home directory.
    ///
    /// # Errors
    /// - The spreadsheet URL is present but is not a Google Sheets URL.
    /// - `recent_rows` is zero.
    /// - The value and category columns are the same column.
    pub fn new(args: &Args) -> Result<Self> {
        let root = args.home().path().to_path_buf();

        ensure!(
            args.recent_rows() > 0,
            "The number of recent rows to inspect must be greater than zero"
        );
        ensure!(
            args.value_column() != args.category_column(),
            "The value column and the category column are both {}",
            args.value_column()
        );

        let spreadsheet_id = args
            .sheet_url()
            .map(|url| {
                extract_spreadsheet_id(url)
                    .context("Failed to extract spreadsheet ID from sheet URL")
                    .map(str::to_string)
            })
            .transpose()?;

        let layout = Layout {
            sheet: args.sheet().to_string(),
            mapping_sheet: args.mapping_sheet().to_string(),
            value_column: args.value_column(),
            category_column: args.category_column(),
            recent_rows: args.recent_rows(),
            missing: args.missing_category().to_string(),
        };

        let client_secret_path = resolve(
            &root,
            args.client_secret(),
            PathBuf::from(SECRETS).join(CLIENT_SECRET_JSON),
        );
        let token_path = resolve(&root, args.token(), PathBuf::from(SECRETS).join(TOKEN_JSON));

        Ok(Self {
            root,
            layout,
            spreadsheet_id,
            telegram_token: args.telegram_token().map(str::to_string),
            chat_id: args.chat_id(),
            notify_url: args.notify_url().cloned(),
            client_secret_path,
            token_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn spreadsheet_id(&self) -> Result<&str> {
        self.spreadsheet_id
            .as_deref()
            .context("The spreadsheet URL is required, set SPREADSHEET_URL")
    }

    pub fn telegram_token(&self) -> Result<&str> {
        self.telegram_token
            .as_deref()
            .context("The Telegram bot token is required, set TELEGRAM_TOKEN")
    }

    pub fn chat_id(&self) -> Result<i64> {
        self.chat_id
            .context("The Telegram chat ID is required, set TELEGRAM_CHAT_ID")
    }

    pub fn notify_url(&self) -> Result<&Url> {
        self.notify_url
            .as_ref()
            .context("The notification webhook URL is required, set NOTIFY_URL")
    }

    pub fn client_secret_path(&self) -> &Path {
        &self.client_secret_path
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }
}

/// Returns `given` if it was provided, otherwise `default`. Relative paths are resolved against
/// `root`.
fn resolve(root: &Path, given: Option<&Path>, default: PathBuf) -> PathBuf {
    let p = given.map(Path::to_path_buf).unwrap_or(default);
    if p.is_absolute() {
        return p;
    }
    root.join(p)
}

/// Extracts the spreadsheet ID from a Google Sheets URL
///
/// # Arguments
/// * `url` - The Google Sheets URL (e.g., "https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...")
///
/// # Returns
/// The spreadsheet ID or an error if the URL format is invalid.
fn extract_spreadsheet_id(url: &str) -> Result<&str> {
    // URL format: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...
    // or: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID?foo=bar
    let parts: Vec<&str> = url.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            let id_part = parts[i + 1];
            let id = id_part
                .split(['?', '#'])
                .next()
                .unwrap_or(id_part);
            ensure!(!id.is_empty(), "The spreadsheet ID in '{url}' is empty");
            return Ok(id);
        }
    }
    Err(anyhow::anyhow!(
        "Invalid Google Sheets URL format. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["categorize", "--home", "/srv/expenses"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::new(&args(&[])).unwrap();
        assert_eq!(config.root(), Path::new("/srv/expenses"));
        assert_eq!(config.layout(), &Layout::default());
        assert_eq!(
            config.client_secret_path(),
            Path::new("/srv/expenses/.secrets/client_secret.json")
        );
        assert_eq!(
            config.token_path(),
            Path::new("/srv/expenses/.secrets/token.json")
        );
    }

    #[test]
    fn test_config_missing_services_are_reported() {
        let config = Config::new(&args(&[])).unwrap();
        let message = config.telegram_token().unwrap_err().to_string();
        assert!(message.contains("TELEGRAM_TOKEN"));
        let message = config.chat_id().unwrap_err().to_string();
        assert!(message.contains("TELEGRAM_CHAT_ID"));
        let message = config.notify_url().unwrap_err().to_string();
        assert!(message.contains("NOTIFY_URL"));
        let message = config.spreadsheet_id().unwrap_err().to_string();
        assert!(message.contains("SPREADSHEET_URL"));
    }

    #[test]
    fn test_config_paths() {
        let config = Config::new(&args(&[
            "--client-secret",
            "/etc/google/secret.json",
            "--token",
            "tokens/t.json",
        ]))
        .unwrap();
        assert_eq!(
            config.client_secret_path(),
            Path::new("/etc/google/secret.json")
        );
        assert_eq!(config.token_path(), Path::new("/srv/expenses/tokens/t.json"));
    }

    #[test]
    fn test_config_layout_from_args() {
        let config = Config::new(&args(&[
            "--sheet",
            "נוכחי",
            "--value-column",
            "B",
            "--category-column",
            "C",
            "--recent-rows",
            "7",
        ]))
        .unwrap();
        let layout = config.layout();
        assert_eq!(layout.sheet, "נוכחי");
        assert_eq!(layout.value_column, Column::new(1));
        assert_eq!(layout.category_column, Column::new(2));
        assert_eq!(layout.recent_rows, 7);
    }

    #[test]
    fn test_config_rejects_zero_rows() {
        assert!(Config::new(&args(&["--recent-rows", "0"])).is_err());
    }

    #[test]
    fn test_config_rejects_same_columns() {
        let result = Config::new(&args(&["--value-column", "E", "--category-column", "E"]));
        assert!(result.unwrap_err().to_string().contains("both E"));
    }

    #[test]
    fn test_config_spreadsheet_id() {
        let config = Config::new(&args(&[
            "--sheet-url",
            "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL/edit",
        ]))
        .unwrap();
        assert_eq!(
            config.spreadsheet_id().unwrap(),
            "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL"
        );

        let result = Config::new(&args(&["--sheet-url", "https://example.com/invalid"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        let url = "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL?foo=bar";
        let id = extract_spreadsheet_id(url).unwrap();
        assert_eq!(id, "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL");

        let url2 = "https://docs.google.com/spreadsheets/d/ABC123#gid=0";
        assert_eq!(extract_spreadsheet_id(url2).unwrap(), "ABC123");

        assert!(extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/").is_err());
        assert!(extract_spreadsheet_id("").is_err());
    }
}
