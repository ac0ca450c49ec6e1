//! Serialization and deserialization structures for the Google OAuth credential files.
//! - `client_secret.json`: OAuth 2.0 client credentials from Google Cloud Console
//! - `token.json`: the provisioned access and refresh tokens

use crate::api::OAUTH_SCOPES;
use crate::{utils, Result};
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// How long before the recorded expiry a token is already treated as expired.
const EXPIRY_MARGIN_MINUTES: i64 = 5;

/// Represents the structure of the `client_secret.json` file downloaded from Google Cloud Console.
///
/// The standard format from Google has an "installed" wrapper around the actual credentials.
///
/// Example:
/// ```json
/// {
///   "installed": {
///     "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
///     "client_secret": "YOUR_CLIENT_SECRET",
///     "redirect_uris": ["http://localhost"],
///     "auth_uri": "https://accounts.google.com/o/oauth2/auth",
///     "token_uri": "https://oauth2.googleapis.com/token"
///   }
/// }
/// ```
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(super) struct SecretFile {
    installed: InstalledCredentials,
}

impl SecretFile {
    pub(super) async fn load(path: &Path) -> Result<SecretFile> {
        utils::deserialize(path)
            .await
            .context("Unable to read the OAuth client secret file")
    }

    pub(super) fn client_id(&self) -> &str {
        &self.installed.client_id
    }

    pub(super) fn client_secret(&self) -> &str {
        &self.installed.client_secret
    }

    pub(super) fn token_uri(&self) -> &str {
        &self.installed.token_uri
    }
}

/// The actual OAuth credentials nested within the `client_secret.json` file.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct InstalledCredentials {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    #[serde(default)]
    auth_uri: String,
    token_uri: String,
}

/// The provisioned OAuth token, together with the path it was loaded from so that refreshed
/// tokens can be written back.
///
/// Example:
/// ```json
/// {
///   "scopes": ["https://www.googleapis.com/auth/spreadsheets"],
///   "access_token": "ya29.a0Af...",
///   "refresh_token": "1//0g...",
///   "expires_at": "2025-01-01T00:00:00Z",
///   "id_token": null
/// }
/// ```
#[derive(Debug, Clone)]
pub(super) struct TokenFile {
    path: PathBuf,
    data: TokenData,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct TokenData {
    scopes: Vec<String>,
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
    #[serde(default)]
    id_token: Option<String>,
}

impl TokenFile {
    pub(super) async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data: TokenData = utils::deserialize(&path)
            .await
            .context("Unable to deserialize the token JSON file")?;
        let token_file = Self { path, data };
        token_file.validate_scopes()?;
        Ok(token_file)
    }

    pub(super) async fn save(&self) -> Result<()> {
        utils::save_private(&self.path, &self.data).await
    }

    fn validate_scopes(&self) -> Result<()> {
        let found_scopes: HashSet<&str> = self.data.scopes.iter().map(|s| s.as_str()).collect();
        for &required_scope in OAUTH_SCOPES {
            if !found_scopes.contains(required_scope) {
                bail!("OAuth scope '{required_scope}' is missing.");
            }
        }
        Ok(())
    }

    pub(super) fn access_token(&self) -> &str {
        &self.data.access_token
    }

    pub(super) fn refresh_token(&self) -> &str {
        &self.data.refresh_token
    }

    pub(super) fn expires_at(&self) -> DateTime<Utc> {
        self.data.expires_at
    }

    /// Check if the token is expired or will expire soon (within 5 minutes)
    pub(super) fn is_expired(&self) -> bool {
        let buffer = chrono::Duration::minutes(EXPIRY_MARGIN_MINUTES);
        self.expires_at() <= Utc::now() + buffer
    }

    /// Replaces the access token. Google does not always issue a new refresh token, in which case
    /// the existing one is kept.
    pub(super) fn update(
        &mut self,
        access_token: String,
        expires_at: DateTime<Utc>,
        refresh_token: Option<String>,
    ) {
        self.data.access_token = access_token;
        self.data.expires_at = expires_at;
        if let Some(rt) = refresh_token {
            self.data.refresh_token = rt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn token_json(expires_at: &str, scopes: &[&str]) -> String {
        serde_json::json!({
            "scopes": scopes,
            "access_token": "abc12",
            "refresh_token": "xyz89",
            "expires_at": expires_at,
            "id_token": null
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_client_secret_load() {
        let json_data = r#"
{
    "installed": {
        "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
        "client_secret": "YOUR_CLIENT_SECRET",
        "redirect_uris": ["http://localhost"],
        "auth_uri": "https://accounts.google.com/o/oauth2/auth",
        "token_uri": "https://oauth2.googleapis.com/token"
    }
}
"#;
        let temp_dir = TempDir::new().unwrap();
        let p = temp_dir.path().join("client_secret.json");
        std::fs::write(&p, json_data).unwrap();
        let secret_file = SecretFile::load(&p).await.unwrap();
        assert_eq!(
            secret_file.client_id(),
            "YOUR_CLIENT_ID.apps.googleusercontent.com"
        );
        assert_eq!(secret_file.client_secret(), "YOUR_CLIENT_SECRET");
        assert_eq!(secret_file.token_uri(), "https://oauth2.googleapis.com/token");
    }

    #[tokio::test]
    async fn test_client_secret_missing_installed() {
        let temp_dir = TempDir::new().unwrap();
        let p = temp_dir.path().join("client_secret.json");
        std::fs::write(&p, r#"{"web": {}}"#).unwrap();
        assert!(SecretFile::load(&p).await.is_err());
    }

    #[tokio::test]
    async fn test_token_file_missing_scope() {
        let tmp = TempDir::new().unwrap();
        let json_path = tmp.path().join("token.json");
        let json = token_json(
            "2025-01-01T00:00:00Z",
            &["https://www.googleapis.com/auth/drive.readonly"],
        );
        std::fs::write(&json_path, json).unwrap();

        let error_message = TokenFile::load(&json_path).await.unwrap_err().to_string();
        assert!(error_message.contains("https://www.googleapis.com/auth/spreadsheets"));
    }

    #[tokio::test]
    async fn test_token_file_expiry_and_update() {
        let tmp = TempDir::new().unwrap();
        let json_path = tmp.path().join("token.json");
        let json = token_json(
            "2025-01-01T00:00:00Z",
            &["https://www.googleapis.com/auth/spreadsheets"],
        );
        std::fs::write(&json_path, json).unwrap();

        let mut token = TokenFile::load(&json_path).await.unwrap();
        assert!(token.is_expired());
        assert_eq!(token.access_token(), "abc12");

        let later = Utc::now() + chrono::Duration::hours(1);
        token.update("new-access".to_string(), later, None);
        assert!(!token.is_expired());
        assert_eq!(token.refresh_token(), "xyz89");
        token.save().await.unwrap();

        let reloaded = TokenFile::load(&json_path).await.unwrap();
        assert_eq!(reloaded.access_token(), "new-access");
        assert_eq!(reloaded.refresh_token(), "xyz89");
        assert_eq!(reloaded.expires_at(), token.expires_at());
    }

    #[tokio::test]
    async fn test_token_file_soon_to_expire() {
        let tmp = TempDir::new().unwrap();
        let json_path = tmp.path().join("token.json");
        let soon = (Utc::now() + chrono::Duration::minutes(2)).to_rfc3339();
        let json = token_json(&soon, &["https://www.googleapis.com/auth/spreadsheets"]);
        std::fs::write(&json_path, json).unwrap();

        let token = TokenFile::load(&json_path).await.unwrap();
        assert!(token.is_expired());
    }
}
