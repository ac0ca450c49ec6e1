//! Keeps the provisioned Google OAuth access token fresh.
//!
//! The credential files are provisioned ahead of time, so there is no consent flow here. When the
//! access token is about to expire it is exchanged for a new one using the refresh token, and the
//! result is written back to the token file.

use crate::api::files::{SecretFile, TokenFile};
use crate::Result;
use anyhow::Context;
use chrono::Utc;
use oauth2::basic::BasicClient;
use oauth2::{ClientId, ClientSecret, RefreshToken, TokenResponse, TokenUrl};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Google access tokens last one hour; used when the token response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Holds the OAuth client credentials and the current token, refreshing the token on demand.
pub(crate) struct TokenProvider {
    secret: SecretFile,
    token: TokenFile,
    http: reqwest::Client,
}

impl TokenProvider {
    /// Loads the client secret and token files. Fails if either is missing or malformed, or if the
    /// token lacks the spreadsheets scope.
    pub(crate) async fn load(client_secret_path: &Path, token_path: &Path) -> Result<Self> {
        let secret = SecretFile::load(client_secret_path).await.with_context(|| {
            format!(
                "The OAuth client secret could not be loaded from {}",
                client_secret_path.display()
            )
        })?;
        let token = TokenFile::load(token_path).await.with_context(|| {
            format!(
                "The OAuth token could not be loaded from {}",
                token_path.display()
            )
        })?;

        // The token endpoint must not be followed through redirects.
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Unable to build the HTTP client for OAuth")?;

        Ok(Self {
            secret,
            token,
            http,
        })
    }

    /// The current access token, which may be expired.
    pub(crate) fn token(&self) -> &str {
        self.token.access_token()
    }

    /// The current access token, refreshed first if it expires within the next few minutes.
    pub(crate) async fn token_with_refresh(&mut self) -> Result<&str> {
        if self.token.is_expired() {
            self.refresh().await?;
        }
        Ok(self.token())
    }

    /// Exchanges the refresh token for a new access token and saves it to the token file.
    pub(crate) async fn refresh(&mut self) -> Result<()> {
        debug!("Refreshing the OAuth access token");
        let token_url = TokenUrl::new(self.secret.token_uri().to_string())
            .context("The token_uri in the OAuth client secret is not a valid URL")?;
        let client = BasicClient::new(ClientId::new(self.secret.client_id().to_string()))
            .set_client_secret(ClientSecret::new(self.secret.client_secret().to_string()))
            .set_token_uri(token_url);

        let refresh_token = RefreshToken::new(self.token.refresh_token().to_string());
        let response = client
            .exchange_refresh_token(&refresh_token)
            .request_async(&self.http)
            .await
            .map_err(|e| anyhow::anyhow!("Unable to refresh the OAuth access token: {e}"))?;

        let lifetime = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let expires_at = Utc::now()
            + chrono::Duration::from_std(lifetime).context("Token lifetime is out of range")?;
        self.token.update(
            response.access_token().secret().to_string(),
            expires_at,
            response.refresh_token().map(|rt| rt.secret().to_string()),
        );
        self.token.save().await?;
        info!("OAuth access token refreshed, valid until {expires_at}");
        Ok(())
    }
}
