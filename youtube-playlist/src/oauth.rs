//! OAuth 2.0 management for YouTube API authentication.
//!
//! This module encapsulates the OAuth operations needed to act on behalf of a YouTube user:
//! reading the application's client-secret descriptor, the initial user authorization (driven
//! through an [`AuthorizationPrompt`]), and refreshing previously issued tokens.

use crate::prompt::AuthorizationPrompt;
use eyre::Context;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{AuthUrl, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, Scope, TokenUrl};
use oauth2::{TokenResponse, reqwest};
use serde::Deserialize;
use std::path::Path;

/// File name of the client-secret descriptor inside the configuration directory.
pub const CLIENT_SECRETS_FILE: &str = "client_secrets.json";

/// Read/write access to the user's YouTube account.
pub const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube";

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

fn google_auth_url() -> String {
    GOOGLE_AUTH_URL.to_string()
}

fn google_token_url() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

/// The application's OAuth registration, as issued by the Google Cloud console.
///
/// This is the part of `client_secrets.json` that the authorization flow needs. It identifies
/// the application, not the user; per-user credentials live in the token store.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "google_auth_url")]
    pub auth_uri: String,
    #[serde(default = "google_token_url")]
    pub token_uri: String,
}

/// The on-disk layout of `client_secrets.json`.
///
/// Desktop applications get an `installed` descriptor, web applications a `web` one. Both carry
/// the same fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ClientSecretsFile {
    Installed(ClientSecrets),
    Web(ClientSecrets),
}

impl ClientSecrets {
    /// Reads the client-secret descriptor at `path`.
    pub fn load(path: &Path) -> eyre::Result<Self> {
        if !path.exists() {
            eyre::bail!("{} is missing", path.display());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read client secrets from {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("parse client secrets from {}", path.display()))
    }

    pub fn parse(contents: &str) -> eyre::Result<Self> {
        let file: ClientSecretsFile =
            serde_json::from_str(contents).context("parse client secrets descriptor")?;
        Ok(match file {
            ClientSecretsFile::Installed(secrets) | ClientSecretsFile::Web(secrets) => secrets,
        })
    }
}

/// Manages OAuth 2.0 authentication flows for YouTube API access.
///
/// The OAuthManager provides a consistent interface for both initial user authentication and
/// token refresh operations, both of which talk to the token endpoint named in the
/// [`ClientSecrets`].
#[derive(Debug, Clone)]
pub struct OAuthManager {
    secrets: ClientSecrets,
    http_client: reqwest::Client,
}

impl OAuthManager {
    /// Creates a new OAuth manager for the given application registration.
    pub fn new(secrets: ClientSecrets) -> eyre::Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build OAuth HTTP client")?;
        Ok(Self {
            secrets,
            http_client,
        })
    }

    fn auth_url(&self) -> eyre::Result<AuthUrl> {
        AuthUrl::new(self.secrets.auth_uri.clone()).context("parse authorization endpoint URL")
    }

    fn token_url(&self) -> eyre::Result<TokenUrl> {
        TokenUrl::new(self.secrets.token_uri.clone()).context("parse token endpoint URL")
    }

    /// Performs a complete OAuth 2.0 authorization flow to obtain a new access token.
    ///
    /// This method:
    /// 1. Builds an authorization URL (PKCE, random CSRF state, offline access)
    /// 2. Hands it to `prompt`, which gets the user to consent and returns the code
    /// 3. Exchanges the authorization code for an access token
    pub async fn authenticate<P>(&self, prompt: &mut P) -> eyre::Result<BasicTokenResponse>
    where
        P: AuthorizationPrompt,
    {
        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_auth_uri(self.auth_url()?)
            .set_token_uri(self.token_url()?)
            .set_redirect_uri(prompt.redirect_url());

        let csrf = CsrfToken::new_random();
        let state = csrf.clone();
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, _csrf_token) = client
            // We never re-use the CSRF since we only go through the flow exactly once.
            .authorize_url(move || state)
            .add_scope(Scope::new(YOUTUBE_SCOPE.to_string()))
            // Without offline access there is no refresh token to store.
            .add_extra_param("access_type", "offline")
            .set_pkce_challenge(pkce_challenge)
            .url();

        let authorization_code = prompt
            .authorization_code(&auth_url, &csrf)
            .await
            .context("await user authorization code")?;

        let token_result = client
            .exchange_code(authorization_code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&self.http_client)
            .await
            .context("exchange authorization code with access token")?;

        tracing::debug!("obtained new OAuth token");
        Ok(token_result)
    }

    /// Attempts to refresh an existing OAuth token using its refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(new_token))` - Refresh succeeded, new token is available
    /// * `Ok(None)` - No refresh token available, or the provider rejected it
    /// * `Err(_)` - Network or other error occurred during refresh attempt
    ///
    /// When refresh yields `None`, the token should be considered invalid and the user
    /// should be asked to re-authenticate using [`Self::authenticate`].
    pub async fn refresh_token(
        &self,
        token: &BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        let Some(refresh_token) = token.refresh_token() else {
            tracing::warn!("no refresh token available, cannot refresh");
            return Ok(None);
        };

        tracing::debug!("attempting to refresh OAuth token");

        // No redirect URL is needed for a refresh.
        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_token_uri(self.token_url()?);

        match client
            .exchange_refresh_token(refresh_token)
            .request_async(&self.http_client)
            .await
        {
            Ok(new_token) => {
                tracing::debug!("successfully refreshed OAuth token");
                Ok(Some(new_token))
            }
            Err(ref e @ oauth2::RequestTokenError::ServerResponse(ref sr))
                if matches!(
                    sr.error(),
                    oauth2::basic::BasicErrorResponseType::InvalidGrant
                ) =>
            {
                tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
                Ok(None)
            }
            Err(e) => Err(e).context("exchange refresh token"),
        }
    }
}
