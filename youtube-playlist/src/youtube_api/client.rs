//! Core YouTube API client functionality and authentication management.

use crate::oauth::OAuthManager;
use crate::youtube_api::{
    playlist_items::{PlaylistItem, PlaylistItemInsertRequest},
    playlists::{NewPlaylist, Playlist, PlaylistInsertRequest},
};
use eyre::Context;
use http::Method;
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::instrument;

/// Base URL of the YouTube Data API v3.
pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone)]
pub struct TimeBoundAccessToken {
    /// The current OAuth2 token
    token: BasicTokenResponse,
    /// When the current access token expires (with safety buffer)
    expires_at: SystemTime,
}

impl TimeBoundAccessToken {
    /// Creates a new YouTube token that is already expired, forcing immediate refresh.
    ///
    /// This is used for tokens loaded from storage, whose issue time is not known.
    pub fn expired(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: SystemTime::UNIX_EPOCH,
            token,
        }
    }

    /// Creates a new YouTube token with calculated expiry time.
    ///
    /// The expiry time is calculated from the token's `expires_in` field minus
    /// a 5-minute safety buffer to prevent edge-case failures.
    pub fn new(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Self::calculate_token_expiry(&token),
            token,
        }
    }

    pub fn raw_token(&self) -> &BasicTokenResponse {
        &self.token
    }

    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }

    /// Refreshes this token using the provided OAuth manager, preserving the refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Token was successfully refreshed
    /// * `Ok(false)` - Refresh failed (invalid grant, no refresh token, etc.)
    /// * `Err(_)` - Network or other error occurred
    pub async fn refresh(&mut self, oauth_manager: &OAuthManager) -> eyre::Result<bool> {
        tracing::trace!("refreshing token");
        match oauth_manager
            .refresh_token(&self.token)
            .await
            .context("refresh OAuth token")?
        {
            Some(new_token) => {
                let old_token = std::mem::replace(&mut self.token, new_token);

                // Google usually omits the refresh token from refresh responses.
                if self.token.refresh_token().is_none() {
                    tracing::trace!("new token lacks refresh token, preserving original");
                    self.token
                        .set_refresh_token(old_token.refresh_token().cloned());
                } else {
                    tracing::debug!("new token includes refresh token");
                }

                self.expires_at = Self::calculate_token_expiry(&self.token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Uses the current time + expires_in duration - 5 minute safety buffer.
    /// If no expires_in is provided, assumes a conservative 55-minute lifetime.
    fn calculate_token_expiry(token: &BasicTokenResponse) -> SystemTime {
        let now = SystemTime::now();
        if let Some(expires_in) = token.expires_in() {
            now + expires_in.saturating_sub(Duration::from_secs(300))
        } else {
            now + Duration::from_secs(3300)
        }
    }
}

/// Client for the parts of the YouTube Data API v3 needed to build playlists.
///
/// Every request carries the OAuth2 bearer token and the application's API key. The client
/// refreshes the access token through the [`OAuthManager`] when it expires during a run.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    token: Arc<Mutex<TimeBoundAccessToken>>,
    oauth_manager: Arc<OAuthManager>,
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl YouTubeClient {
    /// Creates a new YouTube API client.
    ///
    /// # Arguments
    ///
    /// * `token` - The user's OAuth2 token
    /// * `oauth_manager` - OAuth manager for token refresh operations
    /// * `client` - HTTP client for making API requests
    /// * `api_key` - Developer key sent as the `key` query parameter
    pub fn new(
        token: TimeBoundAccessToken,
        oauth_manager: Arc<OAuthManager>,
        client: reqwest::Client,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            token: Arc::new(Mutex::new(token)),
            oauth_manager,
            client,
            api_key: api_key.into(),
            api_base: YOUTUBE_API_BASE.to_string(),
        }
    }

    /// Sends requests to `api_base` instead of [`YOUTUBE_API_BASE`].
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns a clone of the underlying OAuth2 token.
    pub async fn token(&self) -> BasicTokenResponse {
        self.token.lock().await.token.clone()
    }

    /// Gets a guaranteed-fresh access token, refreshing if necessary.
    #[instrument(skip(self))]
    async fn fresh_access_token(&self) -> eyre::Result<String> {
        let mut token = self.token.lock().await;

        if token.is_expired() {
            tracing::debug!("access token expired, attempting refresh");

            if token.refresh(&self.oauth_manager).await? {
                tracing::debug!("access token successfully refreshed");
            } else {
                tracing::error!("access token refresh failed, client is unusable");
                return Err(eyre::eyre!("Unable to refresh expired access token"));
            }
        }

        Ok(token.token.access_token().secret().to_string())
    }

    /// Makes an authenticated HTTP request to the YouTube API.
    ///
    /// Adds the bearer token and API key, sends `query_params` and (if given) a JSON body, and
    /// turns any non-success status into an error carrying the response text.
    #[instrument(skip(self, json_body), level = tracing::Level::TRACE)]
    async fn make_authenticated_request(
        &self,
        method: Method,
        path: &str,
        query_params: &[(&str, &str)],
        json_body: Option<&impl Serialize>,
    ) -> eyre::Result<reqwest::Response> {
        let access_token = self.fresh_access_token().await?;
        let url = format!("{}/{}", self.api_base, path);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("Authorization", format!("Bearer {}", access_token))
            .query(&[("key", self.api_key.as_str())])
            .query(query_params);

        if let Some(body) = json_body {
            request = request
                .header("Content-Type", "application/json")
                .json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("send {} request to YouTube API: {}", method, url))?;

        let status_code = response.status();
        if !status_code.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(eyre::eyre!(
                "YouTube API {} request failed with status {}: {}",
                method,
                status_code,
                error_text
            ));
        }

        Ok(response)
    }

    /// Creates a playlist on the authenticated user's channel.
    ///
    /// Only the ID of the new playlist is requested back.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlists/insert>
    #[instrument(skip(self), ret)]
    pub async fn create_playlist(&self, playlist: &NewPlaylist) -> eyre::Result<Playlist> {
        let query_params = [("part", "snippet,status"), ("fields", "id")];
        let body = PlaylistInsertRequest::from(playlist);

        let response = self
            .make_authenticated_request(Method::POST, "playlists", &query_params, Some(&body))
            .await?;

        let playlist: Playlist = response
            .json()
            .await
            .context("parse YouTube API playlist insert response as JSON")?;

        tracing::debug!(playlist_id = playlist.id, "successfully created playlist");

        Ok(playlist)
    }

    /// Appends a video to the end of a playlist.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlistItems/insert>
    #[instrument(skip(self), ret)]
    pub async fn insert_playlist_item(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> eyre::Result<PlaylistItem> {
        let query_params = [("part", "snippet"), ("fields", "snippet")];
        let body = PlaylistItemInsertRequest::video(playlist_id, video_id);

        let response = self
            .make_authenticated_request(Method::POST, "playlistItems", &query_params, Some(&body))
            .await?;

        let item: PlaylistItem = response
            .json()
            .await
            .context("parse YouTube API playlist item insert response as JSON")?;

        tracing::debug!(playlist_id, video_id, "successfully inserted playlist item");

        Ok(item)
    }
}
