//! Build a YouTube playlist from a list of video URLs.
//!
//! The batch runs in four steps:
//!
//! 1. [`config::Config::load`] reads the API key and playlist metadata from `settings.cfg`.
//! 2. [`authorize_youtube_client`] reuses (or interactively obtains) an OAuth token and returns
//!    an authorized [`YouTubeClient`].
//! 3. [`source::read_source_file`] extracts the video identifiers from `results.txt`.
//! 4. [`playlist_builder::build_playlist`] creates the playlist and appends each video in order.

use crate::oauth::{ClientSecrets, OAuthManager};
use crate::prompt::AuthorizationPrompt;
use crate::token_store::FileTokenStore;
use crate::youtube_api::{TimeBoundAccessToken, YouTubeClient};
use eyre::Context;
use std::path::Path;
use std::sync::Arc;

pub mod config;
pub mod oauth;
pub mod playlist_builder;
pub mod prompt;
pub mod source;
pub mod token_store;
pub mod youtube_api;

#[cfg(test)]
mod test_support;

/// Sets up a [`YouTubeClient`] acting on behalf of the user.
///
/// A token found in `store` is refreshed and reused. When there is none, or the provider no
/// longer accepts it, the user is taken through the consent flow via `prompt`. Either way the
/// resulting token is written back to `store`.
///
/// The client-secret descriptor is read first, so a missing descriptor fails before the user is
/// asked for anything.
pub async fn authorize_youtube_client<P>(
    api_key: &str,
    client_secrets: &Path,
    store: &FileTokenStore,
    prompt: &mut P,
    http_client: reqwest::Client,
) -> eyre::Result<YouTubeClient>
where
    P: AuthorizationPrompt,
{
    let secrets = ClientSecrets::load(client_secrets)?;
    let oauth_manager = OAuthManager::new(secrets)?;

    let token = match store.load().await.context("load stored OAuth token")? {
        Some(stored) => {
            // We don't know when a stored token was issued, so always refresh it.
            tracing::info!("refreshing stored OAuth token");
            let mut token = TimeBoundAccessToken::expired(stored);
            if token
                .refresh(&oauth_manager)
                .await
                .context("refresh token")?
            {
                tracing::debug!("successfully refreshed stored token");
                token
            } else {
                tracing::warn!("stored token is no longer valid, getting new token via full OAuth");
                let raw_token = oauth_manager
                    .authenticate(prompt)
                    .await
                    .context("authorize user to YouTube")?;
                TimeBoundAccessToken::new(raw_token)
            }
        }
        None => {
            tracing::info!("no stored OAuth token, asking user to authorize");
            let raw_token = oauth_manager
                .authenticate(prompt)
                .await
                .context("authorize user to YouTube")?;
            TimeBoundAccessToken::new(raw_token)
        }
    };

    store
        .save(token.raw_token())
        .await
        .context("persist OAuth token")?;

    Ok(YouTubeClient::new(
        token,
        Arc::new(oauth_manager),
        http_client,
        api_key,
    ))
}
