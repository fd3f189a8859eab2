//! YouTube Data API v3 client library.
//!
//! Covers what is needed to assemble a playlist: creating the playlist with
//! [`YouTubeClient::create_playlist`] and appending videos to it with
//! [`YouTubeClient::insert_playlist_item`].
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use youtube_playlist::youtube_api::{NewPlaylist, PrivacyStatus, YouTubeClient};
//!
//! # async fn example(client: YouTubeClient) -> eyre::Result<()> {
//! let playlist = client
//!     .create_playlist(&NewPlaylist {
//!         title: "Road trip".into(),
//!         description: "Songs for the drive".into(),
//!         privacy: PrivacyStatus::Unlisted,
//!     })
//!     .await?;
//! client.insert_playlist_item(&playlist.id, "dQw4w9WgXcQ").await?;
//! println!("{}", playlist.url());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod playlist_items;
pub mod playlists;

// Re-export main types for convenience
pub use client::{TimeBoundAccessToken, YOUTUBE_API_BASE, YouTubeClient};

pub use playlist_items::{PlaylistItem, PlaylistItemSnippet, ResourceId};

pub use playlists::{
    NewPlaylist, Playlist, PlaylistSnippet, PlaylistStatus, PrivacyStatus, playlist_url,
};
