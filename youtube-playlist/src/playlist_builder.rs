//! Creating a playlist and filling it with the videos from a results file.

use crate::source::{SourceFormat, read_source_file};
use crate::youtube_api::{NewPlaylist, Playlist, PlaylistItem, YouTubeClient};
use eyre::Context;
use std::future::Future;
use std::path::Path;

/// The two remote operations the builder relies on.
///
/// Implemented by [`YouTubeClient`]; anything else implementing it can stand in for YouTube.
pub trait PlaylistService {
    fn create_playlist(
        &self,
        playlist: &NewPlaylist,
    ) -> impl Future<Output = eyre::Result<Playlist>>;

    fn insert_playlist_item(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> impl Future<Output = eyre::Result<PlaylistItem>>;
}

impl PlaylistService for YouTubeClient {
    async fn create_playlist(&self, playlist: &NewPlaylist) -> eyre::Result<Playlist> {
        YouTubeClient::create_playlist(self, playlist).await
    }

    async fn insert_playlist_item(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> eyre::Result<PlaylistItem> {
        YouTubeClient::insert_playlist_item(self, playlist_id, video_id).await
    }
}

/// A video that made it into the playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedVideo {
    pub video_id: String,
    /// The video's title, as reported back by the service.
    pub title: Option<String>,
}

/// Outcome of a completed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub playlist_id: String,
    pub playlist_url: String,
    /// Videos in the order they were added.
    pub added: Vec<AddedVideo>,
}

/// Creates the empty playlist described by `playlist`.
pub async fn create_empty_playlist<S>(
    service: &S,
    playlist: &NewPlaylist,
) -> eyre::Result<Playlist>
where
    S: PlaylistService,
{
    let created = service
        .create_playlist(playlist)
        .await
        .with_context(|| format!("create playlist '{}'", playlist.title))?;
    tracing::info!(
        title = playlist.title,
        privacy = %playlist.privacy,
        id = created.id,
        url = %created.url(),
        "new playlist added"
    );
    Ok(created)
}

/// Appends one video to the end of an existing playlist.
pub async fn add_video<S>(
    service: &S,
    playlist_id: &str,
    video_id: &str,
) -> eyre::Result<AddedVideo>
where
    S: PlaylistService,
{
    tracing::info!(playlist_id, video_id, "adding video");
    let item = service
        .insert_playlist_item(playlist_id, video_id)
        .await
        .with_context(|| format!("add video {video_id} to playlist {playlist_id}"))?;
    let title = item.snippet.title;
    tracing::info!(
        video_id,
        title = title.as_deref().unwrap_or("<untitled>"),
        "video added"
    );
    Ok(AddedVideo {
        video_id: video_id.to_string(),
        title,
    })
}

/// Creates `playlist` and appends `videos` to it, one request per video, in order.
///
/// Nothing is inserted unless the playlist was created. The first failing insert aborts the
/// batch; the playlist and the videos already added to it are left in place.
pub async fn build_playlist<S>(
    service: &S,
    playlist: &NewPlaylist,
    videos: &[String],
) -> eyre::Result<BuildSummary>
where
    S: PlaylistService,
{
    let created = create_empty_playlist(service, playlist).await?;

    let mut added = Vec::with_capacity(videos.len());
    for video_id in videos {
        added.push(add_video(service, &created.id, video_id).await?);
    }

    Ok(BuildSummary {
        playlist_url: created.url(),
        playlist_id: created.id,
        added,
    })
}

/// Reads the video identifiers listed in `source`, warning about lines that had to be skipped.
pub async fn read_video_list(source: &Path, format: &SourceFormat) -> eyre::Result<Vec<String>> {
    let parsed = read_source_file(source, format).await?;
    if !parsed.malformed.is_empty() {
        tracing::warn!(
            skipped = parsed.malformed.len(),
            "some video lines could not be read"
        );
    }
    tracing::info!(
        videos = parsed.videos.len(),
        source = %source.display(),
        "read video list"
    );
    Ok(parsed.videos)
}

/// Reads the videos listed in `source` and builds `playlist` from them.
///
/// The source is read before anything is sent to the service, so an unreadable source file
/// leaves no playlist behind.
pub async fn create_playlist_from_source<S>(
    service: &S,
    playlist: &NewPlaylist,
    source: &Path,
    format: &SourceFormat,
) -> eyre::Result<BuildSummary>
where
    S: PlaylistService,
{
    let videos = read_video_list(source, format).await?;
    build_playlist(service, playlist, &videos).await
}
