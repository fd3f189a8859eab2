//! YouTube PlaylistItems API types.

use serde::{Deserialize, Serialize};

/// Resource kind of a video, as used in [`ResourceId::kind`].
pub const VIDEO_KIND: &str = "youtube#video";

/// A `playlistItem` resource identifies a video included in a playlist.
///
/// Items are inserted with `fields=snippet`, so the item's own ID is usually absent.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub snippet: PlaylistItemSnippet,
}

/// Basic details about a playlist item.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    pub playlist_id: String,
    pub resource_id: ResourceId,
    /// The item's title, which is the title of the video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Zero-based position of the item in the playlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

/// Identifies the resource that a playlist item refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub kind: String,
    pub video_id: String,
}

/// Request body for the `playlistItems.insert` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems/insert>
#[derive(Debug, Serialize)]
pub(crate) struct PlaylistItemInsertRequest<'a> {
    pub(crate) snippet: PlaylistItemInsertSnippet<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistItemInsertSnippet<'a> {
    pub(crate) playlist_id: &'a str,
    pub(crate) resource_id: VideoResource<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoResource<'a> {
    pub(crate) kind: &'static str,
    pub(crate) video_id: &'a str,
}

impl<'a> PlaylistItemInsertRequest<'a> {
    pub(crate) fn video(playlist_id: &'a str, video_id: &'a str) -> Self {
        Self {
            snippet: PlaylistItemInsertSnippet {
                playlist_id,
                resource_id: VideoResource {
                    kind: VIDEO_KIND,
                    video_id,
                },
            },
        }
    }
}
