//! YouTube Playlists API types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `playlist` resource represents a YouTube playlist.
///
/// Playlists are created with `fields=id`, so only the ID is guaranteed to be present in
/// responses.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    /// The ID that YouTube uses to uniquely identify the playlist.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<PlaylistSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PlaylistStatus>,
}

impl Playlist {
    /// The public URL of this playlist.
    pub fn url(&self) -> String {
        playlist_url(&self.id)
    }
}

/// Returns the public URL of the playlist with the given ID.
pub fn playlist_url(playlist_id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={playlist_id}")
}

/// Basic details about a playlist.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// See: <https://developers.google.com/youtube/v3/docs/playlists#status>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistStatus {
    pub privacy_status: PrivacyStatus,
}

/// Who can see a playlist.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrivacyStatus {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl PrivacyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::Public => "public",
            PrivacyStatus::Unlisted => "unlisted",
            PrivacyStatus::Private => "private",
        }
    }
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyStatus {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(PrivacyStatus::Public),
            "unlisted" => Ok(PrivacyStatus::Unlisted),
            "private" => Ok(PrivacyStatus::Private),
            _ => Err(eyre::eyre!(
                "unknown privacy status '{s}' (expected public, unlisted, or private)"
            )),
        }
    }
}

/// What to create with `playlists.insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlaylist {
    pub title: String,
    pub description: String,
    pub privacy: PrivacyStatus,
}

/// Request body for the `playlists.insert` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists/insert>
#[derive(Debug, Serialize)]
pub(crate) struct PlaylistInsertRequest<'a> {
    pub(crate) snippet: PlaylistInsertSnippet<'a>,
    pub(crate) status: PlaylistStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct PlaylistInsertSnippet<'a> {
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
}

impl<'a> From<&'a NewPlaylist> for PlaylistInsertRequest<'a> {
    fn from(playlist: &'a NewPlaylist) -> Self {
        Self {
            snippet: PlaylistInsertSnippet {
                title: &playlist.title,
                description: &playlist.description,
            },
            status: PlaylistStatus {
                privacy_status: playlist.privacy,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn insert_request_body() {
        let new = NewPlaylist {
            title: "My List".into(),
            description: "Desc".into(),
            privacy: PrivacyStatus::Public,
        };
        let body = serde_json::to_value(PlaylistInsertRequest::from(&new)).unwrap();
        assert_eq!(
            body,
            json!({
                "snippet": { "title": "My List", "description": "Desc" },
                "status": { "privacyStatus": "public" }
            })
        );
    }

    #[test]
    fn id_only_response() {
        let playlist: Playlist = serde_json::from_value(json!({ "id": "PL123" })).unwrap();
        assert_eq!(playlist.id, "PL123");
        assert!(playlist.snippet.is_none());
        assert_eq!(playlist.url(), "https://www.youtube.com/playlist?list=PL123");
    }

    #[test]
    fn privacy_from_str() {
        assert_eq!(" Public ".parse::<PrivacyStatus>().unwrap(), PrivacyStatus::Public);
        assert_eq!("private".parse::<PrivacyStatus>().unwrap(), PrivacyStatus::Private);
        assert!("friends".parse::<PrivacyStatus>().is_err());
    }

    #[test]
    fn privacy_displays_as_sent_to_api() {
        for privacy in [
            PrivacyStatus::Public,
            PrivacyStatus::Unlisted,
            PrivacyStatus::Private,
        ] {
            assert_eq!(json!(privacy.to_string()), json!(privacy));
            assert_eq!(privacy.to_string().parse::<PrivacyStatus>().unwrap(), privacy);
        }
    }
}
