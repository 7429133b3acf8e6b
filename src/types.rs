use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use tokio::sync::Mutex;

/// A liked song as read from the source library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub artist: String,
}

impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Track {
            title: title.into(),
            artist: artist.into(),
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.artist.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} - {}", self.artist, self.title)
        }
    }
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub position: usize,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Artist")]
    pub artist: String,
}

#[derive(Tabled)]
pub struct SkippedTrackRow {
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Artist")]
    pub artist: String,
    #[tabled(rename = "Reason")]
    pub reason: String,
}

// ---- OAuth ----

/// Response body of an OAuth 2.0 token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Cached Spotify credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

/// Cached YouTube credential in Google's "authorized user" JSON layout, so the
/// file stays interchangeable with Google's own client libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

/// Google OAuth client descriptor (`client_secret.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecretFile {
    pub installed: Option<ClientDescriptor>,
    pub web: Option<ClientDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientDescriptor {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// What the local callback server received from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    Denied(String),
    StateMismatch,
}

/// An authorization in flight, shared between the flow and the callback handler.
#[derive(Debug, Clone)]
pub struct PendingAuth {
    pub expected_state: String,
    pub outcome: Option<CallbackOutcome>,
}

pub type SharedAuth = Arc<Mutex<Option<PendingAuth>>>;

// ---- Spotify ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTracksPage {
    pub items: Vec<SavedTrackItem>,
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTrackItem {
    #[serde(default)]
    pub added_at: Option<String>,
    pub track: Option<SpotifyTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTrack {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

impl From<SpotifyTrack> for Track {
    fn from(track: SpotifyTrack) -> Self {
        let artist = track
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default();
        Track {
            title: track.name,
            artist,
        }
    }
}

// ---- YouTube ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistListResponse {
    #[serde(default)]
    pub items: Vec<Playlist>,
    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub snippet: PlaylistSnippet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub snippet: CreatePlaylistSnippet,
    pub status: PlaylistStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistSnippet {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub default_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistStatus {
    pub privacy_status: String,
}

/// Any inserted YouTube resource; only the id is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertedResource {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: ResourceId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPlaylistItemRequest {
    pub snippet: PlaylistItemSnippet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    pub playlist_id: String,
    pub resource_id: ResourceId,
}
