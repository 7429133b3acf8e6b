//! # YouTube Integration Module
//!
//! Destination side of the transfer, built on the YouTube Data API v3.
//!
//! - [`auth`] - Google installed-app authorization against the client
//!   descriptor in `client_secret.json`, cached in `token.json`.
//! - [`YouTubeApi`] - the four calls the transfer needs, implemented by
//!   [`YouTubeClient`] and mocked in tests.
//!
//! ## API Coverage
//!
//! - `GET /playlists?mine=true` - The user's own playlists (first page only)
//! - `POST /playlists` - Create a playlist
//! - `GET /search` - Top video for a free-text query
//! - `POST /playlistItems` - Append a video to a playlist

pub mod auth;

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config,
    errors::ApiError,
    types::{
        AddPlaylistItemRequest, CreatePlaylistRequest, InsertedResource, PlaylistItemSnippet,
        PlaylistListResponse, ResourceId, SearchListResponse, SearchResult,
    },
    utils,
};

pub const VIDEO_KIND: &str = "youtube#video";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait YouTubeApi: Send + Sync {
    /// Lists the authenticated user's playlists, a single page of at most
    /// `max_results`.
    async fn list_my_playlists(&self, max_results: u32) -> Result<PlaylistListResponse, ApiError>;

    /// Creates a playlist and returns its id.
    async fn insert_playlist(&self, request: &CreatePlaylistRequest) -> Result<String, ApiError>;

    /// Searches videos, best match first.
    async fn search_videos(&self, query: &str, max_results: u32) -> Result<Vec<SearchResult>, ApiError>;

    /// Appends a video to a playlist and returns the new playlist item id.
    async fn insert_playlist_item(&self, playlist_id: &str, video_id: &str) -> Result<String, ApiError>;
}

/// Body of `playlistItems.insert` appending one video.
pub fn playlist_item_request(playlist_id: &str, video_id: &str) -> AddPlaylistItemRequest {
    AddPlaylistItemRequest {
        snippet: PlaylistItemSnippet {
            playlist_id: playlist_id.to_string(),
            resource_id: ResourceId {
                kind: VIDEO_KIND.to_string(),
                video_id: Some(video_id.to_string()),
            },
        },
    }
}

/// Authenticated YouTube Data API client.
pub struct YouTubeClient {
    http: Client,
    access_token: String,
    api_url: String,
}

impl YouTubeClient {
    pub fn new(http: Client, access_token: impl Into<String>) -> Self {
        YouTubeClient {
            http,
            access_token: access_token.into(),
            api_url: config::YOUTUBE_API_URL.to_string(),
        }
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{}", self.api_url, resource)
    }
}

#[async_trait]
impl YouTubeApi for YouTubeClient {
    async fn list_my_playlists(&self, max_results: u32) -> Result<PlaylistListResponse, ApiError> {
        let max_results = max_results.to_string();
        let response = self
            .http
            .get(self.endpoint("playlists"))
            .bearer_auth(&self.access_token)
            .query(&[
                ("part", "snippet"),
                ("mine", "true"),
                ("maxResults", max_results.as_str()),
            ])
            .send()
            .await?;

        utils::read_json("YouTube", response).await
    }

    async fn insert_playlist(&self, request: &CreatePlaylistRequest) -> Result<String, ApiError> {
        let response = self
            .http
            .post(self.endpoint("playlists"))
            .bearer_auth(&self.access_token)
            .query(&[("part", "snippet,status")])
            .json(request)
            .send()
            .await?;

        let created: InsertedResource = utils::read_json("YouTube", response).await?;
        Ok(created.id)
    }

    async fn search_videos(&self, query: &str, max_results: u32) -> Result<Vec<SearchResult>, ApiError> {
        let max_results = max_results.to_string();
        let response = self
            .http
            .get(self.endpoint("search"))
            .bearer_auth(&self.access_token)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", query),
                ("maxResults", max_results.as_str()),
            ])
            .send()
            .await?;

        let results: SearchListResponse = utils::read_json("YouTube", response).await?;
        Ok(results.items)
    }

    async fn insert_playlist_item(&self, playlist_id: &str, video_id: &str) -> Result<String, ApiError> {
        let body = playlist_item_request(playlist_id, video_id);

        let response = self
            .http
            .post(self.endpoint("playlistItems"))
            .bearer_auth(&self.access_token)
            .query(&[("part", "snippet")])
            .json(&body)
            .send()
            .await?;

        let created: InsertedResource = utils::read_json("YouTube", response).await?;
        Ok(created.id)
    }
}
