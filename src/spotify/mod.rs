//! # Spotify Integration Module
//!
//! Source side of the transfer: authorization against the Spotify account
//! service and read access to the user's saved ("liked") tracks.
//!
//! ## Core Modules
//!
//! - [`auth`] - Authorization-code flow with the client id/secret from the
//!   environment, cached in the local data directory and refreshed silently
//!   when it expires.
//! - [`library`] - Walks the paginated `GET /me/tracks` collection and turns it
//!   into an ordered list of [`Track`](crate::types::Track)s.
//!
//! ## API Coverage
//!
//! - `GET /me/tracks` - Saved tracks, 50 per page, following `next` links
//! - `POST /api/token` - Code exchange and token refresh
//!
//! ## Seams
//!
//! Library paging goes through the [`LibraryApi`] trait so it can be exercised
//! against scripted pages in tests; [`SpotifyClient`] is the real
//! implementation.

pub mod auth;
pub mod library;

use async_trait::async_trait;
use reqwest::Client;

use crate::{config, errors::ApiError, types::SavedTracksPage, utils};

/// Saved tracks requested per page (the endpoint maximum).
pub const SAVED_TRACKS_PAGE_SIZE: u32 = 50;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryApi: Send + Sync {
    /// Fetches one page of saved tracks: the first page when `next` is `None`,
    /// otherwise the page behind the `next` URL of the previous one.
    async fn saved_tracks_page(&self, next: Option<String>) -> Result<SavedTracksPage, ApiError>;
}

/// Authenticated Spotify Web API client.
pub struct SpotifyClient {
    http: Client,
    access_token: String,
    api_url: String,
}

impl SpotifyClient {
    pub fn new(http: Client, access_token: impl Into<String>) -> Self {
        SpotifyClient {
            http,
            access_token: access_token.into(),
            api_url: config::SPOTIFY_API_URL.to_string(),
        }
    }
}

#[async_trait]
impl LibraryApi for SpotifyClient {
    async fn saved_tracks_page(&self, next: Option<String>) -> Result<SavedTracksPage, ApiError> {
        let url = next.unwrap_or_else(|| {
            format!(
                "{uri}/me/tracks?limit={limit}",
                uri = self.api_url,
                limit = SAVED_TRACKS_PAGE_SIZE
            )
        });

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        utils::read_json("Spotify", response).await
    }
}
