//! Configuration management for likesync.
//!
//! This module handles loading configuration values from environment variables
//! and `.env` files, and turns them into a single immutable [`Settings`] value
//! that the entry point builds once and hands to every stage.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the current working directory
//! 3. `.env` file in the local data directory
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf};

use crate::errors::ConfigError;

/// Spotify account service authorization endpoint.
pub const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
/// Spotify account service token endpoint.
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
/// Spotify Web API base URL.
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
/// Scope needed to read the user's saved tracks.
pub const SPOTIFY_SCOPE: &str = "user-library-read";
/// YouTube Data API v3 base URL.
pub const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";
/// Scope needed to manage the user's playlists.
pub const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube";

const DEFAULT_SPOTIFY_REDIRECT_URI: &str = "http://localhost:8888/callback";
const DEFAULT_YOUTUBE_CLIENT_SECRET_FILE: &str = "client_secret.json";
const DEFAULT_YOUTUBE_TOKEN_FILE: &str = "token.json";
const DEFAULT_YOUTUBE_CALLBACK_PORT: u16 = 8080;

/// Loads environment variables from `.env` files.
///
/// Looks in the current working directory first and then in the
/// platform-specific local data directory under `likesync/.env`. Variables
/// already present in the process environment are never overridden, and a
/// missing file is not an error.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/likesync/.env`
/// - macOS: `~/Library/Application Support/likesync/.env`
/// - Windows: `%LOCALAPPDATA%/likesync/.env`
///
/// # Errors
///
/// Returns an error string if the data directory cannot be created or an
/// existing `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    for candidate in [PathBuf::from(".env"), path] {
        if candidate.is_file() {
            dotenv::from_path(&candidate)
                .map_err(|e| format!("{}: {}", candidate.display(), e))?;
        }
    }
    Ok(())
}

/// Returns the application's local data directory (`<data_local_dir>/likesync`).
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("likesync");
    path
}

/// Runtime settings for a single invocation.
///
/// Built once in the entry point and passed by reference to every stage.
#[derive(Debug, Clone)]
pub struct Settings {
    /// `CLIENT_ID`, required for any Spotify call.
    pub spotify_client_id: Option<String>,
    /// `CLIENT_SECRET`, required for any Spotify call.
    pub spotify_client_secret: Option<String>,
    /// `SPOTIFY_REDIRECT_URI`, must point at a local address.
    pub spotify_redirect_uri: String,
    pub spotify_token_file: PathBuf,
    /// `YOUTUBE_CLIENT_SECRET_FILE`, Google OAuth client descriptor.
    pub youtube_client_secret_file: PathBuf,
    /// `YOUTUBE_TOKEN_FILE`, cached YouTube credential.
    pub youtube_token_file: PathBuf,
    /// `YOUTUBE_CALLBACK_PORT`, local port of the YouTube callback listener.
    pub youtube_callback_port: u16,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let youtube_callback_port = match var("YOUTUBE_CALLBACK_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "YOUTUBE_CALLBACK_PORT",
                value: raw,
            })?,
            None => DEFAULT_YOUTUBE_CALLBACK_PORT,
        };

        Ok(Self {
            spotify_client_id: var("CLIENT_ID"),
            spotify_client_secret: var("CLIENT_SECRET"),
            spotify_redirect_uri: var("SPOTIFY_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_SPOTIFY_REDIRECT_URI.to_string()),
            spotify_token_file: var("SPOTIFY_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir().join("cache/spotify_token.json")),
            youtube_client_secret_file: var("YOUTUBE_CLIENT_SECRET_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_YOUTUBE_CLIENT_SECRET_FILE)),
            youtube_token_file: var("YOUTUBE_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_YOUTUBE_TOKEN_FILE)),
            youtube_callback_port,
        })
    }

    /// Returns the Spotify client id and secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first absent variable.
    pub fn spotify_credentials(&self) -> Result<(&str, &str), ConfigError> {
        let id = self
            .spotify_client_id
            .as_deref()
            .ok_or(ConfigError::Missing("CLIENT_ID"))?;
        let secret = self
            .spotify_client_secret
            .as_deref()
            .ok_or(ConfigError::Missing("CLIENT_SECRET"))?;
        Ok((id, secret))
    }

    /// Redirect URI registered for the YouTube installed-app client.
    pub fn youtube_redirect_uri(&self) -> String {
        format!("http://localhost:{}/", self.youtube_callback_port)
    }
}
