//! Typed errors for the three failure domains of a run.
//!
//! - [`ConfigError`] - the environment or an on-disk descriptor is unusable.
//! - [`ApiError`] - a Spotify or YouTube REST call failed.
//! - [`AuthError`] - obtaining a credential for either provider failed.
//! - [`TransferError`] - one of the setup stages of a transfer run failed.
//!
//! Whole-run setup failures surface as one of these and abort the run with a
//! diagnostic; per-track failures during a transfer are logged and skipped.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("environment variable {name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("cannot read client secret file {path}: {source}")]
    ClientSecretUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("client secret file {path} is malformed: {reason}")]
    ClientSecretMalformed { path: PathBuf, reason: String },

    #[error("redirect URI {0} must point at a local http address")]
    RedirectUri(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{provider} authorization was denied: {reason}")]
    Denied {
        provider: &'static str,
        reason: String,
    },

    #[error("timed out waiting for the {0} authorization callback")]
    Timeout(&'static str),

    #[error("{0} authorization callback carried an unexpected state")]
    StateMismatch(&'static str),

    #[error("{provider} token endpoint returned HTTP {status}: {body}")]
    TokenRejected {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} token request failed: {source}")]
    TokenRequest {
        provider: &'static str,
        source: ApiError,
    },

    #[error("cannot start callback server on {addr}: {source}")]
    Server {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("failed to persist credential to {path}: {reason}")]
    Persist { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Failed to fetch liked songs: {0}")]
    Library(#[source] ApiError),

    #[error("YouTube authentication failed: {0}")]
    Destination(#[source] AuthError),

    #[error("Failed to resolve playlist '{name}': {source}")]
    Playlist { name: String, source: ApiError },
}
