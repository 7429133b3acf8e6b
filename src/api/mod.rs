//! # API Module
//!
//! HTTP handlers for the short-lived local server that receives OAuth
//! redirects from Spotify and Google during an interactive authorization.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the provider redirect, validates the `state`
//!   parameter and records the authorization code (or the denial) in the
//!   shared [`PendingAuth`](crate::types::PendingAuth). The code exchange itself
//!   happens in [`crate::oauth`] once the flow sees the outcome.
//! - [`health`] - Reports status and version, handy for checking that the
//!   callback port is actually ours.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Extension, Router, routing::get};
//! use likesync::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/health", get(health))
//!     .route("/callback", get(callback).layer(Extension(state)));
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
