//! Spotify Liked Songs to YouTube CLI Library
//!
//! This library provides the building blocks for copying a user's Spotify
//! liked songs into a YouTube playlist. It includes modules for both providers'
//! OAuth flows, their REST APIs, credential caching, and the transfer logic
//! that glues the two together.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `errors` - Typed errors for API calls, authentication and configuration
//! - `management` - Local credential caching
//! - `oauth` - Provider-agnostic OAuth 2.0 authorization-code flow
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client (source library)
//! - `transfer` - Playlist resolution and track transfer
//! - `types` - Data structures and wire formats
//! - `utils` - Utility functions and helpers
//! - `youtube` - YouTube Data API client (destination playlist)
//!
//! # Example
//!
//! ```
//! use likesync::{cli, config};
//!
//! #[tokio::main]
//! async fn main() -> likesync::Res<()> {
//!     config::load_env().await?;
//!     let settings = config::Settings::from_env()?;
//!     cli::transfer(&settings, "Spotify Liked Songs").await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod management;
pub mod oauth;
pub mod server;
pub mod spotify;
pub mod transfer;
pub mod types;
pub mod utils;
pub mod youtube;

/// A convenient Result type alias for operations that may fail.
///
/// Provides a standard error handling pattern for orchestration code using a
/// boxed dynamic error trait object. Lower layers return the typed errors from
/// [`errors`], which convert into this alias with `?`.
///
/// # Example
///
/// ```
/// use likesync::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching liked songs...");
/// info!("Found {} tracks", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Authentication completed successfully");
/// success!("Added {} tracks", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Terminates the process with exit code 1 after printing. Only used for
/// whole-run setup failures (authentication, fetching the library, resolving
/// the playlist) where continuing would be meaningless.
///
/// # Example
///
/// ```
/// error!("Spotify authentication failed: {}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues, e.g. a track that could not be transferred or
/// a credential cache that could not be parsed.
///
/// # Example
///
/// ```
/// warning!("Credential cache is corrupt, starting a new authorization");
/// warning!("Failed to add {}: {}", track, e);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
