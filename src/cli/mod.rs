//! # CLI Module
//!
//! User-facing commands. Each command builds the service clients it needs from
//! the shared [`Settings`](crate::config::Settings), runs its stages in order
//! and reports progress with the logging macros from the crate root.
//!
//! ## Commands
//!
//! - [`transfer`] - The whole run: Spotify library → YouTube playlist
//! - [`auth_spotify`] / [`auth_youtube`] - Authorize one provider and cache
//!   the credential, without transferring anything
//! - [`liked`] - Print the liked-songs library as a table
//!
//! ## Error Handling
//!
//! Setup failures (configuration, authorization, fetching the library,
//! resolving the playlist) end the process through `error!` with a clear
//! message. Failures for individual tracks are reported and skipped.
//!
//! ## Usage Patterns
//!
//! ```bash
//! likesync                                  # transfer into "Spotify Liked Songs"
//! likesync transfer --playlist "From Spotify"
//! likesync auth youtube                     # re-authorize YouTube only
//! likesync liked                            # show what would be transferred
//! ```

mod auth;
mod liked;
mod transfer;

pub use auth::auth_spotify;
pub use auth::auth_youtube;
pub use liked::liked;
pub use transfer::transfer;
