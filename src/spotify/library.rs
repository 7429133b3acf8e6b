use crate::{errors::ApiError, spotify::LibraryApi, types::Track, warning};

/// Retrieves the user's complete liked-songs library.
///
/// Requests the first page of saved tracks and keeps following the `next`
/// link until the service reports there is none. Every item contributes its
/// track title and the name of its first-listed artist, in service order.
///
/// # Arguments
///
/// * `api` - Authenticated library source, normally a [`SpotifyClient`](super::SpotifyClient)
///
/// # Returns
///
/// The concatenation of all pages. Items without a track (content removed
/// from Spotify) are skipped with a warning; nothing else is dropped or merged.
///
/// # Errors
///
/// Any failed page aborts the whole fetch: a partial library is useless for
/// mirroring.
///
/// # Example
///
/// ```
/// let client = SpotifyClient::new(http, &token.access_token);
/// let tracks = fetch_liked_tracks(&client).await?;
/// ```
pub async fn fetch_liked_tracks<L>(api: &L) -> Result<Vec<Track>, ApiError>
where
    L: LibraryApi + ?Sized,
{
    let mut tracks: Vec<Track> = Vec::new();
    let mut next: Option<String> = None;

    loop {
        let page = api.saved_tracks_page(next.take()).await?;

        for item in page.items {
            match item.track {
                Some(track) => tracks.push(Track::from(track)),
                None => warning!(
                    "Skipping a saved item without track data (added {})",
                    item.added_at.as_deref().unwrap_or("at an unknown time")
                ),
            }
        }

        match page.next {
            Some(url) => next = Some(url),
            None => break,
        }
    }

    Ok(tracks)
}
