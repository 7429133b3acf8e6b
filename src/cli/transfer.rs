use reqwest::Client;
use tabled::Table;

use crate::{
    config::Settings,
    error, info,
    spotify::{self, SpotifyClient},
    success,
    transfer::{self, RunOutcome, TransferReport},
    warning,
    youtube::{self, YouTubeClient},
};

/// Copies the Spotify liked-songs library into the YouTube playlist `playlist_name`.
///
/// Runs the four stages in order, each exactly once:
/// 1. authorize Spotify and fetch every liked song
/// 2. authorize YouTube (cached, refreshed, or interactive)
/// 3. find the playlist by exact title or create it
/// 4. search and insert each track, one at a time
///
/// Stages 1-3 abort the run on failure; stage 4 logs and skips failing tracks
/// and prints a summary at the end. Running it twice inserts every track twice.
pub async fn transfer(settings: &Settings, playlist_name: &str) {
    let http = Client::new();

    let spotify_token = match spotify::auth::authenticate(settings, http.clone(), false).await {
        Ok(token) => token,
        Err(e) => error!("Spotify authentication failed: {}", e),
    };
    let spotify = SpotifyClient::new(http.clone(), &spotify_token.access_token);

    let connect = move || async move {
        youtube::auth::authenticate(settings, http.clone(), false)
            .await
            .map(|credential| YouTubeClient::new(http, credential.token))
    };

    match transfer::run(&spotify, connect, playlist_name).await {
        Ok(RunOutcome::EmptyLibrary) => info!("Nothing to transfer."),
        Ok(RunOutcome::Completed { report, .. }) => print_summary(&report, playlist_name),
        Err(e) => error!("{}", e),
    }
}

fn print_summary(report: &TransferReport, playlist_name: &str) {
    success!(
        "Added {} of {} songs to '{}'",
        report.added.len(),
        report.total(),
        playlist_name
    );

    let missing = report.missing_rows();
    if missing.is_empty() {
        return;
    }

    warning!(
        "{} songs skipped (no results), {} failed:",
        report.skipped.len(),
        report.failed.len()
    );
    println!("{}", Table::new(&missing));
}
