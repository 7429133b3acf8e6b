use reqwest::Client;
use tabled::Table;

use crate::{
    config::Settings,
    error, info,
    spotify::{self, SpotifyClient, library::fetch_liked_tracks},
    types::TrackTableRow,
    utils,
};

pub async fn liked(settings: &Settings) {
    let http = Client::new();

    let token = match spotify::auth::authenticate(settings, http.clone(), false).await {
        Ok(token) => token,
        Err(e) => error!("Spotify authentication failed: {}", e),
    };
    let client = SpotifyClient::new(http, &token.access_token);

    let pb = utils::spinner("Fetching liked songs from Spotify...");
    let tracks = match fetch_liked_tracks(&client).await {
        Ok(tracks) => tracks,
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to fetch liked songs: {}", e)
        }
    };
    pb.finish_and_clear();

    if tracks.is_empty() {
        info!("Your Spotify library has no liked songs.");
        return;
    }

    let rows: Vec<TrackTableRow> = tracks
        .into_iter()
        .enumerate()
        .map(|(i, t)| TrackTableRow {
            position: i + 1,
            title: t.title,
            artist: t.artist,
        })
        .collect();

    println!("{}", Table::new(&rows));
    info!("{} liked songs", rows.len());
}
