use reqwest::Client;

use crate::{config::Settings, error, spotify, success, youtube};

pub async fn auth_spotify(settings: &Settings) {
    match spotify::auth::authenticate(settings, Client::new(), true).await {
        Ok(_) => success!(
            "Spotify credential saved to {}",
            settings.spotify_token_file.display()
        ),
        Err(e) => error!("Spotify authentication failed: {}", e),
    }
}

pub async fn auth_youtube(settings: &Settings) {
    match youtube::auth::authenticate(settings, Client::new(), true).await {
        Ok(_) => success!(
            "YouTube credential saved to {}",
            settings.youtube_token_file.display()
        ),
        Err(e) => error!("YouTube authentication failed: {}", e),
    }
}
