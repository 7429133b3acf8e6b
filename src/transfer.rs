//! Playlist resolution and track transfer.
//!
//! Both stages talk to the destination only through [`YouTubeApi`], one call at
//! a time, in source order. [`run`] strings them together after the library
//! fetch.

use indicatif::ProgressBar;

use crate::{
    errors::{ApiError, AuthError, TransferError},
    info,
    spotify::{LibraryApi, library::fetch_liked_tracks},
    success,
    types::{CreatePlaylistRequest, CreatePlaylistSnippet, PlaylistStatus, SkippedTrackRow, Track},
    utils, warning,
    youtube::YouTubeApi,
};

pub const DEFAULT_PLAYLIST_NAME: &str = "Spotify Liked Songs";
pub const PLAYLIST_DESCRIPTION: &str = "Playlist transferred from Spotify Liked Songs";
pub const PLAYLIST_TAGS: [&str; 3] = ["Spotify", "YouTube Music", "Playlist"];
pub const PLAYLIST_LANGUAGE: &str = "en";
pub const PLAYLIST_PRIVACY: &str = "public";

/// Only the first page of the user's playlists is searched for a match.
pub const PLAYLIST_LOOKUP_LIMIT: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistResolution {
    Existing(String),
    Created(String),
}

impl PlaylistResolution {
    pub fn id(&self) -> &str {
        match self {
            PlaylistResolution::Existing(id) | PlaylistResolution::Created(id) => id.as_str(),
        }
    }
}

pub fn create_playlist_request(name: &str) -> CreatePlaylistRequest {
    CreatePlaylistRequest {
        snippet: CreatePlaylistSnippet {
            title: name.to_string(),
            description: PLAYLIST_DESCRIPTION.to_string(),
            tags: PLAYLIST_TAGS.iter().map(|t| t.to_string()).collect(),
            default_language: PLAYLIST_LANGUAGE.to_string(),
        },
        status: PlaylistStatus {
            privacy_status: PLAYLIST_PRIVACY.to_string(),
        },
    }
}

/// Returns the id of the user's playlist titled exactly `name`, creating it
/// when none of the first [`PLAYLIST_LOOKUP_LIMIT`] playlists matches.
///
/// When several playlists share the title, the first one listed wins.
pub async fn resolve_playlist<Y>(api: &Y, name: &str) -> Result<PlaylistResolution, ApiError>
where
    Y: YouTubeApi + ?Sized,
{
    let listing = api.list_my_playlists(PLAYLIST_LOOKUP_LIMIT).await?;

    if let Some(existing) = listing.items.iter().find(|p| p.snippet.title == name) {
        return Ok(PlaylistResolution::Existing(existing.id.clone()));
    }

    if listing.next_page_token.is_some() {
        warning!(
            "Only your first {} playlists were checked for '{}'",
            PLAYLIST_LOOKUP_LIMIT,
            name
        );
    }

    let id = api.insert_playlist(&create_playlist_request(name)).await?;
    Ok(PlaylistResolution::Created(id))
}

#[derive(Debug)]
pub enum TrackOutcome {
    Added { video_id: String },
    NotFound,
    Failed(ApiError),
}

/// Searches the destination for one track and appends the top hit.
pub async fn transfer_track<Y>(api: &Y, playlist_id: &str, track: &Track) -> TrackOutcome
where
    Y: YouTubeApi + ?Sized,
{
    let query = utils::build_search_query(track);

    let results = match api.search_videos(&query, 1).await {
        Ok(results) => results,
        Err(e) => return TrackOutcome::Failed(e),
    };

    let Some(video_id) = results.into_iter().next().and_then(|r| r.id.video_id) else {
        return TrackOutcome::NotFound;
    };

    match api.insert_playlist_item(playlist_id, &video_id).await {
        Ok(_) => TrackOutcome::Added { video_id },
        Err(e) => TrackOutcome::Failed(e),
    }
}

#[derive(Debug, Default)]
pub struct TransferReport {
    pub added: Vec<(Track, String)>,
    pub skipped: Vec<Track>,
    pub failed: Vec<(Track, ApiError)>,
}

impl TransferReport {
    pub fn total(&self) -> usize {
        self.added.len() + self.skipped.len() + self.failed.len()
    }

    /// Tracks that did not make it into the playlist, with the reason.
    pub fn missing_rows(&self) -> Vec<SkippedTrackRow> {
        let skipped = self.skipped.iter().map(|t| SkippedTrackRow {
            title: t.title.clone(),
            artist: t.artist.clone(),
            reason: "no search results".to_string(),
        });
        let failed = self.failed.iter().map(|(t, e)| SkippedTrackRow {
            title: t.title.clone(),
            artist: t.artist.clone(),
            reason: e.to_string(),
        });
        skipped.chain(failed).collect()
    }
}

/// Transfers every track in order, tolerating per-track failures.
///
/// A track without search results is logged and recorded as skipped; a track
/// whose search or insert fails is logged with its error and recorded as
/// failed. Neither stops the loop. There is no retry and no check for videos
/// already in the playlist.
pub async fn transfer_tracks<Y>(api: &Y, playlist_id: &str, tracks: &[Track], pb: &ProgressBar) -> TransferReport
where
    Y: YouTubeApi + ?Sized,
{
    let mut report = TransferReport::default();

    for track in tracks {
        pb.set_message(track.to_string());

        match transfer_track(api, playlist_id, track).await {
            TrackOutcome::Added { video_id } => {
                pb.suspend(|| success!("{} inserted", track));
                report.added.push((track.clone(), video_id));
            }
            TrackOutcome::NotFound => {
                pb.suspend(|| warning!("No YouTube results for {}, skipping", track));
                report.skipped.push(track.clone());
            }
            TrackOutcome::Failed(e) => {
                pb.suspend(|| warning!("Failed to add {}: {}", track, e));
                report.failed.push((track.clone(), e));
            }
        }

        pb.inc(1);
    }

    report
}

#[derive(Debug)]
pub enum RunOutcome {
    /// The library was empty; the destination was never contacted.
    EmptyLibrary,
    Completed {
        playlist: PlaylistResolution,
        report: TransferReport,
    },
}

/// One transfer run: fetch the library, connect to the destination, resolve
/// the playlist and transfer every track.
///
/// `connect` is only called once the library is known to be non-empty, so an
/// empty library never triggers a YouTube authorization.
///
/// # Errors
///
/// Fails on the first setup stage that fails; per-track failures end up in
/// the [`TransferReport`] instead.
pub async fn run<L, C, Fut, Y>(library: &L, connect: C, playlist_name: &str) -> Result<RunOutcome, TransferError>
where
    L: LibraryApi + ?Sized,
    C: FnOnce() -> Fut,
    Fut: Future<Output = Result<Y, AuthError>>,
    Y: YouTubeApi,
{
    let pb = utils::spinner("Fetching liked songs from Spotify...");
    let fetched = fetch_liked_tracks(library).await;
    pb.finish_and_clear();
    let tracks = fetched.map_err(TransferError::Library)?;
    success!("Fetched {} liked songs from Spotify", tracks.len());

    if tracks.is_empty() {
        return Ok(RunOutcome::EmptyLibrary);
    }

    let youtube = connect().await.map_err(TransferError::Destination)?;

    let playlist = resolve_playlist(&youtube, playlist_name)
        .await
        .map_err(|source| TransferError::Playlist {
            name: playlist_name.to_string(),
            source,
        })?;
    match &playlist {
        PlaylistResolution::Existing(_) => {
            info!("Playlist '{}' already exists. Adding songs to it...", playlist_name)
        }
        PlaylistResolution::Created(_) => success!("Created playlist '{}'", playlist_name),
    }

    let pb = utils::progress_bar(tracks.len());
    let report = transfer_tracks(&youtube, playlist.id(), &tracks, &pb).await;
    pb.finish_and_clear();

    Ok(RunOutcome::Completed { playlist, report })
}

#[cfg(test)]
mod tests {
    use mockall::{Sequence, predicate::eq};

    use super::*;
    use crate::{
        spotify::MockLibraryApi,
        types::{
            Playlist, PlaylistListResponse, PlaylistSnippet, ResourceId, SavedTrackItem,
            SavedTracksPage, SearchResult, SpotifyArtist, SpotifyTrack,
        },
        youtube::{MockYouTubeApi, VIDEO_KIND},
    };

    fn playlist(id: &str, title: &str) -> Playlist {
        Playlist {
            id: id.to_string(),
            snippet: PlaylistSnippet {
                title: title.to_string(),
                description: String::new(),
            },
        }
    }

    fn listing(items: Vec<Playlist>) -> PlaylistListResponse {
        PlaylistListResponse {
            items,
            next_page_token: None,
        }
    }

    fn hit(video_id: &str) -> SearchResult {
        SearchResult {
            id: ResourceId {
                kind: VIDEO_KIND.to_string(),
                video_id: Some(video_id.to_string()),
            },
        }
    }

    fn quota_exceeded() -> ApiError {
        ApiError::Status {
            service: "YouTube",
            status: 403,
            body: "quotaExceeded".to_string(),
        }
    }

    #[tokio::test]
    async fn existing_playlist_is_reused_without_create() {
        let mut api = MockYouTubeApi::new();
        api.expect_list_my_playlists()
            .with(eq(50u32))
            .times(1)
            .returning(|_| {
                Ok(listing(vec![
                    playlist("PL1", "Workout"),
                    playlist("PL2", "Spotify Liked Songs"),
                    playlist("PL3", "Spotify Liked Songs"),
                ]))
            });
        api.expect_insert_playlist().never();

        let resolved = resolve_playlist(&api, DEFAULT_PLAYLIST_NAME).await.unwrap();

        assert_eq!(resolved, PlaylistResolution::Existing("PL2".to_string()));
    }

    #[tokio::test]
    async fn title_match_is_exact() {
        let mut api = MockYouTubeApi::new();
        api.expect_list_my_playlists()
            .returning(|_| Ok(listing(vec![playlist("PL1", "spotify liked songs")])));
        api.expect_insert_playlist()
            .times(1)
            .returning(|_| Ok("NEW".to_string()));

        let resolved = resolve_playlist(&api, DEFAULT_PLAYLIST_NAME).await.unwrap();

        assert_eq!(resolved, PlaylistResolution::Created("NEW".to_string()));
    }

    #[tokio::test]
    async fn missing_playlist_is_created_once_with_fixed_metadata() {
        let mut api = MockYouTubeApi::new();
        api.expect_list_my_playlists()
            .times(1)
            .returning(|_| Ok(listing(vec![playlist("PL1", "Workout")])));
        api.expect_insert_playlist()
            .withf(|request: &CreatePlaylistRequest| {
                request.snippet.title == "Spotify Liked Songs"
                    && request.snippet.description == "Playlist transferred from Spotify Liked Songs"
                    && request.snippet.tags == vec!["Spotify", "YouTube Music", "Playlist"]
                    && request.snippet.default_language == "en"
                    && request.status.privacy_status == "public"
            })
            .times(1)
            .returning(|_| Ok("PLNEW".to_string()));

        let resolved = resolve_playlist(&api, DEFAULT_PLAYLIST_NAME).await.unwrap();

        assert_eq!(resolved.id(), "PLNEW");
        assert!(matches!(resolved, PlaylistResolution::Created(_)));
    }

    #[tokio::test]
    async fn listing_errors_propagate() {
        let mut api = MockYouTubeApi::new();
        api.expect_list_my_playlists()
            .returning(|_| Err(quota_exceeded()));
        api.expect_insert_playlist().never();

        let err = resolve_playlist(&api, DEFAULT_PLAYLIST_NAME).await.unwrap_err();

        assert!(matches!(err, ApiError::Status { status: 403, .. }));
    }

    #[test]
    fn create_request_serializes_to_the_data_api_shape() {
        let json = serde_json::to_value(create_playlist_request("Mix")).unwrap();

        assert_eq!(json["snippet"]["title"], "Mix");
        assert_eq!(json["snippet"]["defaultLanguage"], "en");
        assert_eq!(json["snippet"]["tags"][1], "YouTube Music");
        assert_eq!(json["status"]["privacyStatus"], "public");
    }

    #[tokio::test]
    async fn found_track_is_inserted_exactly_once() {
        let mut api = MockYouTubeApi::new();
        api.expect_search_videos()
            .with(eq("Song A Artist X"), eq(1u32))
            .times(1)
            .returning(|_, _| Ok(vec![hit("v1")]));
        api.expect_insert_playlist_item()
            .with(eq("PL"), eq("v1"))
            .times(1)
            .returning(|_, _| Ok("item1".to_string()));

        let outcome = transfer_track(&api, "PL", &Track::new("Song A", "Artist X")).await;

        assert!(matches!(outcome, TrackOutcome::Added { ref video_id } if video_id == "v1"));
    }

    #[tokio::test]
    async fn track_without_results_is_skipped_without_insert() {
        let mut api = MockYouTubeApi::new();
        api.expect_search_videos().returning(|_, _| Ok(vec![]));
        api.expect_insert_playlist_item().never();

        let outcome = transfer_track(&api, "PL", &Track::new("Obscure", "Nobody")).await;

        assert!(matches!(outcome, TrackOutcome::NotFound));
    }

    #[tokio::test]
    async fn failures_are_recorded_and_the_loop_continues() {
        let mut api = MockYouTubeApi::new();
        let mut seq = Sequence::new();
        api.expect_search_videos()
            .with(eq("One A"), eq(1u32))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(quota_exceeded()));
        api.expect_search_videos()
            .with(eq("Two B"), eq(1u32))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![hit("v2")]));
        api.expect_insert_playlist_item()
            .with(eq("PL"), eq("v2"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(quota_exceeded()));
        api.expect_search_videos()
            .with(eq("Three C"), eq(1u32))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![hit("v3")]));
        api.expect_insert_playlist_item()
            .with(eq("PL"), eq("v3"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("item3".to_string()));

        let tracks = vec![
            Track::new("One", "A"),
            Track::new("Two", "B"),
            Track::new("Three", "C"),
        ];
        let report = transfer_tracks(&api, "PL", &tracks, &ProgressBar::hidden()).await;

        assert_eq!(report.added, vec![(Track::new("Three", "C"), "v3".to_string())]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].0, Track::new("One", "A"));
        assert_eq!(report.failed[1].0, Track::new("Two", "B"));
        assert!(report.skipped.is_empty());
        assert_eq!(report.total(), 3);
    }

    #[tokio::test]
    async fn liked_songs_end_to_end() {
        let mut api = MockYouTubeApi::new();
        api.expect_list_my_playlists()
            .times(1)
            .returning(|_| Ok(listing(vec![])));
        api.expect_insert_playlist()
            .withf(|r: &CreatePlaylistRequest| r.snippet.title == "Spotify Liked Songs")
            .times(1)
            .returning(|_| Ok("PLLIKED".to_string()));
        api.expect_search_videos()
            .with(eq("Song A Artist X"), eq(1u32))
            .times(1)
            .returning(|_, _| Ok(vec![hit("v1")]));
        api.expect_search_videos()
            .with(eq("Song B Artist Y"), eq(1u32))
            .times(1)
            .returning(|_, _| Ok(vec![]));
        api.expect_insert_playlist_item()
            .with(eq("PLLIKED"), eq("v1"))
            .times(1)
            .returning(|_, _| Ok("item1".to_string()));

        let library = vec![Track::new("Song A", "Artist X"), Track::new("Song B", "Artist Y")];
        let playlist = resolve_playlist(&api, DEFAULT_PLAYLIST_NAME).await.unwrap();
        let report = transfer_tracks(&api, playlist.id(), &library, &ProgressBar::hidden()).await;

        assert_eq!(playlist, PlaylistResolution::Created("PLLIKED".to_string()));
        assert_eq!(report.added, vec![(Track::new("Song A", "Artist X"), "v1".to_string())]);
        assert_eq!(report.skipped, vec![Track::new("Song B", "Artist Y")]);
        assert!(report.failed.is_empty());

        let rows = report.missing_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Song B");
        assert_eq!(rows[0].reason, "no search results");
    }

    fn library(tracks: &[(&str, &str)]) -> MockLibraryApi {
        let items: Vec<SavedTrackItem> = tracks
            .iter()
            .map(|(title, artist)| SavedTrackItem {
                added_at: None,
                track: Some(SpotifyTrack {
                    id: None,
                    name: title.to_string(),
                    artists: vec![SpotifyArtist {
                        name: artist.to_string(),
                    }],
                }),
            })
            .collect();

        let mut api = MockLibraryApi::new();
        api.expect_saved_tracks_page().times(1).returning(move |_| {
            Ok(SavedTracksPage {
                items: items.clone(),
                next: None,
                total: Some(items.len() as u64),
            })
        });
        api
    }

    #[tokio::test]
    async fn empty_library_never_connects_to_the_destination() {
        let source = library(&[]);
        let mut connected = false;

        let outcome = run(
            &source,
            || {
                connected = true;
                async { Ok::<_, AuthError>(MockYouTubeApi::new()) }
            },
            DEFAULT_PLAYLIST_NAME,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RunOutcome::EmptyLibrary));
        assert!(!connected);
    }

    #[tokio::test]
    async fn library_failure_stops_before_the_destination() {
        let mut source = MockLibraryApi::new();
        source
            .expect_saved_tracks_page()
            .returning(|_| Err(quota_exceeded()));
        let mut connected = false;

        let err = run(
            &source,
            || {
                connected = true;
                async { Ok::<_, AuthError>(MockYouTubeApi::new()) }
            },
            DEFAULT_PLAYLIST_NAME,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TransferError::Library(_)));
        assert!(!connected);
    }

    #[tokio::test]
    async fn destination_auth_failure_is_reported_as_its_own_stage() {
        let source = library(&[("Song A", "Artist X")]);

        let err = run(
            &source,
            || async { Err::<MockYouTubeApi, _>(AuthError::Timeout("YouTube")) },
            DEFAULT_PLAYLIST_NAME,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TransferError::Destination(AuthError::Timeout(_))));
    }

    #[tokio::test]
    async fn run_reuses_an_existing_playlist() {
        let source = library(&[("Song A", "Artist X")]);
        let mut api = MockYouTubeApi::new();
        api.expect_list_my_playlists()
            .returning(|_| Ok(listing(vec![playlist("PLOLD", "Spotify Liked Songs")])));
        api.expect_insert_playlist().never();
        api.expect_search_videos()
            .with(eq("Song A Artist X"), eq(1u32))
            .returning(|_, _| Ok(vec![hit("v1")]));
        api.expect_insert_playlist_item()
            .with(eq("PLOLD"), eq("v1"))
            .times(1)
            .returning(|_, _| Ok("item1".to_string()));

        let outcome = run(&source, move || async move { Ok::<_, AuthError>(api) }, DEFAULT_PLAYLIST_NAME)
            .await
            .unwrap();

        let RunOutcome::Completed { playlist, report } = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(playlist, PlaylistResolution::Existing("PLOLD".to_string()));
        assert_eq!(report.added.len(), 1);
    }
}
