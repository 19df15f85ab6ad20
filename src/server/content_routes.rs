//! Public content routes: one JSON view per page of the music log.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::http_cache;
use super::state::{GuardedMusicStore, ServerState};
use crate::music_store::{
    Album, AlbumSong, Artist, ArtistSong, ArtistStats, EntityId, EntityType, MusicStoreError,
    NoteWithHashtags, RatedArtist, SongDetails, SongSummary, TopRatedSong,
};

pub const CHARTS_SIZE: usize = 10;

#[derive(Serialize)]
struct SongView {
    song: SongDetails,
    artist_stats: Option<ArtistStats>,
    notes: Vec<NoteWithHashtags>,
}

#[derive(Serialize)]
struct ArtistView {
    artist: Artist,
    songs: Vec<ArtistSong>,
    notes: Vec<NoteWithHashtags>,
}

#[derive(Serialize)]
struct AlbumView {
    album: Album,
    songs: Vec<AlbumSong>,
    notes: Vec<NoteWithHashtags>,
}

#[derive(Serialize)]
struct ChartsView {
    top_songs: Vec<TopRatedSong>,
    top_artists: Vec<RatedArtist>,
}

#[derive(Serialize)]
struct HashtagView {
    hashtag: String,
    songs: Vec<SongSummary>,
}

async fn list_songs(State(store): State<GuardedMusicStore>) -> Response {
    match store.list_songs() {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => err.into_response(),
    }
}

fn song_view(store: &GuardedMusicStore, id: EntityId) -> Result<Option<SongView>, MusicStoreError> {
    let song = match store.get_song(id)? {
        Some(song) => song,
        None => return Ok(None),
    };
    let artist_stats = store.artist_stats(song.artist_id)?;
    let notes = store.notes_with_hashtags(EntityType::Song, id)?;
    Ok(Some(SongView {
        song,
        artist_stats,
        notes,
    }))
}

async fn get_song(State(store): State<GuardedMusicStore>, Path(id): Path<EntityId>) -> Response {
    match song_view(&store, id) {
        Ok(Some(view)) => Json(view).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Song not found").into_response(),
        Err(err) => err.into_response(),
    }
}

fn artist_view(
    store: &GuardedMusicStore,
    id: EntityId,
) -> Result<Option<ArtistView>, MusicStoreError> {
    let artist = match store.get_artist(id)? {
        Some(artist) => artist,
        None => return Ok(None),
    };
    Ok(Some(ArtistView {
        artist,
        songs: store.get_artist_songs(id)?,
        notes: store.notes_with_hashtags(EntityType::Artist, id)?,
    }))
}

async fn get_artist(State(store): State<GuardedMusicStore>, Path(id): Path<EntityId>) -> Response {
    match artist_view(&store, id) {
        Ok(Some(view)) => Json(view).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Artist not found").into_response(),
        Err(err) => err.into_response(),
    }
}

fn album_view(
    store: &GuardedMusicStore,
    id: EntityId,
) -> Result<Option<AlbumView>, MusicStoreError> {
    let album = match store.get_album(id)? {
        Some(album) => album,
        None => return Ok(None),
    };
    Ok(Some(AlbumView {
        album,
        songs: store.get_album_songs(id)?,
        notes: store.notes_with_hashtags(EntityType::Album, id)?,
    }))
}

async fn get_album(State(store): State<GuardedMusicStore>, Path(id): Path<EntityId>) -> Response {
    match album_view(&store, id) {
        Ok(Some(view)) => Json(view).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Album not found").into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_charts(State(store): State<GuardedMusicStore>) -> Response {
    let charts = store.top_rated_songs(CHARTS_SIZE).and_then(|top_songs| {
        Ok(ChartsView {
            top_songs,
            top_artists: store.most_rated_artists(CHARTS_SIZE)?,
        })
    });
    match charts {
        Ok(charts) => Json(charts).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_hashtag(
    State(store): State<GuardedMusicStore>,
    Path(hashtag): Path<String>,
) -> Response {
    match store.songs_by_hashtag(&hashtag) {
        Ok(songs) => Json(HashtagView { hashtag, songs }).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Lists and charts may be cached. Entity and hashtag views depend on notes and
/// must reflect a note as soon as it is posted.
pub fn make_content_routes(state: ServerState) -> Router {
    let content_cache_age_sec = state.config.content_cache_age_sec;
    let cached_routes = Router::new()
        .route("/songs", get(list_songs))
        .route("/charts", get(get_charts))
        .layer(middleware::from_fn_with_state(
            content_cache_age_sec,
            http_cache,
        ));

    Router::new()
        .route("/song/{id}", get(get_song))
        .route("/artist/{id}", get(get_artist))
        .route("/album/{id}", get(get_album))
        .route("/hashtag/{name}", get(get_hashtag))
        .merge(cached_routes)
        .with_state(state)
}
