//! Autocomplete search routes

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::session::Session;
use super::state::{GuardedMusicStore, ServerState};
use crate::music_store::{EntityId, MusicStoreResult, SEARCH_RESULTS_LIMIT};

#[derive(Deserialize, Debug, Default)]
struct SearchParams {
    #[serde(default)]
    pub q: String,

    /// Kept as text so that an empty `artist_id=` means "any artist".
    pub artist_id: Option<String>,
}

impl SearchParams {
    fn artist_id(&self) -> Result<Option<EntityId>, String> {
        match self.artist_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| format!("Invalid artist id '{}'", raw)),
        }
    }
}

fn respond<T: serde::Serialize>(result: MusicStoreResult<T>) -> Response {
    match result {
        Ok(results) => Json(results).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn search_artists(
    _session: Session,
    State(store): State<GuardedMusicStore>,
    Query(params): Query<SearchParams>,
) -> Response {
    respond(store.search_artists(&params.q))
}

async fn search_albums(
    _session: Session,
    State(store): State<GuardedMusicStore>,
    Query(params): Query<SearchParams>,
) -> Response {
    let artist_id = match params.artist_id() {
        Ok(artist_id) => artist_id,
        Err(reason) => return (StatusCode::BAD_REQUEST, reason).into_response(),
    };
    respond(store.search_albums(&params.q, artist_id))
}

async fn search_songs(
    _session: Session,
    State(store): State<GuardedMusicStore>,
    Query(params): Query<SearchParams>,
) -> Response {
    respond(store.search_songs(&params.q))
}

async fn search_hashtags(
    _session: Session,
    State(store): State<GuardedMusicStore>,
    Query(params): Query<SearchParams>,
) -> Response {
    respond(store.search_hashtags(&params.q, SEARCH_RESULTS_LIMIT))
}

pub fn make_search_routes(state: ServerState) -> Router {
    Router::new()
        .route("/artists", get(search_artists))
        .route("/albums", get(search_albums))
        .route("/songs", get(search_songs))
        .route("/hashtags", get(search_hashtags))
        .with_state(state)
}
