use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::session::Session;
use super::state::{GuardedMusicStore, ServerState};
use crate::music_store::{EntityId, EntityType, NewAlbum, NewSong, UserId};

#[derive(Deserialize, Debug)]
struct RateSongBody {
    pub song_id: EntityId,
    pub score: i64,
    #[serde(default)]
    pub review: String,
}

#[derive(Deserialize, Debug)]
struct NewArtistBody {
    pub artist_name: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Deserialize, Debug)]
struct NewNoteBody {
    pub note: String,
    pub hashtags: Option<String>,
}

#[derive(Serialize)]
struct CreatedEntityResponse {
    id: EntityId,
}

fn user_id(session: &Session) -> UserId {
    session.user_id as UserId
}

fn created(entity_type: EntityType, id: EntityId) -> Response {
    (
        StatusCode::CREATED,
        [(header::LOCATION, entity_type.view_path(id))],
        Json(CreatedEntityResponse { id }),
    )
        .into_response()
}

async fn rate_song(
    session: Session,
    State(store): State<GuardedMusicStore>,
    Json(body): Json<RateSongBody>,
) -> Response {
    debug!("rate_song() called with {:?}", body);
    match store.upsert_song_rating(user_id(&session), body.song_id, body.score, &body.review) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn add_artist(
    _session: Session,
    State(store): State<GuardedMusicStore>,
    Json(body): Json<NewArtistBody>,
) -> Response {
    match store.add_artist(&body.artist_name, &body.info) {
        Ok(id) => created(EntityType::Artist, id),
        Err(err) => err.into_response(),
    }
}

async fn add_album(
    _session: Session,
    State(store): State<GuardedMusicStore>,
    Json(body): Json<NewAlbum>,
) -> Response {
    match store.add_album(body) {
        Ok(id) => created(EntityType::Album, id),
        Err(err) => err.into_response(),
    }
}

async fn add_song(
    session: Session,
    State(store): State<GuardedMusicStore>,
    Json(body): Json<NewSong>,
) -> Response {
    match store.add_song(user_id(&session), body) {
        Ok(id) => created(EntityType::Song, id),
        Err(err) => err.into_response(),
    }
}

async fn add_note(
    session: Session,
    State(store): State<GuardedMusicStore>,
    Path((entity_type, entity_id)): Path<(String, EntityId)>,
    Json(body): Json<NewNoteBody>,
) -> Response {
    let entity_type: EntityType = match entity_type.parse() {
        Ok(entity_type) => entity_type,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };

    match store.add_note(
        user_id(&session),
        entity_type,
        entity_id,
        &body.note,
        body.hashtags.as_deref(),
    ) {
        Ok(created_note) => (
            StatusCode::CREATED,
            [(header::LOCATION, entity_type.view_path(entity_id))],
            Json(created_note),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_profile(session: Session, State(store): State<GuardedMusicStore>) -> Response {
    match store.user_activity(user_id(&session)) {
        Ok(Some(activity)) => Json(activity).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn make_user_routes(state: ServerState) -> Router {
    Router::new()
        .route("/rate", post(rate_song))
        .route("/artist", post(add_artist))
        .route("/album", post(add_album))
        .route("/song", post(add_song))
        .route("/note/{entity_type}/{entity_id}", post(add_note))
        .route("/profile", get(get_profile))
        .with_state(state)
}
