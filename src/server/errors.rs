use crate::music_store::MusicStoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

impl IntoResponse for MusicStoreError {
    fn into_response(self) -> Response {
        match self {
            MusicStoreError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{} not found", what)).into_response()
            }
            MusicStoreError::AlreadyExists(what) => {
                (StatusCode::CONFLICT, format!("{} already exists", what)).into_response()
            }
            MusicStoreError::InvalidInput(reason) => {
                (StatusCode::BAD_REQUEST, reason).into_response()
            }
            err @ (MusicStoreError::Tagging(_) | MusicStoreError::Storage(_)) => {
                error!("Music store failure: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
                    .into_response()
            }
        }
    }
}
