//! Input validation and error classification for music store writes.

use crate::tagging::TaggingError;
use chrono::NaiveDate;
use rusqlite::ffi;
use thiserror::Error;

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;
pub const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum MusicStoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Tagging(#[from] TaggingError),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type MusicStoreResult<T> = std::result::Result<T, MusicStoreError>;

/// Trims `value`, rejecting it if nothing is left.
pub fn validate_name(field: &str, value: &str) -> MusicStoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MusicStoreError::InvalidInput(format!(
            "{} cannot be empty",
            field
        )));
    }
    Ok(trimmed.to_owned())
}

/// An empty date means "unknown", anything else must be `YYYY-MM-DD`.
pub fn validate_release_date(value: Option<&str>) -> MusicStoreResult<Option<String>> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(value) => value,
    };
    NaiveDate::parse_from_str(value, RELEASE_DATE_FORMAT)
        .map(|date| Some(date.format(RELEASE_DATE_FORMAT).to_string()))
        .map_err(|_| {
            MusicStoreError::InvalidInput(format!(
                "release date '{}' is not in YYYY-MM-DD format",
                value
            ))
        })
}

pub fn validate_score(score: i64) -> MusicStoreResult<i64> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(score)
    } else {
        Err(MusicStoreError::InvalidInput(format!(
            "score must be between {} and {}, got {}",
            MIN_SCORE, MAX_SCORE, score
        )))
    }
}

/// Maps a unique constraint violation to `AlreadyExists(what)`, leaving
/// every other error as a storage failure.
pub fn classify_insert_error(err: rusqlite::Error, what: impl Into<String>) -> MusicStoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            MusicStoreError::AlreadyExists(what.into())
        }
        _ => MusicStoreError::Storage(err),
    }
}

/// Escapes `%`, `_` and the escape character itself for a
/// `LIKE ... ESCAPE '\'` substring match.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
