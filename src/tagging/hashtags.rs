//! Hashtag normalization and note linking.
//!
//! A raw hashtag string is what a user types next to a note, e.g.
//! `"#grunge, 90s , #Seattle"`. [`parse_hashtags`] turns it into canonical
//! tags, [`link_hashtags`] makes sure each one exists once in the tag
//! dictionary and is linked once to the note.

use rusqlite::{params, OptionalExtension, Transaction};
use thiserror::Error;
use tracing::debug;

use crate::sqlite_persistence::schema::{HASHTAG_NOTE_TABLE, HASHTAG_TABLE};

pub const TAG_SEPARATOR: char = ',';
pub const TAG_MARKER: char = '#';

pub type HashtagId = i64;

#[derive(Debug, Error)]
pub enum TaggingError {
    #[error("storage failure while linking hashtags: {0}")]
    StorageFailure(#[from] rusqlite::Error),
}

/// A tag dictionary entry linked to a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedHashtag {
    pub id: HashtagId,
    pub content: String,
}

/// Normalizes a single comma separated token. Returns `None` for tokens that
/// carry no tag once surrounding whitespace and the leading marker are
/// removed.
///
/// Only one leading `#` is stripped and nothing else is rewritten: `"##a"`
/// becomes `"#a"`, `"# rock"` becomes `" rock"` and `"Rock"` stays distinct
/// from `"rock"`.
pub fn normalize_hashtag(token: &str) -> Option<&str> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }
    let tag = trimmed.strip_prefix(TAG_MARKER).unwrap_or(trimmed);
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

/// Splits and normalizes a raw hashtag string. Duplicates collapse onto their
/// first occurrence. Absent or empty input yields no tags.
pub fn parse_hashtags(raw: Option<&str>) -> Vec<String> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Vec::new(),
    };

    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(TAG_SEPARATOR).filter_map(normalize_hashtag) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_owned());
        }
    }
    tags
}

/// Returns the dictionary id of `content`, inserting it first if needed.
///
/// The insert relies on the unique constraint on `hashtag.content`: if a
/// concurrent writer created the row first, the insert is a no-op and the
/// lookup picks up the winner's row.
pub fn ensure_hashtag(tx: &Transaction, content: &str) -> Result<HashtagId, TaggingError> {
    let existing: Option<HashtagId> = tx
        .query_row(
            &format!("SELECT id FROM {} WHERE content = ?1", HASHTAG_TABLE.name),
            params![content],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    tx.execute(
        &format!(
            "INSERT INTO {} (content) VALUES (?1) ON CONFLICT(content) DO NOTHING",
            HASHTAG_TABLE.name
        ),
        params![content],
    )?;
    let id = tx.query_row(
        &format!("SELECT id FROM {} WHERE content = ?1", HASHTAG_TABLE.name),
        params![content],
        |row| row.get(0),
    )?;
    debug!("Created hashtag {:?} with id {}", content, id);
    Ok(id)
}

/// Links every tag found in `raw` to `note_id`, inside the caller's
/// transaction. Re-linking an already linked tag is a no-op.
///
/// The caller owns the transaction: on `Err` it must drop it without
/// committing so that the note and any links written so far disappear too.
pub fn link_hashtags(
    tx: &Transaction,
    note_id: i64,
    raw: Option<&str>,
) -> Result<Vec<LinkedHashtag>, TaggingError> {
    let tags = parse_hashtags(raw);
    let mut linked = Vec::with_capacity(tags.len());

    for content in tags {
        let hashtag_id = ensure_hashtag(tx, &content)?;
        tx.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (note_id, hashtag_id) VALUES (?1, ?2)",
                HASHTAG_NOTE_TABLE.name
            ),
            params![note_id, hashtag_id],
        )?;
        linked.push(LinkedHashtag {
            id: hashtag_id,
            content,
        });
    }

    if !linked.is_empty() {
        debug!("Linked {} hashtags to note {}", linked.len(), note_id);
    }
    Ok(linked)
}
