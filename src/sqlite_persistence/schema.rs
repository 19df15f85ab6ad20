//! Table definitions of the music log database.
//!
//! Users, credentials and tokens live next to the music tables in a single
//! file so that notes and ratings can reference their authors.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const USER_FK: ForeignKey = ForeignKey {
    foreign_table: "user",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

pub const USER_TABLE: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_user_handle", "handle")],
    unique_constraints: &[],
};

pub const USER_PASSWORD_CREDENTIALS_TABLE: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_tried", &SqlType::Integer),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const AUTH_TOKEN_TABLE: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[("idx_auth_token_value", "value")],
    unique_constraints: &[],
};

pub const ARTIST_TABLE: Table = Table {
    name: "artist",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "artist_name",
            &SqlType::Text,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!(
            "info",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const ALBUM_TABLE: Table = Table {
    name: "album",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("album_name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artist",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!("release_date", &SqlType::Text),
    ],
    indices: &[("idx_album_artist_id", "artist_id")],
    unique_constraints: &[&["artist_id", "album_name"]],
};

pub const SONG_TABLE: Table = Table {
    name: "song",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("song_name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artist",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!(
            "album_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "album",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!("release_date", &SqlType::Text),
    ],
    indices: &[("idx_song_album_id", "album_id")],
    unique_constraints: &[&["artist_id", "song_name"]],
};

pub const SONG_RATING_TABLE: Table = Table {
    name: "song_rating",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "song_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "song",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("score", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "review",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_song_rating_song_id", "song_id")],
    unique_constraints: &[&["user_id", "song_id"]],
};

pub const NOTE_TABLE: Table = Table {
    name: "note",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("entity_type", &SqlType::Text, non_null = true),
        sqlite_column!("entity_id", &SqlType::Integer, non_null = true),
        sqlite_column!("note", &SqlType::Text, non_null = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_note_entity", "entity_type, entity_id")],
    unique_constraints: &[],
};

/// The tag dictionary. `content` is unique: concurrent first uses of a tag
/// converge on a single row.
pub const HASHTAG_TABLE: Table = Table {
    name: "hashtag",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("content", &SqlType::Text, non_null = true, is_unique = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const HASHTAG_NOTE_TABLE: Table = Table {
    name: "hashtag_note",
    columns: &[
        sqlite_column!(
            "note_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "note",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "hashtag_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "hashtag",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
    ],
    indices: &[("idx_hashtag_note_hashtag_id", "hashtag_id")],
    unique_constraints: &[&["note_id", "hashtag_id"]],
};

pub const MUSIC_LOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE,
        USER_PASSWORD_CREDENTIALS_TABLE,
        AUTH_TOKEN_TABLE,
        ARTIST_TABLE,
        ALBUM_TABLE,
        SONG_TABLE,
        SONG_RATING_TABLE,
        NOTE_TABLE,
        HASHTAG_TABLE,
        HASHTAG_NOTE_TABLE,
    ],
    migration: None,
}];
