//! Models returned by the music store.
//!
//! Every struct serializes to the JSON shape served by the content, user and
//! search routes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type EntityId = i64;
pub type UserId = i64;

// =============================================================================
// Enumerations
// =============================================================================

/// Kind of entity a note can be attached to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Song,
    Artist,
    Album,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Song => "song",
            EntityType::Artist => "artist",
            EntityType::Album => "album",
        }
    }

    pub(crate) fn table_name(&self) -> &'static str {
        match self {
            EntityType::Song => "song",
            EntityType::Artist => "artist",
            EntityType::Album => "album",
        }
    }

    /// Path of the content route that renders the entity.
    pub fn view_path(&self, id: EntityId) -> String {
        format!("/v1/content/{}/{}", self.as_str(), id)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownEntityType(pub String);

impl fmt::Display for UnknownEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown entity type '{}'", self.0)
    }
}

impl FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "song" => Ok(EntityType::Song),
            "artist" => Ok(EntityType::Artist),
            "album" => Ok(EntityType::Album),
            other => Err(UnknownEntityType(other.to_owned())),
        }
    }
}

// =============================================================================
// Catalog entities
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: EntityId,
    pub artist_name: String,
    pub info: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: EntityId,
    pub album_name: String,
    pub release_date: Option<String>,
    pub artist_id: EntityId,
    pub artist_name: String,
}

/// A song as listed on the home page and on hashtag pages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SongSummary {
    pub id: EntityId,
    pub song_name: String,
    pub artist_id: EntityId,
    pub artist_name: String,
    pub album_id: EntityId,
    pub album_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SongDetails {
    pub id: EntityId,
    pub song_name: String,
    pub artist_id: EntityId,
    pub artist_name: String,
    pub album_id: EntityId,
    pub album_name: String,
    pub album_release_date: Option<String>,
    pub song_release_date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtistSong {
    pub id: EntityId,
    pub song_name: String,
    pub album_id: EntityId,
    pub album_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlbumSong {
    pub id: EntityId,
    pub song_name: String,
}

/// A note together with its author and the hashtags linked to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteWithHashtags {
    pub id: EntityId,
    pub note: String,
    pub created: i64,
    pub user_handle: String,
    pub hashtags: Vec<String>,
}

// =============================================================================
// Aggregates
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtistStats {
    pub artist_id: EntityId,
    pub artist_name: String,
    pub song_count: i64,
    pub album_count: i64,
    pub rating_count: i64,
    pub average_score: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserActivity {
    pub user_id: UserId,
    pub user_handle: String,
    pub rating_count: i64,
    pub average_score: Option<f64>,
    pub note_count: i64,
    pub hashtag_count: i64,
    pub last_activity: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopRatedSong {
    pub song_id: EntityId,
    pub song_name: String,
    pub artist_id: EntityId,
    pub artist_name: String,
    pub average_score: f64,
    pub rating_count: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatedArtist {
    pub artist_id: EntityId,
    pub artist_name: String,
    pub rating_count: i64,
    pub average_score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HashtagUsage {
    pub id: EntityId,
    #[serde(rename = "text")]
    pub content: String,
    pub usage_count: i64,
}

/// Autocomplete entry, `text` is what a picker displays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: EntityId,
    pub text: String,
}

// =============================================================================
// Inputs
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewAlbum {
    pub artist_id: EntityId,
    pub album_name: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewRating {
    pub score: i64,
    #[serde(default)]
    pub review: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewSong {
    pub song_name: String,
    pub artist_id: EntityId,
    pub album_id: EntityId,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Rating written by the submitting user together with the song.
    #[serde(default)]
    pub rating: Option<NewRating>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatedNote {
    pub note_id: EntityId,
    pub hashtags: Vec<String>,
}
