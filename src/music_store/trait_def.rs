//! MusicStore trait definition.

use super::models::*;
use super::validation::MusicStoreResult;

/// Catalog, ratings, notes and the aggregate queries built on them.
pub trait MusicStore: Send + Sync {
    // =========================================================================
    // Catalog Retrieval
    // =========================================================================

    /// All songs, newest first.
    fn list_songs(&self) -> MusicStoreResult<Vec<SongSummary>>;

    fn get_song(&self, song_id: EntityId) -> MusicStoreResult<Option<SongDetails>>;

    fn get_artist(&self, artist_id: EntityId) -> MusicStoreResult<Option<Artist>>;

    /// The artist's songs, latest album first.
    fn get_artist_songs(&self, artist_id: EntityId) -> MusicStoreResult<Vec<ArtistSong>>;

    fn get_album(&self, album_id: EntityId) -> MusicStoreResult<Option<Album>>;

    fn get_album_songs(&self, album_id: EntityId) -> MusicStoreResult<Vec<AlbumSong>>;

    /// Notes attached to an entity, newest first.
    fn notes_with_hashtags(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
    ) -> MusicStoreResult<Vec<NoteWithHashtags>>;

    // =========================================================================
    // Write Operations
    // =========================================================================

    fn add_artist(&self, artist_name: &str, info: &str) -> MusicStoreResult<EntityId>;

    fn add_album(&self, album: NewAlbum) -> MusicStoreResult<EntityId>;

    /// Adds a song and, if present, the submitting user's rating of it, both
    /// or neither.
    fn add_song(&self, user_id: UserId, song: NewSong) -> MusicStoreResult<EntityId>;

    /// Adds a note to an entity and links the hashtags found in
    /// `raw_hashtags` to it, both or neither.
    fn add_note(
        &self,
        user_id: UserId,
        entity_type: EntityType,
        entity_id: EntityId,
        note: &str,
        raw_hashtags: Option<&str>,
    ) -> MusicStoreResult<CreatedNote>;

    /// Creates or replaces the user's rating of a song.
    fn upsert_song_rating(
        &self,
        user_id: UserId,
        song_id: EntityId,
        score: i64,
        review: &str,
    ) -> MusicStoreResult<()>;

    // =========================================================================
    // Aggregates
    // =========================================================================

    fn artist_stats(&self, artist_id: EntityId) -> MusicStoreResult<Option<ArtistStats>>;

    fn user_activity(&self, user_id: UserId) -> MusicStoreResult<Option<UserActivity>>;

    /// Songs by average score, ties broken by number of ratings.
    fn top_rated_songs(&self, limit: usize) -> MusicStoreResult<Vec<TopRatedSong>>;

    fn most_rated_artists(&self, limit: usize) -> MusicStoreResult<Vec<RatedArtist>>;

    /// Hashtags containing `query`, most used first.
    fn search_hashtags(&self, query: &str, limit: usize) -> MusicStoreResult<Vec<HashtagUsage>>;

    /// Songs carrying a note tagged with `hashtag`.
    fn songs_by_hashtag(&self, hashtag: &str) -> MusicStoreResult<Vec<SongSummary>>;

    // =========================================================================
    // Autocomplete
    // =========================================================================

    fn search_artists(&self, query: &str) -> MusicStoreResult<Vec<SearchResult>>;

    /// Unlike the other searches an empty query still lists albums, so that
    /// pickers scoped to `artist_id` can show everything.
    fn search_albums(
        &self,
        query: &str,
        artist_id: Option<EntityId>,
    ) -> MusicStoreResult<Vec<SearchResult>>;

    fn search_songs(&self, query: &str) -> MusicStoreResult<Vec<SearchResult>>;
}
