//! SQLite-backed music store.
//!
//! Shares the database connection with the user store. Each write that
//! touches more than one row runs inside a single IMMEDIATE transaction that
//! is committed explicitly; any early return drops it and rolls back.

use super::models::*;
use super::trait_def::MusicStore;
use super::validation::*;
use crate::sqlite_persistence::{lock_connection, SharedConnection};
use crate::tagging::{link_hashtags, normalize_hashtag};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

pub const SEARCH_RESULTS_LIMIT: usize = 10;

pub struct SqliteMusicStore {
    conn: SharedConnection,
}

impl SqliteMusicStore {
    pub fn new(conn: SharedConnection) -> Self {
        SqliteMusicStore { conn }
    }

    fn entity_exists(
        conn: &Connection,
        entity_type: EntityType,
        id: EntityId,
    ) -> rusqlite::Result<bool> {
        conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)",
                entity_type.table_name()
            ),
            params![id],
            |row| row.get(0),
        )
    }

    fn upsert_rating(
        conn: &Connection,
        user_id: UserId,
        song_id: EntityId,
        score: i64,
        review: &str,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO song_rating (user_id, song_id, score, review) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, song_id) DO UPDATE SET
                score = excluded.score,
                review = excluded.review,
                updated = cast(strftime('%s','now') as int)",
            params![user_id, song_id, score, review],
        )?;
        Ok(())
    }

    fn parse_song_summary_row(row: &Row) -> rusqlite::Result<SongSummary> {
        Ok(SongSummary {
            id: row.get(0)?,
            song_name: row.get(1)?,
            artist_id: row.get(2)?,
            artist_name: row.get(3)?,
            album_id: row.get(4)?,
            album_name: row.get(5)?,
        })
    }

    fn parse_search_result_row(row: &Row) -> rusqlite::Result<SearchResult> {
        Ok(SearchResult {
            id: row.get(0)?,
            text: row.get(1)?,
        })
    }
}

impl MusicStore for SqliteMusicStore {
    fn list_songs(&self) -> MusicStoreResult<Vec<SongSummary>> {
        let conn = lock_connection(&self.conn);
        let mut stmt = conn.prepare(
            "SELECT s.id, s.song_name, a.id, a.artist_name, al.id, al.album_name
             FROM song s
             JOIN artist a ON s.artist_id = a.id
             JOIN album al ON s.album_id = al.id
             ORDER BY s.id DESC",
        )?;
        let songs = stmt
            .query_map([], Self::parse_song_summary_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    fn get_song(&self, song_id: EntityId) -> MusicStoreResult<Option<SongDetails>> {
        let conn = lock_connection(&self.conn);
        let song = conn
            .query_row(
                "SELECT s.id, s.song_name, a.id, a.artist_name, al.id, al.album_name,
                        al.release_date, s.release_date
                 FROM song s
                 JOIN artist a ON s.artist_id = a.id
                 JOIN album al ON s.album_id = al.id
                 WHERE s.id = ?1",
                params![song_id],
                |row| {
                    Ok(SongDetails {
                        id: row.get(0)?,
                        song_name: row.get(1)?,
                        artist_id: row.get(2)?,
                        artist_name: row.get(3)?,
                        album_id: row.get(4)?,
                        album_name: row.get(5)?,
                        album_release_date: row.get(6)?,
                        song_release_date: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(song)
    }

    fn get_artist(&self, artist_id: EntityId) -> MusicStoreResult<Option<Artist>> {
        let conn = lock_connection(&self.conn);
        let artist = conn
            .query_row(
                "SELECT id, artist_name, info FROM artist WHERE id = ?1",
                params![artist_id],
                |row| {
                    Ok(Artist {
                        id: row.get(0)?,
                        artist_name: row.get(1)?,
                        info: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(artist)
    }

    fn get_artist_songs(&self, artist_id: EntityId) -> MusicStoreResult<Vec<ArtistSong>> {
        let conn = lock_connection(&self.conn);
        let mut stmt = conn.prepare(
            "SELECT s.id, s.song_name, al.id, al.album_name
             FROM song s
             JOIN album al ON s.album_id = al.id
             WHERE s.artist_id = ?1
             ORDER BY al.release_date DESC, s.song_name",
        )?;
        let songs = stmt
            .query_map(params![artist_id], |row| {
                Ok(ArtistSong {
                    id: row.get(0)?,
                    song_name: row.get(1)?,
                    album_id: row.get(2)?,
                    album_name: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    fn get_album(&self, album_id: EntityId) -> MusicStoreResult<Option<Album>> {
        let conn = lock_connection(&self.conn);
        let album = conn
            .query_row(
                "SELECT al.id, al.album_name, al.release_date, al.artist_id, a.artist_name
                 FROM album al
                 JOIN artist a ON al.artist_id = a.id
                 WHERE al.id = ?1",
                params![album_id],
                |row| {
                    Ok(Album {
                        id: row.get(0)?,
                        album_name: row.get(1)?,
                        release_date: row.get(2)?,
                        artist_id: row.get(3)?,
                        artist_name: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(album)
    }

    fn get_album_songs(&self, album_id: EntityId) -> MusicStoreResult<Vec<AlbumSong>> {
        let conn = lock_connection(&self.conn);
        let mut stmt =
            conn.prepare("SELECT id, song_name FROM song WHERE album_id = ?1 ORDER BY song_name")?;
        let songs = stmt
            .query_map(params![album_id], |row| {
                Ok(AlbumSong {
                    id: row.get(0)?,
                    song_name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    fn notes_with_hashtags(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
    ) -> MusicStoreResult<Vec<NoteWithHashtags>> {
        let conn = lock_connection(&self.conn);
        let mut stmt = conn.prepare(
            "SELECT n.id, n.note, n.created, u.handle
             FROM note n
             JOIN user u ON n.user_id = u.id
             WHERE n.entity_type = ?1 AND n.entity_id = ?2
             ORDER BY n.created DESC, n.id DESC",
        )?;
        let mut notes = stmt
            .query_map(params![entity_type.as_str(), entity_id], |row| {
                Ok(NoteWithHashtags {
                    id: row.get(0)?,
                    note: row.get(1)?,
                    created: row.get(2)?,
                    user_handle: row.get(3)?,
                    hashtags: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        // Link insertion order is the order the tags were typed in.
        let mut tags_stmt = conn.prepare(
            "SELECT h.content
             FROM hashtag_note hn
             JOIN hashtag h ON hn.hashtag_id = h.id
             WHERE hn.note_id = ?1
             ORDER BY hn.rowid",
        )?;
        for note in notes.iter_mut() {
            note.hashtags = tags_stmt
                .query_map(params![note.id], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
        }
        Ok(notes)
    }

    fn add_artist(&self, artist_name: &str, info: &str) -> MusicStoreResult<EntityId> {
        let artist_name = validate_name("artist name", artist_name)?;
        let conn = lock_connection(&self.conn);
        conn.execute(
            "INSERT INTO artist (artist_name, info) VALUES (?1, ?2)",
            params![artist_name, info.trim()],
        )
        .map_err(|err| classify_insert_error(err, format!("artist '{}'", artist_name)))?;
        let artist_id = conn.last_insert_rowid();
        info!("Added artist '{}' with id {}", artist_name, artist_id);
        Ok(artist_id)
    }

    fn add_album(&self, album: NewAlbum) -> MusicStoreResult<EntityId> {
        let album_name = validate_name("album name", &album.album_name)?;
        let release_date = validate_release_date(album.release_date.as_deref())?;

        let mut conn = lock_connection(&self.conn);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !Self::entity_exists(&tx, EntityType::Artist, album.artist_id)? {
            return Err(MusicStoreError::NotFound(format!(
                "artist {}",
                album.artist_id
            )));
        }
        tx.execute(
            "INSERT INTO album (album_name, artist_id, release_date) VALUES (?1, ?2, ?3)",
            params![album_name, album.artist_id, release_date],
        )
        .map_err(|err| classify_insert_error(err, format!("album '{}'", album_name)))?;
        let album_id = tx.last_insert_rowid();
        tx.commit()?;

        info!("Added album '{}' with id {}", album_name, album_id);
        Ok(album_id)
    }

    fn add_song(&self, user_id: UserId, song: NewSong) -> MusicStoreResult<EntityId> {
        let song_name = validate_name("song name", &song.song_name)?;
        let release_date = validate_release_date(song.release_date.as_deref())?;
        let rating = song
            .rating
            .map(|rating| validate_score(rating.score).map(|score| (score, rating.review)))
            .transpose()?;

        let mut conn = lock_connection(&self.conn);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !Self::entity_exists(&tx, EntityType::Artist, song.artist_id)? {
            return Err(MusicStoreError::NotFound(format!(
                "artist {}",
                song.artist_id
            )));
        }
        let album_artist_id: Option<EntityId> = tx
            .query_row(
                "SELECT artist_id FROM album WHERE id = ?1",
                params![song.album_id],
                |row| row.get(0),
            )
            .optional()?;
        match album_artist_id {
            None => {
                return Err(MusicStoreError::NotFound(format!(
                    "album {}",
                    song.album_id
                )))
            }
            Some(artist_id) if artist_id != song.artist_id => {
                return Err(MusicStoreError::InvalidInput(format!(
                    "album {} is not by artist {}",
                    song.album_id, song.artist_id
                )))
            }
            Some(_) => {}
        }

        tx.execute(
            "INSERT INTO song (song_name, artist_id, album_id, release_date) VALUES (?1, ?2, ?3, ?4)",
            params![song_name, song.artist_id, song.album_id, release_date],
        )
        .map_err(|err| classify_insert_error(err, format!("song '{}'", song_name)))?;
        let song_id = tx.last_insert_rowid();

        if let Some((score, review)) = rating {
            Self::upsert_rating(&tx, user_id, song_id, score, review.trim())?;
        }
        tx.commit()?;

        info!("Added song '{}' with id {}", song_name, song_id);
        Ok(song_id)
    }

    fn add_note(
        &self,
        user_id: UserId,
        entity_type: EntityType,
        entity_id: EntityId,
        note: &str,
        raw_hashtags: Option<&str>,
    ) -> MusicStoreResult<CreatedNote> {
        let note = validate_name("note", note)?;

        let mut conn = lock_connection(&self.conn);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !Self::entity_exists(&tx, entity_type, entity_id)? {
            return Err(MusicStoreError::NotFound(format!(
                "{} {}",
                entity_type, entity_id
            )));
        }

        tx.execute(
            "INSERT INTO note (entity_type, entity_id, note, user_id) VALUES (?1, ?2, ?3, ?4)",
            params![entity_type.as_str(), entity_id, note, user_id],
        )?;
        let note_id = tx.last_insert_rowid();
        let linked = link_hashtags(&tx, note_id, raw_hashtags)?;
        tx.commit()?;

        info!(
            "User {} added note {} to {} {} with {} hashtags",
            user_id,
            note_id,
            entity_type,
            entity_id,
            linked.len()
        );
        Ok(CreatedNote {
            note_id,
            hashtags: linked.into_iter().map(|tag| tag.content).collect(),
        })
    }

    fn upsert_song_rating(
        &self,
        user_id: UserId,
        song_id: EntityId,
        score: i64,
        review: &str,
    ) -> MusicStoreResult<()> {
        let score = validate_score(score)?;
        let mut conn = lock_connection(&self.conn);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !Self::entity_exists(&tx, EntityType::Song, song_id)? {
            return Err(MusicStoreError::NotFound(format!("song {}", song_id)));
        }
        Self::upsert_rating(&tx, user_id, song_id, score, review.trim())?;
        tx.commit()?;
        debug!("User {} rated song {} with {}", user_id, song_id, score);
        Ok(())
    }

    fn artist_stats(&self, artist_id: EntityId) -> MusicStoreResult<Option<ArtistStats>> {
        let conn = lock_connection(&self.conn);
        let stats = conn
            .query_row(
                "SELECT a.id, a.artist_name,
                    (SELECT COUNT(*) FROM song s WHERE s.artist_id = a.id),
                    (SELECT COUNT(*) FROM album al WHERE al.artist_id = a.id),
                    (SELECT COUNT(*) FROM song_rating r JOIN song s ON r.song_id = s.id
                        WHERE s.artist_id = a.id),
                    (SELECT AVG(r.score) FROM song_rating r JOIN song s ON r.song_id = s.id
                        WHERE s.artist_id = a.id)
                 FROM artist a
                 WHERE a.id = ?1",
                params![artist_id],
                |row| {
                    Ok(ArtistStats {
                        artist_id: row.get(0)?,
                        artist_name: row.get(1)?,
                        song_count: row.get(2)?,
                        album_count: row.get(3)?,
                        rating_count: row.get(4)?,
                        average_score: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(stats)
    }

    fn user_activity(&self, user_id: UserId) -> MusicStoreResult<Option<UserActivity>> {
        let conn = lock_connection(&self.conn);
        let activity = conn
            .query_row(
                "SELECT u.id, u.handle,
                    (SELECT COUNT(*) FROM song_rating r WHERE r.user_id = u.id),
                    (SELECT AVG(r.score) FROM song_rating r WHERE r.user_id = u.id),
                    (SELECT COUNT(*) FROM note n WHERE n.user_id = u.id),
                    (SELECT COUNT(DISTINCT hn.hashtag_id) FROM hashtag_note hn
                        JOIN note n ON hn.note_id = n.id WHERE n.user_id = u.id),
                    NULLIF(MAX(
                        COALESCE((SELECT MAX(r.updated) FROM song_rating r WHERE r.user_id = u.id), 0),
                        COALESCE((SELECT MAX(n.created) FROM note n WHERE n.user_id = u.id), 0)
                    ), 0)
                 FROM user u
                 WHERE u.id = ?1",
                params![user_id],
                |row| {
                    Ok(UserActivity {
                        user_id: row.get(0)?,
                        user_handle: row.get(1)?,
                        rating_count: row.get(2)?,
                        average_score: row.get(3)?,
                        note_count: row.get(4)?,
                        hashtag_count: row.get(5)?,
                        last_activity: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(activity)
    }

    fn top_rated_songs(&self, limit: usize) -> MusicStoreResult<Vec<TopRatedSong>> {
        let conn = lock_connection(&self.conn);
        let mut stmt = conn.prepare(
            "SELECT s.id, s.song_name, a.id, a.artist_name,
                AVG(r.score) AS average_score, COUNT(*) AS rating_count
             FROM song_rating r
             JOIN song s ON r.song_id = s.id
             JOIN artist a ON s.artist_id = a.id
             GROUP BY s.id
             ORDER BY average_score DESC, rating_count DESC, s.id
             LIMIT ?1",
        )?;
        let songs = stmt
            .query_map(params![limit as i64], |row| {
                Ok(TopRatedSong {
                    song_id: row.get(0)?,
                    song_name: row.get(1)?,
                    artist_id: row.get(2)?,
                    artist_name: row.get(3)?,
                    average_score: row.get(4)?,
                    rating_count: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    fn most_rated_artists(&self, limit: usize) -> MusicStoreResult<Vec<RatedArtist>> {
        let conn = lock_connection(&self.conn);
        let mut stmt = conn.prepare(
            "SELECT a.id, a.artist_name,
                COUNT(*) AS rating_count, AVG(r.score) AS average_score
             FROM song_rating r
             JOIN song s ON r.song_id = s.id
             JOIN artist a ON s.artist_id = a.id
             GROUP BY a.id
             ORDER BY rating_count DESC, average_score DESC, a.id
             LIMIT ?1",
        )?;
        let artists = stmt
            .query_map(params![limit as i64], |row| {
                Ok(RatedArtist {
                    artist_id: row.get(0)?,
                    artist_name: row.get(1)?,
                    rating_count: row.get(2)?,
                    average_score: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn search_hashtags(&self, query: &str, limit: usize) -> MusicStoreResult<Vec<HashtagUsage>> {
        let query = match normalize_hashtag(query) {
            Some(query) => query,
            None => return Ok(Vec::new()),
        };
        let conn = lock_connection(&self.conn);
        let mut stmt = conn.prepare(
            r"SELECT h.id, h.content, COUNT(hn.note_id) AS usage_count
              FROM hashtag h
              LEFT JOIN hashtag_note hn ON hn.hashtag_id = h.id
              WHERE h.content LIKE ?1 ESCAPE '\'
              GROUP BY h.id
              ORDER BY usage_count DESC, h.content
              LIMIT ?2",
        )?;
        let hashtags = stmt
            .query_map(params![like_pattern(query), limit as i64], |row| {
                Ok(HashtagUsage {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    usage_count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hashtags)
    }

    fn songs_by_hashtag(&self, hashtag: &str) -> MusicStoreResult<Vec<SongSummary>> {
        let hashtag = match normalize_hashtag(hashtag) {
            Some(hashtag) => hashtag,
            None => return Ok(Vec::new()),
        };
        let conn = lock_connection(&self.conn);
        let mut stmt = conn.prepare(
            "SELECT DISTINCT s.id, s.song_name, a.id, a.artist_name, al.id, al.album_name
             FROM hashtag h
             JOIN hashtag_note hn ON hn.hashtag_id = h.id
             JOIN note n ON n.id = hn.note_id AND n.entity_type = 'song'
             JOIN song s ON s.id = n.entity_id
             JOIN artist a ON s.artist_id = a.id
             JOIN album al ON s.album_id = al.id
             WHERE h.content = ?1
             ORDER BY s.song_name, s.id",
        )?;
        let songs = stmt
            .query_map(params![hashtag], Self::parse_song_summary_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    fn search_artists(&self, query: &str) -> MusicStoreResult<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let conn = lock_connection(&self.conn);
        let mut stmt = conn.prepare(
            r"SELECT id, artist_name FROM artist
              WHERE artist_name LIKE ?1 ESCAPE '\'
              ORDER BY artist_name
              LIMIT ?2",
        )?;
        let results = stmt
            .query_map(
                params![like_pattern(query), SEARCH_RESULTS_LIMIT as i64],
                Self::parse_search_result_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(results)
    }

    fn search_albums(
        &self,
        query: &str,
        artist_id: Option<EntityId>,
    ) -> MusicStoreResult<Vec<SearchResult>> {
        let conn = lock_connection(&self.conn);
        let mut stmt = conn.prepare(
            r"SELECT id, album_name FROM album
              WHERE album_name LIKE ?1 ESCAPE '\'
                AND (?2 IS NULL OR artist_id = ?2)
              ORDER BY album_name
              LIMIT ?3",
        )?;
        let results = stmt
            .query_map(
                params![
                    like_pattern(query.trim()),
                    artist_id,
                    SEARCH_RESULTS_LIMIT as i64
                ],
                Self::parse_search_result_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(results)
    }

    fn search_songs(&self, query: &str) -> MusicStoreResult<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let conn = lock_connection(&self.conn);
        let mut stmt = conn.prepare(
            r"SELECT s.id, s.song_name || ' - ' || a.artist_name
              FROM song s
              JOIN artist a ON s.artist_id = a.id
              WHERE s.song_name LIKE ?1 ESCAPE '\'
              ORDER BY s.song_name
              LIMIT ?2",
        )?;
        let results = stmt
            .query_map(
                params![like_pattern(query), SEARCH_RESULTS_LIMIT as i64],
                Self::parse_search_result_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(results)
    }
}
