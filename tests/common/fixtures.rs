//! Test fixtures: a fresh database with two users and a small catalog.

use super::constants::*;
use anyhow::Result;
use music_log_server::music_store::{MusicStore, NewAlbum, NewSong, SqliteMusicStore};
use music_log_server::sqlite_persistence::{open_database, SharedConnection};
use music_log_server::user::{SqliteUserStore, UserManager};
use std::sync::Arc;
use tempfile::TempDir;

pub fn create_test_db() -> Result<(TempDir, SharedConnection)> {
    let temp_dir = TempDir::new()?;
    let conn = open_database(temp_dir.path().join("music_log.db"))?;
    Ok((temp_dir, conn))
}

pub fn create_test_users(user_manager: &UserManager) -> Result<()> {
    user_manager.register(TEST_USER, TEST_PASS)?;
    user_manager.register(OTHER_USER, OTHER_PASS)?;
    Ok(())
}

pub fn create_test_catalog(store: &dyn MusicStore) -> Result<()> {
    let test_band = store.add_artist("The Test Band", "Plays tests.")?;
    let jazz = store.add_artist("Jazz Ensemble", "")?;

    let first_album = store.add_album(NewAlbum {
        artist_id: test_band,
        album_name: "First Album".to_string(),
        release_date: Some("2001-02-03".to_string()),
    })?;
    let jazz_collection = store.add_album(NewAlbum {
        artist_id: jazz,
        album_name: "Jazz Collection".to_string(),
        release_date: None,
    })?;

    let user_id = 1;
    for (song_name, artist_id, album_id) in [
        ("Opening Track", test_band, first_album),
        ("Second Song", test_band, first_album),
        ("Smooth Interlude", jazz, jazz_collection),
    ] {
        store.add_song(
            user_id,
            NewSong {
                song_name: song_name.to_string(),
                artist_id,
                album_id,
                release_date: None,
                rating: None,
            },
        )?;
    }
    Ok(())
}

pub fn create_stores(conn: SharedConnection) -> (Arc<SqliteMusicStore>, Arc<UserManager>) {
    let music_store = Arc::new(SqliteMusicStore::new(conn.clone()));
    let user_manager = Arc::new(UserManager::new(Arc::new(SqliteUserStore::new(conn))));
    (music_store, user_manager)
}
