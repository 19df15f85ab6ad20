use super::schema::MUSIC_LOG_VERSIONED_SCHEMAS;
use super::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::info;

/// One connection shared by every store, serialized by the mutex.
pub type SharedConnection = Arc<Mutex<Connection>>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Locks the shared connection. A panic while holding the lock cannot leave
/// an open transaction behind (rusqlite rolls back on drop), so a poisoned
/// lock is still safe to reuse.
pub fn lock_connection(conn: &SharedConnection) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Opens a connection to the music log database at `db_path`, creating the
/// latest schema for a brand new file, or validating and migrating an
/// existing one.
pub fn open_connection<T: AsRef<Path>>(db_path: T) -> Result<Connection> {
    let db_path = db_path.as_ref();
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open database at {:?}", db_path))?;

    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    let latest = MUSIC_LOG_VERSIONED_SCHEMAS
        .last()
        .context("No schema versions defined")?;

    if table_count == 0 {
        info!("Creating music log db schema at version {}", latest.version);
        latest.create(&conn)?;
    } else {
        let version = read_schema_version(&conn)?;
        MUSIC_LOG_VERSIONED_SCHEMAS
            .get(version)
            .context("Failed to get schema")?
            .validate(&conn)?;
        migrate_if_needed(&conn, version)?;
    }

    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

/// Same as [`open_connection`], wrapped for sharing between stores.
pub fn open_database<T: AsRef<Path>>(db_path: T) -> Result<SharedConnection> {
    Ok(Arc::new(Mutex::new(open_connection(db_path)?)))
}

fn read_schema_version(conn: &Connection) -> Result<usize> {
    let raw_version: i64 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .context("Failed to read database version")?;
    let db_version = raw_version - BASE_DB_VERSION as i64;

    if db_version < 0 {
        bail!(
            "Database version {} is not a music log database (base version {})",
            raw_version,
            BASE_DB_VERSION
        );
    }
    if db_version >= MUSIC_LOG_VERSIONED_SCHEMAS.len() as i64 {
        bail!("Database version {} is too new", db_version);
    }
    Ok(db_version as usize)
}

fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
    let mut latest_from = version;
    for schema in MUSIC_LOG_VERSIONED_SCHEMAS.iter().skip(version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating db from version {} to {}",
                latest_from, schema.version
            );
            migration_fn(conn)?;
        }
        latest_from = schema.version;
    }
    conn.pragma_update(None, "user_version", BASE_DB_VERSION + latest_from)?;
    Ok(())
}
