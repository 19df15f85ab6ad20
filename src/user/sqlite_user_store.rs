use crate::sqlite_persistence::schema::{
    AUTH_TOKEN_TABLE, USER_PASSWORD_CREDENTIALS_TABLE, USER_TABLE,
};
use crate::sqlite_persistence::{lock_connection, SharedConnection};
use crate::user::*;
use anyhow::{Context, Result};
use rusqlite::{ffi, params, OptionalExtension, Row, TransactionBehavior};
use std::str::FromStr;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use super::auth::{HashedPassword, PasswordHasher};

/// User store backed by the shared music log database.
pub struct SqliteUserStore {
    conn: SharedConnection,
}

impl SqliteUserStore {
    pub fn new(conn: SharedConnection) -> Self {
        SqliteUserStore { conn }
    }
}

fn system_time_from_column_result(value: i64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(value.max(0) as u64)
}

fn auth_token_from_row(row: &Row) -> rusqlite::Result<AuthToken> {
    Ok(AuthToken {
        user_id: row.get::<_, i64>("user_id")? as usize,
        value: AuthTokenValue(row.get("value")?),
        created: system_time_from_column_result(row.get("created")?),
        last_used: row
            .get::<_, Option<i64>>("last_used")?
            .map(system_time_from_column_result),
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl UserStore for SqliteUserStore {
    fn create_user_with_password(
        &self,
        user_handle: &str,
        password: &HashedPassword,
    ) -> Result<Option<usize>> {
        let mut conn = lock_connection(&self.conn);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match tx.execute(
            &format!("INSERT INTO {} (handle) VALUES (?1)", USER_TABLE.name),
            params![user_handle],
        ) {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                debug!("User handle {} is already taken", user_handle);
                return Ok(None);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to create user {}", user_handle))
            }
        }
        let user_id = tx.last_insert_rowid();

        tx.execute(
            &format!(
                "INSERT INTO {} (salt, hash, hasher, user_id) VALUES (?1, ?2, ?3, ?4)",
                USER_PASSWORD_CREDENTIALS_TABLE.name
            ),
            params![
                password.salt,
                password.hash,
                password.hasher.to_string(),
                user_id
            ],
        )
        .with_context(|| format!("Failed to store password of user {}", user_handle))?;
        tx.commit()?;

        debug!("Created user {} with id {}", user_handle, user_id);
        Ok(Some(user_id as usize))
    }

    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        let conn = lock_connection(&self.conn);
        let id: Option<i64> = conn
            .query_row(
                &format!("SELECT id FROM {} WHERE handle = ?1", USER_TABLE.name),
                params![user_handle],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(|id| id as usize))
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_user_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = lock_connection(&self.conn);
        let token = conn
            .query_row(
                &format!(
                    "SELECT user_id, value, created, last_used FROM {} WHERE value = ?1",
                    AUTH_TOKEN_TABLE.name
                ),
                params![value.0],
                auth_token_from_row,
            )
            .optional()?;
        Ok(token)
    }

    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let token = match self.get_user_auth_token(token)? {
            Some(token) => token,
            None => return Ok(None),
        };
        let conn = lock_connection(&self.conn);
        conn.execute(
            &format!("DELETE FROM {} WHERE value = ?1", AUTH_TOKEN_TABLE.name),
            params![token.value.0],
        )?;
        Ok(Some(token))
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = lock_connection(&self.conn);
        conn.execute(
            &format!(
                "UPDATE {} SET last_used = cast(strftime('%s','now') as int) WHERE value = ?1",
                AUTH_TOKEN_TABLE.name
            ),
            params![token.0],
        )?;
        Ok(())
    }

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()> {
        let conn = lock_connection(&self.conn);
        conn.execute(
            &format!(
                "INSERT INTO {} (value, user_id) VALUES (?1, ?2)",
                AUTH_TOKEN_TABLE.name
            ),
            params![token.value.0, token.user_id as i64],
        )
        .with_context(|| format!("Failed to store auth token of user {}", token.user_id))?;
        Ok(())
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>> {
        let user_id = match self.get_user_id(user_handle)? {
            Some(id) => id,
            None => return Ok(None),
        };
        let conn = lock_connection(&self.conn);
        let row: Option<(String, String, String, i64, Option<i64>, Option<i64>)> = conn
            .query_row(
                &format!(
                    "SELECT salt, hash, hasher, created, last_tried, last_used FROM {} WHERE user_id = ?1",
                    USER_PASSWORD_CREDENTIALS_TABLE.name
                ),
                params![user_id as i64],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()?;

        let username_password = match row {
            None => None,
            Some((salt, hash, hasher, created, last_tried, last_used)) => {
                match PasswordHasher::from_str(&hasher) {
                    Ok(hasher) => Some(UsernamePasswordCredentials {
                        user_id,
                        salt,
                        hash,
                        hasher,
                        created: system_time_from_column_result(created),
                        last_tried: last_tried.map(system_time_from_column_result),
                        last_used: last_used.map(system_time_from_column_result),
                    }),
                    Err(err) => {
                        warn!("Ignoring password credentials of user {}: {}", user_id, err);
                        None
                    }
                }
            }
        };

        Ok(Some(UserAuthCredentials {
            user_id,
            username_password,
        }))
    }

    fn record_password_attempt(&self, user_id: usize, succeeded: bool) -> Result<()> {
        let conn = lock_connection(&self.conn);
        let sql = if succeeded {
            "UPDATE user_password_credentials
             SET last_tried = cast(strftime('%s','now') as int),
                 last_used = cast(strftime('%s','now') as int)
             WHERE user_id = ?1"
        } else {
            "UPDATE user_password_credentials
             SET last_tried = cast(strftime('%s','now') as int)
             WHERE user_id = ?1"
        };
        conn.execute(sql, params![user_id as i64])?;
        Ok(())
    }
}
