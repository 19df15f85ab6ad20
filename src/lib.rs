//! Music log server library
//!
//! Exposes the internal modules for the binary and the integration tests.

pub mod config;
pub mod music_store;
pub mod server;
pub mod sqlite_persistence;
pub mod tagging;
pub mod user;

pub use music_store::{MusicStore, SqliteMusicStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{SqliteUserStore, UserManager};
