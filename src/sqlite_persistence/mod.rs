mod database;
pub mod schema;
mod versioned_schema;

pub use database::{lock_connection, open_connection, open_database, SharedConnection};
pub use versioned_schema::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
    DEFAULT_TIMESTAMP,
};
