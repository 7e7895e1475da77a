//! `SQLite` engine: pooled `rusqlite` connections behind the
//! [`Session`](crate::session::Session) trait.

pub mod config;
pub mod params;
pub mod query;
pub mod session;

pub use config::{
    SharedSqliteConnection, SqliteManager, SqliteOptions, SqliteOptionsBuilder,
    SqliteSessionFactory,
};
pub use session::SqliteSession;
