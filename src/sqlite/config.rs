use std::future::Future;
use std::sync::Arc;

use bb8::{ManageConnection, Pool};

use crate::config::Configuration;
use crate::error::SqlMapperError;
use crate::translation::PlaceholderStyle;

use super::session::SqliteSession;

/// One `rusqlite` connection, locked for the duration of each blocking call.
pub type SharedSqliteConnection = Arc<tokio::sync::Mutex<rusqlite::Connection>>;

const MEMORY_PATH: &str = ":memory:";

/// Options for configuring a `SQLite` session factory.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub db_path: String,
    pub max_size: u32,
    pub wal: bool,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            max_size: 4,
            wal: true,
        }
    }

    /// A private `:memory:` database lives and dies with its connection, so
    /// such pools hold exactly one, never recycled. Only one session can be open
    /// against it at a time.
    fn effective_max_size(&self) -> u32 {
        if self.db_path == MEMORY_PATH {
            1
        } else {
            self.max_size.max(1)
        }
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path.into()),
        }
    }

    #[must_use]
    pub fn max_size(mut self, max_size: u32) -> Self {
        self.opts.max_size = max_size;
        self
    }

    /// Switch new connections to WAL journaling (on by default).
    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Build a session factory serving `configuration`.
    ///
    /// # Errors
    /// Returns `SqlMapperError` if the configuration targets another placeholder
    /// style or the pool cannot open its first connection.
    pub async fn build(
        self,
        configuration: Configuration,
    ) -> Result<SqliteSessionFactory, SqlMapperError> {
        SqliteSessionFactory::new(self.finish(), configuration).await
    }
}

/// bb8 manager for `SQLite` connections.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    db_path: String,
    wal: bool,
}

impl SqliteManager {
    #[must_use]
    pub fn new(db_path: impl Into<String>, wal: bool) -> Self {
        Self {
            db_path: db_path.into(),
            wal,
        }
    }

    fn open(&self) -> Result<rusqlite::Connection, rusqlite::Error> {
        let conn = rusqlite::Connection::open(&self.db_path)?;
        if self.wal {
            // journal_mode answers with a row, so it cannot go through execute.
            conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
        }
        Ok(conn)
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = rusqlite::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let opened = self.open();
        async move { opened.map(|conn| Arc::new(tokio::sync::Mutex::new(conn))) }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let handle = Arc::clone(conn);
        async move {
            let guard = handle.lock().await;
            guard.query_row("SELECT 1", [], |_| Ok(()))
        }
    }

    /// A connection handed back while a transaction is still open would leak
    /// that transaction into the next checkout.
    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.try_lock().is_ok_and(|guard| !guard.is_autocommit())
    }
}

/// Hands out [`SqliteSession`]s over a shared pool and configuration.
#[derive(Clone)]
pub struct SqliteSessionFactory {
    pool: Pool<SqliteManager>,
    configuration: Arc<Configuration>,
}

impl SqliteSessionFactory {
    /// # Errors
    /// Returns `SqlMapperError::ConfigError` for a non-`SQLite` placeholder style and
    /// `SqlMapperError::ConnectionError` if the pool cannot be built.
    pub async fn new(
        opts: SqliteOptions,
        configuration: Configuration,
    ) -> Result<Self, SqlMapperError> {
        if configuration.placeholder_style() != PlaceholderStyle::Sqlite {
            return Err(SqlMapperError::ConfigError(format!(
                "SQLite sessions need SQLite placeholders, configuration uses {:?}",
                configuration.placeholder_style()
            )));
        }
        let manager = SqliteManager::new(opts.db_path.clone(), opts.wal);
        let mut builder = Pool::builder().max_size(opts.effective_max_size());
        if opts.db_path == MEMORY_PATH {
            builder = builder.idle_timeout(None).max_lifetime(None);
        }
        let pool = builder
            .build(manager)
            .await
            .map_err(|e| {
                SqlMapperError::ConnectionError(format!("Failed to create SQLite pool: {e}"))
            })?;
        tracing::debug!(
            db_path = %opts.db_path,
            statements = configuration.len(),
            "sqlite session factory ready"
        );
        Ok(Self {
            pool,
            configuration: Arc::new(configuration),
        })
    }

    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    #[must_use]
    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    /// Check out a pooled connection as a session.
    ///
    /// # Errors
    /// Returns `SqlMapperError::ConnectionError` if no connection can be acquired.
    pub async fn open_session(&self) -> Result<SqliteSession, SqlMapperError> {
        let conn = self.pool.get_owned().await?;
        Ok(SqliteSession::new(conn, Arc::clone(&self.configuration)))
    }
}

impl std::fmt::Debug for SqliteSessionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSessionFactory")
            .field("pool", &self.pool.state())
            .field("statements", &self.configuration.len())
            .finish()
    }
}
