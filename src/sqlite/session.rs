use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use async_trait::async_trait;
use bb8::PooledConnection;

use crate::bounds::PagingBounds;
use crate::config::Configuration;
use crate::error::SqlMapperError;
use crate::results::MappedRow;
use crate::session::{InsertOutcome, RowHandler, Session};
use crate::statement::StatementSignature;
use crate::types::Params;

use super::config::{SharedSqliteConnection, SqliteManager};
use super::query;

/// A [`Session`] over one pooled `SQLite` connection.
///
/// Statements run in auto-commit mode unless [`begin`](Self::begin) opened a
/// transaction. A session returned to the pool with a transaction still open is
/// discarded rather than reused.
pub struct SqliteSession {
    conn: PooledConnection<'static, SqliteManager>,
    configuration: Arc<Configuration>,
}

impl SqliteSession {
    pub(crate) fn new(
        conn: PooledConnection<'static, SqliteManager>,
        configuration: Arc<Configuration>,
    ) -> Self {
        Self {
            conn,
            configuration,
        }
    }

    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn conn_handle(&self) -> SharedSqliteConnection {
        Arc::clone(&*self.conn)
    }

    /// Run raw SQL (DDL, seeding) outside any mapped statement.
    ///
    /// # Errors
    /// Returns `SqlMapperError::SqliteError` if any statement in the batch fails.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlMapperError> {
        let sql_owned = sql.to_owned();
        run_blocking(self.conn_handle(), move |conn| {
            conn.execute_batch(&sql_owned)
                .map_err(SqlMapperError::SqliteError)
        })
        .await
    }

    /// # Errors
    /// Returns `SqlMapperError::SqliteError` if a transaction is already open.
    pub async fn begin(&self) -> Result<(), SqlMapperError> {
        self.execute_batch("BEGIN").await
    }

    /// # Errors
    /// Returns `SqlMapperError::SqliteError` if no transaction is open.
    pub async fn commit(&self) -> Result<(), SqlMapperError> {
        self.execute_batch("COMMIT").await
    }

    /// # Errors
    /// Returns `SqlMapperError::SqliteError` if no transaction is open.
    pub async fn rollback(&self) -> Result<(), SqlMapperError> {
        self.execute_batch("ROLLBACK").await
    }

    /// True while a transaction opened by [`begin`](Self::begin) is pending.
    pub async fn in_transaction(&self) -> bool {
        !self.conn.lock().await.is_autocommit()
    }
}

impl fmt::Debug for SqliteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteSession")
            .field("statements", &self.configuration.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Session for SqliteSession {
    fn verify(&self, id: &str, signature: &StatementSignature) -> Result<(), SqlMapperError> {
        self.configuration.statement_checked(id, signature).map(|_| ())
    }

    async fn insert(&self, id: &str, params: Params) -> Result<InsertOutcome, SqlMapperError> {
        let configuration = Arc::clone(&self.configuration);
        let id = id.to_owned();
        let outcome = run_blocking(self.conn_handle(), move |conn| {
            query::insert(conn, &configuration, &id, params)
        })
        .await?;
        tracing::debug!(
            rows = outcome.rows_affected,
            key = ?outcome.generated_key,
            "sqlite insert done"
        );
        Ok(outcome)
    }

    async fn select_one(
        &self,
        id: &str,
        params: Params,
    ) -> Result<Option<MappedRow>, SqlMapperError> {
        let configuration = Arc::clone(&self.configuration);
        let id = id.to_owned();
        run_blocking(self.conn_handle(), move |conn| {
            let mut rows =
                query::select_all(conn, &configuration, &id, &params, PagingBounds::UNBOUNDED)?;
            if rows.len() > 1 {
                return Err(SqlMapperError::TooManyResults {
                    id,
                    found: rows.len(),
                });
            }
            Ok(rows.pop())
        })
        .await
    }

    async fn select_list(
        &self,
        id: &str,
        params: Params,
        bounds: PagingBounds,
    ) -> Result<Vec<MappedRow>, SqlMapperError> {
        let configuration = Arc::clone(&self.configuration);
        let id = id.to_owned();
        let rows = run_blocking(self.conn_handle(), move |conn| {
            query::select_all(conn, &configuration, &id, &params, bounds)
        })
        .await?;
        tracing::debug!(rows = rows.len(), "sqlite select done");
        Ok(rows)
    }

    /// Rows cross from the blocking reader to `handler` through a channel that
    /// holds a single row, so the reader never runs more than one row ahead.
    async fn select_streaming(
        &self,
        id: &str,
        params: Params,
        bounds: PagingBounds,
        handler: &mut (dyn RowHandler + Send),
    ) -> Result<usize, SqlMapperError> {
        let configuration = Arc::clone(&self.configuration);
        let id = id.to_owned();
        let handle = self.conn_handle();
        let (tx, mut rx) = tokio::sync::mpsc::channel::<MappedRow>(1);

        let reader = tokio::task::spawn_blocking(move || {
            let guard = handle.blocking_lock();
            query::select(&guard, &configuration, &id, &params, bounds, |row| {
                // A closed channel means the handler stopped or failed.
                Ok(if tx.blocking_send(row).is_ok() {
                    ControlFlow::Continue(())
                } else {
                    ControlFlow::Break(())
                })
            })
        });

        let mut delivered = 0;
        let mut handler_outcome = Ok(());
        while let Some(row) = rx.recv().await {
            delivered += 1;
            match handler.handle_row(row) {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => break,
                Err(err) => {
                    handler_outcome = Err(err);
                    break;
                }
            }
        }
        drop(rx);

        let read = reader.await.map_err(|e| {
            SqlMapperError::ExecutionError(format!("sqlite spawn_blocking join error: {e}"))
        })?;
        handler_outcome?;
        read?;
        tracing::debug!(rows = delivered, "sqlite streaming select done");
        Ok(delivered)
    }
}

pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlMapperError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlMapperError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| SqlMapperError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}
