//! The engine boundary every statement variant is written against.

use std::ops::ControlFlow;

use async_trait::async_trait;

use crate::bounds::PagingBounds;
use crate::error::SqlMapperError;
use crate::results::{KeyedRows, MappedRow};
use crate::statement::StatementSignature;
use crate::types::{Params, RowValues};

/// What the engine reports for one insert.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertOutcome {
    pub rows_affected: usize,
    /// Present only when the statement has a key generator configured.
    pub generated_key: Option<RowValues>,
}

impl InsertOutcome {
    #[must_use]
    pub fn rows(rows_affected: usize) -> Self {
        Self {
            rows_affected,
            generated_key: None,
        }
    }
}

/// Receives streamed rows one at a time.
///
/// Returning `ControlFlow::Break(())` stops delivery; returning an error stops
/// delivery and the error is propagated to the caller of the streaming select.
pub trait RowHandler {
    /// # Errors
    /// Any error aborts the remaining delivery.
    fn handle_row(&mut self, row: MappedRow) -> Result<ControlFlow<()>, SqlMapperError>;
}

impl<F> RowHandler for F
where
    F: FnMut(MappedRow) -> Result<ControlFlow<()>, SqlMapperError>,
{
    fn handle_row(&mut self, row: MappedRow) -> Result<ControlFlow<()>, SqlMapperError> {
        self(row)
    }
}

/// Capabilities a statement needs from an engine session.
///
/// Statements pass their fully-qualified id; resolving it to SQL, binding
/// parameters, executing, windowing and mapping columns are the session's job.
#[async_trait]
pub trait Session: Send + Sync {
    /// Confirm `id` is registered for the operation family and with the
    /// parameter and result types in `signature`. Called before every
    /// statement invocation.
    ///
    /// # Errors
    /// Returns `SqlMapperError::UnknownStatement` for an unregistered id and
    /// `SqlMapperError::ConfigError` when the kind or a declared type differs.
    fn verify(&self, id: &str, signature: &StatementSignature) -> Result<(), SqlMapperError>;

    /// Execute an insert and report affected rows.
    ///
    /// # Errors
    /// Returns the engine's error unmodified.
    async fn insert(&self, id: &str, params: Params) -> Result<InsertOutcome, SqlMapperError>;

    /// Execute a select expected to produce at most one row.
    ///
    /// # Errors
    /// Returns `SqlMapperError::TooManyResults` when more than one row is produced.
    async fn select_one(&self, id: &str, params: Params)
    -> Result<Option<MappedRow>, SqlMapperError>;

    /// Execute a select and return the rows inside `bounds`, in engine order.
    ///
    /// # Errors
    /// Returns the engine's error unmodified.
    async fn select_list(
        &self,
        id: &str,
        params: Params,
        bounds: PagingBounds,
    ) -> Result<Vec<MappedRow>, SqlMapperError>;

    /// Execute a select and pair every row with its `key_field` value.
    ///
    /// # Errors
    /// Returns `SqlMapperError::ResultMapping` when a row lacks `key_field`.
    async fn select_map(
        &self,
        id: &str,
        params: Params,
        key_field: &str,
        bounds: PagingBounds,
    ) -> Result<KeyedRows, SqlMapperError> {
        let rows = self.select_list(id, params, bounds).await?;
        key_rows(id, rows, key_field)
    }

    /// Execute a select and push each row to `handler` as it is produced.
    ///
    /// Returns the number of rows handed to `handler`.
    ///
    /// # Errors
    /// Returns the engine's error, or the first error `handler` returned.
    async fn select_streaming(
        &self,
        id: &str,
        params: Params,
        bounds: PagingBounds,
        handler: &mut (dyn RowHandler + Send),
    ) -> Result<usize, SqlMapperError>;
}

/// Pair each row with its `key_field` value, keeping production order.
///
/// # Errors
/// Returns `SqlMapperError::ResultMapping` when a row lacks `key_field`.
pub fn key_rows(
    id: &str,
    rows: Vec<MappedRow>,
    key_field: &str,
) -> Result<KeyedRows, SqlMapperError> {
    rows.into_iter()
        .map(|row| {
            let key = row.get(key_field).cloned().ok_or_else(|| {
                SqlMapperError::ResultMapping(format!(
                    "statement {id}: map key field {key_field} not present in result"
                ))
            })?;
            Ok((key, row))
        })
        .collect()
}
