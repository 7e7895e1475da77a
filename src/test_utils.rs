//! Scripted in-memory session for exercising statements without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::bounds::PagingBounds;
use crate::config::Configuration;
use crate::error::SqlMapperError;
use crate::results::{KeyedRows, MappedRow};
use crate::session::{InsertOutcome, RowHandler, Session, key_rows};
use crate::statement::StatementSignature;
use crate::types::Params;

/// One call as the scripted session received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: &'static str,
    pub id: String,
    pub params: Params,
    pub bounds: Option<PagingBounds>,
    pub key_field: Option<String>,
}

/// A [`Session`] answering from canned rows and insert outcomes.
///
/// Ids without a script fail with `SqlMapperError::UnknownStatement`, like an
/// engine whose configuration lacks them. Rows are windowed by the bounds a
/// call carries, and every call is recorded for later inspection. Signatures
/// are only verified once a [`Configuration`] is attached.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    configuration: Option<Arc<Configuration>>,
    rows: HashMap<String, Vec<MappedRow>>,
    inserts: HashMap<String, InsertOutcome>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<RecordedCall>>,
    produced: AtomicUsize,
}

impl ScriptedSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify every call against `configuration`, as an engine session does.
    #[must_use]
    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(Arc::new(configuration));
        self
    }

    /// Rows every select on `id` produces, in this order.
    #[must_use]
    pub fn with_rows(mut self, id: impl Into<String>, rows: Vec<MappedRow>) -> Self {
        self.rows.insert(id.into(), rows);
        self
    }

    #[must_use]
    pub fn with_insert(mut self, id: impl Into<String>, outcome: InsertOutcome) -> Self {
        self.inserts.insert(id.into(), outcome);
        self
    }

    /// Make every call on `id` fail with `SqlMapperError::ExecutionError(message)`.
    #[must_use]
    pub fn with_failure(mut self, id: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(id.into(), message.into());
        self
    }

    /// Calls received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rows produced by streaming selects so far.
    #[must_use]
    pub fn produced(&self) -> usize {
        self.produced.load(Ordering::SeqCst)
    }

    fn record(
        &self,
        operation: &'static str,
        id: &str,
        params: &Params,
        bounds: Option<PagingBounds>,
        key_field: Option<&str>,
    ) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                operation,
                id: id.to_owned(),
                params: params.clone(),
                bounds,
                key_field: key_field.map(str::to_owned),
            });
    }

    fn scripted_rows(&self, id: &str) -> Result<&[MappedRow], SqlMapperError> {
        if let Some(message) = self.failures.get(id) {
            return Err(SqlMapperError::ExecutionError(message.clone()));
        }
        self.rows
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| SqlMapperError::UnknownStatement(id.to_owned()))
    }

    fn windowed(&self, id: &str, bounds: PagingBounds) -> Result<Vec<MappedRow>, SqlMapperError> {
        Ok(bounds.window(self.scripted_rows(id)?.iter().cloned()).collect())
    }
}

#[async_trait]
impl Session for ScriptedSession {
    fn verify(&self, id: &str, signature: &StatementSignature) -> Result<(), SqlMapperError> {
        match &self.configuration {
            Some(configuration) => configuration.statement_checked(id, signature).map(|_| ()),
            None => Ok(()),
        }
    }

    async fn insert(&self, id: &str, params: Params) -> Result<InsertOutcome, SqlMapperError> {
        self.record("insert", id, &params, None, None);
        if let Some(message) = self.failures.get(id) {
            return Err(SqlMapperError::ExecutionError(message.clone()));
        }
        self.inserts
            .get(id)
            .cloned()
            .ok_or_else(|| SqlMapperError::UnknownStatement(id.to_owned()))
    }

    async fn select_one(
        &self,
        id: &str,
        params: Params,
    ) -> Result<Option<MappedRow>, SqlMapperError> {
        self.record("select_one", id, &params, None, None);
        let rows = self.scripted_rows(id)?;
        if rows.len() > 1 {
            return Err(SqlMapperError::TooManyResults {
                id: id.to_owned(),
                found: rows.len(),
            });
        }
        Ok(rows.first().cloned())
    }

    async fn select_list(
        &self,
        id: &str,
        params: Params,
        bounds: PagingBounds,
    ) -> Result<Vec<MappedRow>, SqlMapperError> {
        self.record("select_list", id, &params, Some(bounds), None);
        self.windowed(id, bounds)
    }

    async fn select_map(
        &self,
        id: &str,
        params: Params,
        key_field: &str,
        bounds: PagingBounds,
    ) -> Result<KeyedRows, SqlMapperError> {
        self.record("select_map", id, &params, Some(bounds), Some(key_field));
        key_rows(id, self.windowed(id, bounds)?, key_field)
    }

    async fn select_streaming(
        &self,
        id: &str,
        params: Params,
        bounds: PagingBounds,
        handler: &mut (dyn RowHandler + Send),
    ) -> Result<usize, SqlMapperError> {
        self.record("select_streaming", id, &params, Some(bounds), None);
        let mut delivered = 0;
        for row in bounds.window(self.scripted_rows(id)?.iter()) {
            self.produced.fetch_add(1, Ordering::SeqCst);
            delivered += 1;
            if handler.handle_row(row.clone())?.is_break() {
                break;
            }
        }
        Ok(delivered)
    }
}
