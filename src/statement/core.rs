use std::future::Future;

use tracing::Instrument;

use crate::error::SqlMapperError;
use crate::session::Session;
use crate::token::TypeDescriptor;

/// Which session operation family a statement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Insert,
    Select,
}

/// Cursor mode requested from the engine for a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultSetType {
    /// Leave the choice to the engine.
    #[default]
    Default,
    ForwardOnly,
    ScrollInsensitive,
    ScrollSensitive,
}

/// When a select-key query runs relative to its insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrder {
    /// Run first and bind the key as a parameter of the insert.
    Before,
    /// Run after the insert succeeded.
    After,
}

/// How an insert retrieves a database-generated key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyGenerator {
    /// No key retrieval is attempted.
    #[default]
    None,
    /// Use the key the database assigned to the inserted row.
    Generated { key_property: String },
    /// Run a separate query for the key.
    SelectKey {
        sql: String,
        key_property: String,
        order: KeyOrder,
    },
}

impl KeyGenerator {
    #[must_use]
    pub fn generated(key_property: impl Into<String>) -> Self {
        KeyGenerator::Generated {
            key_property: key_property.into(),
        }
    }

    #[must_use]
    pub fn select_key(
        sql: impl Into<String>,
        key_property: impl Into<String>,
        order: KeyOrder,
    ) -> Self {
        KeyGenerator::SelectKey {
            sql: sql.into(),
            key_property: key_property.into(),
            order,
        }
    }

    /// The caller-visible property the key is written to, if any.
    #[must_use]
    pub fn key_property(&self) -> Option<&str> {
        match self {
            KeyGenerator::None => None,
            KeyGenerator::Generated { key_property }
            | KeyGenerator::SelectKey { key_property, .. } => Some(key_property),
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, KeyGenerator::None)
    }
}

/// Operation family and declared types a statement is invoked with.
///
/// Sessions compare it against the registered statement before executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementSignature {
    pub kind: StatementKind,
    pub parameter: TypeDescriptor,
    pub result: TypeDescriptor,
}

/// Configuration-time attributes shared by every mapped statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementMeta {
    id: String,
    sql: String,
    kind: StatementKind,
    parameter_type: TypeDescriptor,
    result_type: TypeDescriptor,
    flush_cache: bool,
    use_cache: bool,
    result_map: Option<String>,
    fetch_size: Option<u32>,
    result_set_type: ResultSetType,
    key_generator: KeyGenerator,
}

impl StatementMeta {
    pub(crate) fn select(
        id: String,
        sql: String,
        parameter_type: TypeDescriptor,
        result_type: TypeDescriptor,
    ) -> Self {
        Self {
            id,
            sql,
            kind: StatementKind::Select,
            parameter_type,
            result_type,
            flush_cache: false,
            use_cache: true,
            result_map: None,
            fetch_size: None,
            result_set_type: ResultSetType::Default,
            key_generator: KeyGenerator::None,
        }
    }

    pub(crate) fn insert(id: String, sql: String, parameter_type: TypeDescriptor) -> Self {
        Self {
            id,
            sql,
            kind: StatementKind::Insert,
            parameter_type,
            result_type: TypeDescriptor::void(),
            flush_cache: true,
            use_cache: false,
            result_map: None,
            fetch_size: None,
            result_set_type: ResultSetType::Default,
            key_generator: KeyGenerator::None,
        }
    }

    /// Fully-qualified statement id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Mapped SQL text with `#{name}` placeholders.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    #[must_use]
    pub fn parameter_type(&self) -> TypeDescriptor {
        self.parameter_type
    }

    #[must_use]
    pub fn result_type(&self) -> TypeDescriptor {
        self.result_type
    }

    #[must_use]
    pub fn signature(&self) -> StatementSignature {
        StatementSignature {
            kind: self.kind,
            parameter: self.parameter_type,
            result: self.result_type,
        }
    }

    #[must_use]
    pub fn flush_cache(&self) -> bool {
        self.flush_cache
    }

    #[must_use]
    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    #[must_use]
    pub fn result_map(&self) -> Option<&str> {
        self.result_map.as_deref()
    }

    #[must_use]
    pub fn fetch_size(&self) -> Option<u32> {
        self.fetch_size
    }

    #[must_use]
    pub fn result_set_type(&self) -> ResultSetType {
        self.result_set_type
    }

    #[must_use]
    pub fn key_generator(&self) -> &KeyGenerator {
        &self.key_generator
    }

    pub(crate) fn set_flush_cache(&mut self, flush: bool) {
        self.flush_cache = flush;
    }

    pub(crate) fn set_use_cache(&mut self, use_cache: bool) {
        self.use_cache = use_cache;
    }

    pub(crate) fn set_result_map(&mut self, result_map: String) {
        self.result_map = Some(result_map);
    }

    pub(crate) fn set_fetch_size(&mut self, fetch_size: u32) {
        self.fetch_size = Some(fetch_size);
    }

    pub(crate) fn set_result_set_type(&mut self, result_set_type: ResultSetType) {
        self.result_set_type = result_set_type;
    }

    pub(crate) fn set_key_generator(&mut self, key_generator: KeyGenerator) {
        self.key_generator = key_generator;
    }
}

/// Anything that can be registered in a [`Configuration`](crate::config::Configuration).
pub trait MappedStatement {
    fn meta(&self) -> &StatementMeta;

    fn id(&self) -> &str {
        self.meta().id()
    }
}

/// The single path from a statement object into its session.
///
/// Inside a span naming the statement and operation, asks `session` to verify
/// the statement's signature, then runs `action`. Errors are returned exactly
/// as the session (or parameter conversion) produced them.
pub(crate) async fn execute<S, T, F>(
    session: &S,
    meta: &StatementMeta,
    operation: &'static str,
    action: F,
) -> Result<T, SqlMapperError>
where
    S: Session + ?Sized,
    F: Future<Output = Result<T, SqlMapperError>>,
{
    let span = tracing::debug_span!("mapped_statement", id = %meta.id(), operation);
    async move {
        tracing::debug!(
            parameter = meta.parameter_type().name(),
            result = meta.result_type().name(),
            "forwarding to session"
        );
        let outcome = match session.verify(meta.id(), &meta.signature()) {
            Ok(()) => action.await,
            Err(err) => Err(err),
        };
        if let Err(err) = &outcome {
            tracing::debug!(error = %err, "session call failed");
        }
        outcome
    }
    .instrument(span)
    .await
}
