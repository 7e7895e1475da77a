use crate::error::SqlMapperError;
use crate::mapping::{GeneratedKeys, ToParams};
use crate::session::{InsertOutcome, Session};
use crate::token::{TypeDescriptor, TypeToken};

use super::core::{KeyGenerator, StatementMeta, execute};
use super::macros::statement_impls;

/// Insert taking one parameter and reporting affected rows.
///
/// With no key generator (the default) the engine is never asked for a key.
pub struct Insert<P> {
    meta: StatementMeta,
    _types: TypeToken<fn(P) -> usize>,
}

impl<P: 'static> Insert<P> {
    #[must_use]
    pub fn new(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            meta: StatementMeta::insert(id.into(), sql.into(), TypeDescriptor::of::<P>()),
            _types: TypeToken::new(),
        }
    }

    #[must_use]
    pub fn key_generator(mut self, key_generator: KeyGenerator) -> Self {
        self.meta.set_key_generator(key_generator);
        self
    }

    /// Inserts flush the engine's cache by default.
    #[must_use]
    pub fn flush_cache(mut self, flush_cache: bool) -> Self {
        self.meta.set_flush_cache(flush_cache);
        self
    }
}

impl<P: ToParams> Insert<P> {
    /// Returns the affected row count exactly as the engine reported it.
    ///
    /// # Errors
    /// Propagates parameter conversion and session errors unmodified.
    pub async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
        param: &P,
    ) -> Result<usize, SqlMapperError> {
        let outcome = self.forward(session, param).await?;
        Ok(outcome.rows_affected)
    }

    async fn forward<S: Session + ?Sized>(
        &self,
        session: &S,
        param: &P,
    ) -> Result<InsertOutcome, SqlMapperError> {
        execute(session, &self.meta, "insert", async {
            session.insert(self.meta.id(), param.to_params()?).await
        })
        .await
    }
}

impl<P: ToParams + GeneratedKeys> Insert<P> {
    /// Like [`apply`](Self::apply), then writes the generated key into `param`.
    ///
    /// Without a key generator, or when the engine reports no key, `param` is
    /// left untouched.
    ///
    /// # Errors
    /// Propagates session errors and errors from `param` accepting the key.
    pub async fn apply_and_fetch_key<S: Session + ?Sized>(
        &self,
        session: &S,
        param: &mut P,
    ) -> Result<usize, SqlMapperError> {
        let outcome = self.forward(session, param).await?;
        if let (Some(property), Some(key)) = (
            self.meta.key_generator().key_property(),
            outcome.generated_key.as_ref(),
        ) {
            tracing::trace!(id = self.meta.id(), property, "populating generated key");
            param.set_generated_key(property, key)?;
        }
        Ok(outcome.rows_affected)
    }
}

statement_impls!(Insert<P>);
