use crate::error::SqlMapperError;
use crate::mapping::{FromRow, ToParams};
use crate::session::Session;
use crate::token::{TypeDescriptor, TypeToken};
use crate::types::{ParamMap, Params};

use super::core::StatementMeta;
use super::dispatch;
use super::macros::{select_attributes, statement_impls};

/// Select at most one row, without a parameter.
///
/// ```rust,no_run
/// use sql_mapper::prelude::*;
///
/// # async fn demo(session: &dyn Session) -> Result<(), SqlMapperError> {
/// let count = SelectOne::<i64>::new("person.count", "SELECT count(*) FROM person");
/// let n: Option<i64> = count.apply(session).await?;
/// # let _ = n;
/// # Ok(())
/// # }
/// ```
pub struct SelectOne<R> {
    meta: StatementMeta,
    _types: TypeToken<fn() -> R>,
}

impl<R: 'static> SelectOne<R> {
    #[must_use]
    pub fn new(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            meta: StatementMeta::select(
                id.into(),
                sql.into(),
                TypeDescriptor::void(),
                TypeDescriptor::of::<R>(),
            ),
            _types: TypeToken::new(),
        }
    }

    select_attributes!();
}

impl<R: FromRow> SelectOne<R> {
    /// Returns `None` when the engine produces no row.
    ///
    /// # Errors
    /// Propagates session errors, including more than one row.
    pub async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
    ) -> Result<Option<R>, SqlMapperError> {
        dispatch::one(&self.meta, session, Ok(Params::None)).await
    }
}

statement_impls!(SelectOne<R>);

/// Select at most one row for a single parameter value.
pub struct SelectOneBy<P, R> {
    meta: StatementMeta,
    _types: TypeToken<fn(P) -> R>,
}

impl<P: 'static, R: 'static> SelectOneBy<P, R> {
    #[must_use]
    pub fn new(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            meta: StatementMeta::select(
                id.into(),
                sql.into(),
                TypeDescriptor::of::<P>(),
                TypeDescriptor::of::<R>(),
            ),
            _types: TypeToken::new(),
        }
    }

    select_attributes!();
}

impl<P: ToParams, R: FromRow> SelectOneBy<P, R> {
    /// Returns `None` when the engine produces no row for `param`.
    ///
    /// # Errors
    /// Propagates parameter conversion and session errors.
    pub async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
        param: &P,
    ) -> Result<Option<R>, SqlMapperError> {
        dispatch::one(&self.meta, session, param.to_params()).await
    }
}

statement_impls!(SelectOneBy<P, R>);

/// Select at most one row for a string-keyed parameter map.
pub struct SelectOneByMap<R> {
    meta: StatementMeta,
    _types: TypeToken<fn(ParamMap) -> R>,
}

impl<R: 'static> SelectOneByMap<R> {
    #[must_use]
    pub fn new(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            meta: StatementMeta::select(
                id.into(),
                sql.into(),
                TypeDescriptor::of::<ParamMap>(),
                TypeDescriptor::of::<R>(),
            ),
            _types: TypeToken::new(),
        }
    }

    select_attributes!();
}

impl<R: FromRow> SelectOneByMap<R> {
    /// # Errors
    /// Propagates session errors.
    pub async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
        params: &ParamMap,
    ) -> Result<Option<R>, SqlMapperError> {
        dispatch::one(&self.meta, session, params.to_params()).await
    }
}

statement_impls!(SelectOneByMap<R>);
