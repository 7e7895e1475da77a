use std::ops::ControlFlow;

use crate::bounds::PagingBounds;
use crate::error::SqlMapperError;
use crate::mapping::{FromRow, ToParams};
use crate::session::Session;
use crate::token::{TypeDescriptor, TypeToken};
use crate::types::{ParamMap, Params};

use super::core::StatementMeta;
use super::dispatch;
use super::macros::{select_attributes, statement_impls};

/// Select every row, without a parameter.
///
/// `handle` pushes rows to a callback as the engine produces them instead of
/// collecting them; the callback returns `ControlFlow::Break(())` to stop early.
pub struct SelectList<R> {
    meta: StatementMeta,
    _types: TypeToken<fn() -> R>,
}

impl<R: 'static> SelectList<R> {
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

impl<R: FromRow> SelectList<R> {
    /// Rows in the order the engine produced them.
    ///
    /// # Errors
    /// Propagates session and row mapping errors.
    pub async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
    ) -> Result<Vec<R>, SqlMapperError> {
        dispatch::list(&self.meta, session, Ok(Params::None), PagingBounds::UNBOUNDED).await
    }

    /// Stream rows to `callback`; returns how many rows it received.
    ///
    /// # Errors
    /// Propagates session errors and the first error `callback` returns.
    pub async fn handle<S, F>(&self, session: &S, callback: F) -> Result<usize, SqlMapperError>
    where
        S: Session + ?Sized,
        F: FnMut(R) -> Result<ControlFlow<()>, SqlMapperError> + Send,
    {
        dispatch::stream(
            &self.meta,
            session,
            Ok(Params::None),
            PagingBounds::UNBOUNDED,
            callback,
        )
        .await
    }
}

statement_impls!(SelectList<R>);

/// Select every row for a single parameter value.
pub struct SelectListBy<P, R> {
    meta: StatementMeta,
    _types: TypeToken<fn(P) -> R>,
}

impl<P: 'static, R: 'static> SelectListBy<P, R> {
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

impl<P: ToParams, R: FromRow> SelectListBy<P, R> {
    /// # Errors
    /// Propagates parameter conversion, session and row mapping errors.
    pub async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
        param: &P,
    ) -> Result<Vec<R>, SqlMapperError> {
        dispatch::list(&self.meta, session, param.to_params(), PagingBounds::UNBOUNDED).await
    }

    /// # Errors
    /// Propagates session errors and the first error `callback` returns.
    pub async fn handle<S, F>(
        &self,
        session: &S,
        param: &P,
        callback: F,
    ) -> Result<usize, SqlMapperError>
    where
        S: Session + ?Sized,
        F: FnMut(R) -> Result<ControlFlow<()>, SqlMapperError> + Send,
    {
        dispatch::stream(
            &self.meta,
            session,
            param.to_params(),
            PagingBounds::UNBOUNDED,
            callback,
        )
        .await
    }
}

statement_impls!(SelectListBy<P, R>);

/// Select every row for a string-keyed parameter map.
pub struct SelectListByMap<R> {
    meta: StatementMeta,
    _types: TypeToken<fn(ParamMap) -> R>,
}

impl<R: 'static> SelectListByMap<R> {
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

impl<R: FromRow> SelectListByMap<R> {
    /// # Errors
    /// Propagates session and row mapping errors.
    pub async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
        params: &ParamMap,
    ) -> Result<Vec<R>, SqlMapperError> {
        dispatch::list(&self.meta, session, params.to_params(), PagingBounds::UNBOUNDED).await
    }

    /// # Errors
    /// Propagates session errors and the first error `callback` returns.
    pub async fn handle<S, F>(
        &self,
        session: &S,
        params: &ParamMap,
        callback: F,
    ) -> Result<usize, SqlMapperError>
    where
        S: Session + ?Sized,
        F: FnMut(R) -> Result<ControlFlow<()>, SqlMapperError> + Send,
    {
        dispatch::stream(
            &self.meta,
            session,
            params.to_params(),
            PagingBounds::UNBOUNDED,
            callback,
        )
        .await
    }
}

statement_impls!(SelectListByMap<R>);

/// Select one window of rows, without a parameter.
pub struct SelectListPage<R> {
    meta: StatementMeta,
    _types: TypeToken<fn(PagingBounds) -> R>,
}

impl<R: 'static> SelectListPage<R> {
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

impl<R: FromRow> SelectListPage<R> {
    /// At most `bounds.limit` rows, starting at `bounds.offset`.
    ///
    /// # Errors
    /// Propagates session and row mapping errors.
    pub async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
        bounds: PagingBounds,
    ) -> Result<Vec<R>, SqlMapperError> {
        dispatch::list(&self.meta, session, Ok(Params::None), bounds).await
    }

    /// # Errors
    /// Propagates session errors and the first error `callback` returns.
    pub async fn handle<S, F>(
        &self,
        session: &S,
        bounds: PagingBounds,
        callback: F,
    ) -> Result<usize, SqlMapperError>
    where
        S: Session + ?Sized,
        F: FnMut(R) -> Result<ControlFlow<()>, SqlMapperError> + Send,
    {
        dispatch::stream(&self.meta, session, Ok(Params::None), bounds, callback).await
    }
}

statement_impls!(SelectListPage<R>);

/// Select one window of rows for a single parameter value.
pub struct SelectListPageBy<P, R> {
    meta: StatementMeta,
    _types: TypeToken<fn(P, PagingBounds) -> R>,
}

impl<P: 'static, R: 'static> SelectListPageBy<P, R> {
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

impl<P: ToParams, R: FromRow> SelectListPageBy<P, R> {
    /// # Errors
    /// Propagates parameter conversion, session and row mapping errors.
    pub async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
        param: &P,
        bounds: PagingBounds,
    ) -> Result<Vec<R>, SqlMapperError> {
        dispatch::list(&self.meta, session, param.to_params(), bounds).await
    }

    /// # Errors
    /// Propagates session errors and the first error `callback` returns.
    pub async fn handle<S, F>(
        &self,
        session: &S,
        param: &P,
        bounds: PagingBounds,
        callback: F,
    ) -> Result<usize, SqlMapperError>
    where
        S: Session + ?Sized,
        F: FnMut(R) -> Result<ControlFlow<()>, SqlMapperError> + Send,
    {
        dispatch::stream(&self.meta, session, param.to_params(), bounds, callback).await
    }
}

statement_impls!(SelectListPageBy<P, R>);
