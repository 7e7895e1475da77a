//! Map-shaped selects.
//!
//! The key field is chosen when the statement is built. When several rows share
//! a key value, the row the engine produced last is the one left in the map:
//! the result depends on engine row order, so give the SQL an `ORDER BY` when
//! that matters.

use std::collections::HashMap;
use std::hash::Hash;

use crate::bounds::PagingBounds;
use crate::error::SqlMapperError;
use crate::mapping::{FromRow, FromValue, ToParams};
use crate::session::Session;
use crate::token::{TypeDescriptor, TypeToken};
use crate::types::Params;

use super::core::StatementMeta;
use super::dispatch;
use super::macros::{select_attributes, statement_impls};

/// Select every row into a map keyed by `map_key`, without a parameter.
pub struct SelectMap<K, R> {
    meta: StatementMeta,
    map_key: String,
    _types: TypeToken<fn() -> HashMap<K, R>>,
}

impl<K: 'static, R: 'static> SelectMap<K, R> {
    #[must_use]
    pub fn new(id: impl Into<String>, sql: impl Into<String>, map_key: impl Into<String>) -> Self {
        Self {
            meta: StatementMeta::select(
                id.into(),
                sql.into(),
                TypeDescriptor::void(),
                TypeDescriptor::of::<R>(),
            ),
            map_key: map_key.into(),
            _types: TypeToken::new(),
        }
    }

    select_attributes!();
}

impl<K, R> SelectMap<K, R> {
    #[must_use]
    pub fn map_key(&self) -> &str {
        &self.map_key
    }
}

impl<K: FromValue + Eq + Hash, R: FromRow> SelectMap<K, R> {
    /// # Errors
    /// Propagates session and mapping errors, including a missing key field.
    pub async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
    ) -> Result<HashMap<K, R>, SqlMapperError> {
        dispatch::map(
            &self.meta,
            session,
            Ok(Params::None),
            &self.map_key,
            PagingBounds::UNBOUNDED,
        )
        .await
    }
}

statement_impls!(SelectMap<K, R>);

/// Select every row for a single parameter value into a map keyed by `map_key`.
pub struct SelectMapBy<P, K, R> {
    meta: StatementMeta,
    map_key: String,
    _types: TypeToken<fn(P) -> HashMap<K, R>>,
}

impl<P: 'static, K: 'static, R: 'static> SelectMapBy<P, K, R> {
    #[must_use]
    pub fn new(id: impl Into<String>, sql: impl Into<String>, map_key: impl Into<String>) -> Self {
        Self {
            meta: StatementMeta::select(
                id.into(),
                sql.into(),
                TypeDescriptor::of::<P>(),
                TypeDescriptor::of::<R>(),
            ),
            map_key: map_key.into(),
            _types: TypeToken::new(),
        }
    }

    select_attributes!();
}

impl<P, K, R> SelectMapBy<P, K, R> {
    #[must_use]
    pub fn map_key(&self) -> &str {
        &self.map_key
    }
}

impl<P: ToParams, K: FromValue + Eq + Hash, R: FromRow> SelectMapBy<P, K, R> {
    /// # Errors
    /// Propagates parameter conversion, session and mapping errors.
    pub async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
        param: &P,
    ) -> Result<HashMap<K, R>, SqlMapperError> {
        dispatch::map(
            &self.meta,
            session,
            param.to_params(),
            &self.map_key,
            PagingBounds::UNBOUNDED,
        )
        .await
    }
}

statement_impls!(SelectMapBy<P, K, R>);

/// Select one window of rows into a map keyed by `map_key`, without a parameter.
pub struct SelectMapPage<K, R> {
    meta: StatementMeta,
    map_key: String,
    _types: TypeToken<fn(PagingBounds) -> HashMap<K, R>>,
}

impl<K: 'static, R: 'static> SelectMapPage<K, R> {
    #[must_use]
    pub fn new(id: impl Into<String>, sql: impl Into<String>, map_key: impl Into<String>) -> Self {
        Self {
            meta: StatementMeta::select(
                id.into(),
                sql.into(),
                TypeDescriptor::void(),
                TypeDescriptor::of::<R>(),
            ),
            map_key: map_key.into(),
            _types: TypeToken::new(),
        }
    }

    select_attributes!();
}

impl<K, R> SelectMapPage<K, R> {
    #[must_use]
    pub fn map_key(&self) -> &str {
        &self.map_key
    }
}

impl<K: FromValue + Eq + Hash, R: FromRow> SelectMapPage<K, R> {
    /// The window applies to rows before they are keyed.
    ///
    /// # Errors
    /// Propagates session and mapping errors.
    pub async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
        bounds: PagingBounds,
    ) -> Result<HashMap<K, R>, SqlMapperError> {
        dispatch::map(&self.meta, session, Ok(Params::None), &self.map_key, bounds).await
    }
}

statement_impls!(SelectMapPage<K, R>);

/// Select one window of rows for a single parameter value into a map keyed by `map_key`.
pub struct SelectMapPageBy<P, K, R> {
    meta: StatementMeta,
    map_key: String,
    _types: TypeToken<fn(P, PagingBounds) -> HashMap<K, R>>,
}

impl<P: 'static, K: 'static, R: 'static> SelectMapPageBy<P, K, R> {
    #[must_use]
    pub fn new(id: impl Into<String>, sql: impl Into<String>, map_key: impl Into<String>) -> Self {
        Self {
            meta: StatementMeta::select(
                id.into(),
                sql.into(),
                TypeDescriptor::of::<P>(),
                TypeDescriptor::of::<R>(),
            ),
            map_key: map_key.into(),
            _types: TypeToken::new(),
        }
    }

    select_attributes!();
}

impl<P, K, R> SelectMapPageBy<P, K, R> {
    #[must_use]
    pub fn map_key(&self) -> &str {
        &self.map_key
    }
}

impl<P: ToParams, K: FromValue + Eq + Hash, R: FromRow> SelectMapPageBy<P, K, R> {
    /// # Errors
    /// Propagates parameter conversion, session and mapping errors.
    pub async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
        param: &P,
        bounds: PagingBounds,
    ) -> Result<HashMap<K, R>, SqlMapperError> {
        dispatch::map(&self.meta, session, param.to_params(), &self.map_key, bounds).await
    }
}

statement_impls!(SelectMapPageBy<P, K, R>);
