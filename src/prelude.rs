//! Convenient imports for common functionality.
//!
//! This module re-exports the statement types, the session trait and the value
//! model needed to declare and run mapped statements.

pub use std::ops::ControlFlow;

pub use crate::bounds::PagingBounds;
pub use crate::config::{Configuration, ConfigurationBuilder, ResultMap};
pub use crate::error::SqlMapperError;
pub use crate::mapping::{FromRow, FromValue, GeneratedKeys, ToParams};
pub use crate::results::MappedRow;
pub use crate::session::{InsertOutcome, RowHandler, Session};
pub use crate::statement::{
    Insert, KeyGenerator, KeyOrder, MappedStatement, ResultSetType, SelectList, SelectListBy,
    SelectListByMap, SelectListPage, SelectListPageBy, SelectMap, SelectMapBy, SelectMapPage,
    SelectMapPageBy, SelectOne, SelectOneBy, SelectOneByMap,
};
pub use crate::token::{TypeDescriptor, TypeToken};
pub use crate::translation::PlaceholderStyle;
pub use crate::types::{ParamMap, Params, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteOptionsBuilder, SqliteSession, SqliteSessionFactory};
