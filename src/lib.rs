//! Typed mapped statements over an async SQL session.
//!
//! A statement ([`Insert`], [`SelectOne`], [`SelectListPageBy`], ...) pairs a
//! fully-qualified id with mapped SQL and declares its parameter and result
//! types as generic arguments. Statements are registered once in a
//! [`Configuration`] and then invoked against any [`Session`]; they forward
//! their id and parameter and adapt what the session returns into the declared
//! shape.
//!
//! ```rust,no_run
//! use sql_mapper::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlMapperError> {
//! let find = SelectOneBy::<i64, String>::new(
//!     "person.findName",
//!     "SELECT name FROM person WHERE id = #{id}",
//! );
//! let configuration = Configuration::builder().add(&find).build()?;
//! let factory = SqliteSessionFactory::builder("people.db")
//!     .build(configuration)
//!     .await?;
//! let session = factory.open_session().await?;
//! let name: Option<String> = find.apply(&session, &1).await?;
//! # let _ = name;
//! # Ok(())
//! # }
//! ```

pub mod bounds;
pub mod config;
pub mod error;
pub mod mapping;
pub mod prelude;
pub mod results;
pub mod session;
pub mod statement;
pub mod token;
pub mod translation;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use bounds::PagingBounds;
pub use config::{Configuration, ConfigurationBuilder, ResultMap};
pub use error::SqlMapperError;
pub use session::{InsertOutcome, RowHandler, Session};
pub use statement::{
    Insert, KeyGenerator, KeyOrder, MappedStatement, ResultSetType, SelectList, SelectListBy,
    SelectListByMap, SelectListPage, SelectListPageBy, SelectMap, SelectMapBy, SelectMapPage,
    SelectMapPageBy, SelectOne, SelectOneBy, SelectOneByMap,
};
pub use token::{TypeDescriptor, TypeToken};
pub use types::{ParamMap, Params, RowValues};
