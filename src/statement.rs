//! Typed mapped statements.
//!
//! Each statement is built once with its id and SQL, registered in a
//! [`Configuration`](crate::config::Configuration), and then invoked against any
//! [`Session`](crate::session::Session). Statements hold no connection and are
//! safe to share between tasks.

mod core;
mod dispatch;
mod insert;
mod macros;
mod select_list;
mod select_map;
mod select_one;

pub use self::core::{
    KeyGenerator, KeyOrder, MappedStatement, ResultSetType, StatementKind, StatementMeta,
    StatementSignature,
};
pub use insert::Insert;
pub use select_list::{SelectList, SelectListBy, SelectListByMap, SelectListPage, SelectListPageBy};
pub use select_map::{SelectMap, SelectMapBy, SelectMapPage, SelectMapPageBy};
pub use select_one::{SelectOne, SelectOneBy, SelectOneByMap};
