//! Per-shape session calls shared by the select variants.
//!
//! Each helper goes through [`execute`] and adapts the session's raw result
//! into the declared shape.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::ControlFlow;

use crate::bounds::PagingBounds;
use crate::error::SqlMapperError;
use crate::mapping::{FromRow, FromValue};
use crate::results::MappedRow;
use crate::session::Session;
use crate::types::{Params, RowValues};

use super::core::{StatementMeta, execute};

/// Absence from the engine becomes `None`, and so does a row whose columns are
/// all `NULL` (`SELECT MAX(x)` over an empty table).
pub(crate) async fn one<R, S>(
    meta: &StatementMeta,
    session: &S,
    params: Result<Params, SqlMapperError>,
) -> Result<Option<R>, SqlMapperError>
where
    R: FromRow,
    S: Session + ?Sized,
{
    execute(session, meta, "select_one", async {
        let row = session.select_one(meta.id(), params?).await?;
        row.filter(|row| !row.values().iter().all(RowValues::is_null))
            .as_ref()
            .map(R::from_row)
            .transpose()
    })
    .await
}

pub(crate) async fn list<R, S>(
    meta: &StatementMeta,
    session: &S,
    params: Result<Params, SqlMapperError>,
    bounds: PagingBounds,
) -> Result<Vec<R>, SqlMapperError>
where
    R: FromRow,
    S: Session + ?Sized,
{
    execute(session, meta, "select_list", async {
        let rows = session.select_list(meta.id(), params?, bounds).await?;
        rows.iter().map(R::from_row).collect()
    })
    .await
}

/// Rows sharing a key: the one produced last stays in the map.
pub(crate) async fn map<K, R, S>(
    meta: &StatementMeta,
    session: &S,
    params: Result<Params, SqlMapperError>,
    map_key: &str,
    bounds: PagingBounds,
) -> Result<HashMap<K, R>, SqlMapperError>
where
    K: FromValue + Eq + Hash,
    R: FromRow,
    S: Session + ?Sized,
{
    execute(session, meta, "select_map", async {
        let keyed = session
            .select_map(meta.id(), params?, map_key, bounds)
            .await?;
        let mut out = HashMap::with_capacity(keyed.len());
        for (key, row) in &keyed {
            out.insert(K::from_value(key)?, R::from_row(row)?);
        }
        Ok(out)
    })
    .await
}

pub(crate) async fn stream<R, S, F>(
    meta: &StatementMeta,
    session: &S,
    params: Result<Params, SqlMapperError>,
    bounds: PagingBounds,
    mut callback: F,
) -> Result<usize, SqlMapperError>
where
    R: FromRow,
    S: Session + ?Sized,
    F: FnMut(R) -> Result<ControlFlow<()>, SqlMapperError> + Send,
{
    execute(session, meta, "select_streaming", async {
        let params = params?;
        let mut handler = |row: MappedRow| -> Result<ControlFlow<()>, SqlMapperError> {
            callback(R::from_row(&row)?)
        };
        session
            .select_streaming(meta.id(), params, bounds, &mut handler)
            .await
    })
    .await
}
