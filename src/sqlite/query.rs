//! Blocking statement execution against one `rusqlite` connection.

use std::ops::ControlFlow;
use std::sync::Arc;

use crate::bounds::PagingBounds;
use crate::config::{Configuration, ResultMap};
use crate::error::SqlMapperError;
use crate::results::{MappedRow, RowColumns};
use crate::session::InsertOutcome;
use crate::statement::{KeyGenerator, KeyOrder, StatementKind};
use crate::translation::BoundSql;
use crate::types::{ParamMap, Params, RowValues};

use super::params::{Params as SqliteParams, sqlite_extract_value};

/// Run a query and push the rows inside `bounds` to `sink`, one at a time.
///
/// Rows before `bounds.offset` are read and dropped; reading stops after
/// `bounds.limit` rows or when `sink` breaks. Returns the rows delivered.
///
/// # Errors
/// Returns `SqlMapperError` if preparing, stepping or reading the query fails,
/// or the first error `sink` returns.
pub fn for_each_row<F>(
    conn: &rusqlite::Connection,
    sql: &str,
    values: &[RowValues],
    bounds: PagingBounds,
    result_map: Option<&ResultMap>,
    mut sink: F,
) -> Result<usize, SqlMapperError>
where
    F: FnMut(MappedRow) -> Result<ControlFlow<()>, SqlMapperError>,
{
    let params = SqliteParams::convert(values);
    let mut stmt = conn.prepare(sql)?;
    let columns = Arc::new(RowColumns::new(
        stmt.column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect(),
    ));
    let mut projector = result_map.map(ResultMap::projector);

    let mut rows = stmt.query(&params.as_refs()[..])?;
    let mut skipped = 0;
    let mut delivered = 0;
    while delivered < bounds.limit {
        let Some(row) = rows.next()? else {
            break;
        };
        if skipped < bounds.offset {
            skipped += 1;
            continue;
        }
        let mut row_values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            row_values.push(sqlite_extract_value(row, idx)?);
        }
        let mut mapped = MappedRow::new(Arc::clone(&columns), row_values);
        if let Some(projector) = projector.as_mut() {
            mapped = projector.project(mapped);
        }
        delivered += 1;
        if sink(mapped)?.is_break() {
            break;
        }
    }
    tracing::trace!(skipped, delivered, "sqlite rows read");
    Ok(delivered)
}

/// Resolve a select by id, bind its parameters and stream its rows to `sink`.
///
/// # Errors
/// Returns configuration, binding and execution errors unmodified.
pub fn select<F>(
    conn: &rusqlite::Connection,
    configuration: &Configuration,
    id: &str,
    params: &Params,
    bounds: PagingBounds,
    sink: F,
) -> Result<usize, SqlMapperError>
where
    F: FnMut(MappedRow) -> Result<ControlFlow<()>, SqlMapperError>,
{
    let stmt = configuration.statement_of_kind(id, StatementKind::Select)?;
    let values = stmt.bound_sql().bind(id, params)?;
    tracing::trace!(
        id,
        sql = stmt.bound_sql().sql(),
        offset = bounds.offset,
        limit = bounds.limit,
        fetch_size = ?stmt.meta().fetch_size(),
        result_set_type = ?stmt.meta().result_set_type(),
        "sqlite select"
    );
    for_each_row(
        conn,
        stmt.bound_sql().sql(),
        &values,
        bounds,
        configuration.result_map_for(stmt),
        sink,
    )
}

/// Materialize a select into a vector.
///
/// # Errors
/// Same as [`select`].
pub fn select_all(
    conn: &rusqlite::Connection,
    configuration: &Configuration,
    id: &str,
    params: &Params,
    bounds: PagingBounds,
) -> Result<Vec<MappedRow>, SqlMapperError> {
    let mut rows = Vec::new();
    select(conn, configuration, id, params, bounds, |row| {
        rows.push(row);
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(rows)
}

/// Resolve an insert by id and execute it, retrieving a key when one is configured.
///
/// # Errors
/// Returns configuration, binding and execution errors unmodified.
pub fn insert(
    conn: &rusqlite::Connection,
    configuration: &Configuration,
    id: &str,
    params: Params,
) -> Result<InsertOutcome, SqlMapperError> {
    let stmt = configuration.statement_of_kind(id, StatementKind::Insert)?;
    tracing::trace!(id, sql = stmt.bound_sql().sql(), "sqlite insert");
    match stmt.meta().key_generator() {
        KeyGenerator::None => Ok(InsertOutcome::rows(execute_bound(
            conn,
            id,
            stmt.bound_sql(),
            &params,
        )?)),
        KeyGenerator::Generated { .. } => {
            let rows_affected = execute_bound(conn, id, stmt.bound_sql(), &params)?;
            // last_insert_rowid still names the previous insert when nothing was written.
            Ok(InsertOutcome {
                rows_affected,
                generated_key: (rows_affected > 0)
                    .then(|| RowValues::Int(conn.last_insert_rowid())),
            })
        }
        KeyGenerator::SelectKey {
            key_property,
            order,
            ..
        } => {
            let key_sql = stmt.select_key_sql().ok_or_else(|| {
                SqlMapperError::ConfigError(format!("statement {id} has no compiled select key"))
            })?;
            match order {
                KeyOrder::Before => {
                    let key = query_key(conn, id, key_sql, &params)?;
                    let params = with_key(id, params, key_property, key.clone())?;
                    let rows_affected = execute_bound(conn, id, stmt.bound_sql(), &params)?;
                    Ok(InsertOutcome {
                        rows_affected,
                        generated_key: Some(key),
                    })
                }
                KeyOrder::After => {
                    let rows_affected = execute_bound(conn, id, stmt.bound_sql(), &params)?;
                    let key = query_key(conn, id, key_sql, &params)?;
                    Ok(InsertOutcome {
                        rows_affected,
                        generated_key: Some(key),
                    })
                }
            }
        }
    }
}

fn execute_bound(
    conn: &rusqlite::Connection,
    id: &str,
    bound: &BoundSql,
    params: &Params,
) -> Result<usize, SqlMapperError> {
    let values = SqliteParams::convert(&bound.bind(id, params)?);
    let mut stmt = conn.prepare(bound.sql())?;
    Ok(stmt.execute(&values.as_refs()[..])?)
}

/// First column of the first row of the select-key query.
fn query_key(
    conn: &rusqlite::Connection,
    id: &str,
    key_sql: &BoundSql,
    params: &Params,
) -> Result<RowValues, SqlMapperError> {
    let values = key_sql.bind(id, params)?;
    let mut key = None;
    for_each_row(
        conn,
        key_sql.sql(),
        &values,
        PagingBounds::UNBOUNDED,
        None,
        |row| {
            key = row.get_by_index(0).cloned();
            Ok(ControlFlow::Break(()))
        },
    )?;
    key.ok_or_else(|| {
        SqlMapperError::ExecutionError(format!("select key for statement {id} produced no row"))
    })
}

/// Bind a key fetched before the insert as a named parameter.
fn with_key(
    id: &str,
    params: Params,
    key_property: &str,
    key: RowValues,
) -> Result<Params, SqlMapperError> {
    match params {
        Params::Named(mut map) => {
            map.insert(key_property.to_owned(), key);
            Ok(Params::Named(map))
        }
        Params::None => Ok(Params::Named(ParamMap::from([(key_property.to_owned(), key)]))),
        Params::Single(_) => Err(SqlMapperError::ParameterError(format!(
            "statement {id} fetches its key before inserting and needs a named parameter, \
             got a single value"
        ))),
    }
}
