//! Statement and result-map registry consulted by engine sessions.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SqlMapperError;
use crate::results::{MappedRow, RowColumns};
use crate::statement::{
    KeyGenerator, MappedStatement, StatementKind, StatementMeta, StatementSignature,
};
use crate::translation::{BoundSql, PlaceholderStyle, compile_placeholders};
use crate::types::RowValues;

/// Column-to-property renaming applied to every row of a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMap {
    id: String,
    mappings: Vec<(String, String)>,
    auto_mapping: bool,
}

impl ResultMap {
    /// Columns without an explicit mapping keep their name (auto mapping on).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mappings: Vec::new(),
            auto_mapping: true,
        }
    }

    /// Expose `column` as `property`. Column matching ignores ASCII case.
    #[must_use]
    pub fn mapping(mut self, column: impl Into<String>, property: impl Into<String>) -> Self {
        self.mappings.push((column.into(), property.into()));
        self
    }

    /// With auto mapping off, unmapped columns are dropped.
    #[must_use]
    pub fn auto_mapping(mut self, enabled: bool) -> Self {
        self.auto_mapping = enabled;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    fn property_for<'a>(&'a self, column: &'a str) -> Option<&'a str> {
        self.mappings
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(column))
            .map(|(_, p)| p.as_str())
            .or(self.auto_mapping.then_some(column))
    }

    /// Start projecting rows of one result through this map.
    #[must_use]
    pub fn projector(&self) -> RowProjector<'_> {
        RowProjector {
            map: self,
            cached: None,
        }
    }
}

/// Applies a [`ResultMap`] row by row, reusing the projected layout while the
/// input layout stays the same.
pub struct RowProjector<'a> {
    map: &'a ResultMap,
    cached: Option<(Arc<RowColumns>, Arc<RowColumns>, Vec<usize>)>,
}

impl RowProjector<'_> {
    pub fn project(&mut self, row: MappedRow) -> MappedRow {
        let stale = self
            .cached
            .as_ref()
            .is_none_or(|(input, _, _)| !Arc::ptr_eq(input, row.columns()));
        if stale {
            let mut names = Vec::new();
            let mut picks = Vec::new();
            for (idx, column) in row.column_names().iter().enumerate() {
                if let Some(property) = self.map.property_for(column) {
                    names.push(property.to_owned());
                    picks.push(idx);
                }
            }
            self.cached = Some((
                Arc::clone(row.columns()),
                Arc::new(RowColumns::new(names)),
                picks,
            ));
        }
        let Some((_, output, picks)) = self.cached.as_ref() else {
            return row;
        };
        let mut values = row.into_values();
        let projected = picks
            .iter()
            .map(|&idx| {
                values
                    .get_mut(idx)
                    .map_or(RowValues::Null, |v| std::mem::replace(v, RowValues::Null))
            })
            .collect();
        MappedRow::new(Arc::clone(output), projected)
    }
}

/// A statement as an engine sees it: metadata plus compiled SQL.
#[derive(Debug, Clone)]
pub struct RegisteredStatement {
    meta: StatementMeta,
    bound: BoundSql,
    select_key: Option<BoundSql>,
}

impl RegisteredStatement {
    #[must_use]
    pub fn meta(&self) -> &StatementMeta {
        &self.meta
    }

    #[must_use]
    pub fn bound_sql(&self) -> &BoundSql {
        &self.bound
    }

    /// Compiled select-key query, for `KeyGenerator::SelectKey` inserts.
    #[must_use]
    pub fn select_key_sql(&self) -> Option<&BoundSql> {
        self.select_key.as_ref()
    }
}

/// Immutable registry of mapped statements and result maps.
///
/// Built once at startup and shared (usually behind an `Arc`) by every session.
#[derive(Debug, Clone)]
pub struct Configuration {
    statements: HashMap<String, RegisteredStatement>,
    result_maps: HashMap<String, ResultMap>,
    placeholder_style: PlaceholderStyle,
}

impl Configuration {
    #[must_use]
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    #[must_use]
    pub fn placeholder_style(&self) -> PlaceholderStyle {
        self.placeholder_style
    }

    /// Resolve `id` to its registered statement.
    ///
    /// # Errors
    /// Returns `SqlMapperError::UnknownStatement` if nothing is registered under `id`.
    pub fn statement(&self, id: &str) -> Result<&RegisteredStatement, SqlMapperError> {
        self.statements
            .get(id)
            .ok_or_else(|| SqlMapperError::UnknownStatement(id.to_owned()))
    }

    /// Resolve `id` and check it belongs to the operation family being invoked.
    ///
    /// # Errors
    /// Returns `SqlMapperError::UnknownStatement` for an unregistered id and
    /// `SqlMapperError::ConfigError` for a kind mismatch.
    pub fn statement_of_kind(
        &self,
        id: &str,
        kind: StatementKind,
    ) -> Result<&RegisteredStatement, SqlMapperError> {
        let stmt = self.statement(id)?;
        if stmt.meta.kind() == kind {
            Ok(stmt)
        } else {
            Err(SqlMapperError::ConfigError(format!(
                "statement {id} is registered as {:?}, invoked as {kind:?}",
                stmt.meta.kind()
            )))
        }
    }

    /// Resolve `id` and check it was registered with exactly `signature`.
    ///
    /// # Errors
    /// Returns `SqlMapperError::UnknownStatement` for an unregistered id and
    /// `SqlMapperError::ConfigError` when the kind, parameter type or result
    /// type differs from the registration.
    pub fn statement_checked(
        &self,
        id: &str,
        signature: &StatementSignature,
    ) -> Result<&RegisteredStatement, SqlMapperError> {
        let stmt = self.statement_of_kind(id, signature.kind)?;
        let registered = stmt.meta.signature();
        if registered.parameter != signature.parameter || registered.result != signature.result {
            return Err(SqlMapperError::ConfigError(format!(
                "statement {id} is registered as ({:?}) -> {:?}, invoked as ({:?}) -> {:?}",
                registered.parameter, registered.result, signature.parameter, signature.result
            )));
        }
        Ok(stmt)
    }

    #[must_use]
    pub fn result_map(&self, id: &str) -> Option<&ResultMap> {
        self.result_maps.get(id)
    }

    /// The result map a select statement references, if any.
    #[must_use]
    pub fn result_map_for(&self, stmt: &RegisteredStatement) -> Option<&ResultMap> {
        stmt.meta.result_map().and_then(|id| self.result_maps.get(id))
    }

    pub fn statement_ids(&self) -> impl Iterator<Item = &str> {
        self.statements.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Fluent builder for a [`Configuration`].
///
/// Registration problems are collected and reported together by [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    statements: Vec<StatementMeta>,
    result_maps: Vec<ResultMap>,
    placeholder_style: PlaceholderStyle,
}

impl ConfigurationBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder style the target engine expects (`SQLite` by default).
    #[must_use]
    pub fn placeholder_style(mut self, style: PlaceholderStyle) -> Self {
        self.placeholder_style = style;
        self
    }

    /// Register a statement under its fully-qualified id.
    #[must_use]
    pub fn add<S: MappedStatement + ?Sized>(mut self, statement: &S) -> Self {
        self.statements.push(statement.meta().clone());
        self
    }

    #[must_use]
    pub fn result_map(mut self, result_map: ResultMap) -> Self {
        self.result_maps.push(result_map);
        self
    }

    /// Validate and compile every registered statement.
    ///
    /// # Errors
    /// Returns `SqlMapperError::ConfigError` listing every invalid id, duplicate,
    /// unresolved result map, SQL placeholder problem, or placeholder used by a
    /// statement declared without a parameter.
    pub fn build(self) -> Result<Configuration, SqlMapperError> {
        let mut problems = Vec::new();

        let mut result_maps = HashMap::with_capacity(self.result_maps.len());
        for map in self.result_maps {
            if result_maps.contains_key(map.id()) {
                problems.push(format!("duplicate result map {}", map.id()));
            } else {
                result_maps.insert(map.id().to_owned(), map);
            }
        }

        let mut statements = HashMap::with_capacity(self.statements.len());
        for meta in self.statements {
            match compile_statement(meta, &result_maps, self.placeholder_style) {
                Ok(stmt) => {
                    let id = stmt.meta.id().to_owned();
                    if statements.contains_key(&id) {
                        problems.push(format!("duplicate statement id {id}"));
                    } else {
                        statements.insert(id, stmt);
                    }
                }
                Err(problem) => problems.push(problem),
            }
        }

        if !problems.is_empty() {
            return Err(SqlMapperError::ConfigError(problems.join("; ")));
        }

        tracing::debug!(
            statements = statements.len(),
            result_maps = result_maps.len(),
            "configuration built"
        );
        Ok(Configuration {
            statements,
            result_maps,
            placeholder_style: self.placeholder_style,
        })
    }
}

fn compile_statement(
    meta: StatementMeta,
    result_maps: &HashMap<String, ResultMap>,
    style: PlaceholderStyle,
) -> Result<RegisteredStatement, String> {
    let id = meta.id();
    if id.is_empty() || id.chars().any(char::is_whitespace) {
        return Err(format!("invalid statement id {id:?}"));
    }
    let bound = compile_placeholders(meta.sql(), style).map_err(|e| format!("{id}: {e}"))?;
    if meta.parameter_type().is_void() && bound.has_parameters() {
        return Err(format!(
            "{id}: declared without a parameter but uses {:?}",
            bound.parameter_names()
        ));
    }
    if let Some(map_id) = meta.result_map() {
        if !result_maps.contains_key(map_id) {
            return Err(format!("{id}: unknown result map {map_id}"));
        }
    }
    let select_key = match meta.key_generator() {
        KeyGenerator::SelectKey { sql, .. } => {
            Some(compile_placeholders(sql, style).map_err(|e| format!("{id} select key: {e}"))?)
        }
        _ => None,
    };
    Ok(RegisteredStatement {
        meta,
        bound,
        select_key,
    })
}
