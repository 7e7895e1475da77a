use std::fmt;

use crate::error::SqlMapperError;
use crate::types::{Params, RowValues};

/// Target placeholder style for compiled statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`.
    Postgres,
    /// SQLite-style placeholders like `?1`.
    #[default]
    Sqlite,
}

impl PlaceholderStyle {
    fn write(self, out: &mut String, position: usize) {
        use std::fmt::Write;
        let sigil = match self {
            PlaceholderStyle::Postgres => '$',
            PlaceholderStyle::Sqlite => '?',
        };
        // Writing into a String cannot fail.
        let _ = write!(out, "{sigil}{position}");
    }
}

/// Mapped SQL compiled to positional placeholders.
///
/// `parameters[i]` names the value bound at position `i + 1`.
#[derive(Clone, PartialEq, Eq)]
pub struct BoundSql {
    sql: String,
    parameters: Vec<String>,
}

impl BoundSql {
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn parameter_names(&self) -> &[String] {
        &self.parameters
    }

    #[must_use]
    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    /// Resolve each placeholder against `params`, in position order.
    ///
    /// # Errors
    /// Returns `SqlMapperError::ParameterError` when the statement has placeholders
    /// but no parameter was given, or a named parameter is missing.
    pub fn bind(&self, id: &str, params: &Params) -> Result<Vec<RowValues>, SqlMapperError> {
        if params.is_none() && self.has_parameters() {
            return Err(SqlMapperError::ParameterError(format!(
                "statement {id} expects parameters {:?} but none were given",
                self.parameters
            )));
        }
        self.parameters
            .iter()
            .map(|name| {
                params.lookup(name).cloned().ok_or_else(|| {
                    SqlMapperError::ParameterError(format!(
                        "statement {id} has no value for parameter #{{{name}}}"
                    ))
                })
            })
            .collect()
    }
}

impl fmt::Debug for BoundSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundSql")
            .field("sql", &self.sql)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Compile `#{name}` placeholders into the engine's positional style.
///
/// Anything after a comma inside the braces (`#{id,jdbcType=INTEGER}`) is ignored.
/// Placeholders inside string literals, quoted identifiers, comments and dollar-quoted
/// blocks are left untouched.
///
/// # Errors
/// Returns `SqlMapperError::ConfigError` for an unterminated or empty placeholder.
pub fn compile_placeholders(
    sql: &str,
    target: PlaceholderStyle,
) -> Result<BoundSql, SqlMapperError> {
    let mut out = String::with_capacity(sql.len());
    let mut parameters = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();
    // Start of the span not yet copied to `out`.
    let mut copied = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    state = State::LineComment;
                    idx += 1;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                b'#' if bytes.get(idx + 1) == Some(&b'{') => {
                    let close = sql[idx + 2..].find('}').ok_or_else(|| {
                        SqlMapperError::ConfigError(format!(
                            "unterminated placeholder at byte {idx} in: {sql}"
                        ))
                    })? + idx
                        + 2;
                    let name = placeholder_name(&sql[idx + 2..close]);
                    if name.is_empty() {
                        return Err(SqlMapperError::ConfigError(format!(
                            "empty placeholder at byte {idx} in: {sql}"
                        )));
                    }
                    out.push_str(&sql[copied..idx]);
                    parameters.push(name.to_owned());
                    target.write(&mut out, parameters.len());
                    idx = close;
                    copied = close + 1;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }
        idx += 1;
    }

    out.push_str(&sql[copied..]);
    Ok(BoundSql {
        sql: out,
        parameters,
    })
}

fn placeholder_name(inner: &str) -> &str {
    inner.split(',').next().unwrap_or_default().trim()
}

#[derive(Clone)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let mut idx = start + 1;
    while idx < bytes.len() && bytes[idx] != b'$' {
        let b = bytes[idx];
        if !(b.is_ascii_alphanumeric() || b == b'_') {
            return None;
        }
        idx += 1;
    }

    if idx < bytes.len() && bytes[idx] == b'$' {
        let tag = String::from_utf8(bytes[start + 1..idx].to_vec()).ok()?;
        Some((tag, idx))
    } else {
        None
    }
}

/// True when the closing `$tag$` starts at `idx`.
fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    end < bytes.len()
        && bytes[idx + 1..end] == *tag.as_bytes()
        && bytes.get(end) == Some(&b'$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamMap;

    #[test]
    fn compiles_named_to_sqlite() {
        let bound = compile_placeholders(
            "select * from t where a = #{a} and b = #{ b }",
            PlaceholderStyle::Sqlite,
        )
        .unwrap();
        assert_eq!(bound.sql(), "select * from t where a = ?1 and b = ?2");
        assert_eq!(bound.parameter_names(), ["a", "b"]);
    }

    #[test]
    fn compiles_named_to_postgres() {
        let bound = compile_placeholders(
            "insert into t values(#{id,jdbcType=INTEGER}, #{name})",
            PlaceholderStyle::Postgres,
        )
        .unwrap();
        assert_eq!(bound.sql(), "insert into t values($1, $2)");
        assert_eq!(bound.parameter_names(), ["id", "name"]);
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "select '#{x}', \"#{y}\" -- #{z}\n/* #{w} */ from t where a = #{a}";
        let bound = compile_placeholders(sql, PlaceholderStyle::Sqlite).unwrap();
        assert_eq!(
            bound.sql(),
            "select '#{x}', \"#{y}\" -- #{z}\n/* #{w} */ from t where a = ?1"
        );
        assert_eq!(bound.parameter_names(), ["a"]);
    }

    #[test]
    fn skips_dollar_quoted_blocks() {
        let sql = "$foo$ select #{a} $foo$ where a = #{a}";
        let bound = compile_placeholders(sql, PlaceholderStyle::Postgres).unwrap();
        assert_eq!(bound.sql(), "$foo$ select #{a} $foo$ where a = $1");
    }

    #[test]
    fn rejects_unterminated_and_empty() {
        assert!(matches!(
            compile_placeholders("select #{a", PlaceholderStyle::Sqlite),
            Err(SqlMapperError::ConfigError(_))
        ));
        assert!(matches!(
            compile_placeholders("select #{ }", PlaceholderStyle::Sqlite),
            Err(SqlMapperError::ConfigError(_))
        ));
    }

    #[test]
    fn single_value_binds_every_placeholder() {
        let bound =
            compile_placeholders("select #{id} where x = #{other}", PlaceholderStyle::Sqlite)
                .unwrap();
        let values = bound
            .bind("s", &Params::Single(RowValues::Int(4)))
            .unwrap();
        assert_eq!(values, vec![RowValues::Int(4), RowValues::Int(4)]);
    }

    #[test]
    fn named_binding_reports_missing_name() {
        let bound = compile_placeholders("select #{id}", PlaceholderStyle::Sqlite).unwrap();
        let err = bound.bind("s", &Params::Named(ParamMap::new())).unwrap_err();
        assert!(matches!(err, SqlMapperError::ParameterError(_)));
        assert!(bound.bind("s", &Params::None).is_err());
    }

    #[test]
    fn no_placeholders_accepts_no_parameter() {
        let bound = compile_placeholders("select 1", PlaceholderStyle::Sqlite).unwrap();
        assert!(bound.bind("s", &Params::None).unwrap().is_empty());
    }
}
