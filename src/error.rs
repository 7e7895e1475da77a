use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;

#[derive(Debug, Error)]
pub enum SqlMapperError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown statement id: {0}")]
    UnknownStatement(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter binding error: {0}")]
    ParameterError(String),

    #[error("Result mapping error: {0}")]
    ResultMapping(String),

    #[error("Statement {id} expected at most one row, engine produced {found}")]
    TooManyResults { id: String, found: usize },

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for SqlMapperError {
    fn from(err: serde_json::Error) -> Self {
        SqlMapperError::ResultMapping(format!("serde mapping failed: {err}"))
    }
}

#[cfg(feature = "sqlite")]
impl From<bb8::RunError<rusqlite::Error>> for SqlMapperError {
    fn from(err: bb8::RunError<rusqlite::Error>) -> Self {
        SqlMapperError::ConnectionError(format!("SQLite pool error: {err}"))
    }
}
