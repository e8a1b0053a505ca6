// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Error types for backend operations.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::backend::Dialect;

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a database.
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to open database with context
    #[error("Failed to open database at '{path}': {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Database file not found
    #[error("Database not found at: {0}")]
    DatabaseNotFound(PathBuf),

    /// A raw statement was rejected by SQLite
    #[error("{source}\n  in statement: {}", .statement.trim())]
    Statement {
        statement: String,
        #[source]
        source: rusqlite::Error,
    },

    /// PostgreSQL error
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A raw statement was rejected by PostgreSQL
    #[cfg(feature = "postgres")]
    #[error("{source}\n  in statement: {}", .statement.trim())]
    PostgresStatement {
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    /// The async runtime backing the PostgreSQL driver could not start
    #[cfg(feature = "postgres")]
    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// Dialect known but compiled out
    #[error("Dialect '{0}' is not available in this build")]
    UnsupportedDialect(Dialect),

    /// Dialect name not recognised
    #[error("Unknown dialect '{0}' (expected sqlite or postgres)")]
    UnknownDialect(String),
}

/// Coarse classification of backend failures.
///
/// Lets a scenario expect "some constraint violation" without depending on
/// the wording of a particular engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Constraint,
    Syntax,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Constraint => "constraint violation",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Other => "other error",
        })
    }
}

impl Error {
    pub(crate) fn statement(statement: &str, source: rusqlite::Error) -> Self {
        Error::Statement {
            statement: statement.to_owned(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Sqlite(e) | Error::Statement { source: e, .. } => sqlite_error_kind(e),
            #[cfg(feature = "postgres")]
            Error::Postgres(e) | Error::PostgresStatement { source: e, .. } => {
                crate::postgres::error_kind(e)
            }
            _ => ErrorKind::Other,
        }
    }
}

fn sqlite_error_kind(error: &rusqlite::Error) -> ErrorKind {
    match error {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            ErrorKind::Constraint
        }
        _ if is_sqlite_syntax_message(&error.to_string()) => ErrorKind::Syntax,
        _ => ErrorKind::Other,
    }
}

/// SQLite reports parse failures only through SQLITE_ERROR and its message.
fn is_sqlite_syntax_message(message: &str) -> bool {
    message.contains("syntax error")
        || message.starts_with("near \"")
        || message.starts_with("incomplete input")
        || message.starts_with("unrecognized token")
}
