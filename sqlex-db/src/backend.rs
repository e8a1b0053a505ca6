// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! The raw-query interface shared by all backends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlex_verify::{ResultSet, Value};

use crate::connection::{Database, OpenMode};
use crate::error::{Error, Result};

/// SQL dialect spoken by a backend.
///
/// Configuration files and the command line share the [`FromStr`] parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
}

impl Dialect {
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            _ => Err(Error::UnknownDialect(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Dialect {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// A database that executes raw SQL and hands back materialized rows.
pub trait Backend {
    fn dialect(&self) -> Dialect;

    /// Run one statement.
    ///
    /// Statements producing columns return their rows; all others return
    /// an empty [`ResultSet`] carrying `rows_affected`.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet>;

    /// Run several `;`-separated statements, discarding any rows.
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    fn drop_table(&mut self, table: &str) -> Result<()> {
        self.query(&format!("DROP TABLE IF EXISTS {}", quote_identifier(table)), &[])?;
        Ok(())
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        (**self).query(sql, params)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        (**self).execute_batch(sql)
    }

    fn drop_table(&mut self, table: &str) -> Result<()> {
        (**self).drop_table(table)
    }
}

/// Quote `name` as an SQL identifier, preserving its case.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Open a backend for `dialect`.
///
/// For SQLite `database` is a file path (created if missing) or
/// `:memory:`; for PostgreSQL it is a connection URL.
pub fn connect(dialect: Dialect, database: &str) -> Result<Box<dyn Backend>> {
    match dialect {
        Dialect::Sqlite => {
            let db = if database == ":memory:" {
                Database::open_memory()?
            } else {
                Database::open(database, OpenMode::Create)?
            };
            Ok(Box::new(db))
        }
        #[cfg(feature = "postgres")]
        Dialect::Postgres => Ok(Box::new(crate::postgres::PgDatabase::connect(database)?)),
        #[cfg(not(feature = "postgres"))]
        Dialect::Postgres => Err(Error::UnsupportedDialect(dialect)),
    }
}
