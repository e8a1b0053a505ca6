// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Raw statement execution for SQLite.

use rusqlite::params_from_iter;
use sqlex_verify::{ResultSet, Row, Value};
use tracing::debug;

use crate::backend::{Backend, Dialect};
use crate::connection::Database;
use crate::error::{Error, Result};
use crate::types::{SqlParam, value_from_sql};

impl Database {
    /// Run one statement with positional parameters (`?1` or `$1`, ...).
    ///
    /// When a result row repeats a column name the last occurrence wins.
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| Error::statement(sql, e))?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let bound = params_from_iter(params.iter().map(SqlParam));

        if columns.is_empty() {
            let changed = stmt.execute(bound).map_err(|e| Error::statement(sql, e))?;
            debug!("Statement changed {changed} rows");
            return Ok(ResultSet::affected(changed as u64));
        }

        let mut out = Vec::new();
        let mut rows = stmt.query(bound).map_err(|e| Error::statement(sql, e))?;
        while let Some(row) = rows.next().map_err(|e| Error::statement(sql, e))? {
            let mut values = Row::with_capacity(columns.len());
            for (index, column) in columns.iter().enumerate() {
                values.insert(column.as_str(), value_from_sql(row.get_ref(index)?));
            }
            out.push(values);
        }

        debug!("Query returned {} rows", out.len());
        Ok(ResultSet::new(columns, out))
    }

    /// Run several `;`-separated statements.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| Error::statement(sql, e))
    }
}

impl Backend for Database {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        Database::query(self, sql, params)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        Database::execute_batch(self, sql)
    }
}
