// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Raw SQL backends returning typed result sets.
//!
//! This crate runs literal SQL statements and materializes their output as
//! [`sqlex_verify::ResultSet`] values ready for comparison.
//!
//! **Architecture**: this is the database layer of sqlex; scenarios and the
//! command line talk to it only through the [`Backend`] trait.
//!
//! # Key Features
//!
//! - SQLite via rusqlite, with foreign keys enforced so cascades fire
//! - In-memory databases for tests
//! - PostgreSQL via sqlx (`postgres` feature)
//! - Portable classification of failures ([`ErrorKind`])
//!
//! # Example
//!
//! ```
//! use sqlex_db::Database;
//! use sqlex_verify::{assert_rows_eq, row};
//!
//! let db = Database::open_memory()?;
//! db.execute_batch(r#"CREATE TABLE "Animal" (id INTEGER PRIMARY KEY, name TEXT)"#)?;
//! db.query(r#"INSERT INTO "Animal" VALUES (0, 'dog')"#, &[])?;
//!
//! let rows = db.query(r#"SELECT name FROM "Animal""#, &[])?;
//! assert_rows_eq!(rows, [row! { "name" => "dog" }]);
//! # Ok::<(), sqlex_db::Error>(())
//! ```

mod backend;
mod connection;
mod error;
#[cfg(feature = "postgres")]
mod postgres;
mod query;
mod types;

pub use backend::{Backend, Dialect, connect, quote_identifier};
pub use connection::{Database, OpenMode};
pub use error::{Error, ErrorKind, Result};
#[cfg(feature = "postgres")]
pub use postgres::PgDatabase;
