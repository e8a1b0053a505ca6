// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Typed comparison of SQL result rows against expected rows.
//!
//! A query's rows are compared, in order, against literal expected rows.
//! Columns named in a [`TypecastMap`] are normalized on both sides before
//! a strict, typed equality check, so backend-specific representations
//! (a count returned as `'3'` by one driver and `3` by another) compare
//! equal while everything else must match exactly.
//!
//! **Architecture**: this crate is pure. It performs no I/O and keeps no
//! global state; typecasts travel inside a [`VerifyConfig`].
//!
//! # Example
//!
//! ```
//! use sqlex_verify::{assert_rows_equal, row, Coercion, TypecastMap, VerifyError};
//!
//! let typecasts = TypecastMap::new().with("cnt", Coercion::Integer);
//! let actual = vec![row! { "name" => "flying", "cnt" => 2 }];
//!
//! assert!(assert_rows_equal(&actual, &[row! { "cnt" => "2" }], &typecasts).is_ok());
//! assert!(matches!(
//!     assert_rows_equal(&actual, &[], &typecasts),
//!     Err(VerifyError::CardinalityMismatch { expected: 0, actual: 1 })
//! ));
//! ```

mod error;
mod macros;
mod row;
mod typecast;
mod value;
mod verify;

pub use error::VerifyError;
pub use row::{QueryMeta, ResultSet, Row};
pub use typecast::{Coercion, Typecast, TypecastMap, UnknownCoercion};
pub use value::Value;
pub use verify::{MatchMode, RowOrder, Verifier, VerifyConfig, assert_rows_equal};
