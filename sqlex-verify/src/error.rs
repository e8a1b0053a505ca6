// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Assertion failures.

use thiserror::Error;

use crate::row::Row;
use crate::value::Value;

/// Why a result set did not match its expectation.
///
/// Values in [`VerifyError::ValueMismatch`] are reported after typecasts
/// were applied, since those are the values that were compared.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    #[error("row {row}: column '{column}' is missing from the result")]
    MissingField { row: usize, column: String },

    #[error("row {row}, column '{column}': expected {expected}, got {actual}")]
    ValueMismatch {
        row: usize,
        column: String,
        expected: Value,
        actual: Value,
    },

    #[error("expected {expected} rows, got {actual}")]
    CardinalityMismatch { expected: usize, actual: usize },

    #[error(
        "row {row}: expected columns [{}], got [{}]",
        .expected.join(", "),
        .actual.join(", ")
    )]
    ColumnSetMismatch {
        row: usize,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("no result row matches expected row {row}: {expected}")]
    UnmatchedRow { row: usize, expected: Row },
}
