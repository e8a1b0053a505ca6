// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Comparison of actual result rows against expected rows.

use serde::{Deserialize, Serialize};

use crate::error::VerifyError;
use crate::row::Row;
use crate::typecast::{Typecast, TypecastMap};

/// Which columns of an actual row take part in the comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Only the columns named by the expected row are compared; the actual
    /// row may carry more.
    #[default]
    Subset,
    /// The actual row must carry exactly the expected columns.
    Exact,
}

/// Whether row order is significant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowOrder {
    #[default]
    Ordered,
    Unordered,
}

/// Everything that shapes a comparison.
#[derive(Debug, Clone, Default)]
pub struct VerifyConfig {
    pub typecasts: TypecastMap,
    pub mode: MatchMode,
    pub order: RowOrder,
}

/// Compares result rows against expectations under a fixed [`VerifyConfig`].
///
/// A verifier is built once per suite; the `with_*` methods derive a new,
/// scoped verifier for a single call site without touching this one.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerifyConfig,
}

impl Verifier {
    pub fn new(config: VerifyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    pub fn with_typecast(&self, column: impl Into<String>, cast: impl Into<Typecast>) -> Self {
        let mut config = self.config.clone();
        config.typecasts.insert(column, cast);
        Self { config }
    }

    pub fn with_overrides(&self, overrides: &TypecastMap) -> Self {
        let mut config = self.config.clone();
        config.typecasts = config.typecasts.overlay(overrides);
        Self { config }
    }

    pub fn with_mode(&self, mode: MatchMode) -> Self {
        let mut config = self.config.clone();
        config.mode = mode;
        Self { config }
    }

    pub fn with_order(&self, order: RowOrder) -> Self {
        let mut config = self.config.clone();
        config.order = order;
        Self { config }
    }

    /// Check `actual` against `expected`, returning the first mismatch.
    pub fn verify(&self, actual: &[Row], expected: &[Row]) -> Result<(), VerifyError> {
        let VerifyConfig {
            typecasts,
            mode,
            order,
        } = &self.config;
        match order {
            RowOrder::Ordered => compare_ordered(actual, expected, typecasts, *mode),
            RowOrder::Unordered => compare_unordered(actual, expected, typecasts, *mode),
        }
    }
}

/// Ordered, subset-mode comparison of `actual` against `expected`.
///
/// Rows in the overlapping prefix are compared column by column first, so
/// a wrong value is reported before a wrong row count.
pub fn assert_rows_equal(
    actual: &[Row],
    expected: &[Row],
    typecasts: &TypecastMap,
) -> Result<(), VerifyError> {
    compare_ordered(actual, expected, typecasts, MatchMode::Subset)
}

fn compare_ordered(
    actual: &[Row],
    expected: &[Row],
    typecasts: &TypecastMap,
    mode: MatchMode,
) -> Result<(), VerifyError> {
    for (index, (got, want)) in actual.iter().zip(expected).enumerate() {
        compare_row(index, got, want, typecasts, mode)?;
    }
    check_cardinality(actual, expected)
}

fn compare_unordered(
    actual: &[Row],
    expected: &[Row],
    typecasts: &TypecastMap,
    mode: MatchMode,
) -> Result<(), VerifyError> {
    let candidates: Vec<Vec<usize>> = expected
        .iter()
        .map(|want| {
            actual
                .iter()
                .enumerate()
                .filter(|(index, got)| compare_row(*index, got, want, typecasts, mode).is_ok())
                .map(|(index, _)| index)
                .collect()
        })
        .collect();

    // owner[a] is the expected row currently paired with actual row a.
    let mut owner = vec![None; actual.len()];
    let mut matched = 0;
    let mut unmatched = None;
    for want in 0..expected.len() {
        let mut seen = vec![false; actual.len()];
        if augment(want, &candidates, &mut owner, &mut seen) {
            matched += 1;
        } else if unmatched.is_none() {
            unmatched = Some(want);
        }
    }

    match unmatched {
        Some(row) if matched < actual.len() => Err(VerifyError::UnmatchedRow {
            row,
            expected: expected[row].clone(),
        }),
        _ => check_cardinality(actual, expected),
    }
}

/// Try to pair expected row `want` with a free actual row, re-pairing
/// earlier rows along an alternating path when needed.
fn augment(
    want: usize,
    candidates: &[Vec<usize>],
    owner: &mut [Option<usize>],
    seen: &mut [bool],
) -> bool {
    for &got in &candidates[want] {
        if seen[got] {
            continue;
        }
        seen[got] = true;
        let free = match owner[got] {
            None => true,
            Some(other) => augment(other, candidates, owner, seen),
        };
        if free {
            owner[got] = Some(want);
            return true;
        }
    }
    false
}

fn compare_row(
    index: usize,
    actual: &Row,
    expected: &Row,
    typecasts: &TypecastMap,
    mode: MatchMode,
) -> Result<(), VerifyError> {
    for (column, want) in expected.iter() {
        let Some(got) = actual.get(column) else {
            return Err(VerifyError::MissingField {
                row: index,
                column: column.to_owned(),
            });
        };
        let got = typecasts.coerce(column, got);
        let want = typecasts.coerce(column, want);
        if got != want {
            return Err(VerifyError::ValueMismatch {
                row: index,
                column: column.to_owned(),
                expected: want.into_owned(),
                actual: got.into_owned(),
            });
        }
    }
    // Every expected column was found above, so a longer actual row has extras.
    if mode == MatchMode::Exact && actual.len() != expected.len() {
        return Err(VerifyError::ColumnSetMismatch {
            row: index,
            expected: expected.columns().map(str::to_owned).collect(),
            actual: actual.columns().map(str::to_owned).collect(),
        });
    }
    Ok(())
}

fn check_cardinality(actual: &[Row], expected: &[Row]) -> Result<(), VerifyError> {
    if actual.len() != expected.len() {
        return Err(VerifyError::CardinalityMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::typecast::Coercion;
    use crate::value::Value;
    use crate::{assert_rows_eq, row};

    fn names(names: &[&str]) -> Vec<Row> {
        names.iter().map(|n| row! { "name" => *n }).collect()
    }

    #[test]
    fn test_extra_actual_row_is_cardinality_mismatch() {
        let err = assert_rows_equal(
            &names(&["dog", "cat", "hawk"]),
            &names(&["dog", "cat"]),
            &TypecastMap::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            VerifyError::CardinalityMismatch {
                expected: 2,
                actual: 3
            }
        );
        assert_eq!(err.to_string(), "expected 2 rows, got 3");
    }

    #[test]
    fn test_typecast_applies_to_expected_and_actual() {
        let typecasts = TypecastMap::new().with("cnt", Coercion::Integer);
        let actual = [row! { "cnt" => 3 }];
        let expected = [row! { "cnt" => "3" }];
        assert_rows_equal(&actual, &expected, &typecasts).unwrap();

        // without the cast the text '3' and the integer 3 differ
        let err = assert_rows_equal(&actual, &expected, &TypecastMap::new()).unwrap_err();
        assert!(matches!(err, VerifyError::ValueMismatch { row: 0, .. }));
    }

    #[test]
    fn test_order_is_significant() {
        let err = assert_rows_equal(
            &names(&["mammal", "flying"]),
            &names(&["flying", "mammal"]),
            &TypecastMap::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            VerifyError::ValueMismatch {
                row: 0,
                column: "name".into(),
                expected: Value::from("flying"),
                actual: Value::from("mammal"),
            }
        );
        assert_eq!(
            err.to_string(),
            "row 0, column 'name': expected 'flying', got 'mammal'"
        );
    }

    #[test]
    fn test_value_mismatch_reported_before_cardinality() {
        let err = assert_rows_equal(
            &names(&["dog", "cow", "hawk"]),
            &names(&["dog", "cat"]),
            &TypecastMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::ValueMismatch { row: 1, .. }));
    }

    #[test]
    fn test_missing_column() {
        let actual = [row! { "id" => 0, "name" => "dog" }];
        let expected = [row! { "name" => "dog", "cnt" => 1 }];
        let err = assert_rows_equal(&actual, &expected, &TypecastMap::new()).unwrap_err();
        assert_eq!(
            err,
            VerifyError::MissingField {
                row: 0,
                column: "cnt".into()
            }
        );
    }

    #[test]
    fn test_partial_rows_ignore_extra_columns() {
        let actual = [
            row! { "id" => 0, "name" => "flying" },
            row! { "id" => 1, "name" => "MAMMAL" },
        ];
        let expected = names(&["flying", "MAMMAL"]);
        assert_rows_equal(&actual, &expected, &TypecastMap::new()).unwrap();
    }

    #[test]
    fn test_exact_mode_rejects_extra_columns() {
        let verifier = Verifier::default().with_mode(MatchMode::Exact);
        let actual = [row! { "id" => 0, "name" => "flying" }];
        let err = verifier.verify(&actual, &names(&["flying"])).unwrap_err();
        assert_eq!(
            err,
            VerifyError::ColumnSetMismatch {
                row: 0,
                expected: vec!["name".into()],
                actual: vec!["id".into(), "name".into()],
            }
        );
        verifier
            .verify(&actual, &[row! { "id" => 0, "name" => "flying" }])
            .unwrap();
    }

    #[rstest]
    #[case::same_order(&["a", "b", "c"], &["a", "b", "c"])]
    #[case::shuffled(&["c", "a", "b"], &["a", "b", "c"])]
    #[case::duplicates(&["a", "b", "a"], &["a", "a", "b"])]
    fn test_unordered_accepts_permutations(#[case] actual: &[&str], #[case] expected: &[&str]) {
        let verifier = Verifier::default().with_order(RowOrder::Unordered);
        verifier.verify(&names(actual), &names(expected)).unwrap();
    }

    #[test]
    fn test_unordered_repairs_partial_rows() {
        let verifier = Verifier::default().with_order(RowOrder::Unordered);
        let actual = [
            row! { "name" => "a", "id" => 1 },
            row! { "name" => "a", "id" => 2 },
        ];
        // the first expected row fits both actual rows, the second only one
        let expected = [row! { "name" => "a" }, row! { "name" => "a", "id" => 1 }];
        verifier.verify(&actual, &expected).unwrap();

        let expected = [row! { "name" => "a", "id" => 2 }, row! { "name" => "a", "id" => 2 }];
        let err = verifier.verify(&actual, &expected).unwrap_err();
        assert_eq!(
            err,
            VerifyError::UnmatchedRow {
                row: 1,
                expected: row! { "name" => "a", "id" => 2 }
            }
        );
    }

    #[test]
    fn test_unordered_failures() {
        let verifier = Verifier::default().with_order(RowOrder::Unordered);

        let err = verifier
            .verify(&names(&["a", "b"]), &names(&["b", "z"]))
            .unwrap_err();
        assert_eq!(
            err,
            VerifyError::UnmatchedRow {
                row: 1,
                expected: row! { "name" => "z" }
            }
        );

        let err = verifier
            .verify(&names(&["a", "b"]), &names(&["b", "a", "a"]))
            .unwrap_err();
        assert_eq!(
            err,
            VerifyError::CardinalityMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_scoped_override_leaves_default_untouched() {
        let suite = Verifier::new(VerifyConfig {
            typecasts: TypecastMap::new().with("cnt", Coercion::Integer),
            ..Default::default()
        });
        let scoped = suite.with_typecast("cnt", Coercion::Text);

        let actual = [row! { "cnt" => 3 }];
        suite.verify(&actual, &[row! { "cnt" => "3" }]).unwrap();
        scoped.verify(&actual, &[row! { "cnt" => "3" }]).unwrap();
        assert_eq!(suite.config().typecasts.get("cnt").unwrap().name(), "integer");
        assert_eq!(scoped.config().typecasts.get("cnt").unwrap().name(), "text");
    }

    #[test]
    fn test_assert_macro_passes() {
        let typecasts = TypecastMap::new().with("cnt", Coercion::Integer);
        assert_rows_eq!(
            vec![row! { "name" => "vertebrate", "cnt" => 3 }],
            [row! { "name" => "vertebrate", "cnt" => "3" }],
            &typecasts
        );
    }

    #[test]
    #[should_panic = "result rows differ: expected 1 rows, got 0"]
    fn test_assert_macro_panics_with_diagnostic() {
        let actual: Vec<Row> = Vec::new();
        assert_rows_eq!(actual, [row! { "name" => "dog" }]);
    }
}
