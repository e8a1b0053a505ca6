// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Per-column value normalization.
//!
//! Backends disagree on how some values come back: PostgreSQL drivers
//! commonly hand `COUNT(*)` over as a numeric string while SQLite returns a
//! native integer. A [`TypecastMap`] names, per column, the function that
//! brings both representations to one canonical value before the strict
//! comparison in [`crate::Verifier`] runs.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::Value;

type CoerceFn = dyn Fn(&Value) -> Value + Send + Sync;

/// A named, pure coercion function.
#[derive(Clone)]
pub struct Typecast {
    name: Cow<'static, str>,
    func: Arc<CoerceFn>,
}

impl Typecast {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, value: &Value) -> Value {
        (self.func)(value)
    }
}

impl fmt::Debug for Typecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Typecast").field(&self.name).finish()
    }
}

impl From<Coercion> for Typecast {
    fn from(coercion: Coercion) -> Self {
        Typecast::new(coercion.name(), move |v| coercion.apply(v))
    }
}

/// Built-in coercions, nameable from configuration files.
///
/// Every coercion is idempotent, and values it cannot convert are
/// returned unchanged so the mismatch still surfaces. Names are parsed by
/// [`FromStr`], case-insensitively and with short aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Coercion {
    Integer,
    Float,
    Text,
    Boolean,
}

impl Coercion {
    pub fn name(self) -> &'static str {
        match self {
            Coercion::Integer => "integer",
            Coercion::Float => "float",
            Coercion::Text => "text",
            Coercion::Boolean => "boolean",
        }
    }

    pub fn apply(self, value: &Value) -> Value {
        match self {
            Coercion::Integer => to_integer(value),
            Coercion::Float => to_float(value),
            Coercion::Text => to_text(value),
            Coercion::Boolean => to_boolean(value),
        }
    }
}

impl fmt::Display for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown coercion '{0}' (expected integer, float, text or boolean)")]
pub struct UnknownCoercion(pub String);

impl FromStr for Coercion {
    type Err = UnknownCoercion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(Coercion::Integer),
            "float" | "real" => Ok(Coercion::Float),
            "text" | "string" => Ok(Coercion::Text),
            "boolean" | "bool" => Ok(Coercion::Boolean),
            _ => Err(UnknownCoercion(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Coercion {
    type Error = UnknownCoercion;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// 2^63; `i64::MAX as f64` rounds up to this, so the upper bound is exclusive.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn to_integer(value: &Value) -> Value {
    match value {
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_or_else(|_| value.clone(), Value::Integer),
        Value::Real(r) if r.fract() == 0.0 && *r >= -I64_BOUND && *r < I64_BOUND => {
            Value::Integer(*r as i64)
        }
        Value::Boolean(b) => Value::Integer(i64::from(*b)),
        _ => value.clone(),
    }
}

fn to_float(value: &Value) -> Value {
    match value {
        Value::Integer(i) => Value::Real(*i as f64),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_or_else(|_| value.clone(), Value::Real),
        _ => value.clone(),
    }
}

fn to_text(value: &Value) -> Value {
    match value {
        Value::Integer(i) => Value::Text(i.to_string()),
        Value::Real(r) => Value::Text(r.to_string()),
        Value::Boolean(b) => Value::Text(b.to_string()),
        _ => value.clone(),
    }
}

fn to_boolean(value: &Value) -> Value {
    match value {
        Value::Integer(0) => Value::Boolean(false),
        Value::Integer(1) => Value::Boolean(true),
        Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Value::Boolean(true),
            "false" | "f" | "0" => Value::Boolean(false),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}

/// Column name to [`Typecast`] mapping.
#[derive(Debug, Clone, Default)]
pub struct TypecastMap {
    casts: BTreeMap<String, Typecast>,
}

impl TypecastMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, cast: impl Into<Typecast>) -> Option<Typecast> {
        self.casts.insert(column.into(), cast.into())
    }

    /// Builder form of [`TypecastMap::insert`].
    pub fn with(mut self, column: impl Into<String>, cast: impl Into<Typecast>) -> Self {
        self.insert(column, cast);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Typecast> {
        self.casts.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.casts.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.casts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.casts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.casts.is_empty()
    }

    /// A new map holding `self`'s entries with `overrides` taking
    /// precedence per column.
    pub fn overlay(&self, overrides: &TypecastMap) -> TypecastMap {
        let mut casts = self.casts.clone();
        for (column, cast) in &overrides.casts {
            casts.insert(column.clone(), cast.clone());
        }
        TypecastMap { casts }
    }

    /// Apply the cast registered for `column`, if any.
    pub fn coerce<'v>(&self, column: &str, value: &'v Value) -> Cow<'v, Value> {
        match self.casts.get(column) {
            Some(cast) => Cow::Owned(cast.apply(value)),
            None => Cow::Borrowed(value),
        }
    }
}

impl<K: Into<String>, C: Into<Typecast>> FromIterator<(K, C)> for TypecastMap {
    fn from_iter<I: IntoIterator<Item = (K, C)>>(iter: I) -> Self {
        let mut map = TypecastMap::new();
        for (column, cast) in iter {
            map.insert(column, cast);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::numeric_string(Value::from("3"), Value::Integer(3))]
    #[case::padded(Value::from(" 42 "), Value::Integer(42))]
    #[case::already_int(Value::Integer(3), Value::Integer(3))]
    #[case::whole_real(Value::Real(2.0), Value::Integer(2))]
    #[case::fractional_real(Value::Real(2.5), Value::Real(2.5))]
    #[case::huge_real(Value::Real(1e300), Value::Real(1e300))]
    #[case::boolean(Value::Boolean(true), Value::Integer(1))]
    #[case::not_a_number(Value::from("3abc"), Value::from("3abc"))]
    #[case::null(Value::Null, Value::Null)]
    fn test_integer(#[case] input: Value, #[case] expected: Value) {
        assert_eq!(Coercion::Integer.apply(&input), expected);
    }

    #[rstest]
    #[case(Value::Integer(2), Value::Real(2.0))]
    #[case(Value::from("1.5"), Value::Real(1.5))]
    #[case(Value::from("x"), Value::from("x"))]
    fn test_float(#[case] input: Value, #[case] expected: Value) {
        assert_eq!(Coercion::Float.apply(&input), expected);
    }

    #[rstest]
    #[case(Value::Integer(2), Value::from("2"))]
    #[case(Value::Real(1.5), Value::from("1.5"))]
    #[case(Value::Boolean(false), Value::from("false"))]
    #[case(Value::Null, Value::Null)]
    fn test_text(#[case] input: Value, #[case] expected: Value) {
        assert_eq!(Coercion::Text.apply(&input), expected);
    }

    #[rstest]
    #[case(Value::Integer(1), Value::Boolean(true))]
    #[case(Value::Integer(0), Value::Boolean(false))]
    #[case(Value::Integer(2), Value::Integer(2))]
    #[case(Value::from("t"), Value::Boolean(true))]
    #[case(Value::from("FALSE"), Value::Boolean(false))]
    #[case(Value::from("maybe"), Value::from("maybe"))]
    fn test_boolean(#[case] input: Value, #[case] expected: Value) {
        assert_eq!(Coercion::Boolean.apply(&input), expected);
    }

    #[rstest]
    #[case("integer", Coercion::Integer)]
    #[case("INT", Coercion::Integer)]
    #[case("real", Coercion::Float)]
    #[case("string", Coercion::Text)]
    #[case("bool", Coercion::Boolean)]
    fn test_parse_coercion(#[case] input: &str, #[case] expected: Coercion) {
        assert_eq!(input.parse::<Coercion>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_coercion() {
        let err = "date".parse::<Coercion>().unwrap_err();
        assert_eq!(err, UnknownCoercion("date".into()));
    }

    #[test]
    fn test_deserialize_uses_parser() {
        let parsed: Vec<Coercion> = serde_json::from_str(r#"["INT", "real", "string", "Bool"]"#).unwrap();
        assert_eq!(
            parsed,
            [Coercion::Integer, Coercion::Float, Coercion::Text, Coercion::Boolean]
        );
        let err = serde_json::from_str::<Coercion>(r#""date""#).unwrap_err();
        assert!(err.to_string().contains("unknown coercion 'date'"), "{err}");
        assert_eq!(serde_json::to_string(&Coercion::Float).unwrap(), r#""float""#);
    }

    #[test]
    fn test_overlay_prefers_overrides() {
        let defaults = TypecastMap::new()
            .with("cnt", Coercion::Integer)
            .with("name", Coercion::Text);
        let overrides =
            TypecastMap::new().with("cnt", Typecast::new("zero", |_| Value::Integer(0)));
        let merged = defaults.overlay(&overrides);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("cnt").unwrap().name(), "zero");
        assert_eq!(merged.get("name").unwrap().name(), "text");
        // defaults are untouched
        assert_eq!(defaults.get("cnt").unwrap().name(), "integer");
    }

    #[test]
    fn test_coerce_unregistered_column_borrows() {
        let map = TypecastMap::new().with("cnt", Coercion::Integer);
        let value = Value::from("3");
        assert!(matches!(map.coerce("name", &value), Cow::Borrowed(_)));
        assert_eq!(*map.coerce("cnt", &value), Value::Integer(3));
    }
}
