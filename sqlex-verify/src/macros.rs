// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

/// Build a [`Row`](crate::Row) from `column => value` pairs.
///
/// ```
/// use sqlex_verify::{row, Value};
///
/// let r = row! { "name" => "dog", "cnt" => 3 };
/// assert_eq!(r.get("cnt"), Some(&Value::Integer(3)));
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::Row::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::Row::new();
        $( row.insert($column, $value); )+
        row
    }};
}

/// Panic with the verifier's diagnostic unless `actual` matches `expected`.
///
/// Both sides may be anything that is `AsRef<[Row]>`: a `ResultSet`, a
/// `Vec<Row>` or an array of rows.
#[macro_export]
macro_rules! assert_rows_eq {
    ($actual:expr, $expected:expr $(,)?) => {
        $crate::assert_rows_eq!($actual, $expected, &$crate::TypecastMap::new())
    };
    ($actual:expr, $expected:expr, $typecasts:expr $(,)?) => {
        if let Err(err) = $crate::assert_rows_equal(
            ::core::convert::AsRef::<[$crate::Row]>::as_ref(&$actual),
            ::core::convert::AsRef::<[$crate::Row]>::as_ref(&$expected),
            $typecasts,
        ) {
            panic!("result rows differ: {err}");
        }
    };
}
