//! Typed row decoding.

use rusqlite::Row;

use crate::timestamp::Timestamp;

/// Decodes one result row into a value.
///
/// Record types read their columns by name (`row.get("title")`), so the
/// decoder is independent of column order in the `SELECT`. Scalars read the
/// first column.
pub trait FromRow: Sized {
    /// Builds `Self` from the current row.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

macro_rules! scalar_from_row {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromRow for $ty {
                fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
                    row.get(0)
                }
            }
        )*
    };
}

scalar_from_row!(i64, i32, bool, String, Timestamp);

impl<T: rusqlite::types::FromSql> FromRow for Option<T> {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}
