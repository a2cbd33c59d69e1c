//! Row-mapping helpers shared by the port implementations.

use domain::{StoreError, Timestamp};
use rusqlite::types::Type;
use rusqlite::{ErrorCode, Row};
use serde::de::DeserializeOwned;

pub(crate) trait SqlResultExt<T> {
    /// Maps a driver error to [`StoreError`]; constraint violations become
    /// [`StoreError::Conflict`].
    fn store_err(self) -> Result<T, StoreError>;
}

impl<T> SqlResultExt<T> for rusqlite::Result<T> {
    fn store_err(self) -> Result<T, StoreError> {
        self.map_err(|e| match e {
            rusqlite::Error::SqliteFailure(inner, message)
                if inner.code == ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(message.unwrap_or_else(|| "constraint violated".into()))
            }
            other => StoreError::Backend(other.to_string()),
        })
    }
}

/// Reads a text column through `parse`, reporting unknown values as a
/// conversion failure.
pub(crate) fn parse_col<T>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    parse(&text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value {text:?}").into(),
        )
    })
}

pub(crate) fn timestamp_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Timestamp> {
    parse_col(row, idx, Timestamp::parse_rfc3339)
}

pub(crate) fn json_col<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Backend(format!("cannot encode row: {e}")))
}

/// SQLite treats a negative `LIMIT` as "no limit".
pub(crate) fn limit_param(limit: Option<usize>) -> i64 {
    limit
        .and_then(|l| i64::try_from(l).ok())
        .unwrap_or(-1)
}
