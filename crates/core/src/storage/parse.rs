//! Column decoding for stored values
//!
//! Ids and timestamps are stored as text. Decoding failures surface as
//! rusqlite conversion errors carrying the column index.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Error as SqlError, Row};
use uuid::Uuid;

use crate::models::YesNo;

/// Format a timestamp for storage.
///
/// Fixed nanosecond precision keeps lexical order equal to time order and
/// reads back the exact instant that was written.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_error<E>(idx: usize) -> impl FnOnce(E) -> SqlError
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |e| SqlError::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub fn uuid_at(row: &Row<'_>, idx: usize) -> Result<Uuid, SqlError> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(conversion_error(idx))
}

pub fn datetime_at(row: &Row<'_>, idx: usize) -> Result<DateTime<Utc>, SqlError> {
    let text: String = row.get(idx)?;
    decode_datetime(&text).map_err(conversion_error(idx))
}

pub fn datetime_opt_at(row: &Row<'_>, idx: usize) -> Result<Option<DateTime<Utc>>, SqlError> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| decode_datetime(&t).map_err(conversion_error(idx)))
        .transpose()
}

/// Unknown answers read as unanswered
pub fn yes_no_at(row: &Row<'_>, idx: usize) -> Result<Option<YesNo>, SqlError> {
    let text: Option<String> = row.get(idx)?;
    Ok(text.as_deref().and_then(YesNo::parse))
}

fn decode_datetime(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc))
}

/// `QueryReturnedNoRows` as `Ok(None)`
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, SqlError>;
}

impl<T> OptionalExt<T> for Result<T, SqlError> {
    fn optional(self) -> Result<Option<T>, SqlError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(SqlError::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
