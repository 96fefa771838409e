//! Type inference by successive coercion.
//!
//! Candidates are tried in a fixed order (integer, float, date) and the first
//! one that accepts every non-null cell wins. A column nothing accepts, or one
//! with no non-null cells at all, is a string column.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::{
    ChunkApply, DataType, DatetimeChunked, IntoSeries, NewChunkedArray, Series, StringChunked,
    TimeUnit,
};
use tracing::debug;

use crate::column::{Column, ColumnType, TypedColumn};

/// A coercion attempt rejected the column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionFailed {
    pub target: ColumnType,
    pub reason: String,
}

impl CoercionFailed {
    fn new(target: ColumnType, reason: impl ToString) -> Self {
        Self {
            target,
            reason: reason.to_string(),
        }
    }
}

type Coercion = fn(&StringChunked) -> Result<Series, CoercionFailed>;

const COERCIONS: [(ColumnType, Coercion); 3] = [
    (ColumnType::Integer, coerce_integer),
    (ColumnType::Float, coerce_float),
    (ColumnType::Date, coerce_date),
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
    "%a %b %e %H:%M:%S %Y",
];

// Month-first before day-first, the same preference as the common US parsers.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m/%d/%y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d-%B-%Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%A, %B %d, %Y",
];

/// Decide the semantic type of `column` and coerce its cells.
pub fn infer(column: &Column) -> TypedColumn {
    let label = column.label();

    if column.null_count() == column.len() {
        debug!(column = label, "No non-null values, defaulting to string");
        return TypedColumn::new(ColumnType::String, column.series());
    }

    let trimmed = StringChunked::from_iter_options(
        column.cells().name().clone(),
        column.cells().iter().map(|cell| cell.map(str::trim)),
    );
    for (column_type, attempt) in COERCIONS {
        match attempt(&trimmed) {
            Ok(series) => {
                debug!(column = label, %column_type, "Coerced column");
                return TypedColumn::new(column_type, series);
            }
            Err(failed) => {
                debug!(
                    column = label,
                    %column_type,
                    reason = %failed.reason,
                    "Not a {} column",
                    column_type
                );
            }
        }
    }

    debug!(column = label, "String column");
    TypedColumn::new(ColumnType::String, column.series())
}

/// Whole numbers that fit in `i64`; any other non-null cell fails the cast.
pub fn coerce_integer(cells: &StringChunked) -> Result<Series, CoercionFailed> {
    cells
        .clone()
        .into_series()
        .strict_cast(&DataType::Int64)
        .map_err(|e| CoercionFailed::new(ColumnType::Integer, e))
}

/// Finite decimal literals. Negative zero is stored as zero.
pub fn coerce_float(cells: &StringChunked) -> Result<Series, CoercionFailed> {
    let series = cells
        .clone()
        .into_series()
        .strict_cast(&DataType::Float64)
        .map_err(|e| CoercionFailed::new(ColumnType::Float, e))?;
    let values = series
        .f64()
        .map_err(|e| CoercionFailed::new(ColumnType::Float, e))?;
    if let Some(bad) = values.iter().flatten().find(|v| !v.is_finite()) {
        return Err(CoercionFailed::new(
            ColumnType::Float,
            format!("non-finite value {bad}"),
        ));
    }
    Ok(values.apply_values(|v| v + 0.0).into_series())
}

pub fn coerce_date(cells: &StringChunked) -> Result<Series, CoercionFailed> {
    let dates = cells
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            None => Ok(None),
            Some(text) => parse_date(text).map(Some).ok_or_else(|| {
                CoercionFailed::new(ColumnType::Date, format!("row {row}: '{text}'"))
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DatetimeChunked::from_naive_datetime_options(
        cells.name().clone(),
        dates,
        TimeUnit::Microseconds,
    )
    .into_series())
}

/// Parse a calendar date or date-time in any of the accepted layouts.
///
/// Zoned timestamps (RFC 3339, RFC 2822) are normalized to UTC. Date-only
/// layouts map to midnight.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }
    if let Ok(zoned) = DateTime::parse_from_rfc3339(text) {
        return Some(zoned.naive_utc());
    }
    if let Ok(zoned) = DateTime::parse_from_rfc2822(text) {
        return Some(zoned.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
