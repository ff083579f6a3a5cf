//! Build typed Arrow arrays from string-based warehouse rows.
//!
//! Every non-NULL cell must parse as its declared kind; the first failure
//! aborts the whole frame.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Date32Builder, Decimal128Builder, Float64Builder, Int64Builder,
    StringBuilder, TimestampMillisecondBuilder,
};
use arrow::compute::kernels::cast_utils;
use arrow::datatypes::Decimal128Type;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::schema::{ColumnKind, ColumnSpec, DECIMAL_PRECISION};
use crate::error::FetchError;

/// Build one typed column from cell `col_idx` of every row.
pub(crate) fn build_column(
    spec: &ColumnSpec,
    col_idx: usize,
    rows: &[Vec<Option<String>>],
) -> Result<ArrayRef, FetchError> {
    let num_rows = rows.len();
    let cells = rows
        .iter()
        .map(move |row| row.get(col_idx).and_then(|v| v.as_deref()))
        .enumerate();
    let fail = |row: usize, value: &str| FetchError::Conversion {
        column: spec.name.to_string(),
        row,
        value: value.to_string(),
        expected: spec.kind.label(),
    };

    let array: ArrayRef = match spec.kind {
        ColumnKind::Utf8 => {
            let mut builder = StringBuilder::with_capacity(num_rows, num_rows * 32);
            for (_, cell) in cells {
                builder.append_option(cell);
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Int64 => {
            let mut builder = Int64Builder::with_capacity(num_rows);
            for (row, cell) in cells {
                match cell {
                    Some(s) => {
                        builder.append_value(s.trim().parse::<i64>().map_err(|_| fail(row, s))?)
                    }
                    None => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Float64 => {
            let mut builder = Float64Builder::with_capacity(num_rows);
            for (row, cell) in cells {
                match cell {
                    Some(s) => {
                        builder.append_value(s.trim().parse::<f64>().map_err(|_| fail(row, s))?)
                    }
                    None => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(num_rows);
            for (row, cell) in cells {
                match cell {
                    Some(s) => builder.append_value(parse_bool(s).ok_or_else(|| fail(row, s))?),
                    None => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Decimal { scale } => {
            let mut builder = Decimal128Builder::with_capacity(num_rows)
                .with_precision_and_scale(DECIMAL_PRECISION, scale)?;
            for (row, cell) in cells {
                match cell {
                    Some(s) => builder.append_value(
                        parse_decimal(s, DECIMAL_PRECISION, scale).ok_or_else(|| fail(row, s))?,
                    ),
                    None => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Timestamp => {
            let mut builder = TimestampMillisecondBuilder::with_capacity(num_rows);
            for (row, cell) in cells {
                match cell {
                    Some(s) => {
                        builder.append_value(parse_timestamp_ms(s).ok_or_else(|| fail(row, s))?)
                    }
                    None => builder.append_null(),
                }
            }
            Arc::new(builder.finish().with_timezone("UTC"))
        }
        ColumnKind::Date => {
            let mut builder = Date32Builder::with_capacity(num_rows);
            for (row, cell) in cells {
                match cell {
                    Some(s) => builder.append_value(parse_date32(s).ok_or_else(|| fail(row, s))?),
                    None => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
    };

    Ok(array)
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Parse a plain decimal string into the unscaled `i128` of a
/// `Decimal128(precision, scale)`.
///
/// Accepts an optional `-`, integer digits and an optional fraction; no
/// exponent. Fraction digits beyond `scale` are accepted only when they are
/// zeros, so no value is ever truncated. Returns `None` when the value does
/// not fit `precision`.
pub(crate) fn parse_decimal(value: &str, precision: u8, scale: i8) -> Option<i128> {
    let s = value.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() || !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    let keep = frac_part.len().min(usize::try_from(scale).ok()?);
    let (kept, dropped) = frac_part.split_at(keep);
    if dropped.bytes().any(|b| b != b'0') {
        return None;
    }
    let exact = if kept.is_empty() {
        format!("{sign}{int_part}")
    } else {
        format!("{sign}{int_part}.{kept}")
    };

    let unscaled = cast_utils::parse_decimal::<Decimal128Type>(&exact, precision, scale).ok()?;
    let limit = 10_i128.checked_pow(u32::from(precision))?;
    (unscaled.abs() < limit).then_some(unscaled)
}

/// Parse a timestamp string into epoch milliseconds.
///
/// Supported formats:
/// 1. Integer epoch milliseconds: `1718361000000`
/// 2. BigQuery REST float seconds: `1.718361E9`
/// 3. RFC 3339: `2025-06-14T10:30:00Z`
/// 4. Space-separated, optional fraction: `2025-06-14 10:30:00[.123]`
pub(crate) fn parse_timestamp_ms(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(ms) = value.parse::<i64>() {
        return Some(ms);
    }
    if value.contains(['E', 'e', '.']) && !value.contains(['-', ':']) {
        if let Ok(secs) = value.parse::<f64>() {
            if secs.is_finite() {
                return Some((secs * 1000.0).round() as i64);
            }
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).timestamp_millis());
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ndt.and_utc().timestamp_millis());
    }
    None
}

/// Days since the Unix epoch for a `YYYY-MM-DD` date.
pub(crate) fn parse_date32(value: &str) -> Option<i32> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()?;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    i32::try_from((date - epoch).num_days()).ok()
}
