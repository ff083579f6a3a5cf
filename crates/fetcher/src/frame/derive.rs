//! Columns computed from other frame columns.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Decimal128Array, Float64Array, Int64Array};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;

use super::schema::{ColumnSpec, DECIMAL_PRECISION};
use crate::error::FetchError;

fn typed_column<'a, T: Array + 'static>(
    frame: &'a RecordBatch,
    name: &str,
) -> Result<&'a T, FetchError> {
    frame
        .column_by_name(name)
        .ok_or_else(|| FetchError::MissingColumn(name.to_string()))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| FetchError::MissingColumn(name.to_string()))
}

/// Append `extra` columns to `frame`.
pub fn with_columns(
    frame: RecordBatch,
    extra: Vec<(ColumnSpec, ArrayRef)>,
) -> Result<RecordBatch, FetchError> {
    let mut fields: Vec<Field> = frame.schema().fields().iter().map(|f| Field::clone(f)).collect();
    let mut arrays: Vec<ArrayRef> = frame.columns().to_vec();
    for (spec, array) in extra {
        fields.push(spec.field());
        arrays.push(array);
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Reinterpret the unscaled values of a decimal column under a new scale,
/// e.g. raw MIST at scale 0 → SUI at scale 9. The stored integers do not
/// change, so this is exact.
pub fn rescale_decimal(
    frame: &RecordBatch,
    source: &str,
    scale: i8,
) -> Result<ArrayRef, FetchError> {
    let raw = typed_column::<Decimal128Array>(frame, source)?;
    let rescaled = raw.clone().with_precision_and_scale(DECIMAL_PRECISION, scale)?;
    Ok(Arc::new(rescaled))
}

/// `numerator / denominator * 100`, NULL where either side is NULL or the
/// denominator is zero.
pub fn percentage(
    frame: &RecordBatch,
    numerator: &str,
    denominator: &str,
) -> Result<ArrayRef, FetchError> {
    let num = typed_column::<Int64Array>(frame, numerator)?;
    let den = typed_column::<Int64Array>(frame, denominator)?;
    let values: Float64Array = num
        .iter()
        .zip(den.iter())
        .map(|(n, d)| match (n, d) {
            (Some(n), Some(d)) if d != 0 => Some(n as f64 / d as f64 * 100.0),
            _ => None,
        })
        .collect();
    Ok(Arc::new(values))
}
