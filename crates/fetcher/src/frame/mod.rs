//! Normalize row-oriented warehouse results into Arrow frames.
//!
//! Each accessor declares the columns it expects ([`ColumnSpec`]); the
//! string cells are coerced into those types and any derived columns are
//! appended afterwards.

pub(crate) mod builders;
mod derive;
pub mod schema;

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use suiscan_bigquery::QueryResult;

use crate::error::FetchError;

pub use derive::{percentage, rescale_decimal, with_columns};
pub use schema::{build_schema, ColumnKind, ColumnSpec};

/// A columnar result owned by the caller.
pub type Frame = RecordBatch;

/// Coerce `result` into a frame with exactly the declared columns, in the
/// declared order. Extra result columns are ignored.
///
/// Fails with [`FetchError::MissingColumn`] when a declared column is absent
/// and with [`FetchError::Conversion`] on the first cell that cannot be
/// coerced. No row is ever dropped.
pub fn normalize(result: &QueryResult, columns: &[ColumnSpec]) -> Result<Frame, FetchError> {
    let schema = Arc::new(build_schema(columns));
    let mut arrays = Vec::with_capacity(columns.len());

    for spec in columns {
        let col_idx = result
            .column_index(spec.name)
            .ok_or_else(|| FetchError::MissingColumn(spec.name.to_string()))?;
        arrays.push(builders::build_column(spec, col_idx, &result.rows)?);
    }

    Ok(RecordBatch::try_new(schema, arrays)?)
}
