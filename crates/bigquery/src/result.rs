use serde::{Deserialize, Serialize};

/// Column definition returned by a BigQuery job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn {
    /// Column name as declared in the result schema.
    pub name: String,
    /// BigQuery field type (e.g. "STRING", "INTEGER", "BIGNUMERIC", "BOOLEAN", "DATE").
    pub data_type: String,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Execution metadata for a completed query job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryMetadata {
    /// BigQuery job ID.
    pub job_id: String,
    /// Location the job ran in, if reported.
    pub location: Option<String>,
    /// Total rows in the result as reported by the service.
    pub total_rows: u64,
    /// Bytes processed by the job.
    pub bytes_processed: u64,
    /// Bytes billed for the job (0 when served from cache).
    pub bytes_billed: u64,
    /// Whether the result came from the query cache.
    pub cache_hit: bool,
    /// Wall-clock time from submission to the last page, in milliseconds.
    pub elapsed_ms: u64,
}

/// Row-oriented result set from a query job.
///
/// Rows are stored as `Vec<Option<String>>` where `None` represents SQL NULL.
/// Column ordering in each row matches the `columns` vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column definitions in result-set order.
    pub columns: Vec<ResultColumn>,
    /// Row data. Each inner vector has the same length as `columns`.
    pub rows: Vec<Vec<Option<String>>>,
    /// Job execution metadata.
    pub metadata: QueryMetadata,
}

/// On-demand pricing: $6.25 per TiB billed.
const DOLLARS_PER_BYTE: f64 = 6.25 / (1024.0 * 1024.0 * 1024.0 * 1024.0);

impl QueryResult {
    /// A result with the given columns and no rows.
    pub fn empty(columns: Vec<ResultColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            metadata: QueryMetadata::default(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Finds the zero-based index of a column by name (case-sensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Estimates the query cost in USD from bytes billed.
    pub fn cost_estimate_usd(&self) -> f64 {
        self.metadata.bytes_billed as f64 * DOLLARS_PER_BYTE
    }
}
