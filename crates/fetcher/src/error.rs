use std::time::Duration;

use suiscan_bigquery::WarehouseError;

/// Errors surfaced by [`DataFetcher`](crate::DataFetcher) operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Credentials or settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Arguments violate an accessor precondition (e.g. `limit == 0`).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The remote query failed; the cause is kept as the source.
    #[error("Query failed: {0}")]
    Query(#[source] WarehouseError),

    /// A returned value cannot be coerced to its declared column type.
    #[error("Cannot convert {value:?} in column `{column}` (row {row}) to {expected}")]
    Conversion {
        column: String,
        row: usize,
        value: String,
        expected: &'static str,
    },

    /// The result set lacks a column the frame declares.
    #[error("Result is missing column `{0}`")]
    MissingColumn(String),

    /// The caller-supplied deadline expired before the query returned.
    #[error("Fetch exceeded deadline of {0:?}")]
    Timeout(Duration),

    /// Arrow rejected the assembled arrays.
    #[error("Frame assembly failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    InvalidRequest,
    Query,
    Conversion,
    Timeout,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Configuration(_) => ErrorKind::Configuration,
            FetchError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            FetchError::Query(_) => ErrorKind::Query,
            FetchError::Conversion { .. } | FetchError::MissingColumn(_) | FetchError::Arrow(_) => {
                ErrorKind::Conversion
            }
            FetchError::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

impl From<WarehouseError> for FetchError {
    fn from(err: WarehouseError) -> Self {
        match err {
            WarehouseError::NotConfigured(msg) => FetchError::Configuration(msg),
            other => FetchError::Query(other),
        }
    }
}
