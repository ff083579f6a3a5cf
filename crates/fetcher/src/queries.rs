//! SQL for each accessor.
//!
//! Table paths cannot be bound parameters in BigQuery, so the dataset id is
//! validated once and spliced in; every other value is a named parameter.

use suiscan_bigquery::WarehouseQuery;

use crate::error::FetchError;
use crate::request::{QueryRequest, TimeWindow};

/// Reject dataset ids that could escape the backtick-quoted table path.
pub fn validate_dataset(dataset: &str) -> Result<(), FetchError> {
    let valid = !dataset.is_empty()
        && dataset
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(FetchError::Configuration(format!("invalid dataset id {:?}", dataset)))
    }
}

/// Transactions inside `window`, newest first. Digest breaks timestamp ties.
pub fn recent_transactions(dataset: &str, window: &TimeWindow, limit: u32) -> WarehouseQuery {
    let sql = format!(
        "SELECT
    transaction_digest,
    timestamp_ms,
    sender,
    gas_used,
    gas_price,
    success,
    effects_status,
    checkpoint_sequence_number,
    TIMESTAMP_MILLIS(timestamp_ms) AS timestamp
FROM `{dataset}.transactions`
WHERE timestamp_ms BETWEEN @start_ms AND @end_ms
ORDER BY timestamp_ms DESC, transaction_digest ASC
LIMIT @limit"
    );
    WarehouseQuery::new(sql)
        .bind("start_ms", window.start_ms)
        .bind("end_ms", window.end_ms)
        .bind("limit", limit)
}

/// Per-owner balance of `coin_type`, largest first, address breaking ties.
///
/// With an address filter only those owners are considered and the filter
/// size caps the row count.
pub fn wallet_balances(dataset: &str, coin_type: &str, request: &QueryRequest) -> WarehouseQuery {
    let owner_filter = if request.addresses().is_some() {
        "\n  AND owner IN UNNEST(@addresses)"
    } else {
        ""
    };
    let sql = format!(
        "SELECT
    owner AS address,
    coin_type,
    CAST(SUM(CAST(balance AS BIGNUMERIC)) AS STRING) AS balance,
    COUNT(*) AS object_count,
    MAX(timestamp_ms) AS last_activity_ms,
    TIMESTAMP_MILLIS(MAX(timestamp_ms)) AS last_activity
FROM `{dataset}.objects`
WHERE coin_type = @coin_type{owner_filter}
GROUP BY owner, coin_type
ORDER BY SUM(CAST(balance AS BIGNUMERIC)) DESC, address ASC
LIMIT @limit"
    );

    let mut query = WarehouseQuery::new(sql)
        .bind("coin_type", coin_type)
        .bind("limit", request.row_cap());
    if let Some(addresses) = request.addresses() {
        query = query.bind("addresses", addresses.iter().cloned().collect::<Vec<_>>());
    }
    query
}

/// Per-day activity inside `window` (half-open), newest day first. Days
/// without transactions produce no row.
pub fn transaction_summary(dataset: &str, window: &TimeWindow) -> WarehouseQuery {
    let sql = format!(
        "SELECT
    DATE(TIMESTAMP_MILLIS(timestamp_ms)) AS date,
    COUNT(*) AS transaction_count,
    COUNT(DISTINCT sender) AS unique_senders,
    SUM(CAST(gas_used AS INT64)) AS total_gas_used,
    AVG(CAST(gas_used AS INT64)) AS avg_gas_used,
    COUNTIF(success) AS successful_txns,
    COUNTIF(NOT success) AS failed_txns
FROM `{dataset}.transactions`
WHERE timestamp_ms >= @start_ms AND timestamp_ms < @end_ms
GROUP BY date
ORDER BY date DESC"
    );
    WarehouseQuery::new(sql)
        .bind("start_ms", window.start_ms)
        .bind("end_ms", window.end_ms)
}
