//! QueryResult lookups, cost estimate and serialization.

use suiscan_bigquery::*;

fn sample() -> QueryResult {
    let mut result = QueryResult::empty(vec![
        ResultColumn::new("address", "STRING"),
        ResultColumn::new("balance", "BIGNUMERIC"),
    ]);
    result.rows = vec![
        vec![Some("0xa".to_string()), Some("123456789012345678".to_string())],
        vec![Some("0xb".to_string()), None],
    ];
    result.metadata = QueryMetadata {
        job_id: "job_abc".into(),
        location: Some("US".into()),
        total_rows: 2,
        bytes_processed: 2048,
        bytes_billed: 1024 * 1024 * 1024 * 1024,
        cache_hit: false,
        elapsed_ms: 812,
    };
    result
}

#[test]
fn test_column_lookup() {
    let result = sample();
    assert_eq!(result.row_count(), 2);
    assert_eq!(result.column_index("balance"), Some(1));
    assert_eq!(result.column_index("missing"), None);
    assert_eq!(result.rows[1][1], None);
}

#[test]
fn test_cost_estimate_per_tib() {
    let result = sample();
    assert!((result.cost_estimate_usd() - 6.25).abs() < 1e-9);

    let cached = QueryResult::empty(Vec::new());
    assert_eq!(cached.cost_estimate_usd(), 0.0);
}

#[test]
fn test_result_json_roundtrip() {
    let json = serde_json::to_string(&sample()).unwrap();
    let back: QueryResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.rows, sample().rows);
    assert_eq!(back.metadata.job_id, "job_abc");
}
