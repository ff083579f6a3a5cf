//! Named parameters and their REST encoding.

use serde_json::json;
use suiscan_bigquery::*;

#[test]
fn test_rest_encoding_of_each_type() {
    let query = WarehouseQuery::new("SELECT 1")
        .bind("limit", 10u32)
        .bind("coin_type", "0x2::sui::SUI")
        .bind("addresses", vec!["0xa".to_string(), "0xb".to_string()]);

    assert_eq!(
        query.to_rest_parameters(),
        vec![
            json!({
                "name": "limit",
                "parameterType": { "type": "INT64" },
                "parameterValue": { "value": "10" },
            }),
            json!({
                "name": "coin_type",
                "parameterType": { "type": "STRING" },
                "parameterValue": { "value": "0x2::sui::SUI" },
            }),
            json!({
                "name": "addresses",
                "parameterType": { "type": "ARRAY", "arrayType": { "type": "STRING" } },
                "parameterValue": { "arrayValues": [{ "value": "0xa" }, { "value": "0xb" }] },
            }),
        ]
    );
}

#[test]
fn test_untrusted_values_stay_out_of_sql() {
    let hostile = "0x1' OR '1'='1";
    let query = WarehouseQuery::new("SELECT * FROM t WHERE owner = @owner").bind("owner", hostile);

    assert!(!query.sql.contains(hostile));
    assert_eq!(query.to_rest_parameters()[0]["parameterValue"]["value"], hostile);
}

#[test]
fn test_rebinding_replaces_value() {
    let query = WarehouseQuery::new("SELECT @n").bind("n", 1i64).bind("n", 2i64);
    assert_eq!(query.params.len(), 1);
    assert_eq!(query.param("n").and_then(ParameterValue::as_i64), Some(2));
}

#[test]
fn test_negative_int64() {
    let param = QueryParameter {
        name: "start_ms".into(),
        value: ParameterValue::Int64(-5),
    };
    assert_eq!(param.to_rest()["parameterValue"]["value"], "-5");
    assert_eq!(param.value.type_name(), "INT64");
}
