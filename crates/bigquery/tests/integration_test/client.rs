//! Client construction and the `WarehouseClient` seam.

use std::sync::Arc;

use suiscan_bigquery::*;
use suiscan_core::BigQueryConfig;

fn configured() -> BigQueryConfig {
    BigQueryConfig {
        project_id: Some("analytics-sandbox".into()),
        access_token: Some("ya29.token".into()),
        ..BigQueryConfig::default()
    }
}

#[test]
fn test_client_requires_project() {
    let config = BigQueryConfig {
        project_id: None,
        ..configured()
    };
    let err = BigQueryClient::new(config).err().unwrap();
    assert!(matches!(err, WarehouseError::NotConfigured(_)));
    assert!(err.to_string().contains("project"));
}

#[test]
fn test_client_requires_token() {
    let config = BigQueryConfig {
        access_token: None,
        ..configured()
    };
    let err = BigQueryClient::new(config).err().unwrap();
    assert!(matches!(err, WarehouseError::NotConfigured(_)));
}

#[test]
fn test_client_builds() {
    let client = BigQueryClient::new(configured()).unwrap();
    assert_eq!(client.project_id(), "analytics-sandbox");
}

#[tokio::test]
async fn test_shared_client_through_arc() {
    let mock = Arc::new(MockWarehouseClient::new(QueryResult::empty(vec![ResultColumn::new(
        "n", "INT64",
    )])));
    let shared: Arc<MockWarehouseClient> = Arc::clone(&mock);

    let query = WarehouseQuery::new("SELECT @n AS n").bind("n", 7i64);
    let result = shared.execute(&query).await.unwrap();

    assert_eq!(result.columns.len(), 1);
    assert_eq!(mock.last_query().unwrap(), query);
}

#[tokio::test]
async fn test_dyn_client() {
    let client: Box<dyn WarehouseClient> =
        Box::new(FailingWarehouseClient::api(401, "Invalid Credentials"));
    let err = client.execute(&WarehouseQuery::new("SELECT 1")).await.unwrap_err();
    assert_eq!(err.to_string(), "BigQuery API error 401: Invalid Credentials");
}
