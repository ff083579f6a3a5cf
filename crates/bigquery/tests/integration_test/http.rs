//! `BigQueryClient` against a local stand-in for the REST API.
//!
//! Each test starts an axum server on an ephemeral port that answers
//! `jobs.query`, `jobs.getQueryResults` and `jobs.cancel` from a script.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use suiscan_bigquery::*;
use suiscan_core::BigQueryConfig;

const JOB_ID: &str = "job_42";

/// Scripted behaviour of the fake API.
struct Script {
    submit_status: StatusCode,
    submit_body: Value,
    /// `getQueryResults` calls answered with `jobComplete: false` first.
    incomplete_polls: usize,
    complete_page: Value,
    second_page: Value,
}

#[derive(Default)]
struct Seen {
    polls: AtomicUsize,
    cancelled: AtomicBool,
    submitted: Mutex<Option<Value>>,
    authorization: Mutex<Option<String>>,
}

struct ServerState {
    script: Script,
    seen: Seen,
}

fn job_reference() -> Value {
    json!({ "projectId": "test-project", "jobId": JOB_ID, "location": "US" })
}

fn schema() -> Value {
    json!({ "fields": [
        { "name": "address", "type": "STRING", "mode": "NULLABLE" },
        { "name": "balance", "type": "BIGNUMERIC", "mode": "NULLABLE" }
    ]})
}

fn running() -> Value {
    json!({
        "kind": "bigquery#queryResponse",
        "jobReference": job_reference(),
        "jobComplete": false
    })
}

async fn submit(
    State(state): State<Arc<ServerState>>,
    Path(_project): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.seen.authorization.lock().unwrap() = auth;
    *state.seen.submitted.lock().unwrap() = Some(body);
    (state.script.submit_status, Json(state.script.submit_body.clone()))
}

async fn results(
    State(state): State<Arc<ServerState>>,
    Path((_project, _job)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    if params.get("pageToken").map(String::as_str) == Some("page-2") {
        return Json(state.script.second_page.clone());
    }
    let polled = state.seen.polls.fetch_add(1, Ordering::SeqCst) + 1;
    if polled <= state.script.incomplete_polls {
        Json(running())
    } else {
        Json(state.script.complete_page.clone())
    }
}

async fn cancel(
    State(state): State<Arc<ServerState>>,
    Path((_project, _job)): Path<(String, String)>,
) -> Json<Value> {
    state.seen.cancelled.store(true, Ordering::SeqCst);
    Json(json!({ "kind": "bigquery#jobCancelResponse" }))
}

async fn serve(script: Script) -> (SocketAddr, Arc<ServerState>) {
    let state = Arc::new(ServerState {
        script,
        seen: Seen::default(),
    });
    let app = Router::new()
        .route("/projects/{project}/queries", post(submit))
        .route("/projects/{project}/queries/{job}", get(results))
        .route("/projects/{project}/jobs/{job}/cancel", post(cancel))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    (addr, state)
}

fn client_for(addr: SocketAddr, timeout_seconds: u32) -> BigQueryClient {
    BigQueryClient::new(BigQueryConfig {
        project_id: Some("test-project".into()),
        api_url: format!("http://{}", addr),
        timeout_seconds,
        access_token: Some("test-token".into()),
        ..BigQueryConfig::default()
    })
    .unwrap()
}

fn balances_query() -> WarehouseQuery {
    WarehouseQuery::new("SELECT address, balance FROM t WHERE coin_type = @coin LIMIT @limit")
        .bind("coin", "0x2::sui::SUI")
        .bind("limit", 2u32)
}

#[tokio::test]
async fn test_polls_until_complete_then_follows_page_token() {
    let (addr, state) = serve(Script {
        submit_status: StatusCode::OK,
        submit_body: running(),
        incomplete_polls: 1,
        complete_page: json!({
            "jobReference": job_reference(),
            "jobComplete": true,
            "schema": schema(),
            "totalRows": "2",
            "totalBytesProcessed": "2048",
            "totalBytesBilled": "10485760",
            "rows": [ { "f": [ { "v": "0xa" }, { "v": "5000000000" } ] } ],
            "pageToken": "page-2"
        }),
        second_page: json!({
            "jobReference": job_reference(),
            "jobComplete": true,
            "rows": [ { "f": [ { "v": "0xb" }, { "v": null } ] } ]
        }),
    })
    .await;

    let result = client_for(addr, 30).execute_query(&balances_query()).await.unwrap();

    assert_eq!(result.columns.len(), 2);
    assert_eq!(result.columns[1].data_type, "BIGNUMERIC");
    assert_eq!(result.row_count(), 2);
    assert_eq!(result.rows[0], vec![Some("0xa".to_string()), Some("5000000000".to_string())]);
    assert_eq!(result.rows[1], vec![Some("0xb".to_string()), None]);
    assert_eq!(result.metadata.job_id, JOB_ID);
    assert_eq!(result.metadata.total_rows, 2);
    assert_eq!(result.metadata.bytes_processed, 2048);
    assert_eq!(result.metadata.bytes_billed, 10_485_760);
    assert_eq!(state.seen.polls.load(Ordering::SeqCst), 2);

    let submitted = state.seen.submitted.lock().unwrap().clone().unwrap();
    assert_eq!(submitted["parameterMode"], "NAMED");
    assert_eq!(submitted["useLegacySql"], false);
    assert_eq!(submitted["queryParameters"][1]["name"], "limit");
    assert_eq!(submitted["queryParameters"][1]["parameterValue"]["value"], "2");
    assert_eq!(
        state.seen.authorization.lock().unwrap().as_deref(),
        Some("Bearer test-token")
    );
}

#[tokio::test]
async fn test_error_status_becomes_api_error() {
    let (addr, state) = serve(Script {
        submit_status: StatusCode::FORBIDDEN,
        submit_body: json!({
            "error": {
                "code": 403,
                "message": "Access Denied: Project test-project",
                "status": "PERMISSION_DENIED"
            }
        }),
        incomplete_polls: 0,
        complete_page: Value::Null,
        second_page: Value::Null,
    })
    .await;

    let err = client_for(addr, 30).execute_query(&balances_query()).await.unwrap_err();
    match err {
        WarehouseError::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Access Denied: Project test-project (PERMISSION_DENIED)");
        }
        other => panic!("expected Api, got {other:?}"),
    }
    assert_eq!(state.seen.polls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_job_errors_become_query_failed() {
    let (addr, _state) = serve(Script {
        submit_status: StatusCode::OK,
        submit_body: json!({
            "jobReference": job_reference(),
            "jobComplete": true,
            "errors": [ { "reason": "invalidQuery", "message": "Unrecognized name: balanse" } ]
        }),
        incomplete_polls: 0,
        complete_page: Value::Null,
        second_page: Value::Null,
    })
    .await;

    let err = client_for(addr, 30).execute_query(&balances_query()).await.unwrap_err();
    match err {
        WarehouseError::QueryFailed { job_id, reason } => {
            assert_eq!(job_id, JOB_ID);
            assert_eq!(reason, "invalidQuery: Unrecognized name: balanse");
        }
        other => panic!("expected QueryFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_job_that_never_completes_is_cancelled() {
    let (addr, state) = serve(Script {
        submit_status: StatusCode::OK,
        submit_body: running(),
        incomplete_polls: usize::MAX,
        complete_page: Value::Null,
        second_page: Value::Null,
    })
    .await;

    let client = client_for(addr, 1);
    let err = tokio::time::timeout(Duration::from_secs(10), client.execute_query(&balances_query()))
        .await
        .expect("client must give up on its own")
        .unwrap_err();

    match err {
        WarehouseError::QueryTimeout { job_id, seconds } => {
            assert_eq!(job_id, JOB_ID);
            assert_eq!(seconds, 1);
        }
        other => panic!("expected QueryTimeout, got {other:?}"),
    }
    assert!(state.seen.polls.load(Ordering::SeqCst) >= 1);
    assert!(state.seen.cancelled.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_server_that_never_answers_times_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = client_for(addr, 1);
    let err = tokio::time::timeout(Duration::from_secs(5), client.execute_query(&balances_query()))
        .await
        .expect("client must give up on its own")
        .unwrap_err();

    match err {
        WarehouseError::QueryTimeout { job_id, seconds } => {
            assert_eq!(job_id, "(not assigned)");
            assert_eq!(seconds, 1);
        }
        other => panic!("expected QueryTimeout, got {other:?}"),
    }
}

/// Needs real credentials: `BIGQUERY_PROJECT_ID` plus either
/// `GOOGLE_OAUTH_ACCESS_TOKEN` or `GOOGLE_APPLICATION_CREDENTIALS`.
#[test]
#[ignore]
fn test_real_bigquery_query() {
    suiscan_core::load_dotenv();
    let config = suiscan_core::Config::from_env();

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let client = BigQueryClient::new(config.bigquery).expect("BigQuery credentials required");
        let query = WarehouseQuery::new("SELECT @n AS n").bind("n", 1i64);
        let result = client.execute_query(&query).await.unwrap();

        assert_eq!(result.row_count(), 1);
        assert_eq!(result.rows[0][0].as_deref(), Some("1"));
        assert!(!result.metadata.job_id.is_empty());
    });
}
