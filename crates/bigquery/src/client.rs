//! BigQuery query execution client.
//!
//! Provides the [`WarehouseClient`] seam and [`BigQueryClient`], which runs
//! parameterized SQL through the BigQuery REST API: submit with `jobs.query`,
//! poll `jobs.getQueryResults` with exponential backoff until the job
//! completes, follow page tokens, and return a [`QueryResult`].

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, info, warn};

use suiscan_core::BigQueryConfig;

use crate::params::WarehouseQuery;
use crate::result::{QueryMetadata, QueryResult};
use crate::wire::{api_error_message, parse_count, QueryResponse};

/// Longest single server-side wait requested from `jobs.query`.
const MAX_SERVER_WAIT_MS: u64 = 10_000;

/// OAuth scope requested when minting tokens from a service-account key.
const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the warehouse.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    /// Project or credentials are missing.
    #[error("BigQuery is not configured: {0}")]
    NotConfigured(String),

    /// Transport-level failure (DNS, TLS, connection reset, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A bearer token could not be minted from the service-account key.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The API answered with a non-success status.
    #[error("BigQuery API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The job ran and reported an error.
    #[error("Query {job_id} failed: {reason}")]
    QueryFailed { job_id: String, reason: String },

    /// The job did not complete within the configured timeout. `job_id` is
    /// `(not assigned)` when the submit request itself never answered.
    #[error("Query {job_id} timed out after {seconds}s")]
    QueryTimeout { job_id: String, seconds: u32 },

    /// Failed to decode a response body.
    #[error("Parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Anything that can run a parameterized query and hand back rows.
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    async fn execute(&self, query: &WarehouseQuery) -> Result<QueryResult, WarehouseError>;
}

#[async_trait]
impl<T: WarehouseClient + ?Sized> WarehouseClient for Arc<T> {
    async fn execute(&self, query: &WarehouseQuery) -> Result<QueryResult, WarehouseError> {
        (**self).execute(query).await
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// How requests are authorised.
enum Credentials {
    /// Bearer token minted outside this process. Never refreshed.
    Token(String),
    /// Service-account key file; tokens are minted and cached on demand.
    ServiceAccount(CustomServiceAccount),
}

impl Credentials {
    /// An explicit token wins over the credential file.
    fn resolve(config: &BigQueryConfig) -> Result<Self, WarehouseError> {
        if let Some(token) = &config.access_token {
            return Ok(Credentials::Token(token.clone()));
        }
        let path = config.credentials_path.as_deref().ok_or_else(|| {
            WarehouseError::NotConfigured(
                "no access token or service-account key \
                 (set GOOGLE_OAUTH_ACCESS_TOKEN or GOOGLE_APPLICATION_CREDENTIALS)"
                    .into(),
            )
        })?;
        let account = CustomServiceAccount::from_file(path).map_err(|e| {
            WarehouseError::NotConfigured(format!(
                "cannot load service-account key {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Credentials::ServiceAccount(account))
    }

    fn kind(&self) -> &'static str {
        match self {
            Credentials::Token(_) => "access-token",
            Credentials::ServiceAccount(_) => "service-account",
        }
    }

    async fn bearer(&self) -> Result<String, WarehouseError> {
        match self {
            Credentials::Token(token) => Ok(token.clone()),
            Credentials::ServiceAccount(account) => {
                let token = account
                    .token(&[BIGQUERY_SCOPE])
                    .await
                    .map_err(|e| WarehouseError::Auth(e.to_string()))?;
                Ok(token.as_str().to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the BigQuery REST API.
///
/// Every call is bounded by `timeout_seconds`: each HTTP request carries that
/// timeout and the whole submit/poll/page lifecycle runs under the same
/// budget. A job still running when the budget expires is cancelled.
pub struct BigQueryClient {
    config: BigQueryConfig,
    project_id: String,
    credentials: Credentials,
    http: reqwest::Client,
}

impl BigQueryClient {
    /// Create a client from configuration.
    ///
    /// Returns [`WarehouseError::NotConfigured`] when the project is missing
    /// or when neither an access token nor a loadable service-account key is
    /// available.
    pub fn new(config: BigQueryConfig) -> Result<Self, WarehouseError> {
        let project_id = config.project_id.clone().ok_or_else(|| {
            WarehouseError::NotConfigured(
                "no project id (set BIGQUERY_PROJECT_ID or GOOGLE_APPLICATION_CREDENTIALS)".into(),
            )
        })?;
        let credentials = Credentials::resolve(&config)?;
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .build()?;

        info!(
            project = %project_id,
            location = %config.location,
            api_url = %config.api_url,
            auth = credentials.kind(),
            "BigQueryClient initialised"
        );

        Ok(Self {
            config,
            project_id,
            credentials,
            http,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    // -----------------------------------------------------------------------
    // Public API
    // -----------------------------------------------------------------------

    /// Execute a parameterized query and return the full result.
    ///
    /// 1. Submit with `jobs.query`
    /// 2. Poll `jobs.getQueryResults` until the job completes
    /// 3. Read the remaining pages
    ///
    /// Fails with [`WarehouseError::QueryTimeout`] once `timeout_seconds`
    /// have elapsed, whichever step is in flight.
    pub async fn execute_query(
        &self,
        query: &WarehouseQuery,
    ) -> Result<QueryResult, WarehouseError> {
        let budget = Duration::from_secs(u64::from(self.config.timeout_seconds));
        let mut job_id = None;

        let outcome = tokio::time::timeout(budget, self.run_job(query, &mut job_id)).await;
        match outcome {
            Ok(Err(WarehouseError::Http(e))) if e.is_timeout() => Err(self.timed_out(job_id).await),
            Ok(result) => result,
            Err(_) => Err(self.timed_out(job_id).await),
        }
    }

    /// Request cancellation of a running job.
    pub async fn cancel_job(&self, job_id: &str) -> Result<(), WarehouseError> {
        info!(job_id = %job_id, "Cancelling job");
        let url = format!(
            "{}/projects/{}/jobs/{}/cancel",
            self.config.api_url, self.project_id, job_id
        );
        let _: serde_json::Value = self
            .send_json(
                self.http
                    .post(&url)
                    .query(&[("location", self.config.location.as_str())]),
            )
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Submit, poll and page through one job. `job_id` is filled in as soon
    /// as the service assigns one.
    async fn run_job(
        &self,
        query: &WarehouseQuery,
        job_id: &mut Option<String>,
    ) -> Result<QueryResult, WarehouseError> {
        let start = Instant::now();
        info!(sql = %query.sql, params = query.params.len(), "Starting BigQuery job");

        let url = format!("{}/projects/{}/queries", self.config.api_url, self.project_id);
        let body = self.query_request_body(query);
        let first: QueryResponse = self.send_json(self.http.post(&url).json(&body)).await?;

        let job = first
            .job_reference
            .clone()
            .ok_or_else(|| WarehouseError::ParseError("No jobReference in response".into()))?;
        *job_id = Some(job.job_id.clone());
        Self::check_job_errors(&job.job_id, &first)?;

        info!(job_id = %job.job_id, complete = first.job_complete, "Query job submitted");

        let mut page = if first.job_complete {
            first
        } else {
            self.poll_until_complete(&job.job_id, start).await?
        };

        let columns = page.columns();
        let mut rows = page.take_rows();
        let total_rows = parse_count(page.total_rows.as_deref());
        let bytes_processed = parse_count(page.total_bytes_processed.as_deref());
        let bytes_billed = parse_count(page.total_bytes_billed.as_deref());
        let cache_hit = page.cache_hit;

        while let Some(token) = page.page_token.take() {
            debug!(job_id = %job.job_id, fetched = rows.len(), "Fetching next result page");
            page = self.get_query_results(&job.job_id, Some(&token), 0).await?;
            Self::check_job_errors(&job.job_id, &page)?;
            rows.extend(page.take_rows());
        }

        let metadata = QueryMetadata {
            job_id: job.job_id,
            location: job.location.or_else(|| Some(self.config.location.clone())),
            total_rows,
            bytes_processed,
            bytes_billed,
            cache_hit,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        debug!(
            columns = columns.len(),
            rows = rows.len(),
            job_id = %metadata.job_id,
            bytes_processed = metadata.bytes_processed,
            "Parsed BigQuery results"
        );

        Ok(QueryResult {
            columns,
            rows,
            metadata,
        })
    }

    /// Cancel the job (best effort) and build the timeout error.
    async fn timed_out(&self, job_id: Option<String>) -> WarehouseError {
        warn!(
            job_id = job_id.as_deref().unwrap_or("(none)"),
            timeout_seconds = self.config.timeout_seconds,
            "Query timed out"
        );
        if let Some(id) = &job_id {
            if let Err(e) = self.cancel_job(id).await {
                warn!(job_id = %id, error = %e, "Cancel request failed");
            }
        }
        WarehouseError::QueryTimeout {
            job_id: job_id.unwrap_or_else(|| "(not assigned)".to_string()),
            seconds: self.config.timeout_seconds,
        }
    }

    fn query_request_body(&self, query: &WarehouseQuery) -> serde_json::Value {
        let timeout_ms = (u64::from(self.config.timeout_seconds) * 1000).min(MAX_SERVER_WAIT_MS);
        let mut body = json!({
            "query": query.sql,
            "useLegacySql": false,
            "parameterMode": "NAMED",
            "queryParameters": query.to_rest_parameters(),
            "timeoutMs": timeout_ms,
            "location": self.config.location,
            "requestId": uuid::Uuid::new_v4().to_string(),
        });
        if self.config.max_bytes_billed > 0 {
            body["maximumBytesBilled"] = json!(self.config.max_bytes_billed.to_string());
        }
        body
    }

    async fn get_query_results(
        &self,
        job_id: &str,
        page_token: Option<&str>,
        timeout_ms: u64,
    ) -> Result<QueryResponse, WarehouseError> {
        let url = format!(
            "{}/projects/{}/queries/{}",
            self.config.api_url, self.project_id, job_id
        );
        let mut params: Vec<(&str, String)> = vec![
            ("location", self.config.location.clone()),
            ("timeoutMs", timeout_ms.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.send_json(self.http.get(&url).query(&params)).await
    }

    /// Poll until the job reports `jobComplete`. The caller bounds the wait.
    async fn poll_until_complete(
        &self,
        job_id: &str,
        start: Instant,
    ) -> Result<QueryResponse, WarehouseError> {
        let initial_delay_ms: u64 = 200;
        let max_delay_ms: u64 = 2000;
        let backoff_factor: f64 = 1.5;

        let mut delay_ms = initial_delay_ms;

        loop {
            let jitter_ms = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos()
                % 100;
            tokio::time::sleep(Duration::from_millis(delay_ms + u64::from(jitter_ms))).await;

            let resp = self.get_query_results(job_id, None, 0).await?;
            Self::check_job_errors(job_id, &resp)?;

            debug!(
                job_id = %job_id,
                complete = resp.job_complete,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Polling job status"
            );

            if resp.job_complete {
                return Ok(resp);
            }

            delay_ms = ((delay_ms as f64 * backoff_factor) as u64).min(max_delay_ms);
        }
    }

    fn check_job_errors(job_id: &str, resp: &QueryResponse) -> Result<(), WarehouseError> {
        match resp.error_reason() {
            Some(reason) => {
                error!(job_id = %job_id, reason = %reason, "Query failed");
                Err(WarehouseError::QueryFailed {
                    job_id: job_id.to_string(),
                    reason,
                })
            }
            None => Ok(()),
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, WarehouseError> {
        let token = self.credentials.bearer().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(&body);
            error!(status = status.as_u16(), message = %message, "BigQuery API error");
            return Err(WarehouseError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| WarehouseError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl WarehouseClient for BigQueryClient {
    async fn execute(&self, query: &WarehouseQuery) -> Result<QueryResult, WarehouseError> {
        self.execute_query(query).await
    }
}

// ---------------------------------------------------------------------------
// Tests: request building and errors only, no network calls
// ---------------------------------------------------------------------------
