//! In-memory warehouse clients for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{WarehouseClient, WarehouseError};
use crate::params::WarehouseQuery;
use crate::result::QueryResult;

/// Returns a canned result and records every query it receives.
pub struct MockWarehouseClient {
    result: QueryResult,
    queries: Mutex<Vec<WarehouseQuery>>,
}

impl MockWarehouseClient {
    pub fn new(result: QueryResult) -> Self {
        Self {
            result,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// All queries executed so far, oldest first.
    pub fn queries(&self) -> Vec<WarehouseQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    /// The most recent query, if any.
    pub fn last_query(&self) -> Option<WarehouseQuery> {
        self.queries.lock().ok().and_then(|q| q.last().cloned())
    }
}

#[async_trait]
impl WarehouseClient for MockWarehouseClient {
    async fn execute(&self, query: &WarehouseQuery) -> Result<QueryResult, WarehouseError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }
        Ok(self.result.clone())
    }
}

enum Failure {
    Api { status: u16, message: String },
    Job { reason: String },
    Timeout { seconds: u32 },
}

/// Fails every query with the configured error.
pub struct FailingWarehouseClient {
    failure: Failure,
}

impl FailingWarehouseClient {
    /// Fail with an HTTP-level API error (auth, quota, ...).
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self {
            failure: Failure::Api {
                status,
                message: message.into(),
            },
        }
    }

    /// Fail with a job-level error (syntax, missing column, ...).
    pub fn job(reason: impl Into<String>) -> Self {
        Self {
            failure: Failure::Job {
                reason: reason.into(),
            },
        }
    }

    /// Fail as if the job never completed.
    pub fn timeout(seconds: u32) -> Self {
        Self {
            failure: Failure::Timeout { seconds },
        }
    }
}

#[async_trait]
impl WarehouseClient for FailingWarehouseClient {
    async fn execute(&self, _query: &WarehouseQuery) -> Result<QueryResult, WarehouseError> {
        Err(match &self.failure {
            Failure::Api { status, message } => WarehouseError::Api {
                status: *status,
                message: message.clone(),
            },
            Failure::Job { reason } => WarehouseError::QueryFailed {
                job_id: "mock-job".into(),
                reason: reason.clone(),
            },
            Failure::Timeout { seconds } => WarehouseError::QueryTimeout {
                job_id: "mock-job".into(),
                seconds: *seconds,
            },
        })
    }
}
