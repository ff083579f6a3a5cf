//! BigQuery REST v2 payloads for `jobs.query` and `jobs.getQueryResults`.
//!
//! Both endpoints return the same shape, so one struct covers them. Int64
//! counters arrive as decimal strings.

use serde::Deserialize;
use serde_json::Value;

use crate::result::ResultColumn;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub schema: Option<TableSchema>,
    #[serde(default)]
    pub job_reference: Option<JobReference>,
    #[serde(default)]
    pub total_rows: Option<String>,
    #[serde(default)]
    pub page_token: Option<String>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
    #[serde(default)]
    pub total_bytes_processed: Option<String>,
    #[serde(default)]
    pub total_bytes_billed: Option<String>,
    #[serde(default)]
    pub job_complete: bool,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
    #[serde(default)]
    pub cache_hit: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableSchema {
    #[serde(default)]
    pub fields: Vec<TableFieldSchema>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableFieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobReference {
    pub job_id: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableCell {
    #[serde(default)]
    pub v: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorProto {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Google API error envelope: `{"error": {"code": .., "message": ..}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl QueryResponse {
    pub fn columns(&self) -> Vec<ResultColumn> {
        self.schema
            .as_ref()
            .map(|s| {
                s.fields
                    .iter()
                    .map(|f| {
                        let data_type = match f.mode.as_deref() {
                            Some("REPEATED") => format!("ARRAY<{}>", f.field_type),
                            _ => f.field_type.clone(),
                        };
                        ResultColumn::new(f.name.clone(), data_type)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Flatten `rows[].f[].v` into string cells. Scalars arrive as JSON
    /// strings; nested RECORD/REPEATED values are kept as their JSON text.
    pub fn take_rows(&mut self) -> Vec<Vec<Option<String>>> {
        std::mem::take(&mut self.rows)
            .into_iter()
            .map(|row| row.f.into_iter().map(|cell| cell_to_string(cell.v)).collect())
            .collect()
    }

    /// First job-level error rendered as `reason: message`.
    pub fn error_reason(&self) -> Option<String> {
        self.errors.first().map(|e| {
            match (e.reason.as_deref(), e.message.as_deref()) {
                (Some(r), Some(m)) => format!("{}: {}", r, m),
                (Some(r), None) => r.to_string(),
                (None, Some(m)) => m.to_string(),
                (None, None) => "unknown".to_string(),
            }
        })
    }
}

fn cell_to_string(v: Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Parse a decimal-string counter, treating absent or malformed as 0.
pub(crate) fn parse_count(v: Option<&str>) -> u64 {
    v.and_then(|s| s.parse().ok()).unwrap_or(0)
}

/// Extract a readable message from an error response body.
pub(crate) fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => match env.error.status {
            Some(status) => format!("{} ({})", env.error.message, status),
            None => env.error.message,
        },
        Err(_) if body.is_empty() => "empty response body".to_string(),
        Err(_) => body.chars().take(512).collect(),
    }
}
