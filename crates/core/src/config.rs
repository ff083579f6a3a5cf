use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sui::{DEFAULT_DATASET, SUI_COIN_TYPE};

/// Default BigQuery REST endpoint.
pub const DEFAULT_BIGQUERY_API_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub bigquery: BigQueryConfig,
    pub fetcher: FetcherSettings,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SUISCAN_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SUISCAN_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            bigquery: BigQueryConfig::from_env_profiled(p),
            fetcher: FetcherSettings::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() {
            "default"
        } else {
            &self.profile
        }
    }

    /// Log a summary for startup; the token is reported only as set or unset.
    pub fn log_summary(&self) {
        let token = if self.bigquery.access_token.is_some() {
            "set"
        } else {
            "(none)"
        };
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  bigquery:    project={}, location={}, timeout={}s, configured={}",
            self.bigquery.project_id.as_deref().unwrap_or("(none)"),
            self.bigquery.location,
            self.bigquery.timeout_seconds,
            self.bigquery.is_configured(),
        );
        tracing::info!(
            "  credentials: file={}, token={}",
            self.bigquery
                .credentials_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string()),
            token,
        );
        tracing::info!(
            "  fetcher:     dataset={}, coin_type={}",
            self.fetcher.dataset,
            self.fetcher.coin_type,
        );
    }
}

// ── BigQuery ──────────────────────────────────────────────────

/// Connection settings for the BigQuery REST API.
///
/// The access token is an OAuth bearer token minted outside this process
/// (for example with `gcloud auth print-access-token`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BigQueryConfig {
    /// Project that runs (and is billed for) the query jobs.
    pub project_id: Option<String>,
    /// Job location, e.g. "US".
    pub location: String,
    /// Base URL of the REST API, without trailing slash.
    pub api_url: String,
    /// Maximum time to wait for a job to complete.
    pub timeout_seconds: u32,
    /// Upper bound on billed bytes per query (0 = unlimited).
    pub max_bytes_billed: u64,
    /// Path named by `GOOGLE_APPLICATION_CREDENTIALS`, if any.
    pub credentials_path: Option<PathBuf>,
    /// Explicit bearer token; takes precedence over the key file.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl BigQueryConfig {
    fn from_env_profiled(p: &str) -> Self {
        let credentials_path =
            profiled_env_opt(p, "GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from);

        let project_id = profiled_env_opt(p, "BIGQUERY_PROJECT_ID")
            .or_else(|| profiled_env_opt(p, "GOOGLE_CLOUD_PROJECT"))
            .or_else(|| credentials_path.as_deref().and_then(project_id_from_credentials));

        Self {
            project_id,
            location: profiled_env_or(p, "BIGQUERY_LOCATION", "US"),
            api_url: profiled_env_or(p, "BIGQUERY_API_URL", DEFAULT_BIGQUERY_API_URL)
                .trim_end_matches('/')
                .to_string(),
            timeout_seconds: profiled_env_u32(p, "BIGQUERY_TIMEOUT_SECONDS", 300),
            max_bytes_billed: profiled_env_u64(p, "BIGQUERY_MAX_BYTES_BILLED", 0),
            credentials_path,
            access_token: profiled_env_opt(p, "GOOGLE_OAUTH_ACCESS_TOKEN"),
        }
    }

    /// A project plus either a bearer token or a service-account key file.
    pub fn is_configured(&self) -> bool {
        self.project_id.is_some()
            && (self.access_token.is_some() || self.credentials_path.is_some())
    }
}

impl Default for BigQueryConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            location: "US".to_string(),
            api_url: DEFAULT_BIGQUERY_API_URL.to_string(),
            timeout_seconds: 300,
            max_bytes_billed: 0,
            credentials_path: None,
            access_token: None,
        }
    }
}

/// Pull `project_id` (or `quota_project_id`) out of a Google credential file.
///
/// Service-account keys carry `project_id`; user credentials written by
/// `gcloud auth application-default login` carry `quota_project_id`.
pub fn project_id_from_credentials(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| warn!(path = %path.display(), error = %e, "cannot read credential file"))
        .ok()?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| warn!(path = %path.display(), error = %e, "credential file is not JSON"))
        .ok()?;
    ["project_id", "quota_project_id"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ── Fetcher ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherSettings {
    /// Fully qualified dataset holding the Sui tables.
    pub dataset: String,
    /// Coin type whose balances are aggregated.
    pub coin_type: String,
    /// Caller-side deadline for a whole fetch (None = no deadline).
    pub deadline_seconds: Option<u64>,
}

impl FetcherSettings {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            dataset: profiled_env_or(p, "SUI_DATASET", DEFAULT_DATASET),
            coin_type: profiled_env_or(p, "SUI_COIN_TYPE", SUI_COIN_TYPE),
            deadline_seconds: profiled_env_opt(p, "FETCH_DEADLINE_SECONDS")
                .and_then(|v| v.parse().ok())
                .filter(|s| *s > 0),
        }
    }
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            coin_type: SUI_COIN_TYPE.to_string(),
            deadline_seconds: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────
