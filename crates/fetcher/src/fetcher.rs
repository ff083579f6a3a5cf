//! [`DataFetcher`]: named analytical questions over the Sui dataset.
//!
//! Each accessor builds one parameterized query, runs it through the
//! injected [`WarehouseClient`], and normalizes the rows into a [`Frame`].
//! Nothing is cached between calls.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use suiscan_bigquery::{BigQueryClient, QueryResult, WarehouseClient, WarehouseQuery};
use suiscan_core::{Config, FetcherSettings, DEFAULT_DATASET, SUI_COIN_TYPE, SUI_DECIMALS};

use crate::error::FetchError;
use crate::frame::{self, schema, Frame};
use crate::queries;
use crate::request::{QueryRequest, TimeWindow};

/// Settings a [`DataFetcher`] needs beyond its client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    /// Fully qualified dataset holding `transactions` and `objects`.
    pub dataset: String,
    /// Coin type whose balances are reported.
    pub coin_type: String,
    /// Upper bound on a single remote call; `None` waits for the client.
    pub deadline: Option<Duration>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            coin_type: SUI_COIN_TYPE.to_string(),
            deadline: None,
        }
    }
}

impl From<&FetcherSettings> for FetcherConfig {
    fn from(settings: &FetcherSettings) -> Self {
        Self {
            dataset: settings.dataset.clone(),
            coin_type: settings.coin_type.clone(),
            deadline: settings.deadline_seconds.map(Duration::from_secs),
        }
    }
}

/// Fetches Sui transactions, balances and daily summaries as Arrow frames.
pub struct DataFetcher<C> {
    client: C,
    config: FetcherConfig,
    clock: fn() -> DateTime<Utc>,
}

impl DataFetcher<BigQueryClient> {
    /// Build a fetcher backed by BigQuery from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        config.log_summary();
        let client = BigQueryClient::new(config.bigquery.clone())?;
        Self::new(client, FetcherConfig::from(&config.fetcher))
    }
}

impl<C: WarehouseClient> DataFetcher<C> {
    /// Wrap an already-authenticated client.
    pub fn new(client: C, config: FetcherConfig) -> Result<Self, FetchError> {
        queries::validate_dataset(&config.dataset)?;
        info!(dataset = %config.dataset, coin_type = %config.coin_type, "DataFetcher ready");
        Ok(Self {
            client,
            config,
            clock: Utc::now,
        })
    }

    /// Replace the time source used to compute query windows.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn dataset(&self) -> &str {
        &self.config.dataset
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Transactions from the last `days` days, newest first, at most `limit`.
    ///
    /// Columns: `transaction_digest`, `timestamp_ms`, `sender`, `gas_used`,
    /// `gas_price`, `success`, `effects_status`,
    /// `checkpoint_sequence_number`, `timestamp`.
    pub async fn get_recent_transactions(
        &self,
        days: u32,
        limit: u32,
    ) -> Result<Frame, FetchError> {
        let request = QueryRequest::new(days, limit)?;
        let window = TimeWindow::trailing(request.days(), (self.clock)());
        info!(days, limit, "Fetching recent transactions");

        let query = queries::recent_transactions(&self.config.dataset, &window, request.limit());
        let result = self.run(&query).await?;

        let frame = frame::normalize(&result, schema::TRANSACTION_COLUMNS)?;

        info!(rows = frame.num_rows(), "Fetched transactions");
        Ok(frame)
    }

    /// Balances of the configured coin per wallet.
    ///
    /// With `addresses`, exactly those wallets (one row each when present in
    /// the dataset) and `limit` is ignored. Without, the `limit` largest
    /// wallets. Ordered by balance descending, then address ascending.
    ///
    /// Columns: `address`, `coin_type`, `balance` (raw MIST),
    /// `object_count`, `last_activity_ms`, `last_activity`, `balance_sui`.
    pub async fn get_wallet_balances(
        &self,
        limit: u32,
        addresses: Option<&[String]>,
    ) -> Result<Frame, FetchError> {
        let request = QueryRequest::new(0, limit)?
            .with_addresses(addresses.unwrap_or_default().iter().cloned());
        match request.addresses() {
            Some(set) => info!(addresses = set.len(), "Fetching balances for specific addresses"),
            None => info!(limit, "Fetching top wallet balances"),
        }

        let query =
            queries::wallet_balances(&self.config.dataset, &self.config.coin_type, &request);
        let result = self.run(&query).await?;

        let base = frame::normalize(&result, schema::BALANCE_COLUMNS)?;
        let balance_sui = frame::rescale_decimal(&base, "balance", SUI_DECIMALS)?;
        let frame = frame::with_columns(base, vec![(schema::BALANCE_SUI, balance_sui)])?;

        info!(rows = frame.num_rows(), "Fetched wallet balances");
        Ok(frame)
    }

    /// One row per UTC day in the last `days` calendar days that saw at
    /// least one transaction, newest first. Quiet days are absent, not zero.
    ///
    /// Columns: `date`, `transaction_count`, `unique_senders`,
    /// `total_gas_used`, `avg_gas_used`, `successful_txns`, `failed_txns`,
    /// `success_rate_pct`.
    pub async fn get_transaction_summary(&self, days: u32) -> Result<Frame, FetchError> {
        let window = TimeWindow::calendar_days(days, (self.clock)());
        info!(days, "Fetching transaction summary");

        let query = queries::transaction_summary(&self.config.dataset, &window);
        let result = self.run(&query).await?;

        let base = frame::normalize(&result, schema::SUMMARY_COLUMNS)?;
        let success_rate = frame::percentage(&base, "successful_txns", "transaction_count")?;
        let frame = frame::with_columns(base, vec![(schema::SUMMARY_SUCCESS_RATE, success_rate)])?;

        info!(rows = frame.num_rows(), "Generated transaction summary");
        Ok(frame)
    }

    async fn run(&self, query: &WarehouseQuery) -> Result<QueryResult, FetchError> {
        let outcome = match self.config.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.client.execute(query))
                .await
                .map_err(|_| {
                    warn!(deadline_ms = deadline.as_millis() as u64, "Fetch exceeded deadline");
                    FetchError::Timeout(deadline)
                })?,
            None => self.client.execute(query).await,
        };

        let result = outcome.map_err(|e| {
            error!(error = %e, "Warehouse query failed");
            FetchError::from(e)
        })?;

        info!(
            job_id = %result.metadata.job_id,
            rows = result.row_count(),
            bytes_billed = result.metadata.bytes_billed,
            cache_hit = result.metadata.cache_hit,
            cost_usd = result.cost_estimate_usd(),
            "Warehouse query complete"
        );
        Ok(result)
    }
}
