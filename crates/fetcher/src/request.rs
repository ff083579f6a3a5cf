//! Validated request parameters and time windows.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use crate::error::FetchError;

/// Parameters of a single fetch. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    days: u32,
    limit: u32,
    addresses: Option<BTreeSet<String>>,
}

impl QueryRequest {
    /// Build a request; `limit` must be positive.
    pub fn new(days: u32, limit: u32) -> Result<Self, FetchError> {
        if limit == 0 {
            return Err(FetchError::InvalidRequest("limit must be greater than 0".into()));
        }
        Ok(Self {
            days,
            limit,
            addresses: None,
        })
    }

    /// Restrict to the given addresses. Duplicates collapse; an empty
    /// collection means no filter.
    pub fn with_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = addresses.into_iter().map(Into::into).collect();
        self.addresses = if set.is_empty() { None } else { Some(set) };
        self
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn addresses(&self) -> Option<&BTreeSet<String>> {
        self.addresses.as_ref()
    }

    /// Maximum rows the query may return. With an address filter the filter
    /// size is the cap and `limit` is ignored.
    pub fn row_cap(&self) -> u32 {
        match &self.addresses {
            Some(set) => u32::try_from(set.len()).unwrap_or(u32::MAX),
            None => self.limit,
        }
    }
}

/// Epoch-millisecond bounds of a query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    /// `[now - days, now]`.
    pub fn trailing(days: u32, now: DateTime<Utc>) -> Self {
        let start_ms = now
            .checked_sub_signed(Duration::days(i64::from(days)))
            .map(|start| start.timestamp_millis())
            .unwrap_or(i64::MIN);
        Self {
            start_ms,
            end_ms: now.timestamp_millis(),
        }
    }

    /// The last `days` UTC calendar days including today, ending at `now`.
    /// Zero days gives an empty window starting and ending at `now`.
    pub fn calendar_days(days: u32, now: DateTime<Utc>) -> Self {
        let end_ms = now.timestamp_millis();
        if days == 0 {
            return Self {
                start_ms: end_ms,
                end_ms,
            };
        }
        let today = now.date_naive();
        let start_ms = today
            .checked_sub_signed(Duration::days(i64::from(days) - 1))
            .and_then(|first_day| first_day.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or(i64::MIN);
        Self { start_ms, end_ms }
    }

    pub fn contains(&self, ms: i64) -> bool {
        ms >= self.start_ms && ms <= self.end_ms
    }

    pub fn is_empty(&self) -> bool {
        self.start_ms >= self.end_ms
    }
}
