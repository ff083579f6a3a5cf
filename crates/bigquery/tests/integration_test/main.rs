//! Integration tests for suiscan-bigquery.
//!
//! `http` drives `BigQueryClient` against a local fake of the REST API; the
//! rest use the constructor and the in-memory `WarehouseClient`s. Tests
//! marked with `#[ignore]` require BigQuery credentials and must be run
//! explicitly.

mod client;
mod http;
mod params;
mod result;
