//! Constants describing the public Sui dataset.

/// Public BigQuery copy of Sui mainnet.
pub const DEFAULT_DATASET: &str = "bigquery-public-data.crypto_sui_mainnet_us";

/// Native SUI coin type.
pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

/// Number of decimal places between MIST and SUI (1 SUI = 10^9 MIST).
pub const SUI_DECIMALS: i8 = 9;
