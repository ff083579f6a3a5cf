pub mod config;
pub mod sui;

pub use config::{load_dotenv, BigQueryConfig, Config, FetcherSettings};
pub use sui::*;
