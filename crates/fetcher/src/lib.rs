pub mod error;
pub mod fetcher;
pub mod frame;
pub mod queries;
pub mod request;

pub use error::{ErrorKind, FetchError};
pub use fetcher::{DataFetcher, FetcherConfig};
pub use frame::{normalize, ColumnKind, ColumnSpec, Frame};
pub use request::{QueryRequest, TimeWindow};
