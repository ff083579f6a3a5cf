pub mod client;
pub mod mock;
pub mod params;
pub mod result;
mod wire;

pub use client::{BigQueryClient, WarehouseClient, WarehouseError};
pub use mock::{FailingWarehouseClient, MockWarehouseClient};
pub use params::{ParameterValue, QueryParameter, WarehouseQuery};
pub use result::{QueryMetadata, QueryResult, ResultColumn};
