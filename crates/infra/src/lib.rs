//! Infrastructure layer: record storage and its configuration.

pub mod config;
pub mod store;


pub use config::DatabaseConfig;
pub use store::{InMemorySplitRepository, SplitRepository, SqliteSplitRepository, StoreError, StoreResult};
