//! Record storage boundary for events, participants and expense entries.
//!
//! This module defines the repository abstraction the application service talks
//! to, plus two engines: an in-memory one for tests/dev and a SQLite one for
//! on-device persistence.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemorySplitRepository;
pub use r#trait::{SplitRepository, StoreError, StoreResult};
pub use sqlite::SqliteSplitRepository;
