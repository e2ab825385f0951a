//! Storage configuration.

use serde::{Deserialize, Serialize};

/// SQLite connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `sqlite://path/to/file.db` or `sqlite::memory:`.
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub const IN_MEMORY_URL: &'static str = "sqlite::memory:";

    /// Private, throwaway database (tests, previews).
    pub fn in_memory() -> Self {
        Self {
            url: Self::IN_MEMORY_URL.to_string(),
            max_connections: 1,
        }
    }

    /// In-memory SQLite databases live and die with a single connection.
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Pool size actually used: in-memory databases are pinned to one connection.
    pub fn effective_max_connections(&self) -> u32 {
        if self.is_in_memory() {
            1
        } else {
            self.max_connections.max(1)
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://splitbook.db".to_string(),
            max_connections: 4,
        }
    }
}
