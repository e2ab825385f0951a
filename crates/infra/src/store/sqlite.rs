//! SQLite-backed split repository.
//!
//! Each record is stored as a JSON document in a `data` column, next to the
//! columns needed for lookups (`id`, owning `event_id`). Insertion order is the
//! SQLite `rowid`. Application settings live in a plain key/value table.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use splitbook_core::{Entity, EventId, ExpenseId, ParticipantId};
use splitbook_ledger::{Event, ExpenseEntry, Participant};

use super::r#trait::{SplitRepository, StoreError, StoreResult};
use crate::config::DatabaseConfig;

const SCHEMA: [&str; 6] = [
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id   TEXT PRIMARY KEY NOT NULL,
        data TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS participants (
        id       TEXT PRIMARY KEY NOT NULL,
        event_id TEXT NOT NULL REFERENCES events (id) ON DELETE CASCADE,
        data     TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS participants_event_id ON participants (event_id)",
    r#"
    CREATE TABLE IF NOT EXISTS expense_entries (
        id       TEXT PRIMARY KEY NOT NULL,
        event_id TEXT NOT NULL REFERENCES events (id) ON DELETE CASCADE,
        data     TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS expense_entries_event_id ON expense_entries (event_id)",
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        key   TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )
    "#,
];

/// SQLite split repository.
///
/// `SqlitePool` is `Send + Sync` and cheap to clone; connections are checked
/// out per statement (or per transaction for cascades) and returned on drop.
#[derive(Debug, Clone)]
pub struct SqliteSplitRepository {
    pool: SqlitePool,
}

impl SqliteSplitRepository {
    /// Open (creating if missing) the database and apply the schema.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options =
            SqlitePoolOptions::new().max_connections(config.effective_max_connections());
        if config.is_in_memory() {
            // The database vanishes with its only connection.
            pool_options = pool_options
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }

        let pool = pool_options.connect_with(options).await?;
        tracing::debug!(url = %config.url, "opened sqlite split store");

        let repo = Self { pool };
        repo.migrate().await?;
        Ok(repo)
    }

    /// Wrap an existing pool. The schema is applied before returning.
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        let repo = Self { pool };
        repo.migrate().await?;
        Ok(repo)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn insert_child<T>(&self, table: &str, record: &T, event_id: EventId) -> StoreResult<()>
    where
        T: Entity + Serialize + Sync,
    {
        let data = serde_json::to_string(record)?;
        let sql = format!("INSERT INTO {table} (id, event_id, data) VALUES (?1, ?2, ?3)");
        sqlx::query(&sql)
            .bind(record.id().to_string())
            .bind(event_id.to_string())
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|err| map_write_error::<T>(err, record.id(), event_id))?;
        Ok(())
    }

    async fn fetch_one<T>(&self, table: &str, id: String) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let sql = format!("SELECT data FROM {table} WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| decode(&r)).transpose()
    }

    async fn fetch_children<T>(&self, table: &str, event_id: EventId) -> StoreResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let sql = format!("SELECT data FROM {table} WHERE event_id = ?1 ORDER BY rowid");
        let rows = sqlx::query(&sql)
            .bind(event_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode).collect()
    }

    async fn replace<T>(&self, table: &str, record: &T) -> StoreResult<()>
    where
        T: Entity + Serialize + Sync,
    {
        let data = serde_json::to_string(record)?;
        let sql = format!("UPDATE {table} SET data = ?2 WHERE id = ?1");
        let result = sqlx::query(&sql)
            .bind(record.id().to_string())
            .bind(data)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(T::kind(), record.id()));
        }
        Ok(())
    }

    async fn delete_by_id(&self, table: &str, id: String) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {table} WHERE id = ?1");
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

fn decode<T: DeserializeOwned>(row: &SqliteRow) -> StoreResult<T> {
    let data: String = row.try_get("data")?;
    Ok(serde_json::from_str(&data)?)
}

fn map_write_error<T: Entity>(err: sqlx::Error, id: &T::Id, event_id: EventId) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::duplicate(T::kind(), id);
        }
        if db.is_foreign_key_violation() {
            return StoreError::MissingParent(event_id);
        }
    }
    StoreError::Sqlx(err)
}

#[async_trait]
impl SplitRepository for SqliteSplitRepository {
    async fn insert_event(&self, event: &Event) -> StoreResult<()> {
        let data = serde_json::to_string(event)?;
        sqlx::query("INSERT INTO events (id, data) VALUES (?1, ?2)")
            .bind(event.id_typed().to_string())
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|err| map_write_error::<Event>(err, event.id(), event.id_typed()))?;
        Ok(())
    }

    async fn get_event(&self, id: EventId) -> StoreResult<Option<Event>> {
        self.fetch_one("events", id.to_string()).await
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let rows = sqlx::query("SELECT data FROM events ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode).collect()
    }

    async fn update_event(&self, event: &Event) -> StoreResult<()> {
        self.replace("events", event).await
    }

    async fn delete_event(&self, id: EventId) -> StoreResult<bool> {
        let key = id.to_string();
        // Rolled back on drop if any statement fails.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM expense_entries WHERE event_id = ?1")
            .bind(key.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM participants WHERE event_id = ?1")
            .bind(key.as_str())
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM events WHERE id = ?1")
            .bind(key.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(removed > 0)
    }

    async fn insert_participant(&self, participant: &Participant) -> StoreResult<()> {
        self.insert_child("participants", participant, participant.event_id())
            .await
    }

    async fn get_participant(&self, id: ParticipantId) -> StoreResult<Option<Participant>> {
        self.fetch_one("participants", id.to_string()).await
    }

    async fn list_participants(&self, event_id: EventId) -> StoreResult<Vec<Participant>> {
        self.fetch_children("participants", event_id).await
    }

    async fn update_participant(&self, participant: &Participant) -> StoreResult<()> {
        self.replace("participants", participant).await
    }

    async fn delete_participant(&self, id: ParticipantId) -> StoreResult<bool> {
        self.delete_by_id("participants", id.to_string()).await
    }

    async fn insert_expense(&self, expense: &ExpenseEntry) -> StoreResult<()> {
        self.insert_child("expense_entries", expense, expense.event_id())
            .await
    }

    async fn get_expense(&self, id: ExpenseId) -> StoreResult<Option<ExpenseEntry>> {
        self.fetch_one("expense_entries", id.to_string()).await
    }

    async fn list_expenses(&self, event_id: EventId) -> StoreResult<Vec<ExpenseEntry>> {
        self.fetch_children("expense_entries", event_id).await
    }

    async fn delete_expense(&self, id: ExpenseId) -> StoreResult<bool> {
        self.delete_by_id("expense_entries", id.to_string()).await
    }

    async fn get_setting(&self, key: &str) -> StoreResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.try_get::<String, _>("value")).transpose()?)
    }

    async fn put_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
