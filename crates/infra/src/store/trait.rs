use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use splitbook_core::{EventId, ExpenseId, ParticipantId};
use splitbook_ledger::{Event, ExpenseEntry, Participant};

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operation error.
///
/// These are **infrastructure errors** (missing rows, I/O, encoding) as opposed
/// to domain errors (validation, consistency).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} {id} already exists")]
    Duplicate { kind: &'static str, id: String },

    /// A participant or expense was written for an event that is not stored.
    #[error("event {0} does not exist")]
    MissingParent(EventId),

    #[error("record encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound { kind, id: id.to_string() }
    }

    pub fn duplicate(kind: &'static str, id: impl ToString) -> Self {
        Self::Duplicate { kind, id: id.to_string() }
    }
}

/// Create/read/update/delete access to split records.
///
/// ## Ownership
///
/// An event owns its participants and expense entries:
/// - inserting a child for an unknown event fails with [`StoreError::MissingParent`]
/// - deleting an event deletes its children in the same unit of work
///
/// ## Ordering
///
/// `list_*` return records in insertion order, so balance aggregation over them
/// is reproducible.
///
/// ## Resource scope
///
/// Implementations acquire whatever handle they need (lock guard, pooled
/// connection, transaction) per call and release it before returning, on
/// success and failure alike.
#[async_trait]
pub trait SplitRepository: Send + Sync {
    async fn insert_event(&self, event: &Event) -> StoreResult<()>;
    async fn get_event(&self, id: EventId) -> StoreResult<Option<Event>>;
    async fn list_events(&self) -> StoreResult<Vec<Event>>;
    /// Replace a stored event. Fails with `NotFound` when absent.
    async fn update_event(&self, event: &Event) -> StoreResult<()>;
    /// Delete an event and everything it owns. Returns whether it existed.
    async fn delete_event(&self, id: EventId) -> StoreResult<bool>;

    async fn insert_participant(&self, participant: &Participant) -> StoreResult<()>;
    async fn get_participant(&self, id: ParticipantId) -> StoreResult<Option<Participant>>;
    async fn list_participants(&self, event_id: EventId) -> StoreResult<Vec<Participant>>;
    async fn update_participant(&self, participant: &Participant) -> StoreResult<()>;
    async fn delete_participant(&self, id: ParticipantId) -> StoreResult<bool>;

    async fn insert_expense(&self, expense: &ExpenseEntry) -> StoreResult<()>;
    async fn get_expense(&self, id: ExpenseId) -> StoreResult<Option<ExpenseEntry>>;
    async fn list_expenses(&self, event_id: EventId) -> StoreResult<Vec<ExpenseEntry>>;
    async fn delete_expense(&self, id: ExpenseId) -> StoreResult<bool>;

    /// Application setting previously written with `put_setting`.
    async fn get_setting(&self, key: &str) -> StoreResult<Option<String>>;
    /// Insert or overwrite an application setting.
    async fn put_setting(&self, key: &str, value: &str) -> StoreResult<()>;
}

#[async_trait]
impl<S> SplitRepository for Arc<S>
where
    S: SplitRepository + ?Sized,
{
    async fn insert_event(&self, event: &Event) -> StoreResult<()> {
        (**self).insert_event(event).await
    }

    async fn get_event(&self, id: EventId) -> StoreResult<Option<Event>> {
        (**self).get_event(id).await
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        (**self).list_events().await
    }

    async fn update_event(&self, event: &Event) -> StoreResult<()> {
        (**self).update_event(event).await
    }

    async fn delete_event(&self, id: EventId) -> StoreResult<bool> {
        (**self).delete_event(id).await
    }

    async fn insert_participant(&self, participant: &Participant) -> StoreResult<()> {
        (**self).insert_participant(participant).await
    }

    async fn get_participant(&self, id: ParticipantId) -> StoreResult<Option<Participant>> {
        (**self).get_participant(id).await
    }

    async fn list_participants(&self, event_id: EventId) -> StoreResult<Vec<Participant>> {
        (**self).list_participants(event_id).await
    }

    async fn update_participant(&self, participant: &Participant) -> StoreResult<()> {
        (**self).update_participant(participant).await
    }

    async fn delete_participant(&self, id: ParticipantId) -> StoreResult<bool> {
        (**self).delete_participant(id).await
    }

    async fn insert_expense(&self, expense: &ExpenseEntry) -> StoreResult<()> {
        (**self).insert_expense(expense).await
    }

    async fn get_expense(&self, id: ExpenseId) -> StoreResult<Option<ExpenseEntry>> {
        (**self).get_expense(id).await
    }

    async fn list_expenses(&self, event_id: EventId) -> StoreResult<Vec<ExpenseEntry>> {
        (**self).list_expenses(event_id).await
    }

    async fn delete_expense(&self, id: ExpenseId) -> StoreResult<bool> {
        (**self).delete_expense(id).await
    }

    async fn get_setting(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_setting(key).await
    }

    async fn put_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).put_setting(key, value).await
    }
}
