use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use splitbook_core::{Entity, EventId, ExpenseId, ParticipantId};
use splitbook_ledger::{Event, ExpenseEntry, Participant};

use super::r#trait::{SplitRepository, StoreError, StoreResult};

/// Insertion-ordered table of one record kind.
#[derive(Debug)]
struct Table<T: Entity> {
    rows: HashMap<T::Id, (u64, T)>,
    next_seq: u64,
}

impl<T> Table<T>
where
    T: Entity + Clone,
{
    fn new() -> Self {
        Self {
            rows: HashMap::new(),
            next_seq: 0,
        }
    }

    fn insert(&mut self, record: &T) -> StoreResult<()> {
        let id = *record.id();
        if self.rows.contains_key(&id) {
            return Err(StoreError::duplicate(T::kind(), id));
        }
        self.rows.insert(id, (self.next_seq, record.clone()));
        self.next_seq += 1;
        Ok(())
    }

    fn get(&self, id: &T::Id) -> Option<T> {
        self.rows.get(id).map(|(_, r)| r.clone())
    }

    fn update(&mut self, record: &T) -> StoreResult<()> {
        let id = *record.id();
        match self.rows.get_mut(&id) {
            Some((_, slot)) => {
                *slot = record.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(T::kind(), id)),
        }
    }

    fn remove(&mut self, id: &T::Id) -> bool {
        self.rows.remove(id).is_some()
    }

    fn retain(&mut self, keep: impl Fn(&T) -> bool) {
        self.rows.retain(|_, (_, r)| keep(r));
    }

    fn select(&self, filter: impl Fn(&T) -> bool) -> Vec<T> {
        let mut hits: Vec<&(u64, T)> = self.rows.values().filter(|(_, r)| filter(r)).collect();
        hits.sort_by_key(|(seq, _)| *seq);
        hits.into_iter().map(|(_, r)| r.clone()).collect()
    }
}

#[derive(Debug)]
struct Tables {
    events: Table<Event>,
    participants: Table<Participant>,
    expenses: Table<ExpenseEntry>,
    settings: HashMap<String, String>,
}

/// In-memory split repository.
///
/// Intended for tests/dev. All tables sit behind one lock so cascades are atomic.
#[derive(Debug)]
pub struct InMemorySplitRepository {
    inner: RwLock<Tables>,
}

impl InMemorySplitRepository {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Tables {
                events: Table::new(),
                participants: Table::new(),
                expenses: Table::new(),
                settings: HashMap::new(),
            }),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> StoreResult<R> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&guard))
    }

    fn write<R>(&self, f: impl FnOnce(&mut Tables) -> StoreResult<R>) -> StoreResult<R> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        f(&mut guard)
    }
}

impl Default for InMemorySplitRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_parent(tables: &Tables, event_id: EventId) -> StoreResult<()> {
    if tables.events.rows.contains_key(&event_id) {
        Ok(())
    } else {
        Err(StoreError::MissingParent(event_id))
    }
}

#[async_trait]
impl SplitRepository for InMemorySplitRepository {
    async fn insert_event(&self, event: &Event) -> StoreResult<()> {
        self.write(|t| t.events.insert(event))
    }

    async fn get_event(&self, id: EventId) -> StoreResult<Option<Event>> {
        self.read(|t| t.events.get(&id))
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        self.read(|t| t.events.select(|_| true))
    }

    async fn update_event(&self, event: &Event) -> StoreResult<()> {
        self.write(|t| t.events.update(event))
    }

    async fn delete_event(&self, id: EventId) -> StoreResult<bool> {
        self.write(|t| {
            t.expenses.retain(|e| e.event_id() != id);
            t.participants.retain(|p| p.event_id() != id);
            Ok(t.events.remove(&id))
        })
    }

    async fn insert_participant(&self, participant: &Participant) -> StoreResult<()> {
        self.write(|t| {
            ensure_parent(t, participant.event_id())?;
            t.participants.insert(participant)
        })
    }

    async fn get_participant(&self, id: ParticipantId) -> StoreResult<Option<Participant>> {
        self.read(|t| t.participants.get(&id))
    }

    async fn list_participants(&self, event_id: EventId) -> StoreResult<Vec<Participant>> {
        self.read(|t| t.participants.select(|p| p.event_id() == event_id))
    }

    async fn update_participant(&self, participant: &Participant) -> StoreResult<()> {
        self.write(|t| t.participants.update(participant))
    }

    async fn delete_participant(&self, id: ParticipantId) -> StoreResult<bool> {
        self.write(|t| Ok(t.participants.remove(&id)))
    }

    async fn insert_expense(&self, expense: &ExpenseEntry) -> StoreResult<()> {
        self.write(|t| {
            ensure_parent(t, expense.event_id())?;
            t.expenses.insert(expense)
        })
    }

    async fn get_expense(&self, id: ExpenseId) -> StoreResult<Option<ExpenseEntry>> {
        self.read(|t| t.expenses.get(&id))
    }

    async fn list_expenses(&self, event_id: EventId) -> StoreResult<Vec<ExpenseEntry>> {
        self.read(|t| t.expenses.select(|e| e.event_id() == event_id))
    }

    async fn delete_expense(&self, id: ExpenseId) -> StoreResult<bool> {
        self.write(|t| Ok(t.expenses.remove(&id)))
    }

    async fn get_setting(&self, key: &str) -> StoreResult<Option<String>> {
        self.read(|t| t.settings.get(key).cloned())
    }

    async fn put_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        self.write(|t| {
            t.settings.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }
}
