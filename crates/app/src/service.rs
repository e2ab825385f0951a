//! Split/share use cases over a [`SplitRepository`].
//!
//! Each operation loads what it needs, runs the pure ledger logic and only
//! then writes. A rejected input never reaches storage.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use chrono::Utc;

use splitbook_core::{DomainError, EventId, ExpenseId, ParticipantId};
use splitbook_infra::{SplitRepository, SqliteSplitRepository};
use splitbook_ledger::{
    BalanceSheet, Currency, EvenSplitResult, Event, EventFilter, EventSummary, ExpenseEntry,
    NewExpense, Participant, SplitForm, add_participant, compute_balances,
};

use crate::config::AppConfig;
use crate::errors::AppResult;

/// Settings key recording that the onboarding carousel was dismissed.
pub const ONBOARDING_COMPLETED: &str = "onboarding_completed";

pub struct SplitApp<R> {
    config: AppConfig,
    repo: R,
    needs_onboarding: AtomicBool,
}

impl SplitApp<SqliteSplitRepository> {
    /// Install logging, open the configured database and build the service.
    pub async fn bootstrap(config: AppConfig) -> anyhow::Result<Self> {
        splitbook_observability::init(&config.log);

        let repo = SqliteSplitRepository::connect(&config.database)
            .await
            .with_context(|| format!("failed to open split store at {}", config.database.url))?;

        let app = Self::open(config, repo)
            .await
            .context("failed to load stored settings")?;

        tracing::info!(
            database = %app.config.database.url,
            currency = %app.config.default_currency,
            onboarding = app.needs_onboarding(),
            "splitbook ready"
        );
        Ok(app)
    }
}

impl<R: SplitRepository> SplitApp<R> {
    pub fn new(config: AppConfig, repo: R) -> Self {
        let needs_onboarding = AtomicBool::new(config.show_onboarding);
        Self {
            config,
            repo,
            needs_onboarding,
        }
    }

    /// Build the service and restore the settings persisted in `repo`.
    /// Without a stored value, `config.show_onboarding` decides.
    pub async fn open(config: AppConfig, repo: R) -> AppResult<Self> {
        let completed = repo.get_setting(ONBOARDING_COMPLETED).await?;
        let app = Self::new(config, repo);
        if completed.as_deref() == Some("true") {
            app.needs_onboarding.store(false, Ordering::Relaxed);
        }
        Ok(app)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn needs_onboarding(&self) -> bool {
        self.needs_onboarding.load(Ordering::Relaxed)
    }

    /// The onboarding carousel was dismissed; it stays hidden from now on,
    /// including after [`SplitApp::open`] on the same store.
    pub async fn complete_onboarding(&self) -> AppResult<()> {
        self.repo.put_setting(ONBOARDING_COMPLETED, "true").await?;
        self.needs_onboarding.store(false, Ordering::Relaxed);
        tracing::info!("onboarding completed");
        Ok(())
    }

    /// Live numbers for the split form while it is being filled in.
    pub fn preview_split(form: &SplitForm) -> EvenSplitResult {
        form.parse_lenient()
    }

    /// Create an even split from a fully valid form.
    pub async fn create_split(&self, form: &SplitForm) -> AppResult<Event> {
        let outcome = form.validate().inspect_err(|err| {
            tracing::warn!(error = %err, "split form rejected");
        })?;
        self.store_split(&form.event_name, form.currency, outcome).await
    }

    /// Create an even split, treating unparseable numbers as 0 (count as 1).
    /// Only the event name is still required.
    pub async fn create_split_lenient(&self, form: &SplitForm) -> AppResult<Event> {
        self.store_split(&form.event_name, form.currency, form.parse_lenient())
            .await
    }

    async fn store_split(
        &self,
        name: &str,
        currency: Currency,
        outcome: EvenSplitResult,
    ) -> AppResult<Event> {
        let per_participant = outcome.amount_per_participant;
        let participants = outcome.number_of_participants;
        let event = Event::create_split(EventId::new(), name, currency, outcome, Utc::now())?;
        self.repo.insert_event(&event).await?;

        tracing::info!(
            event_id = %event.id_typed(),
            per_participant,
            participants,
            "created even split"
        );
        Ok(event)
    }

    /// Create an empty itemized share. `None` uses the configured default currency.
    pub async fn create_share(&self, name: &str, currency: Option<Currency>) -> AppResult<Event> {
        let currency = currency.unwrap_or(self.config.default_currency);
        let event = Event::create_share(EventId::new(), name, currency, Utc::now())?;
        self.repo.insert_event(&event).await?;

        tracing::info!(event_id = %event.id_typed(), %currency, "created share");
        Ok(event)
    }

    pub async fn event(&self, event_id: EventId) -> AppResult<Event> {
        tracing::debug!(%event_id, "loading event");
        self.repo
            .get_event(event_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("event {event_id}")).into())
    }

    pub async fn participants(&self, event_id: EventId) -> AppResult<Vec<Participant>> {
        self.event(event_id).await?;
        Ok(self.repo.list_participants(event_id).await?)
    }

    pub async fn expenses(&self, event_id: EventId) -> AppResult<Vec<ExpenseEntry>> {
        self.event(event_id).await?;
        Ok(self.repo.list_expenses(event_id).await?)
    }

    /// Events matching `filter`, in creation order.
    pub async fn list_events(&self, filter: EventFilter) -> AppResult<Vec<EventSummary>> {
        let events = self.repo.list_events().await?;
        let mut summaries = Vec::new();

        for event in events.iter().filter(|e| filter.matches(e)) {
            let summary = if event.is_share() {
                let participants = self.repo.list_participants(event.id_typed()).await?;
                let expenses = self.repo.list_expenses(event.id_typed()).await?;
                EventSummary::build(event, &participants, &expenses)
            } else {
                EventSummary::build(event, &[], &[])
            };
            summaries.push(summary);
        }

        tracing::debug!(?filter, shown = summaries.len(), total = events.len(), "listed events");
        Ok(summaries)
    }

    /// Flip the done flag; returns the updated event.
    pub async fn toggle_done(&self, event_id: EventId) -> AppResult<Event> {
        let mut event = self.event(event_id).await?;
        let done = event.toggle_done();
        self.repo.update_event(&event).await?;

        tracing::info!(%event_id, done, "toggled event status");
        Ok(event)
    }

    /// Delete an event with all of its participants and expenses.
    pub async fn delete_event(&self, event_id: EventId) -> AppResult<()> {
        if !self.repo.delete_event(event_id).await? {
            return Err(DomainError::not_found(format!("event {event_id}")).into());
        }
        tracing::info!(%event_id, "deleted event");
        Ok(())
    }

    pub async fn add_participant(&self, event_id: EventId, name: &str) -> AppResult<Participant> {
        let event = self.event(event_id).await?;
        let roster = self.repo.list_participants(event_id).await?;

        let participant = add_participant(&event, &roster, name).inspect_err(|err| {
            tracing::warn!(%event_id, error = %err, "participant rejected");
        })?;
        self.repo.insert_participant(&participant).await?;

        tracing::info!(
            %event_id,
            participant_id = %participant.id_typed(),
            color = participant.display_color().hex(),
            "added participant"
        );
        Ok(participant)
    }

    pub async fn rename_participant(
        &self,
        participant_id: ParticipantId,
        name: &str,
    ) -> AppResult<Participant> {
        let mut participant = self.participant(participant_id).await?;
        participant.rename(name)?;
        self.repo.update_participant(&participant).await?;

        tracing::info!(%participant_id, initials = participant.initials(), "renamed participant");
        Ok(participant)
    }

    /// Remove a participant no expense refers to.
    pub async fn remove_participant(&self, participant_id: ParticipantId) -> AppResult<()> {
        let participant = self.participant(participant_id).await?;
        let expenses = self.repo.list_expenses(participant.event_id()).await?;

        if let Some(entry) = expenses.iter().find(|e| e.references(participant_id)) {
            tracing::warn!(%participant_id, expense_id = %entry.id_typed(), "participant still referenced");
            return Err(DomainError::conflict(format!(
                "participant {} is part of expense '{}'",
                participant.name(),
                entry.title()
            ))
            .into());
        }

        self.repo.delete_participant(participant_id).await?;
        tracing::info!(%participant_id, "removed participant");
        Ok(())
    }

    async fn participant(&self, participant_id: ParticipantId) -> AppResult<Participant> {
        self.repo
            .get_participant(participant_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("participant {participant_id}")).into())
    }

    /// Record an itemized expense. Entries whose amounts do not add up are
    /// rejected before anything is written.
    pub async fn add_expense(&self, event_id: EventId, new: NewExpense) -> AppResult<ExpenseEntry> {
        let event = self.event(event_id).await?;
        let roster = self.repo.list_participants(event_id).await?;

        let entry = ExpenseEntry::record(&event, &roster, new).inspect_err(|err| {
            tracing::warn!(%event_id, error = %err, "expense rejected");
        })?;
        self.repo.insert_expense(&entry).await?;

        tracing::info!(
            %event_id,
            expense_id = %entry.id_typed(),
            amount = entry.amount(),
            "recorded expense"
        );
        Ok(entry)
    }

    pub async fn delete_expense(&self, expense_id: ExpenseId) -> AppResult<()> {
        if !self.repo.delete_expense(expense_id).await? {
            return Err(DomainError::not_found(format!("expense {expense_id}")).into());
        }
        tracing::info!(%expense_id, "deleted expense");
        Ok(())
    }

    /// Net position of every participant of a share.
    pub async fn balances(&self, event_id: EventId) -> AppResult<BalanceSheet> {
        let event = self.event(event_id).await?;
        event.ensure_share()?;

        let participants = self.repo.list_participants(event_id).await?;
        let expenses = self.repo.list_expenses(event_id).await?;
        let sheet = compute_balances(&event, &participants, &expenses);

        tracing::debug!(%event_id, expenses = expenses.len(), "computed balances");
        Ok(sheet)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use splitbook_core::amounts_match;
    use splitbook_infra::{DatabaseConfig, InMemorySplitRepository};
    use splitbook_ledger::{Allocation, EventMode, KindFilter, StatusFilter};

    use super::*;
    use crate::errors::AppError;

    fn app() -> SplitApp<InMemorySplitRepository> {
        SplitApp::new(AppConfig::default(), InMemorySplitRepository::new())
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 5).unwrap()
    }

    fn form(name: &str, people: &str, total: &str, tip: &str) -> SplitForm {
        SplitForm {
            event_name: name.to_string(),
            number_of_participants: people.to_string(),
            total_bill_amount: total.to_string(),
            tip_percentage: tip.to_string(),
            currency: Currency::Usd,
        }
    }

    async fn trip<R: SplitRepository>(app: &SplitApp<R>) -> (Event, Vec<Participant>) {
        let event = app.create_share("Trip in Italy", None).await.unwrap();
        let mut roster = Vec::new();
        for name in ["Ana", "Bruno", "Carla"] {
            roster.push(app.add_participant(event.id_typed(), name).await.unwrap());
        }
        (event, roster)
    }

    #[tokio::test]
    async fn create_split_persists_the_computed_outcome() {
        let app = app();
        let event = app
            .create_split(&form("Friday Night Out", "6", "567.50", "15"))
            .await
            .unwrap();

        assert_eq!(event.mode(), EventMode::EvenSplit);
        let split = event.even_split().unwrap();
        assert!((split.amount_per_participant - 108.770_833).abs() < 1e-4);

        let stored = app.event(event.id_typed()).await.unwrap();
        assert_eq!(stored, event);
    }

    #[tokio::test]
    async fn strict_split_rejects_what_lenient_accepts() {
        let app = app();
        let sloppy = form("Lunch", "abc", "12,50", "");

        let err = app.create_split(&sloppy).await.unwrap_err();
        assert!(err.is_validation());
        assert!(app.list_events(EventFilter::default()).await.unwrap().is_empty());

        let event = app.create_split_lenient(&sloppy).await.unwrap();
        let split = event.even_split().unwrap();
        assert_eq!(split.number_of_participants, 1);
        assert_eq!(split.amount_per_participant, 0.0);

        let preview = SplitApp::<InMemorySplitRepository>::preview_split(&sloppy);
        assert_eq!(&preview, split);
    }

    #[tokio::test]
    async fn share_uses_configured_default_currency() {
        let config = AppConfig {
            default_currency: Currency::Gel,
            ..AppConfig::default()
        };
        let app = SplitApp::new(config, InMemorySplitRepository::new());

        let defaulted = app.create_share("Tbilisi", None).await.unwrap();
        let explicit = app.create_share("London", Some(Currency::Gbp)).await.unwrap();
        assert_eq!(defaulted.currency(), Currency::Gel);
        assert_eq!(explicit.currency(), Currency::Gbp);

        let err = app.create_share("   ", None).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn participants_get_initials_and_rotating_colours() {
        let app = app();
        let (event, roster) = trip(&app).await;

        assert_eq!(roster[0].initials(), "A");
        assert_ne!(roster[0].display_color(), roster[1].display_color());
        assert_eq!(app.participants(event.id_typed()).await.unwrap(), roster);

        let renamed = app
            .rename_participant(roster[0].id_typed(), "Ana Maria")
            .await
            .unwrap();
        assert_eq!(renamed.initials(), "AM");

        let err = app.add_participant(event.id_typed(), "  ").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn participants_cannot_join_an_even_split() {
        let app = app();
        let split = app
            .create_split(&form("Dinner", "2", "40", "0"))
            .await
            .unwrap();

        match app.add_participant(split.id_typed(), "Ana").await {
            Err(AppError::Domain(DomainError::InvariantViolation(_))) => {}
            other => panic!("expected invariant violation, got {other:?}"),
        }
        assert!(matches!(
            app.balances(split.id_typed()).await,
            Err(AppError::Domain(DomainError::InvariantViolation(_)))
        ));
    }

    #[tokio::test]
    async fn single_payer_even_split_balances() {
        let app = app();
        let (event, roster) = trip(&app).await;
        let ids: Vec<_> = roster.iter().map(Participant::id_typed).collect();

        app.add_expense(
            event.id_typed(),
            NewExpense {
                title: "Dinner".to_string(),
                amount: 90.0,
                paid_by: vec![Allocation::new(ids[0], 90.0)],
                paid_for: Allocation::split_evenly(90.0, &ids),
                date: date(),
                currency: None,
            },
        )
        .await
        .unwrap();

        let sheet = app.balances(event.id_typed()).await.unwrap();
        assert!(amounts_match(sheet.net(ids[0]), 60.0));
        assert!(amounts_match(sheet.net(ids[1]), -30.0));
        assert!(amounts_match(sheet.net(ids[2]), -30.0));
        assert!(amounts_match(sheet.total_net(), 0.0));

        // Reading twice gives the same answer.
        assert_eq!(app.balances(event.id_typed()).await.unwrap(), sheet);
    }

    #[tokio::test]
    async fn inconsistent_expense_is_never_persisted() {
        let app = app();
        let (event, roster) = trip(&app).await;
        let (a, b) = (roster[0].id_typed(), roster[1].id_typed());

        let err = app
            .add_expense(
                event.id_typed(),
                NewExpense {
                    title: "Museum".to_string(),
                    amount: 100.0,
                    paid_by: vec![Allocation::new(a, 60.0)],
                    paid_for: vec![Allocation::new(b, 100.0)],
                    date: date(),
                    currency: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Domain(DomainError::ConsistencyViolation(_))));
        assert!(app.expenses(event.id_typed()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn referenced_participant_cannot_be_removed() {
        let app = app();
        let (event, roster) = trip(&app).await;
        let entry = app
            .add_expense(
                event.id_typed(),
                NewExpense::single("Taxi", 30.0, roster[0].id_typed(), roster[1].id_typed(), date()),
            )
            .await
            .unwrap();

        match app.remove_participant(roster[1].id_typed()).await {
            Err(AppError::Domain(DomainError::Conflict(_))) => {}
            other => panic!("expected conflict, got {other:?}"),
        }

        app.remove_participant(roster[2].id_typed()).await.unwrap();
        assert_eq!(app.participants(event.id_typed()).await.unwrap().len(), 2);

        app.delete_expense(entry.id_typed()).await.unwrap();
        app.remove_participant(roster[1].id_typed()).await.unwrap();

        let err = app.delete_expense(entry.id_typed()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_events_applies_kind_and_status_filters() {
        let app = app();
        let split = app
            .create_split(&form("Friday Night Out", "4", "100", "10"))
            .await
            .unwrap();
        let (share, roster) = trip(&app).await;
        app.add_expense(
            share.id_typed(),
            NewExpense::single("Boat", 45.0, roster[0].id_typed(), roster[2].id_typed(), date()),
        )
        .await
        .unwrap();
        let finished = app.create_share("Last year", None).await.unwrap();
        app.toggle_done(finished.id_typed()).await.unwrap();

        let active = app.list_events(EventFilter::default()).await.unwrap();
        let names: Vec<_> = active.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Friday Night Out", "Trip in Italy"]);

        assert!(amounts_match(active[0].total_amount, 110.0));
        assert_eq!(active[0].amount_per_participant, Some(27.5));
        assert!(amounts_match(active[1].total_amount, 45.0));
        assert_eq!(active[1].participant_names, ["Ana", "Bruno", "Carla"]);

        let splits = app
            .list_events(EventFilter::new(KindFilter::Splits, StatusFilter::Active))
            .await
            .unwrap();
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].event_id, split.id_typed());

        let done = app
            .list_events(EventFilter::new(KindFilter::All, StatusFilter::Done))
            .await
            .unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].event_id, finished.id_typed());
        assert!(done[0].is_done);
    }

    #[tokio::test]
    async fn toggling_twice_restores_the_event() {
        let app = app();
        let event = app.create_share("Weekend", None).await.unwrap();

        assert!(app.toggle_done(event.id_typed()).await.unwrap().is_done());
        assert!(!app.toggle_done(event.id_typed()).await.unwrap().is_done());

        let err = app.toggle_done(EventId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn onboarding_is_shown_until_completed() {
        let app = app();
        assert!(app.needs_onboarding());
        app.complete_onboarding().await.unwrap();
        assert!(!app.needs_onboarding());

        let quiet = SplitApp::new(
            AppConfig {
                show_onboarding: false,
                ..AppConfig::default()
            },
            InMemorySplitRepository::new(),
        );
        assert!(!quiet.needs_onboarding());
    }

    #[tokio::test]
    async fn completed_onboarding_survives_reopening_the_store() {
        let repo = std::sync::Arc::new(InMemorySplitRepository::new());
        let first = SplitApp::open(AppConfig::default(), repo.clone()).await.unwrap();
        assert!(first.needs_onboarding());
        first.complete_onboarding().await.unwrap();

        let second = SplitApp::open(AppConfig::default(), repo).await.unwrap();
        assert!(!second.needs_onboarding());
    }

    #[tokio::test]
    async fn onboarding_flag_persists_in_a_sqlite_file() {
        let path = std::env::temp_dir().join(format!("splitbook-onboarding-{}.db", EventId::new()));
        let config = AppConfig {
            database: DatabaseConfig {
                url: format!("sqlite://{}", path.display()),
                max_connections: 1,
            },
            ..AppConfig::default()
        };

        let first = SplitApp::bootstrap(config.clone()).await.unwrap();
        assert!(first.needs_onboarding());
        first.complete_onboarding().await.unwrap();
        first.repository().close().await;

        let second = SplitApp::bootstrap(config).await.unwrap();
        assert!(!second.needs_onboarding());
        second.repository().close().await;

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }

    #[tokio::test]
    async fn bootstrap_runs_against_sqlite_and_cascades_deletes() {
        let config = AppConfig {
            database: DatabaseConfig::in_memory(),
            ..AppConfig::default()
        };
        let app = SplitApp::bootstrap(config).await.unwrap();
        let (event, roster) = trip(&app).await;
        app.add_expense(
            event.id_typed(),
            NewExpense::single("Pizza", 24.0, roster[1].id_typed(), roster[0].id_typed(), date()),
        )
        .await
        .unwrap();

        app.delete_event(event.id_typed()).await.unwrap();

        let repo = app.repository();
        assert!(repo.list_participants(event.id_typed()).await.unwrap().is_empty());
        assert!(repo.list_expenses(event.id_typed()).await.unwrap().is_empty());
        assert!(app.delete_event(event.id_typed()).await.unwrap_err().is_not_found());

        repo.close().await;
    }
}
