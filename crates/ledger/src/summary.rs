//! List-screen view of events: filtering and one-line summaries.

use serde::{Deserialize, Serialize};

use splitbook_core::EventId;

use crate::balance::total_expenses;
use crate::event::{Currency, Event, EventMode};
use crate::expense::ExpenseEntry;
use crate::participant::Participant;

/// Which kinds of events to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindFilter {
    #[default]
    All,
    Splits,
    Shares,
}

/// Which lifecycle state to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Active,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub kind: KindFilter,
    pub status: StatusFilter,
}

impl EventFilter {
    pub fn new(kind: KindFilter, status: StatusFilter) -> Self {
        Self { kind, status }
    }

    pub fn matches(&self, event: &Event) -> bool {
        let kind_ok = match self.kind {
            KindFilter::All => true,
            KindFilter::Splits => event.mode() == EventMode::EvenSplit,
            KindFilter::Shares => event.mode() == EventMode::ItemizedShare,
        };
        let status_ok = match self.status {
            StatusFilter::Active => !event.is_done(),
            StatusFilter::Done => event.is_done(),
        };
        kind_ok && status_ok
    }
}

/// One row of the events list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: EventId,
    pub name: String,
    pub mode: EventMode,
    pub currency: Currency,
    pub is_done: bool,
    /// Bill plus tip for splits; sum of expenses for shares.
    pub total_amount: f64,
    /// Only for splits.
    pub amount_per_participant: Option<f64>,
    /// Only for shares, in roster order.
    pub participant_names: Vec<String>,
}

impl EventSummary {
    /// Summarise `event`. `participants` and `expenses` may contain records of
    /// other events; they are filtered out.
    pub fn build(event: &Event, participants: &[Participant], expenses: &[ExpenseEntry]) -> Self {
        let event_id = event.id_typed();

        let (total_amount, amount_per_participant) = match event.even_split() {
            Some(split) => (split.total_with_tip(), Some(split.amount_per_participant)),
            None => {
                let own: Vec<ExpenseEntry> = expenses
                    .iter()
                    .filter(|e| e.event_id() == event_id)
                    .cloned()
                    .collect();
                (total_expenses(&own), None)
            }
        };

        let participant_names = participants
            .iter()
            .filter(|p| p.event_id() == event_id)
            .map(|p| p.name().to_string())
            .collect();

        Self {
            event_id,
            name: event.name().to_string(),
            mode: event.mode(),
            currency: event.currency(),
            is_done: event.is_done(),
            total_amount,
            amount_per_participant,
            participant_names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::NewExpense;
    use crate::participant::add_participant;
    use crate::split::EvenSplitResult;
    use chrono::{NaiveDate, Utc};

    fn split_event(done: bool) -> Event {
        let mut e = Event::create_split(
            EventId::new(),
            "Friday Night Out",
            Currency::Usd,
            EvenSplitResult::new(567.5, 15.0, 6),
            Utc::now(),
        )
        .unwrap();
        e.set_done(done);
        e
    }

    fn share_event(done: bool) -> Event {
        let mut e = Event::create_share(EventId::new(), "Trip in Italy", Currency::Euro, Utc::now()).unwrap();
        e.set_done(done);
        e
    }

    #[test]
    fn default_filter_shows_active_events_of_every_kind() {
        let filter = EventFilter::default();
        assert!(filter.matches(&split_event(false)));
        assert!(filter.matches(&share_event(false)));
        assert!(!filter.matches(&split_event(true)));
    }

    #[test]
    fn kind_and_status_filters_combine() {
        let events = [split_event(false), split_event(true), share_event(false), share_event(true)];
        let done_shares = EventFilter::new(KindFilter::Shares, StatusFilter::Done);
        let hits: Vec<_> = events.iter().filter(|e| done_shares.matches(e)).collect();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].is_share() && hits[0].is_done());

        let active_splits = EventFilter::new(KindFilter::Splits, StatusFilter::Active);
        assert_eq!(events.iter().filter(|e| active_splits.matches(e)).count(), 1);
    }

    #[test]
    fn split_summary_reports_total_and_each() {
        let event = split_event(false);
        let summary = EventSummary::build(&event, &[], &[]);
        assert!((summary.total_amount - 652.625).abs() < 1e-9);
        let each = summary.amount_per_participant.unwrap();
        assert!((each - 108.770_833).abs() < 1e-5);
        assert!(summary.participant_names.is_empty());
    }

    #[test]
    fn share_summary_lists_participants_and_expense_total() {
        let event = share_event(false);
        let ana = add_participant(&event, &[], "Ana").unwrap();
        let bruno = add_participant(&event, std::slice::from_ref(&ana), "Bruno").unwrap();
        let roster = vec![ana, bruno];
        let date = NaiveDate::from_ymd_opt(2024, 10, 5).unwrap();
        let entry = ExpenseEntry::record(
            &event,
            &roster,
            NewExpense::single("Pizza", 24.0, roster[0].id_typed(), roster[1].id_typed(), date),
        )
        .unwrap();

        let summary = EventSummary::build(&event, &roster, &[entry]);
        assert_eq!(summary.total_amount, 24.0);
        assert_eq!(summary.amount_per_participant, None);
        assert_eq!(summary.participant_names, vec!["Ana", "Bruno"]);
    }
}
