//! Per-participant balances for itemized shares.
//!
//! A participant is credited with what they paid and debited with what they
//! owe; the difference is their net balance. Positive means the group owes
//! them, negative means they owe the group.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use splitbook_core::ParticipantId;

use crate::event::Event;
use crate::expense::ExpenseEntry;
use crate::participant::Participant;

/// Totals for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticipantBalance {
    pub participant_id: ParticipantId,
    /// Sum of contributions on the payer side.
    pub paid: f64,
    /// Sum of shares on the beneficiary side.
    pub owed: f64,
}

impl ParticipantBalance {
    fn zero(participant_id: ParticipantId) -> Self {
        Self { participant_id, paid: 0.0, owed: 0.0 }
    }

    /// `paid - owed`.
    pub fn net(&self) -> f64 {
        self.paid - self.owed
    }
}

/// Balances of every participant in an event, in a stable order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceSheet {
    entries: Vec<ParticipantBalance>,
}

impl BalanceSheet {
    pub fn entries(&self) -> &[ParticipantBalance] {
        &self.entries
    }

    pub fn get(&self, participant_id: ParticipantId) -> Option<&ParticipantBalance> {
        self.entries.iter().find(|b| b.participant_id == participant_id)
    }

    /// Net balance of `participant_id`, 0 for unknown participants.
    pub fn net(&self, participant_id: ParticipantId) -> f64 {
        self.get(participant_id).map(ParticipantBalance::net).unwrap_or(0.0)
    }

    /// Sum of all nets; 0 (up to rounding) for any set of consistent entries.
    pub fn total_net(&self) -> f64 {
        self.entries.iter().map(ParticipantBalance::net).sum()
    }

    /// `participant_id → net` view.
    pub fn to_map(&self) -> HashMap<ParticipantId, f64> {
        self.entries.iter().map(|b| (b.participant_id, b.net())).collect()
    }
}

/// Aggregate `expenses` into per-participant balances for `event`.
///
/// Every participant of `event` in `participants` gets an entry (zero if
/// untouched). Entries of other events are skipped. Expense entries are trusted
/// to satisfy their sum invariants; they are not re-validated here.
pub fn compute_balances(
    event: &Event,
    participants: &[Participant],
    expenses: &[ExpenseEntry],
) -> BalanceSheet {
    let event_id = event.id_typed();
    let mut entries: Vec<ParticipantBalance> = Vec::new();
    let mut index: HashMap<ParticipantId, usize> = HashMap::new();

    for p in participants.iter().filter(|p| p.event_id() == event_id) {
        slot(&mut entries, &mut index, p.id_typed());
    }

    for expense in expenses.iter().filter(|e| e.event_id() == event_id) {
        for c in expense.paid_by() {
            let i = slot(&mut entries, &mut index, c.participant_id);
            entries[i].paid += c.amount;
        }
        for s in expense.paid_for() {
            let i = slot(&mut entries, &mut index, s.participant_id);
            entries[i].owed += s.amount;
        }
    }

    BalanceSheet { entries }
}

fn slot(
    entries: &mut Vec<ParticipantBalance>,
    index: &mut HashMap<ParticipantId, usize>,
    participant_id: ParticipantId,
) -> usize {
    *index.entry(participant_id).or_insert_with(|| {
        entries.push(ParticipantBalance::zero(participant_id));
        entries.len() - 1
    })
}

/// Total of all expense amounts (the "Total Expenses" figure of a share).
pub fn total_expenses(expenses: &[ExpenseEntry]) -> f64 {
    expenses.iter().map(ExpenseEntry::amount).sum()
}
