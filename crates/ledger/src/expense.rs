use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use splitbook_core::{
    DomainError, DomainResult, Entity, EventId, ExpenseId, ParticipantId, ValueObject, amounts_match,
};

use crate::event::{Currency, Event};
use crate::participant::Participant;

/// One participant's part of an expense: what they contributed (payer side)
/// or what they owe (beneficiary side).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub participant_id: ParticipantId,
    pub amount: f64,
}

impl ValueObject for Allocation {}

impl Allocation {
    pub fn new(participant_id: ParticipantId, amount: f64) -> Self {
        Self { participant_id, amount }
    }

    /// Equal shares of `amount` for each participant, in the given order.
    pub fn split_evenly(amount: f64, participants: &[ParticipantId]) -> Vec<Allocation> {
        if participants.is_empty() {
            return Vec::new();
        }
        let each = amount / participants.len() as f64;
        participants
            .iter()
            .map(|id| Allocation::new(*id, each))
            .collect()
    }
}

/// Input for recording an itemized expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub title: String,
    pub amount: f64,
    pub paid_by: Vec<Allocation>,
    pub paid_for: Vec<Allocation>,
    pub date: NaiveDate,
    /// Label shown next to the amount; `None` uses the event's currency.
    #[serde(default)]
    pub currency: Option<Currency>,
}

impl NewExpense {
    /// One payer covers the whole amount for one beneficiary.
    pub fn single(
        title: impl Into<String>,
        amount: f64,
        payer: ParticipantId,
        beneficiary: ParticipantId,
        date: NaiveDate,
    ) -> Self {
        Self {
            title: title.into(),
            amount,
            paid_by: vec![Allocation::new(payer, amount)],
            paid_for: vec![Allocation::new(beneficiary, amount)],
            date,
            currency: None,
        }
    }
}

/// One itemized cost within a share. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    id: ExpenseId,
    event_id: EventId,
    title: String,
    amount: f64,
    paid_by: Vec<Allocation>,
    paid_for: Vec<Allocation>,
    date: NaiveDate,
    currency: Currency,
}

impl ExpenseEntry {
    /// Validate `new` against the event and its roster and build the entry.
    ///
    /// Sums on both sides must equal `amount` within the amount tolerance, and
    /// every referenced participant must belong to `event`.
    pub fn record(event: &Event, participants: &[Participant], new: NewExpense) -> DomainResult<Self> {
        event.ensure_share()?;

        let title = new.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("expense title cannot be empty"));
        }
        if !new.amount.is_finite() || new.amount <= 0.0 {
            return Err(DomainError::validation("expense amount must be positive"));
        }
        if new.paid_by.is_empty() {
            return Err(DomainError::validation("expense needs at least one payer"));
        }
        if new.paid_for.is_empty() {
            return Err(DomainError::validation("expense needs at least one beneficiary"));
        }

        let roster: HashSet<ParticipantId> = participants
            .iter()
            .filter(|p| p.event_id() == event.id_typed())
            .map(|p| p.id_typed())
            .collect();

        check_side("paid by", &new.paid_by, new.amount, &roster)?;
        check_side("paid for", &new.paid_for, new.amount, &roster)?;

        Ok(Self {
            id: ExpenseId::new(),
            event_id: event.id_typed(),
            title: title.to_string(),
            amount: new.amount,
            paid_by: new.paid_by,
            paid_for: new.paid_for,
            date: new.date,
            currency: new.currency.unwrap_or(event.currency()),
        })
    }

    pub fn id_typed(&self) -> ExpenseId {
        self.id
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn paid_by(&self) -> &[Allocation] {
        &self.paid_by
    }

    pub fn paid_for(&self) -> &[Allocation] {
        &self.paid_for
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Display label only; amounts are never converted.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Whether `participant_id` appears on either side of this entry.
    pub fn references(&self, participant_id: ParticipantId) -> bool {
        self.paid_by
            .iter()
            .chain(self.paid_for.iter())
            .any(|a| a.participant_id == participant_id)
    }
}

impl Entity for ExpenseEntry {
    type Id = ExpenseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn kind() -> &'static str {
        "expense"
    }
}

fn check_side(
    side: &str,
    allocations: &[Allocation],
    amount: f64,
    roster: &HashSet<ParticipantId>,
) -> DomainResult<()> {
    let mut seen = HashSet::with_capacity(allocations.len());
    let mut total = 0.0;

    for a in allocations {
        if !a.amount.is_finite() || a.amount <= 0.0 {
            return Err(DomainError::validation(format!("{side}: amounts must be positive")));
        }
        if !seen.insert(a.participant_id) {
            return Err(DomainError::validation(format!(
                "{side}: participant {} listed twice",
                a.participant_id
            )));
        }
        if !roster.contains(&a.participant_id) {
            return Err(DomainError::consistency(format!(
                "{side}: participant {} does not belong to this event",
                a.participant_id
            )));
        }
        total += a.amount;
    }

    if !amounts_match(total, amount) {
        return Err(DomainError::consistency(format!(
            "{side}: shares sum to {total} but the expense amount is {amount}"
        )));
    }
    Ok(())
}
