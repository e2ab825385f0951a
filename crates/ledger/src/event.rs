use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use splitbook_core::{DomainError, DomainResult, Entity, EventId, ValueObject};

use crate::split::EvenSplitResult;

/// Currency label attached to an event.
///
/// Display-only: amounts are never converted between currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EURO")]
    Euro,
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "GEL")]
    Gel,
}

impl ValueObject for Currency {}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Usd, Currency::Euro, Currency::Gbp, Currency::Gel];

    pub fn label(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Euro => "EURO",
            Currency::Gbp => "GBP",
            Currency::Gel => "GEL",
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

impl core::str::FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Currency::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown currency '{wanted}' (expected one of USD, EURO, GBP, GEL)"
                ))
            })
    }
}

/// How an event divides money between people. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventMode {
    EvenSplit,
    ItemizedShare,
}

/// One bill-splitting or sharing occasion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    name: String,
    currency: Currency,
    mode: EventMode,
    is_done: bool,
    /// Present iff `mode == EvenSplit`.
    even_split: Option<EvenSplitResult>,
    created_at: DateTime<Utc>,
}

impl Event {
    /// Create an even-split event carrying its computed outcome.
    pub fn create_split(
        id: EventId,
        name: &str,
        currency: Currency,
        outcome: EvenSplitResult,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: validate_name(name)?,
            currency,
            mode: EventMode::EvenSplit,
            is_done: false,
            even_split: Some(outcome),
            created_at,
        })
    }

    /// Create an itemized-share event (participants and expenses are added later).
    pub fn create_share(
        id: EventId,
        name: &str,
        currency: Currency,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: validate_name(name)?,
            currency,
            mode: EventMode::ItemizedShare,
            is_done: false,
            even_split: None,
            created_at,
        })
    }

    pub fn id_typed(&self) -> EventId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn mode(&self) -> EventMode {
        self.mode
    }

    pub fn is_done(&self) -> bool {
        self.is_done
    }

    pub fn even_split(&self) -> Option<&EvenSplitResult> {
        self.even_split.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_share(&self) -> bool {
        self.mode == EventMode::ItemizedShare
    }

    /// Flip the done flag; returns the new value.
    pub fn toggle_done(&mut self) -> bool {
        self.is_done = !self.is_done;
        self.is_done
    }

    pub fn set_done(&mut self, done: bool) {
        self.is_done = done;
    }

    /// Invariant helper: itemized operations are only valid on share events.
    pub fn ensure_share(&self) -> DomainResult<()> {
        if !self.is_share() {
            return Err(DomainError::invariant(format!(
                "event '{}' is an even split; participants and expenses belong to shares",
                self.name
            )));
        }
        Ok(())
    }
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn kind() -> &'static str {
        "event"
    }
}

fn validate_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("event name cannot be empty"));
    }
    Ok(trimmed.to_string())
}
