use serde::{Deserialize, Serialize};

use splitbook_core::{DomainError, DomainResult, Entity, EventId, ParticipantId, ValueObject};

use crate::event::Event;

/// Fixed avatar palette, cycled round-robin per event.
pub const PALETTE: [&str; 8] = [
    "#7B61FF", "#FF6B6B", "#1DB954", "#FFB020", "#2D9CDB", "#F2994A", "#9B51E0", "#27AE60",
];

/// Avatar colour as a `#RRGGBB` hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayColor(String);

impl ValueObject for DisplayColor {}

impl DisplayColor {
    /// Palette entry for the `index`-th participant of an event.
    pub fn round_robin(index: usize) -> Self {
        Self(PALETTE[index % PALETTE.len()].to_string())
    }

    pub fn hex(&self) -> &str {
        &self.0
    }
}

/// Uppercased first character of each whitespace-separated token.
///
/// "Ana Maria" → "AM", "john smith" → "JS", "Ana" → "A".
pub fn derive_initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|token| token.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// A named person taking part in an itemized share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    id: ParticipantId,
    event_id: EventId,
    name: String,
    initials: String,
    display_color: DisplayColor,
}

impl Participant {
    pub fn id_typed(&self) -> ParticipantId {
        self.id
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initials(&self) -> &str {
        &self.initials
    }

    pub fn display_color(&self) -> &DisplayColor {
        &self.display_color
    }

    /// Rename and re-derive initials. The colour is kept.
    pub fn rename(&mut self, name: &str) -> DomainResult<()> {
        let name = validate_name(name)?;
        self.initials = derive_initials(&name);
        self.name = name;
        Ok(())
    }
}

impl Entity for Participant {
    type Id = ParticipantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn kind() -> &'static str {
        "participant"
    }
}

/// Provision a new participant for `event`.
///
/// `existing` is the current roster; only entries belonging to `event` count
/// toward the colour rotation.
pub fn add_participant(event: &Event, existing: &[Participant], name: &str) -> DomainResult<Participant> {
    event.ensure_share()?;
    let name = validate_name(name)?;

    let position = existing
        .iter()
        .filter(|p| p.event_id == event.id_typed())
        .count();

    Ok(Participant {
        id: ParticipantId::new(),
        event_id: event.id_typed(),
        initials: derive_initials(&name),
        name,
        display_color: DisplayColor::round_robin(position),
    })
}

fn validate_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("participant name cannot be empty"));
    }
    Ok(trimmed.to_string())
}
