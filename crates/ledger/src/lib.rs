//! Split ledger domain module (even splits and itemized shares).
//!
//! Pure domain logic only: no IO, no storage, no presentation concerns. Every
//! operation here is synchronous and deterministic; the infra crate persists the
//! records and the app crate wires them together.

pub mod balance;
pub mod event;
pub mod expense;
pub mod participant;
pub mod split;
pub mod summary;

pub use balance::{BalanceSheet, ParticipantBalance, compute_balances, total_expenses};
pub use event::{Currency, Event, EventMode};
pub use expense::{Allocation, ExpenseEntry, NewExpense};
pub use participant::{DisplayColor, PALETTE, Participant, add_participant, derive_initials};
pub use split::{EvenSplitResult, SplitForm, compute_even_split};
pub use summary::{EventFilter, EventSummary, KindFilter, StatusFilter};
