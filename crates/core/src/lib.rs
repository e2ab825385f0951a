//! `splitbook-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{EventId, ExpenseId, ParticipantId};
pub use value_object::ValueObject;

/// Tolerance used when comparing monetary sums: absolute up to 1.0, relative
/// to the larger magnitude above that.
pub const AMOUNT_TOLERANCE: f64 = 1e-6;

/// Whether two amounts are equal within [`AMOUNT_TOLERANCE`].
pub fn amounts_match(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= AMOUNT_TOLERANCE * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_amounts_use_an_absolute_tolerance() {
        assert!(amounts_match(0.1 + 0.2, 0.3));
        assert!(amounts_match(0.0, 5e-7));
        assert!(!amounts_match(0.0, 1e-5));
        assert!(!amounts_match(30.0, 30.01));
    }

    #[test]
    fn large_amounts_tolerate_rounding_in_the_last_digits() {
        let big: f64 = 9_876_543_210_987.65;
        let next = f64::from_bits(big.to_bits() + 3);
        assert!((next - big) > 1e-6);
        assert!(amounts_match(big, next));
        assert!(amounts_match(next, big));
        assert!(!amounts_match(big, big + 1e8));
    }
}
