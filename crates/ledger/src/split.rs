//! Even-split computation: one bill, a tip, N people.

use serde::{Deserialize, Serialize};

use splitbook_core::{DomainError, DomainResult};

use crate::event::Currency;

/// Amount each participant pays for an evenly split bill.
///
/// `(total + total * tip_percentage / 100) / n`, with `n` clamped to at least 1
/// and non-finite inputs treated as 0. Never returns NaN or infinity.
pub fn compute_even_split(total_bill_amount: f64, tip_percentage: f64, number_of_participants: i64) -> f64 {
    let total = finite_or_zero(total_bill_amount);
    let tip = finite_or_zero(tip_percentage);
    let n = clamp_participants(number_of_participants);

    let per_participant = (total + total * tip / 100.0) / n as f64;
    finite_or_zero(per_participant)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn clamp_participants(n: i64) -> u64 {
    n.max(1).unsigned_abs()
}

/// Computed outcome of an even-split event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvenSplitResult {
    pub total_bill_amount: f64,
    pub tip_percentage: f64,
    pub number_of_participants: u64,
    pub amount_per_participant: f64,
}

impl EvenSplitResult {
    /// Build the outcome, applying the same clamping as [`compute_even_split`].
    pub fn new(total_bill_amount: f64, tip_percentage: f64, number_of_participants: i64) -> Self {
        Self {
            total_bill_amount: finite_or_zero(total_bill_amount),
            tip_percentage: finite_or_zero(tip_percentage),
            number_of_participants: clamp_participants(number_of_participants),
            amount_per_participant: compute_even_split(
                total_bill_amount,
                tip_percentage,
                number_of_participants,
            ),
        }
    }

    /// Bill plus tip.
    pub fn total_with_tip(&self) -> f64 {
        self.total_bill_amount + self.total_bill_amount * self.tip_percentage / 100.0
    }
}

/// Raw input of the "create new split" form, exactly as typed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SplitForm {
    pub event_name: String,
    pub number_of_participants: String,
    pub total_bill_amount: String,
    pub tip_percentage: String,
    #[serde(default)]
    pub currency: Currency,
}

impl SplitForm {
    /// Input-compatible parse: malformed or negative amounts and tips become 0,
    /// a malformed or non-positive participant count becomes 1.
    pub fn parse_lenient(&self) -> EvenSplitResult {
        let total = parse_amount(&self.total_bill_amount).map_or(0.0, |v| v.max(0.0));
        let tip = parse_amount(&self.tip_percentage).map_or(0.0, |v| v.max(0.0));
        let n = self.number_of_participants.trim().parse::<i64>().unwrap_or(1);
        EvenSplitResult::new(total, tip, n)
    }

    /// Strict parse used to gate the confirm action.
    pub fn validate(&self) -> DomainResult<EvenSplitResult> {
        if self.event_name.trim().is_empty() {
            return Err(DomainError::validation("event name cannot be empty"));
        }

        let n = self
            .number_of_participants
            .trim()
            .parse::<i64>()
            .map_err(|_| DomainError::validation("number of participants must be a whole number"))?;
        if n < 1 {
            return Err(DomainError::validation("number of participants must be at least 1"));
        }

        let total = parse_amount(&self.total_bill_amount)
            .ok_or_else(|| DomainError::validation("total bill amount must be a number"))?;
        if total < 0.0 {
            return Err(DomainError::validation("total bill amount cannot be negative"));
        }

        let tip = parse_amount(&self.tip_percentage)
            .ok_or_else(|| DomainError::validation("tip percentage must be a number"))?;
        if tip < 0.0 {
            return Err(DomainError::validation("tip percentage cannot be negative"));
        }

        Ok(EvenSplitResult::new(total, tip, n))
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Parse a user-entered decimal; `None` for empty, malformed, or non-finite text.
fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn form(name: &str, n: &str, total: &str, tip: &str) -> SplitForm {
        SplitForm {
            event_name: name.to_string(),
            number_of_participants: n.to_string(),
            total_bill_amount: total.to_string(),
            tip_percentage: tip.to_string(),
            currency: Currency::Usd,
        }
    }

    #[test]
    fn friday_night_out_example() {
        let untipped = compute_even_split(567.50, 0.0, 6);
        assert!((untipped - 94.583_333_333).abs() < 1e-6);
        assert_eq!(format!("{untipped:.2}"), "94.58");

        let tipped = compute_even_split(567.50, 15.0, 6);
        assert!((tipped - 108.770_833_333).abs() < 1e-6);
    }

    #[test]
    fn non_positive_participant_counts_clamp_to_one() {
        let one = compute_even_split(80.0, 12.5, 1);
        assert_eq!(compute_even_split(80.0, 12.5, 0), one);
        assert_eq!(compute_even_split(80.0, 12.5, -5), one);
        assert_eq!(one, 90.0);
    }

    #[test]
    fn non_finite_inputs_degrade_to_zero() {
        assert_eq!(compute_even_split(f64::NAN, 10.0, 2), 0.0);
        assert_eq!(compute_even_split(100.0, f64::INFINITY, 2), 50.0);
        assert_eq!(compute_even_split(f64::MAX, f64::MAX, 1), 0.0);
    }

    #[test]
    fn lenient_parse_falls_back_to_zero_and_one() {
        let result = form("Bar", "abc", "12,50", "lots").parse_lenient();
        assert_eq!(result.total_bill_amount, 0.0);
        assert_eq!(result.tip_percentage, 0.0);
        assert_eq!(result.number_of_participants, 1);
        assert_eq!(result.amount_per_participant, 0.0);
    }

    #[test]
    fn lenient_parse_clamps_negative_numbers_to_zero() {
        let result = form("Bar", "3", "-90", "-200").parse_lenient();
        assert_eq!(result.total_bill_amount, 0.0);
        assert_eq!(result.tip_percentage, 0.0);
        assert_eq!(result.amount_per_participant, 0.0);

        let tipless = form("Bar", "3", "90", "-200").parse_lenient();
        assert_eq!(tipless.amount_per_participant, 30.0);
    }

    #[test]
    fn counts_beyond_u32_are_divided_exactly() {
        assert_eq!(compute_even_split(5e9, 0.0, 5_000_000_000), 1.0);
        assert_eq!(compute_even_split(1.0, 0.0, i64::MAX), 1.0 / i64::MAX as f64);

        let outcome = EvenSplitResult::new(5e9, 0.0, 5_000_000_000);
        assert_eq!(outcome.number_of_participants, 5_000_000_000);
        assert_eq!(outcome.amount_per_participant, 1.0);

        let strict = form("Stadium", "5000000000", "5000000000", "0").validate().unwrap();
        assert_eq!(strict.number_of_participants, 5_000_000_000);
        assert_eq!(strict.amount_per_participant, 1.0);
    }

    #[test]
    fn lenient_parse_accepts_well_formed_input() {
        let result = form("Bar", " 6 ", "567.5", "15").parse_lenient();
        assert_eq!(result.number_of_participants, 6);
        assert!((result.amount_per_participant - 108.770_833).abs() < 1e-5);
        assert!((result.total_with_tip() - 652.625).abs() < 1e-9);
    }

    #[test]
    fn strict_parse_rejects_each_malformed_field() {
        assert!(form("", "2", "10", "0").validate().unwrap_err().is_validation());
        assert!(form("Bar", "two", "10", "0").validate().is_err());
        assert!(form("Bar", "0", "10", "0").validate().is_err());
        assert!(form("Bar", "2", "ten", "0").validate().is_err());
        assert!(form("Bar", "2", "10", "").validate().is_err());
        assert!(form("Bar", "2", "-10", "0").validate().is_err());
        assert!(form("Bar", "2", "NaN", "0").validate().is_err());
        assert!(!form("Bar", "2", "10", "x").is_valid());
    }

    #[test]
    fn strict_parse_computes_the_same_outcome() {
        let strict = form("Bar", "4", "100", "20").validate().unwrap();
        assert_eq!(strict, form("Bar", "4", "100", "20").parse_lenient());
        assert_eq!(strict.amount_per_participant, 30.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for valid inputs the result is finite, non-negative and
        /// matches the closed-form expression.
        #[test]
        fn even_split_matches_formula(
            total in 0.0f64..1_000_000.0,
            tip in 0.0f64..300.0,
            n in 1i64..500,
        ) {
            let each = compute_even_split(total, tip, n);
            let expected = (total + total * tip / 100.0) / n as f64;
            prop_assert!(each.is_finite());
            prop_assert!(each >= 0.0);
            prop_assert!((each - expected).abs() <= 1e-9 * expected.max(1.0));
        }

        /// Property: any count below one behaves exactly like one.
        #[test]
        fn counts_below_one_behave_like_one(
            total in 0.0f64..10_000.0,
            tip in 0.0f64..100.0,
            n in i64::MIN..1,
        ) {
            prop_assert_eq!(compute_even_split(total, tip, n), compute_even_split(total, tip, 1));
        }
    }
}
