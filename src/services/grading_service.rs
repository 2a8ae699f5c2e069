use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Error, Result};

/// Largest value a `NUMERIC(10, 2)` score column holds.
pub const MAX_STORED_SCORE: f64 = 99_999_999.99;

pub struct GradingService;

impl GradingService {
    /// Converts a client-supplied score into a two-decimal `Decimal`.
    pub fn score_from_f64(value: f64, field: &str) -> Result<Decimal> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::BadRequest(format!(
                "{} must be a non-negative number",
                field
            )));
        }
        if value > MAX_STORED_SCORE {
            return Err(Error::BadRequest(format!(
                "{} must not exceed {}",
                field, MAX_STORED_SCORE
            )));
        }
        let decimal = Decimal::from_f64(value)
            .ok_or_else(|| Error::BadRequest(format!("{} is out of range", field)))?;
        Ok(round2(decimal))
    }

    /// `score / max_score * 100`, rounded half away from zero to two decimals
    /// and clamped to 0..=100. A zero maximum yields 0.
    pub fn percentage(score: Decimal, max_score: Decimal) -> Decimal {
        if max_score <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let raw = score / max_score * Decimal::ONE_HUNDRED;
        round2(raw).clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
    }

    pub fn is_passing(percentage: Decimal, passing_threshold: Decimal) -> bool {
        percentage >= passing_threshold
    }
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(GradingService::percentage(dec("1"), dec("3")), dec("33.33"));
        assert_eq!(GradingService::percentage(dec("2"), dec("3")), dec("66.67"));
        assert_eq!(GradingService::percentage(dec("7"), dec("10")), dec("70"));
    }

    #[test]
    fn zero_max_score_is_zero_percent() {
        assert_eq!(GradingService::percentage(dec("5"), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn percentage_is_clamped() {
        assert_eq!(GradingService::percentage(dec("12"), dec("10")), dec("100"));
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(GradingService::is_passing(dec("50"), dec("50")));
        assert!(!GradingService::is_passing(dec("49.99"), dec("50")));
    }

    #[test]
    fn rejects_negative_and_non_finite_scores() {
        assert!(GradingService::score_from_f64(-1.0, "score").is_err());
        assert!(GradingService::score_from_f64(f64::NAN, "score").is_err());
        assert_eq!(GradingService::score_from_f64(7.5, "score").unwrap(), dec("7.5"));
    }

    #[test]
    fn rejects_scores_the_store_cannot_hold() {
        assert!(matches!(
            GradingService::score_from_f64(1.0e9, "maxScore"),
            Err(Error::BadRequest(_))
        ));
        assert_eq!(
            GradingService::score_from_f64(MAX_STORED_SCORE, "maxScore").unwrap(),
            dec("99999999.99")
        );
    }
}
