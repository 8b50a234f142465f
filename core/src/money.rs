//! Exact-decimal money helpers.
//!
//! RULE: Money is `Decimal` everywhere in the pipeline and integer minor
//! units (cents) in the database, so SQL `SUM` never rounds. Commission
//! rates are fractional with four decimal places (0.1500 = 15%) and are
//! stored scaled by 10_000.

use crate::error::{SettlementError, SettlementResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places of a money amount (minor-unit scale).
pub const MONEY_SCALE: u32 = 2;

/// Decimal places of a commission rate.
pub const RATE_SCALE: u32 = 4;

/// A stored minor-unit amount as an exact decimal, e.g. 12345 -> 123.45.
pub fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, MONEY_SCALE)
}

/// A decimal amount as integer minor units, e.g. 123.45 -> 12345.
///
/// Fails if the amount carries sub-cent precision or does not fit in an
/// `i64`. Amounts reach this point already rounded to two places, so an
/// error here means a bug upstream, and it must surface loudly.
pub fn to_minor(amount: Decimal) -> SettlementResult<i64> {
    let scaled = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(SettlementError::AmountPrecision { amount })?;
    if scaled != scaled.trunc() {
        return Err(SettlementError::AmountPrecision { amount });
    }
    scaled
        .to_i64()
        .ok_or(SettlementError::AmountPrecision { amount })
}

/// A stored basis-points rate as a fractional decimal, e.g. 1500 -> 0.1500.
pub fn from_rate_bps(bps: i64) -> Decimal {
    Decimal::new(bps, RATE_SCALE)
}

/// A fractional rate as stored basis points, e.g. 0.1500 -> 1500.
pub fn to_rate_bps(rate: Decimal) -> SettlementResult<i64> {
    let scaled = rate
        .checked_mul(Decimal::new(10_000, 0))
        .ok_or(SettlementError::AmountPrecision { amount: rate })?;
    if scaled != scaled.trunc() {
        return Err(SettlementError::AmountPrecision { amount: rate });
    }
    scaled
        .to_i64()
        .ok_or(SettlementError::AmountPrecision { amount: rate })
}

/// Round to two decimal places, half away from zero (12.005 -> 12.01).
pub fn round_half_up(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn minor_units_round_trip() {
        assert_eq!(to_minor(dec!(123.45)).unwrap(), 12345);
        assert_eq!(from_minor(12345), dec!(123.45));
        assert_eq!(to_minor(dec!(0.00)).unwrap(), 0);
        assert_eq!(to_minor(dec!(-7.50)).unwrap(), -750);
    }

    #[test]
    fn sub_cent_precision_is_rejected() {
        let err = to_minor(dec!(1.005)).unwrap_err();
        assert!(
            matches!(err, SettlementError::AmountPrecision { .. }),
            "expected AmountPrecision, got {err:?}"
        );
    }

    #[test]
    fn rate_round_trip() {
        assert_eq!(to_rate_bps(dec!(0.1500)).unwrap(), 1500);
        assert_eq!(from_rate_bps(800), dec!(0.0800));
        assert!(to_rate_bps(dec!(0.12345)).is_err());
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_half_up(dec!(12.005)), dec!(12.01));
        assert_eq!(round_half_up(dec!(12.004)), dec!(12.00));
        assert_eq!(round_half_up(dec!(-12.005)), dec!(-12.01));
        assert_eq!(round_half_up(dec!(12.0)), dec!(12.00));
    }
}
