//! Balances and ledger amounts are persisted as i64 minor units (cents) so
//! storage-level increments stay atomic; services and DTOs work in exact
//! `Decimal` values. Credits truncate toward zero when converted to cents,
//! which keeps the sum of rate shares within the exact rate bound.

use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

const CENTS_PER_UNIT: i64 = 100;

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Truncates to whole cents. None on values outside the i64 cent range.
pub fn to_cents(amount: Decimal) -> Option<i64> {
    (amount.round_dp_with_strategy(2, RoundingStrategy::ToZero) * Decimal::from(CENTS_PER_UNIT)).to_i64()
}

/// Applies a fractional rate to an amount held in cents.
pub fn rate_of_cents(cents: i64, rate: Decimal) -> Option<i64> {
    to_cents(from_cents(cents) * rate)
}
