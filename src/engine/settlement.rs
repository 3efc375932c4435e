//! Pure settlement arithmetic.
//!
//! No side effects here: given price samples and frozen round totals,
//! compute the outcome and payout figures. All division is integer
//! floor division; rounding remainders stay in the custody pool as
//! residual rather than being created or destroyed.

use rust_decimal::Decimal;

use crate::types::Outcome;

/// Direction of price movement between the round's two samples.
pub fn outcome(start_price: Decimal, end_price: Decimal) -> Outcome {
    match end_price.cmp(&start_price) {
        std::cmp::Ordering::Greater => Outcome::Up,
        std::cmp::Ordering::Less => Outcome::Down,
        std::cmp::Ordering::Equal => Outcome::Tie,
    }
}

/// Gross claim payout before the claim fee: the stake back plus the
/// stake's pro-rata share of the losing pool.
///
/// `share = amount / winning_total`; `gross = amount + share × losing_total`,
/// computed as `amount + amount × losing_total / winning_total` with a
/// u128 intermediate so the product cannot overflow.
///
/// The caller guarantees `winning_total >= amount > 0` (the order is a
/// live member of the winning side).
pub fn claim_gross(amount: u64, winning_total: u64, losing_total: u64) -> u64 {
    debug_assert!(amount > 0 && winning_total >= amount);
    let bonus = (amount as u128 * losing_total as u128) / winning_total as u128;
    amount + bonus as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
