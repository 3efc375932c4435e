//! Fee configuration — administrator-controlled stake and fee
//! parameters, plus the integer fee arithmetic used by settlement.
//!
//! Amounts are integers in the smallest currency unit; fee deductions
//! use floor division so remainders accrue to the custodied residual
//! rather than being minted or lost.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::MarketError;

/// Unit stake size and fee percentages.
///
/// Mutated only by the administrator (between rounds, in practice);
/// read by every stake, refund, and claim operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Fixed minimum/multiple bet size in the smallest currency unit.
    pub unit_stake: u64,
    /// Percentage deducted when withdrawing a stake before settlement.
    pub refund_fee_pct: u8,
    /// Percentage deducted from winnings at settlement.
    pub claim_fee_pct: u8,
}

impl Default for FeeConfig {
    fn default() -> Self {
        FeeConfig {
            unit_stake: 1000,
            refund_fee_pct: 5,
            claim_fee_pct: 1,
        }
    }
}

impl fmt::Display for FeeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unit_stake={} refund_fee={}% claim_fee={}%",
            self.unit_stake, self.refund_fee_pct, self.claim_fee_pct,
        )
    }
}

impl FeeConfig {
    /// Build a validated fee config.
    pub fn new(unit_stake: u64, refund_fee_pct: u8, claim_fee_pct: u8) -> Result<Self, MarketError> {
        let cfg = FeeConfig { unit_stake, refund_fee_pct, claim_fee_pct };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check invariants: positive unit stake, percentages within 0–100.
    pub fn validate(&self) -> Result<(), MarketError> {
        if self.unit_stake == 0 {
            return Err(MarketError::InvalidFeeConfig(
                "unit stake must be positive".to_string(),
            ));
        }
        if self.refund_fee_pct > 100 {
            return Err(MarketError::InvalidFeeConfig(format!(
                "refund fee {}% exceeds 100%",
                self.refund_fee_pct
            )));
        }
        if self.claim_fee_pct > 100 {
            return Err(MarketError::InvalidFeeConfig(format!(
                "claim fee {}% exceeds 100%",
                self.claim_fee_pct
            )));
        }
        Ok(())
    }

    /// Whether an amount is a positive multiple of the unit stake.
    pub fn is_valid_stake(&self, amount: u64) -> bool {
        amount > 0 && amount % self.unit_stake == 0
    }

    /// Amount returned to a participant refunding `amount` before
    /// settlement: `amount × (100 − refund_fee) / 100`, floored.
    pub fn refund_net(&self, amount: u64) -> u64 {
        apply_fee(amount, self.refund_fee_pct)
    }

    /// Net claim payout for a gross winnings amount:
    /// `gross × (100 − claim_fee) / 100`, floored.
    pub fn claim_net(&self, gross: u64) -> u64 {
        apply_fee(gross, self.claim_fee_pct)
    }
}

/// `amount × (100 − fee_pct) / 100` with a u128 intermediate so the
/// multiplication cannot overflow for any u64 amount.
fn apply_fee(amount: u64, fee_pct: u8) -> u64 {
    let kept = (100 - fee_pct.min(100)) as u128;
    ((amount as u128 * kept) / 100) as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
