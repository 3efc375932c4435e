//! Versioned round storage.
//!
//! Rounds live in a table keyed by round number; a settled round's
//! record (prices, frozen totals, outcome) is kept forever so late
//! claims always read the totals of their own round, never a newer
//! round's counters.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::engine::settlement;
use crate::types::{Outcome, Round, RoundStatus, Trend};

/// Table of all rounds plus the monotonically increasing counter.
/// At most one round is Open at any time: the latest one, and only
/// until `settle_current` runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundTable {
    rounds: BTreeMap<u64, Round>,
    /// Latest round number; 0 means no round has ever opened.
    current: u64,
}

impl RoundTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_number(&self) -> u64 {
        self.current
    }

    /// The currently open round, if any.
    pub fn current_open(&self) -> Option<&Round> {
        self.rounds.get(&self.current).filter(|r| r.is_open())
    }

    pub fn get(&self, number: u64) -> Option<&Round> {
        self.rounds.get(&number)
    }

    /// Open the next round at the given price sample and return its
    /// number. The caller must have checked that no round is open.
    pub fn open_next(&mut self, start_price: Decimal) -> u64 {
        self.current += 1;
        self.rounds.insert(self.current, Round::open(self.current, start_price));
        self.current
    }

    /// Settle the open round at the given end price, freezing its
    /// totals, and return its number and outcome. The caller must have
    /// checked that a round is open.
    pub fn settle_current(&mut self, end_price: Decimal) -> (u64, Outcome) {
        let round = self
            .rounds
            .get_mut(&self.current)
            .filter(|r| r.is_open())
            .expect("settle_current called without an open round");

        let outcome = settlement::outcome(round.start_price, end_price);
        round.end_price = Some(end_price);
        round.outcome = Some(outcome);
        round.status = RoundStatus::Settled;
        round.settled_at = Some(Utc::now());
        (round.number, outcome)
    }

    /// Increase a side total after an order is placed.
    pub fn add_stake(&mut self, number: u64, trend: Trend, amount: u64) {
        if let Some(round) = self.rounds.get_mut(&number) {
            match trend {
                Trend::Up => round.up_total += amount,
                Trend::Down => round.down_total += amount,
            }
        }
    }

    /// Decrease a side total after an order is refunded.
    pub fn remove_stake(&mut self, number: u64, trend: Trend, amount: u64) {
        if let Some(round) = self.rounds.get_mut(&number) {
            match trend {
                Trend::Up => round.up_total = round.up_total.saturating_sub(amount),
                Trend::Down => round.down_total = round.down_total.saturating_sub(amount),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
