//! Per-round order book.
//!
//! Orders are keyed by (round number, participant). The book only
//! stores live orders — refunds and claims delete their entry — so the
//! sum over the whole book is exactly the custody solvency floor.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{Order, ParticipantId, Trend};

/// All live orders, grouped per round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBook {
    orders: HashMap<u64, HashMap<ParticipantId, Order>>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, round: u64, participant: &str) -> Option<&Order> {
        self.orders.get(&round)?.get(participant)
    }

    /// Add stake to the participant's order in the round, creating it
    /// on first stake. Trend compatibility is validated by the engine
    /// before this is called.
    pub fn stake(&mut self, round: u64, participant: &str, trend: Trend, amount: u64) {
        self.orders
            .entry(round)
            .or_default()
            .entry(participant.to_string())
            .and_modify(|o| o.amount += amount)
            .or_insert_with(|| Order {
                round,
                participant: participant.to_string(),
                trend,
                amount,
                placed_at: Utc::now(),
            });
    }

    /// Delete and return an order (refund or claim).
    pub fn remove(&mut self, round: u64, participant: &str) -> Option<Order> {
        let per_round = self.orders.get_mut(&round)?;
        let order = per_round.remove(participant);
        if per_round.is_empty() {
            self.orders.remove(&round);
        }
        order
    }

    /// Live orders of one round.
    pub fn orders_for_round(&self, round: u64) -> impl Iterator<Item = &Order> {
        self.orders.get(&round).into_iter().flat_map(|m| m.values())
    }

    /// All booked orders across every round.
    pub fn all_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values().flat_map(|m| m.values())
    }

    /// Sum of every booked order's stake.
    pub fn live_total(&self) -> u64 {
        self.all_orders().map(|o| o.amount).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
