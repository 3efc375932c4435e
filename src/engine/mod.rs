//! The market engine.
//!
//! - `round` — versioned per-round storage and open/settle transitions
//! - `book` — the per-round order book
//! - `settlement` — pure payout arithmetic
//!
//! `MarketEngine` wires them together with the oracle and ledger seams
//! and is the single entry point for every state mutation. Callers
//! serialize access (the server holds one mutex around the engine), so
//! each operation runs validation, custody transfer, and mutation as
//! one atomic step.

pub mod book;
pub mod round;
pub mod settlement;

use std::sync::Arc;
use tracing::{info, warn};

use crate::fees::FeeConfig;
use crate::ledger::Ledger;
use crate::oracle::PriceOracle;
use crate::types::{MarketError, Order, Outcome, Round, RoundStatus, Trend};

use book::OrderBook;
use round::RoundTable;

/// The serialized state machine behind every market operation.
///
/// Fallible external calls (oracle sample, ledger transfer) happen
/// before any in-memory mutation, so a failure at any point leaves the
/// engine exactly as it was.
pub struct MarketEngine {
    fees: FeeConfig,
    rounds: RoundTable,
    book: OrderBook,
    oracle: Arc<dyn PriceOracle>,
    ledger: Arc<dyn Ledger>,
}

impl MarketEngine {
    pub fn new(fees: FeeConfig, oracle: Arc<dyn PriceOracle>, ledger: Arc<dyn Ledger>) -> Self {
        MarketEngine {
            fees,
            rounds: RoundTable::new(),
            book: OrderBook::new(),
            oracle,
            ledger,
        }
    }

    /// Rebuild an engine from persisted state.
    pub fn from_parts(
        fees: FeeConfig,
        rounds: RoundTable,
        book: OrderBook,
        oracle: Arc<dyn PriceOracle>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        MarketEngine { fees, rounds, book, oracle, ledger }
    }

    // -- Round lifecycle (scheduler-triggered) ----------------------------

    /// Open the next round at the oracle's current price.
    ///
    /// Rejected while a round is Open: the state machine enforces the
    /// once-per-period schedule rather than trusting the caller.
    pub fn start_round(&mut self) -> Result<u64, MarketError> {
        if let Some(open) = self.rounds.current_open() {
            return Err(MarketError::RoundAlreadyOpen(open.number));
        }
        let start_price = self.oracle.current_price()?;
        let number = self.rounds.open_next(start_price);

        info!(round = number, %start_price, "Round opened");
        Ok(number)
    }

    /// Lock and settle the open round at the oracle's current price.
    pub fn execute_round(&mut self) -> Result<(u64, Outcome), MarketError> {
        if self.rounds.current_open().is_none() {
            return Err(MarketError::NoOpenRound);
        }
        let end_price = self.oracle.current_price()?;
        let (number, outcome) = self.rounds.settle_current(end_price);

        let round = self.rounds.get(number).cloned();
        if let Some(r) = &round {
            info!(
                round = number,
                start_price = %r.start_price,
                %end_price,
                %outcome,
                up_total = r.up_total,
                down_total = r.down_total,
                "Round settled"
            );
        }
        if outcome == Outcome::Tie {
            warn!(round = number, "Round ended in a tie — no winning side, orders refundable");
        }
        Ok((number, outcome))
    }

    // -- Participant operations -------------------------------------------

    /// Stake `amount` on `trend` in the currently open round.
    pub fn place_order(
        &mut self,
        round: u64,
        participant: &str,
        trend: Trend,
        amount: u64,
    ) -> Result<(), MarketError> {
        match self.rounds.current_open() {
            Some(open) if open.number == round => {}
            _ => return Err(MarketError::RoundNotOpen(round)),
        }
        if !self.fees.is_valid_stake(amount) {
            return Err(MarketError::InvalidStakeAmount {
                amount,
                unit_stake: self.fees.unit_stake,
            });
        }
        if let Some(existing) = self.book.get(round, participant) {
            if existing.trend != trend {
                return Err(MarketError::TrendMismatch {
                    existing: existing.trend,
                    requested: trend,
                });
            }
        }

        // Custody first; in-memory mutation cannot fail after this.
        self.ledger.deposit(participant, amount)?;
        self.book.stake(round, participant, trend, amount);
        self.rounds.add_stake(round, trend, amount);

        info!(round, participant, %trend, amount, "Order placed");
        Ok(())
    }

    /// Withdraw a stake before settlement (or after a tie), minus the
    /// refund fee. The fee remainder stays in custody as residual.
    pub fn refund(&mut self, round: u64, participant: &str) -> Result<u64, MarketError> {
        let refundable = match self.rounds.get(round) {
            Some(r) if r.is_open() => true,
            // Tie rounds carry no winning side; stakes stay refundable.
            Some(r) if r.outcome == Some(Outcome::Tie) => true,
            _ => false,
        };
        if !refundable {
            return Err(MarketError::RoundNotOpen(round));
        }
        let order = self
            .book
            .get(round, participant)
            .cloned()
            .ok_or_else(|| MarketError::NoOrderFound {
                round,
                participant: participant.to_string(),
            })?;

        let net = self.fees.refund_net(order.amount);
        self.ledger.payout(participant, net)?;
        self.book.remove(round, participant);
        self.rounds.remove_stake(round, order.trend, order.amount);

        info!(round, participant, staked = order.amount, net, "Order refunded");
        Ok(net)
    }

    /// Claim winnings from a settled round: the stake back plus a
    /// pro-rata share of the losing pool, minus the claim fee.
    pub fn claim(&mut self, round: u64, participant: &str) -> Result<u64, MarketError> {
        let record = match self.rounds.get(round) {
            Some(r) if r.status == RoundStatus::Settled => r.clone(),
            _ => return Err(MarketError::RoundNotSettled(round)),
        };
        let order = self
            .book
            .get(round, participant)
            .cloned()
            .ok_or_else(|| MarketError::NoOrderFound {
                round,
                participant: participant.to_string(),
            })?;

        // Settled rounds always carry an outcome.
        let outcome = record.outcome.ok_or(MarketError::RoundNotSettled(round))?;
        if !outcome.is_winner(order.trend) {
            return Err(MarketError::NotWinningSide(round));
        }

        let winning_total = record.side_total(order.trend);
        let losing_total = record.side_total(order.trend.opposite());
        let gross = settlement::claim_gross(order.amount, winning_total, losing_total);
        let net = self.fees.claim_net(gross);

        self.ledger.payout(participant, net)?;
        self.book.remove(round, participant);

        info!(round, participant, staked = order.amount, gross, net, "Winnings claimed");
        Ok(net)
    }

    // -- Administration ---------------------------------------------------

    /// Replace the fee configuration. Intended between rounds, but the
    /// engine only validates the values; stake multiples are checked
    /// against the config in effect at each stake event.
    pub fn set_fee_config(&mut self, fees: FeeConfig) -> Result<(), MarketError> {
        fees.validate()?;
        info!(%fees, "Fee config updated");
        self.fees = fees;
        Ok(())
    }

    /// Withdraw accumulated fee residue to the administrator.
    ///
    /// Custody may never drop below the sum of all live orders' stakes
    /// across all rounds.
    pub fn withdraw_residual(&mut self, admin: &str, amount: u64) -> Result<(), MarketError> {
        let floor = self.solvency_floor();
        let available = self.ledger.custodied().saturating_sub(floor);
        if amount > available {
            return Err(MarketError::SolvencyViolation { requested: amount, floor });
        }
        self.ledger.payout(admin, amount)?;
        info!(admin, amount, floor, "Residual withdrawn");
        Ok(())
    }

    // -- Read interface (no side effects) ---------------------------------

    /// The latest round number (0 means no round has ever opened).
    pub fn current_round_number(&self) -> u64 {
        self.rounds.current_number()
    }

    pub fn round(&self, number: u64) -> Option<&Round> {
        self.rounds.get(number)
    }

    pub fn order(&self, round: u64, participant: &str) -> Option<&Order> {
        self.book.get(round, participant)
    }

    pub fn fees(&self) -> FeeConfig {
        self.fees
    }

    pub fn custodied(&self) -> u64 {
        self.ledger.custodied()
    }

    /// Sum of stakes the custody pool must keep covering: orders in
    /// the open round, winning-side orders not yet claimed, and tie
    /// round orders awaiting refund. Losing orders forfeit their stake
    /// at settlement and drop out of the floor.
    pub fn solvency_floor(&self) -> u64 {
        self.book
            .all_orders()
            .filter(|o| self.order_is_live(o))
            .map(|o| o.amount)
            .sum()
    }

    fn order_is_live(&self, order: &Order) -> bool {
        match self.rounds.get(order.round) {
            Some(r) if r.is_open() => true,
            Some(r) => match r.outcome {
                Some(Outcome::Tie) => true,
                Some(decided) => decided.is_winner(order.trend),
                None => true,
            },
            None => false,
        }
    }

    /// Persistable views of the engine's own state. The ledger is
    /// snapshotted separately by its owner.
    pub fn rounds_table(&self) -> &RoundTable {
        &self.rounds
    }

    pub fn order_book(&self) -> &OrderBook {
        &self.book
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::oracle::PostedOracle;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct Harness {
        engine: MarketEngine,
        oracle: Arc<PostedOracle>,
        ledger: Arc<MemoryLedger>,
    }

    /// Engine with the default production config: unit stake 1000,
    /// refund fee 5%, claim fee 1%.
    fn harness() -> Harness {
        let oracle = Arc::new(PostedOracle::new());
        let ledger = Arc::new(MemoryLedger::new());
        let engine = MarketEngine::new(
            FeeConfig::new(1000, 5, 1).unwrap(),
            oracle.clone() as Arc<dyn PriceOracle>,
            ledger.clone() as Arc<dyn Ledger>,
        );
        Harness { engine, oracle, ledger }
    }

    fn open_round_at(h: &mut Harness, price: Decimal) -> u64 {
        h.oracle.post(price).unwrap();
        h.engine.start_round().unwrap()
    }

    fn settle_at(h: &mut Harness, price: Decimal) -> Outcome {
        h.oracle.post(price).unwrap();
        h.engine.execute_round().unwrap().1
    }

    /// Side totals must always equal the sum of live orders, per round.
    fn assert_totals_invariant(h: &Harness, round: u64) {
        let r = h.engine.round(round).unwrap();
        let live: u64 = h.engine.order_book().orders_for_round(round).map(|o| o.amount).sum();
        assert_eq!(r.up_total + r.down_total, live);
    }

    // -- round lifecycle --

    #[test]
    fn test_start_round_samples_price() {
        let mut h = harness();
        let n = open_round_at(&mut h, dec!(100));
        assert_eq!(n, 1);
        let round = h.engine.round(1).unwrap();
        assert!(round.is_open());
        assert_eq!(round.start_price, dec!(100));
        assert_eq!(round.up_total, 0);
        assert_eq!(round.down_total, 0);
    }

    #[test]
    fn test_start_round_rejected_while_open() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        let err = h.engine.start_round().unwrap_err();
        assert_eq!(err, MarketError::RoundAlreadyOpen(1));
        // Counter untouched by the failed call
        assert_eq!(h.engine.current_round_number(), 1);
    }

    #[test]
    fn test_execute_round_requires_open() {
        let mut h = harness();
        h.oracle.post(dec!(100)).unwrap();
        assert_eq!(h.engine.execute_round().unwrap_err(), MarketError::NoOpenRound);
    }

    #[test]
    fn test_execute_round_records_outcome() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        let outcome = settle_at(&mut h, dec!(120));
        assert_eq!(outcome, Outcome::Up);

        let round = h.engine.round(1).unwrap();
        assert_eq!(round.status, RoundStatus::Settled);
        assert_eq!(round.end_price, Some(dec!(120)));
        assert!(round.settled_at.is_some());
    }

    #[test]
    fn test_oracle_failure_leaves_state_untouched() {
        let mut h = harness();
        // No price posted yet
        assert!(matches!(
            h.engine.start_round().unwrap_err(),
            MarketError::OracleUnavailable(_)
        ));
        assert_eq!(h.engine.current_round_number(), 0);
    }

    #[test]
    fn test_settled_totals_stay_frozen_next_round_zeroed() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 3000).unwrap();
        settle_at(&mut h, dec!(90));

        let n = open_round_at(&mut h, dec!(90));
        assert_eq!(n, 2);
        // Round 1's totals are frozen, round 2 starts from zero.
        assert_eq!(h.engine.round(1).unwrap().up_total, 3000);
        assert_eq!(h.engine.round(2).unwrap().up_total, 0);
        assert_eq!(h.engine.round(2).unwrap().down_total, 0);
    }

    // -- orders --

    #[test]
    fn test_place_order_escrows_stake() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 2000).unwrap();

        assert_eq!(h.ledger.custodied(), 2000);
        assert_eq!(h.engine.round(1).unwrap().up_total, 2000);
        let order = h.engine.order(1, "x").unwrap();
        assert_eq!(order.amount, 2000);
        assert_eq!(order.trend, Trend::Up);
        assert_totals_invariant(&h, 1);
    }

    #[test]
    fn test_place_order_accumulates_same_trend() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Down, 1000).unwrap();
        h.engine.place_order(1, "x", Trend::Down, 2000).unwrap();

        assert_eq!(h.engine.order(1, "x").unwrap().amount, 3000);
        assert_eq!(h.engine.round(1).unwrap().down_total, 3000);
        assert_totals_invariant(&h, 1);
    }

    #[test]
    fn test_place_order_rejects_side_switch() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 1000).unwrap();
        let err = h.engine.place_order(1, "x", Trend::Down, 1000).unwrap_err();
        assert_eq!(
            err,
            MarketError::TrendMismatch { existing: Trend::Up, requested: Trend::Down }
        );
        // Rejected stake took no custody
        assert_eq!(h.ledger.custodied(), 1000);
    }

    #[test]
    fn test_place_order_requires_open_round() {
        let mut h = harness();
        assert_eq!(
            h.engine.place_order(1, "x", Trend::Up, 1000).unwrap_err(),
            MarketError::RoundNotOpen(1)
        );

        open_round_at(&mut h, dec!(100));
        // Stale round number is rejected even while another round is open
        assert_eq!(
            h.engine.place_order(7, "x", Trend::Up, 1000).unwrap_err(),
            MarketError::RoundNotOpen(7)
        );
    }

    #[test]
    fn test_place_order_validates_stake_multiple() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        for bad in [0, 999, 1500] {
            assert_eq!(
                h.engine.place_order(1, "x", Trend::Up, bad).unwrap_err(),
                MarketError::InvalidStakeAmount { amount: bad, unit_stake: 1000 }
            );
        }
        assert_eq!(h.ledger.custodied(), 0);
    }

    #[test]
    fn test_unit_stake_change_between_rounds_mixes_multiples() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 1000).unwrap();
        // Unit stake changes mid-round; the existing order keeps its
        // old multiple and further stakes follow the new config.
        h.engine.set_fee_config(FeeConfig::new(700, 5, 1).unwrap()).unwrap();
        h.engine.place_order(1, "x", Trend::Up, 1400).unwrap();
        assert_eq!(h.engine.order(1, "x").unwrap().amount, 2400);
    }

    // -- refund --

    #[test]
    fn test_refund_before_lock() {
        // Stake 1000 up, refund before lock → 950 out, up_total back
        // to zero, order gone.
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 1000).unwrap();

        let net = h.engine.refund(1, "x").unwrap();
        assert_eq!(net, 950);
        assert_eq!(h.ledger.paid_to("x"), 950);
        assert!(h.engine.order(1, "x").is_none());
        assert_eq!(h.engine.round(1).unwrap().up_total, 0);
        // The 5% fee stays custodied as residual
        assert_eq!(h.ledger.custodied(), 50);
        assert_totals_invariant(&h, 1);
    }

    #[test]
    fn test_refund_requires_order() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        assert_eq!(
            h.engine.refund(1, "ghost").unwrap_err(),
            MarketError::NoOrderFound { round: 1, participant: "ghost".to_string() }
        );
    }

    #[test]
    fn test_refund_rejected_after_decided_settlement() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 1000).unwrap();
        settle_at(&mut h, dec!(120));
        assert_eq!(h.engine.refund(1, "x").unwrap_err(), MarketError::RoundNotOpen(1));
    }

    #[test]
    fn test_tie_round_claims_fail_refunds_allowed() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 1000).unwrap();
        h.engine.place_order(1, "y", Trend::Down, 1000).unwrap();
        assert_eq!(settle_at(&mut h, dec!(100)), Outcome::Tie);

        // No side can claim a tie
        assert_eq!(h.engine.claim(1, "x").unwrap_err(), MarketError::NotWinningSide(1));
        assert_eq!(h.engine.claim(1, "y").unwrap_err(), MarketError::NotWinningSide(1));

        // Both stakes stay refundable at the refund-fee rate
        assert_eq!(h.engine.refund(1, "x").unwrap(), 950);
        assert_eq!(h.engine.refund(1, "y").unwrap(), 950);
        assert_eq!(h.ledger.custodied(), 100);
    }

    // -- claim --

    #[test]
    fn test_claim_sole_winner_empty_losing_pool() {
        // Sole participant, up wins, no losing pool:
        // gross = 1000, net = 990.
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 1000).unwrap();
        settle_at(&mut h, dec!(120));

        assert_eq!(h.engine.claim(1, "x").unwrap(), 990);
        assert_eq!(h.ledger.paid_to("x"), 990);
        assert!(h.engine.order(1, "x").is_none());
        // 10 of claim fee remains custodied
        assert_eq!(h.ledger.custodied(), 10);
    }

    #[test]
    fn test_claim_takes_whole_losing_pool() {
        // x up 1000, y down 1000, up wins:
        // x: gross 2000, net 1980. y: NotWinningSide.
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 1000).unwrap();
        h.engine.place_order(1, "y", Trend::Down, 1000).unwrap();
        settle_at(&mut h, dec!(120));

        assert_eq!(h.engine.claim(1, "x").unwrap(), 1980);
        assert_eq!(h.engine.claim(1, "y").unwrap_err(), MarketError::NotWinningSide(1));
        assert_eq!(h.ledger.custodied(), 20);
    }

    #[test]
    fn test_second_claim_fails() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 1000).unwrap();
        settle_at(&mut h, dec!(120));

        h.engine.claim(1, "x").unwrap();
        assert_eq!(
            h.engine.claim(1, "x").unwrap_err(),
            MarketError::NoOrderFound { round: 1, participant: "x".to_string() }
        );
    }

    #[test]
    fn test_claim_before_settlement_fails() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 1000).unwrap();
        assert_eq!(h.engine.claim(1, "x").unwrap_err(), MarketError::RoundNotSettled(1));
    }

    #[test]
    fn test_claim_payout_monotonic_in_stake() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "small", Trend::Up, 1000).unwrap();
        h.engine.place_order(1, "big", Trend::Up, 2000).unwrap();
        h.engine.place_order(1, "loser", Trend::Down, 5000).unwrap();
        settle_at(&mut h, dec!(150));

        let small = h.engine.claim(1, "small").unwrap();
        let big = h.engine.claim(1, "big").unwrap();
        assert!(big >= small);
        // 2× the stake earns at least 2× within a unit of rounding
        assert!(big >= small * 2 - 1);
    }

    #[test]
    fn test_claim_down_side_wins_on_price_drop() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "bear", Trend::Down, 1000).unwrap();
        h.engine.place_order(1, "bull", Trend::Up, 1000).unwrap();
        assert_eq!(settle_at(&mut h, dec!(80)), Outcome::Down);

        assert_eq!(h.engine.claim(1, "bear").unwrap(), 1980);
        assert_eq!(h.engine.claim(1, "bull").unwrap_err(), MarketError::NotWinningSide(1));
    }

    #[test]
    fn test_claim_still_works_after_later_rounds() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 1000).unwrap();
        settle_at(&mut h, dec!(110));

        // Two more full rounds elapse
        open_round_at(&mut h, dec!(110));
        settle_at(&mut h, dec!(105));
        open_round_at(&mut h, dec!(105));

        // Round 1's frozen totals still settle the old claim
        assert_eq!(h.engine.claim(1, "x").unwrap(), 990);
    }

    // -- admin --

    #[test]
    fn test_set_fee_config_validates() {
        let mut h = harness();
        let err = h
            .engine
            .set_fee_config(FeeConfig { unit_stake: 0, refund_fee_pct: 5, claim_fee_pct: 1 })
            .unwrap_err();
        assert!(matches!(err, MarketError::InvalidFeeConfig(_)));
        // Old config still in force
        assert_eq!(h.engine.fees().unit_stake, 1000);

        h.engine.set_fee_config(FeeConfig::new(500, 10, 2).unwrap()).unwrap();
        assert_eq!(h.engine.fees().unit_stake, 500);
    }

    #[test]
    fn test_withdraw_residual_respects_solvency_floor() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 1000).unwrap();
        // Refund leaves 50 of residual; x's order is gone, y's stays live.
        h.engine.place_order(1, "y", Trend::Down, 1000).unwrap();
        h.engine.refund(1, "x").unwrap();

        // custodied = 1050, floor = 1000 → at most 50 withdrawable
        assert_eq!(
            h.engine.withdraw_residual("admin", 51).unwrap_err(),
            MarketError::SolvencyViolation { requested: 51, floor: 1000 }
        );
        h.engine.withdraw_residual("admin", 50).unwrap();
        assert_eq!(h.ledger.paid_to("admin"), 50);
        assert_eq!(h.ledger.custodied(), 1000);
    }

    #[test]
    fn test_withdraw_residual_floor_spans_settled_rounds() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 1000).unwrap();
        settle_at(&mut h, dec!(120));
        // Unclaimed winning order still backs the custody pool.
        assert_eq!(
            h.engine.withdraw_residual("admin", 1).unwrap_err(),
            MarketError::SolvencyViolation { requested: 1, floor: 1000 }
        );
    }

    #[test]
    fn test_losing_orders_drop_out_of_floor() {
        let mut h = harness();
        open_round_at(&mut h, dec!(100));
        h.engine.place_order(1, "x", Trend::Up, 1000).unwrap();
        h.engine.place_order(1, "y", Trend::Down, 1000).unwrap();
        settle_at(&mut h, dec!(120));

        // y's stake is forfeit; only x's unclaimed win backs custody.
        assert_eq!(h.engine.solvency_floor(), 1000);

        h.engine.claim(1, "x").unwrap();
        assert_eq!(h.engine.solvency_floor(), 0);
        // The 20 of claim fee is free residual.
        h.engine.withdraw_residual("admin", 20).unwrap();
        assert_eq!(h.ledger.custodied(), 0);
    }
}
