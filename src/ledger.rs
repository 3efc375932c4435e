//! Escrow custody seam.
//!
//! The engine instructs the ledger to move value atomically with each
//! state transition: deposits take custody of a stake, payouts release
//! custody back to a participant. The engine calls the fallible ledger
//! operation *before* mutating its own state so every operation stays
//! all-or-nothing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::types::{MarketError, ParticipantId};

/// Abstraction over the value-custody primitive.
pub trait Ledger: Send + Sync {
    /// Take custody of `amount` from the participant.
    fn deposit(&self, participant: &str, amount: u64) -> Result<(), MarketError>;

    /// Release `amount` of custodied value to the participant.
    /// Fails if the custodied pool cannot cover it.
    fn payout(&self, participant: &str, amount: u64) -> Result<(), MarketError>;

    /// Total value currently held in custody.
    fn custodied(&self) -> u64;
}

// ---------------------------------------------------------------------------
// In-memory ledger
// ---------------------------------------------------------------------------

/// Serializable snapshot of the in-memory ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub custodied: u64,
    pub paid_out: HashMap<ParticipantId, u64>,
}

/// In-memory custody pool.
///
/// Tracks the single custodied balance plus cumulative payouts per
/// participant (the latter is bookkeeping for audit and tests; the
/// solvency invariant only needs the pool total).
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<LedgerSnapshot>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a ledger from a persisted snapshot.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        MemoryLedger { inner: Mutex::new(snapshot) }
    }

    /// Current snapshot (for persistence).
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.inner.lock().unwrap().clone()
    }

    /// Cumulative amount paid out to a participant.
    pub fn paid_to(&self, participant: &str) -> u64 {
        self.inner
            .lock()
            .unwrap()
            .paid_out
            .get(participant)
            .copied()
            .unwrap_or(0)
    }
}

impl Ledger for MemoryLedger {
    fn deposit(&self, participant: &str, amount: u64) -> Result<(), MarketError> {
        let mut inner = self.inner.lock().unwrap();
        inner.custodied = inner
            .custodied
            .checked_add(amount)
            .ok_or(MarketError::CustodyOverflow)?;
        debug!(participant, amount, custodied = inner.custodied, "Deposit taken into custody");
        Ok(())
    }

    fn payout(&self, participant: &str, amount: u64) -> Result<(), MarketError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.custodied < amount {
            return Err(MarketError::InsufficientCustody {
                needed: amount,
                available: inner.custodied,
            });
        }
        inner.custodied -= amount;
        *inner.paid_out.entry(participant.to_string()).or_insert(0) += amount;
        debug!(participant, amount, custodied = inner.custodied, "Payout released from custody");
        Ok(())
    }

    fn custodied(&self) -> u64 {
        self.inner.lock().unwrap().custodied
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
