//! Persistence layer.
//!
//! Saves and loads the full market state (fees, round table, order
//! book, ledger custody) as a JSON snapshot after every mutating call.
//! JSON is sufficient here; the state is one document written whole.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::engine::book::OrderBook;
use crate::engine::round::RoundTable;
use crate::fees::FeeConfig;
use crate::ledger::LedgerSnapshot;

/// Default snapshot file path.
const DEFAULT_STATE_FILE: &str = "trendpool_state.json";

/// Everything needed to rebuild the engine and ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub fees: FeeConfig,
    pub rounds: RoundTable,
    pub book: OrderBook,
    pub ledger: LedgerSnapshot,
    pub saved_at: DateTime<Utc>,
}

/// Save a snapshot to a JSON file.
pub fn save_snapshot(snapshot: &MarketSnapshot, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);
    let json = serde_json::to_string_pretty(snapshot)
        .context("Failed to serialise market snapshot")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write snapshot to {path}"))?;

    debug!(
        path,
        round = snapshot.rounds.current_number(),
        custodied = snapshot.ledger.custodied,
        "Snapshot saved"
    );
    Ok(())
}

/// Load a snapshot from a JSON file.
/// Returns None if the file doesn't exist (fresh start).
pub fn load_snapshot(path: Option<&str>) -> Result<Option<MarketSnapshot>> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved state found, starting fresh");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read snapshot from {path}"))?;

    let snapshot: MarketSnapshot = serde_json::from_str(&json)
        .context(format!("Failed to parse snapshot from {path}"))?;

    info!(
        path,
        round = snapshot.rounds.current_number(),
        custodied = snapshot.ledger.custodied,
        live_orders = snapshot.book.live_total(),
        "State loaded from disk"
    );

    Ok(Some(snapshot))
}

/// Delete the snapshot file (for testing or reset).
pub fn delete_snapshot(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete snapshot file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
