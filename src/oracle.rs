//! Price oracle seam.
//!
//! The engine treats the oracle as a black box that synchronously
//! returns the current price sample or fails. `PostedOracle` is the
//! production implementation: the trusted oracle identity posts price
//! samples inbound (over the authorized HTTP route) and the engine
//! reads the latest one at round open/lock. Oracle failures propagate
//! to the caller; the external scheduler owns retries.

use rust_decimal::Decimal;
use std::sync::Mutex;

use crate::types::MarketError;

/// Abstraction over the trusted price feed.
pub trait PriceOracle: Send + Sync {
    /// The current price sample (positive, fixed precision).
    fn current_price(&self) -> Result<Decimal, MarketError>;
}

/// Oracle backed by the most recently posted price sample.
///
/// Starts empty; `current_price` fails until the first sample arrives.
#[derive(Debug, Default)]
pub struct PostedOracle {
    last: Mutex<Option<Decimal>>,
}

impl PostedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample from the trusted oracle identity.
    /// Non-positive prices are rejected.
    pub fn post(&self, price: Decimal) -> Result<(), MarketError> {
        if price <= Decimal::ZERO {
            return Err(MarketError::OracleUnavailable(format!(
                "non-positive price sample: {price}"
            )));
        }
        *self.last.lock().unwrap() = Some(price);
        Ok(())
    }
}

impl PriceOracle for PostedOracle {
    fn current_price(&self) -> Result<Decimal, MarketError> {
        self.last
            .lock()
            .unwrap()
            .ok_or_else(|| MarketError::OracleUnavailable("no price sample posted yet".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
