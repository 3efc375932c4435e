//! Shared types for the TRENDPOOL engine.
//!
//! These types form the data model used across all modules: round and
//! order records, the trend/outcome enums, and the domain error enum.
//! They are designed to be stable so that the engine, server, and
//! storage modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque participant credential (address-like, supplied by the
/// custody layer). The core never interprets it.
pub type ParticipantId = String;

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

/// The side a participant bets on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// The opposite trend.
    pub fn opposite(&self) -> Self {
        match self {
            Trend::Up => Trend::Down,
            Trend::Down => Trend::Up,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "UP"),
            Trend::Down => write!(f, "DOWN"),
        }
    }
}

impl std::str::FromStr for Trend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Trend::Up),
            "down" => Ok(Trend::Down),
            _ => Err(anyhow::anyhow!("Unknown trend: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Round
// ---------------------------------------------------------------------------

/// Round lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    Open,
    Settled,
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundStatus::Open => write!(f, "OPEN"),
            RoundStatus::Settled => write!(f, "SETTLED"),
        }
    }
}

/// Direction of price movement between the round's start and end
/// samples, recorded at settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Up,
    Down,
    /// End price equal to start price. No side can claim; orders stay
    /// refundable at the refund-fee rate.
    Tie,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Up => write!(f, "UP"),
            Outcome::Down => write!(f, "DOWN"),
            Outcome::Tie => write!(f, "TIE"),
        }
    }
}

impl Outcome {
    /// Whether an order on the given trend won this round.
    pub fn is_winner(&self, trend: Trend) -> bool {
        matches!(
            (self, trend),
            (Outcome::Up, Trend::Up) | (Outcome::Down, Trend::Down)
        )
    }
}

/// One cycle of the market, identified by a monotonically increasing
/// round number (0 is reserved for "no round yet").
///
/// Totals are frozen at settlement and kept per round number — the
/// next round gets its own zeroed record rather than overwriting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub number: u64,
    pub status: RoundStatus,
    pub start_price: Decimal,
    /// Absent until the round is settled.
    pub end_price: Option<Decimal>,
    pub up_total: u64,
    pub down_total: u64,
    pub outcome: Option<Outcome>,
    pub opened_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Round {
    /// Create a fresh Open round at the given price sample.
    pub fn open(number: u64, start_price: Decimal) -> Self {
        Round {
            number,
            status: RoundStatus::Open,
            start_price,
            end_price: None,
            up_total: 0,
            down_total: 0,
            outcome: None,
            opened_at: Utc::now(),
            settled_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == RoundStatus::Open
    }

    /// Total staked on the given trend.
    pub fn side_total(&self, trend: Trend) -> u64 {
        match trend {
            Trend::Up => self.up_total,
            Trend::Down => self.down_total,
        }
    }

    /// Combined pool for this round.
    pub fn pool_total(&self) -> u64 {
        self.up_total + self.down_total
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Round #{} [{}] start={} end={} up={} down={}",
            self.number,
            self.status,
            self.start_price,
            self.end_price
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            self.up_total,
            self.down_total,
        )
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// A participant's cumulative stake on one trend within one round.
///
/// Exists only while its round is live or until claimed/refunded;
/// refunding or claiming deletes it. The amount is always a positive
/// multiple of the unit stake in effect at each stake event (the unit
/// stake can change between rounds, so an order may mix multiples from
/// different fee configs — not an error).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub round: u64,
    pub participant: ParticipantId,
    pub trend: Trend,
    pub amount: u64,
    pub placed_at: DateTime<Utc>,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[round {}] {} {} {}",
            self.round, self.participant, self.trend, self.amount,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for TRENDPOOL.
///
/// Every failure leaves round/order/ledger state exactly as before the
/// call; nothing is partially applied and nothing is swallowed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MarketError {
    // -- state errors (wrong round phase) --
    #[error("Round {0} is already open")]
    RoundAlreadyOpen(u64),

    #[error("No round is currently open")]
    NoOpenRound,

    #[error("Round {0} is not open")]
    RoundNotOpen(u64),

    #[error("Round {0} is not settled")]
    RoundNotSettled(u64),

    // -- validation errors --
    #[error("Stake of {amount} is not a positive multiple of the unit stake {unit_stake}")]
    InvalidStakeAmount { amount: u64, unit_stake: u64 },

    #[error("Order already placed on {existing}, cannot stake {requested} in the same round")]
    TrendMismatch { existing: Trend, requested: Trend },

    #[error("Invalid fee config: {0}")]
    InvalidFeeConfig(String),

    // -- not found --
    #[error("No order found for {participant} in round {round}")]
    NoOrderFound { round: u64, participant: ParticipantId },

    #[error("Order is not on the winning side of round {0}")]
    NotWinningSide(u64),

    // -- authorization --
    #[error("Unauthorized")]
    Unauthorized,

    // -- solvency --
    #[error("Withdrawal of {requested} would drop custody below the {floor} owed to live orders")]
    SolvencyViolation { requested: u64, floor: u64 },

    #[error("Insufficient custodied funds: need {needed}, have {available}")]
    InsufficientCustody { needed: u64, available: u64 },

    #[error("Custody balance overflow")]
    CustodyOverflow,

    // -- oracle --
    #[error("Price sample unavailable: {0}")]
    OracleUnavailable(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
