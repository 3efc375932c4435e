//! API route handlers.
//!
//! All endpoints return JSON. The engine lives behind a single mutex in
//! `Arc<ServiceState>`; every mutating handler holds it for the whole
//! validation + custody + mutation sequence, then snapshots state to
//! disk before releasing it.
//!
//! Three trusted identities authorize the privileged routes by bearer
//! token: the administrator (fees, residual withdrawal), the scheduler
//! (round open/lock), and the price oracle (samples). Participants are
//! identified by the opaque credential in their request body.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::error;

use crate::engine::MarketEngine;
use crate::fees::FeeConfig;
use crate::ledger::MemoryLedger;
use crate::oracle::PostedOracle;
use crate::storage::{self, MarketSnapshot};
use crate::types::{MarketError, Outcome, Round, Trend};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Bearer tokens for the three trusted identities.
pub struct AuthTokens {
    pub admin: Secret<String>,
    pub scheduler: Secret<String>,
    pub oracle: Secret<String>,
}

impl AuthTokens {
    pub fn new(admin: String, scheduler: String, oracle: String) -> Self {
        AuthTokens {
            admin: Secret::new(admin),
            scheduler: Secret::new(scheduler),
            oracle: Secret::new(oracle),
        }
    }
}

/// Shared state accessible by all route handlers.
pub struct ServiceState {
    pub engine: Mutex<MarketEngine>,
    pub oracle: Arc<PostedOracle>,
    pub ledger: Arc<MemoryLedger>,
    pub tokens: AuthTokens,
    /// Snapshot path; None disables persistence (tests).
    pub state_file: Option<String>,
}

pub type AppState = Arc<ServiceState>;

/// Write the current state to disk. Persistence failure is logged, not
/// returned — the in-memory transition has already committed.
fn persist(state: &ServiceState, engine: &MarketEngine) {
    let Some(path) = &state.state_file else { return };
    let snapshot = MarketSnapshot {
        fees: engine.fees(),
        rounds: engine.rounds_table().clone(),
        book: engine.order_book().clone(),
        ledger: state.ledger.snapshot(),
        saved_at: Utc::now(),
    };
    if let Err(e) = storage::save_snapshot(&snapshot, Some(path)) {
        error!(error = %e, path, "Failed to persist state snapshot");
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// JSON body for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Wraps domain errors (and plain read misses) for axum responses.
#[derive(Debug)]
pub enum ApiError {
    Market(MarketError),
    NotFound(String),
}

impl From<MarketError> for ApiError {
    fn from(e: MarketError) -> Self {
        ApiError::Market(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use MarketError::*;
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Market(e) => {
                let status = match &e {
                    RoundAlreadyOpen(_) | NoOpenRound | RoundNotOpen(_) | RoundNotSettled(_) => {
                        StatusCode::CONFLICT
                    }
                    InvalidStakeAmount { .. } | TrendMismatch { .. } | InvalidFeeConfig(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    NoOrderFound { .. } | NotWinningSide(_) => StatusCode::NOT_FOUND,
                    Unauthorized => StatusCode::UNAUTHORIZED,
                    SolvencyViolation { .. } | InsufficientCustody { .. } | CustodyOverflow => {
                        StatusCode::CONFLICT
                    }
                    OracleUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, e.to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Extract and compare the bearer token against one trusted identity.
fn authorize(headers: &HeaderMap, expected: &Secret<String>) -> Result<(), ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match token {
        Some(t) if t == expected.expose_secret() => Ok(()),
        _ => Err(ApiError::Market(MarketError::Unauthorized)),
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub round: u64,
    pub participant: String,
    pub trend: Trend,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct OrderRefRequest {
    pub round: u64,
    pub participant: String,
}

#[derive(Debug, Deserialize)]
pub struct FeesRequest {
    pub unit_stake: u64,
    pub refund_fee_pct: u8,
    pub claim_fee_pct: u8,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    /// Credential the custody layer pays the residue out to.
    pub destination: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundResponse {
    pub number: u64,
    pub status: String,
    pub start_price: Decimal,
    pub end_price: Option<Decimal>,
    pub up_total: u64,
    pub down_total: u64,
    pub outcome: Option<Outcome>,
}

impl From<&Round> for RoundResponse {
    fn from(r: &Round) -> Self {
        RoundResponse {
            number: r.number,
            status: r.status.to_string(),
            start_price: r.start_price,
            end_price: r.end_price,
            up_total: r.up_total,
            down_total: r.down_total,
            outcome: r.outcome,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub round: u64,
    pub participant: String,
    pub trend: Trend,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettledResponse {
    pub round: u64,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayoutResponse {
    pub round: u64,
    pub participant: String,
    pub payout: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub current_round: u64,
    pub custodied: u64,
    pub live_orders_total: u64,
}

// ---------------------------------------------------------------------------
// Trigger routes (scheduler identity)
// ---------------------------------------------------------------------------

/// POST /api/rounds/open — the scheduler's round-open-time trigger.
pub async fn open_round(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RoundResponse>, ApiError> {
    authorize(&headers, &state.tokens.scheduler)?;
    let mut engine = state.engine.lock().unwrap();
    let number = engine.start_round()?;
    persist(&state, &engine);
    // The round we just opened always exists.
    let round = engine.round(number).ok_or(MarketError::NoOpenRound)?;
    Ok(Json(RoundResponse::from(round)))
}

/// POST /api/rounds/lock — the scheduler's round-lock-time trigger.
pub async fn lock_round(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SettledResponse>, ApiError> {
    authorize(&headers, &state.tokens.scheduler)?;
    let mut engine = state.engine.lock().unwrap();
    let (round, outcome) = engine.execute_round()?;
    persist(&state, &engine);
    Ok(Json(SettledResponse { round, outcome }))
}

/// POST /api/oracle/price — the trusted oracle posts a sample.
pub async fn post_price(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PriceRequest>,
) -> Result<StatusCode, ApiError> {
    authorize(&headers, &state.tokens.oracle)?;
    state.oracle.post(req.price)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Participant routes
// ---------------------------------------------------------------------------

/// POST /api/orders — stake on the open round.
pub async fn place_order(
    State(state): State<AppState>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let mut engine = state.engine.lock().unwrap();
    engine.place_order(req.round, &req.participant, req.trend, req.amount)?;
    persist(&state, &engine);
    let order = engine
        .order(req.round, &req.participant)
        .ok_or_else(|| MarketError::NoOrderFound {
            round: req.round,
            participant: req.participant.clone(),
        })?;
    Ok(Json(OrderResponse {
        round: order.round,
        participant: order.participant.clone(),
        trend: order.trend,
        amount: order.amount,
    }))
}

/// POST /api/orders/refund — withdraw a stake, minus the refund fee.
pub async fn refund_order(
    State(state): State<AppState>,
    Json(req): Json<OrderRefRequest>,
) -> Result<Json<PayoutResponse>, ApiError> {
    let mut engine = state.engine.lock().unwrap();
    let payout = engine.refund(req.round, &req.participant)?;
    persist(&state, &engine);
    Ok(Json(PayoutResponse { round: req.round, participant: req.participant, payout }))
}

/// POST /api/orders/claim — collect winnings from a settled round.
pub async fn claim_order(
    State(state): State<AppState>,
    Json(req): Json<OrderRefRequest>,
) -> Result<Json<PayoutResponse>, ApiError> {
    let mut engine = state.engine.lock().unwrap();
    let payout = engine.claim(req.round, &req.participant)?;
    persist(&state, &engine);
    Ok(Json(PayoutResponse { round: req.round, participant: req.participant, payout }))
}

// ---------------------------------------------------------------------------
// Admin routes
// ---------------------------------------------------------------------------

/// POST /api/admin/fees — replace the fee configuration.
pub async fn set_fees(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<FeesRequest>,
) -> Result<Json<FeeConfig>, ApiError> {
    authorize(&headers, &state.tokens.admin)?;
    let fees = FeeConfig::new(req.unit_stake, req.refund_fee_pct, req.claim_fee_pct)?;
    let mut engine = state.engine.lock().unwrap();
    engine.set_fee_config(fees)?;
    persist(&state, &engine);
    Ok(Json(fees))
}

/// POST /api/admin/withdraw — extract fee residue, subject to the
/// custody solvency floor.
pub async fn withdraw_residual(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<WithdrawRequest>,
) -> Result<StatusCode, ApiError> {
    authorize(&headers, &state.tokens.admin)?;
    let mut engine = state.engine.lock().unwrap();
    engine.withdraw_residual(&req.destination, req.amount)?;
    persist(&state, &engine);
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Read routes
// ---------------------------------------------------------------------------

/// GET /api/rounds/current
pub async fn get_current_round(
    State(state): State<AppState>,
) -> Result<Json<RoundResponse>, ApiError> {
    let engine = state.engine.lock().unwrap();
    let number = engine.current_round_number();
    match engine.round(number) {
        Some(round) => Ok(Json(RoundResponse::from(round))),
        None => Err(ApiError::NotFound("no round has opened yet".to_string())),
    }
}

/// GET /api/rounds/:number
pub async fn get_round(
    State(state): State<AppState>,
    Path(number): Path<u64>,
) -> Result<Json<RoundResponse>, ApiError> {
    let engine = state.engine.lock().unwrap();
    match engine.round(number) {
        Some(round) => Ok(Json(RoundResponse::from(round))),
        None => Err(ApiError::NotFound(format!("round {number} not found"))),
    }
}

/// GET /api/rounds/:number/orders/:participant
pub async fn get_order(
    State(state): State<AppState>,
    Path((number, participant)): Path<(u64, String)>,
) -> Result<Json<OrderResponse>, ApiError> {
    let engine = state.engine.lock().unwrap();
    let order = engine
        .order(number, &participant)
        .ok_or(MarketError::NoOrderFound { round: number, participant })?;
    Ok(Json(OrderResponse {
        round: order.round,
        participant: order.participant.clone(),
        trend: order.trend,
        amount: order.amount,
    }))
}

/// GET /api/fees
pub async fn get_fees(State(state): State<AppState>) -> Json<FeeConfig> {
    let engine = state.engine.lock().unwrap();
    Json(engine.fees())
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let engine = state.engine.lock().unwrap();
    Json(StatusResponse {
        current_round: engine.current_round_number(),
        custodied: engine.custodied(),
        live_orders_total: engine.solvency_floor(),
    })
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}
