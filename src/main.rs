//! TRENDPOOL — daily up/down price prediction pool.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores state from disk (or starts fresh), and serves the market
//! API with graceful shutdown.

use anyhow::Result;
use std::sync::{Arc, Mutex};
use tracing::info;

use trendpool::config::AppConfig;
use trendpool::engine::MarketEngine;
use trendpool::ledger::{Ledger, MemoryLedger};
use trendpool::oracle::{PostedOracle, PriceOracle};
use trendpool::server;
use trendpool::server::routes::{AuthTokens, ServiceState};
use trendpool::storage;

const BANNER: &str = r#"
 _____ ____  _____ _   _ ____  ____   ___   ___  _
|_   _|  _ \| ____| \ | |  _ \|  _ \ / _ \ / _ \| |
  | | | |_) |  _| |  \| | | | | |_) | | | | | | | |
  | | |  _ <| |___| |\  | |_| |  __/| |_| | |_| | |___
  |_| |_| \_\_____|_| \_|____/|_|    \___/ \___/|_____|

  Daily up/down prediction pool — v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;
    init_logging();

    println!("{BANNER}");
    info!(
        unit_stake = cfg.market.unit_stake,
        refund_fee_pct = cfg.market.refund_fee_pct,
        claim_fee_pct = cfg.market.claim_fee_pct,
        port = cfg.server.port,
        "TRENDPOOL starting up"
    );

    // -- Trusted identity tokens ------------------------------------------

    let tokens = AuthTokens::new(
        AppConfig::resolve_env(&cfg.auth.admin_token_env)?,
        AppConfig::resolve_env(&cfg.auth.scheduler_token_env)?,
        AppConfig::resolve_env(&cfg.auth.oracle_token_env)?,
    );

    // -- Restore or create state ------------------------------------------

    let oracle = Arc::new(PostedOracle::new());
    let state_file = cfg.storage.state_file.clone();

    let (engine, ledger) = match storage::load_snapshot(Some(&state_file))? {
        Some(snapshot) => {
            info!(
                round = snapshot.rounds.current_number(),
                custodied = snapshot.ledger.custodied,
                "Resumed from saved state"
            );
            let ledger = Arc::new(MemoryLedger::from_snapshot(snapshot.ledger));
            let engine = MarketEngine::from_parts(
                snapshot.fees,
                snapshot.rounds,
                snapshot.book,
                oracle.clone() as Arc<dyn PriceOracle>,
                ledger.clone() as Arc<dyn Ledger>,
            );
            (engine, ledger)
        }
        None => {
            let fees = cfg.fee_config()?;
            info!(%fees, "Fresh start");
            let ledger = Arc::new(MemoryLedger::new());
            let engine = MarketEngine::new(
                fees,
                oracle.clone() as Arc<dyn PriceOracle>,
                ledger.clone() as Arc<dyn Ledger>,
            );
            (engine, ledger)
        }
    };

    let state = Arc::new(ServiceState {
        engine: Mutex::new(engine),
        oracle,
        ledger,
        tokens,
        state_file: Some(state_file),
    });

    // -- Serve until Ctrl+C -----------------------------------------------

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received.");
    };

    server::serve(state.clone(), cfg.server.port, shutdown).await?;

    let engine = state.engine.lock().unwrap();
    info!(
        round = engine.current_round_number(),
        custodied = engine.custodied(),
        live_orders = engine.solvency_floor(),
        "TRENDPOOL shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trendpool=info"));

    let json_logging = std::env::var("TRENDPOOL_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
