//! TRENDPOOL — daily up/down price prediction pool.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod fees;
pub mod oracle;
pub mod ledger;
pub mod engine;
pub mod storage;
pub mod server;
