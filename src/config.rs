//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the admin/scheduler/oracle bearer tokens) are referenced by
//! env-var name in the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::fees::FeeConfig;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub market: MarketConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

/// Initial fee parameters; the administrator can change them at
/// runtime through the admin interface.
#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    pub unit_stake: u64,
    pub refund_fee_pct: u8,
    pub claim_fee_pct: u8,
}

/// Env-var names holding the bearer tokens for the three trusted
/// identities.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub admin_token_env: String,
    pub scheduler_token_env: String,
    pub oracle_token_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Path of the JSON state snapshot. Missing file means fresh start.
    pub state_file: String,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// The fee config described by the market section, validated.
    pub fn fee_config(&self) -> Result<FeeConfig> {
        FeeConfig::new(
            self.market.unit_stake,
            self.market.refund_fee_pct,
            self.market.claim_fee_pct,
        )
        .context("Invalid [market] fee parameters")
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [market]
            unit_stake = 1000
            refund_fee_pct = 5
            claim_fee_pct = 1

            [auth]
            admin_token_env = "TRENDPOOL_ADMIN_TOKEN"
            scheduler_token_env = "TRENDPOOL_SCHEDULER_TOKEN"
            oracle_token_env = "TRENDPOOL_ORACLE_TOKEN"

            [server]
            port = 8080

            [storage]
            state_file = "trendpool_state.json"
        "#;
        let cfg: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.market.unit_stake, 1000);
        assert_eq!(cfg.market.refund_fee_pct, 5);
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.auth.admin_token_env, "TRENDPOOL_ADMIN_TOKEN");

        let fees = cfg.fee_config().unwrap();
        assert_eq!(fees.unit_stake, 1000);
        assert_eq!(fees.claim_fee_pct, 1);
    }

    #[test]
    fn test_invalid_fee_params_rejected() {
        let toml = r#"
            [market]
            unit_stake = 0
            refund_fee_pct = 5
            claim_fee_pct = 1

            [auth]
            admin_token_env = "A"
            scheduler_token_env = "S"
            oracle_token_env = "O"

            [server]
            port = 8080

            [storage]
            state_file = "s.json"
        "#;
        let cfg: AppConfig = toml::from_str(toml).unwrap();
        assert!(cfg.fee_config().is_err());
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(AppConfig::load("/nonexistent/config.toml").is_err());
    }
}
