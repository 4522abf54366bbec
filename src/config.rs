use crate::domain::money::GAME_CURRENCY_SCALE;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Ledger settings, loaded from a JSON file and overridden from the command line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Game currency credited to an account opened without an explicit balance.
    pub initial_game_currency: Decimal,
    /// USDC paid for one unit of game currency.
    pub conversion_rate: Decimal,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Withdrawal endpoint. When unset the simulated gateway is used.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_game_currency: dec!(1000),
            conversion_rate: dec!(0.01),
            gateway: GatewayConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_ms: 10_000,
            max_attempts: 3,
            backoff_ms: 200,
        }
    }
}

impl LedgerConfig {
    /// Reads a JSON config file. Missing keys keep their defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_game_currency < Decimal::ZERO {
            return Err(LedgerError::Config(
                "initial_game_currency must not be negative".to_string(),
            ));
        }
        if self.initial_game_currency.normalize().scale() > GAME_CURRENCY_SCALE {
            return Err(LedgerError::Config(format!(
                "initial_game_currency allows at most {GAME_CURRENCY_SCALE} fractional digits"
            )));
        }
        if self.conversion_rate <= Decimal::ZERO {
            return Err(LedgerError::Config(
                "conversion_rate must be positive".to_string(),
            ));
        }
        self.gateway.validate()
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(LedgerError::Config(
                "gateway.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(LedgerError::Config(
                "gateway.timeout_ms must be at least 1".to_string(),
            ));
        }
        if self.endpoint.is_some() && self.api_key.is_none() {
            return Err(LedgerError::Config(
                "gateway.api_key is required when an endpoint is set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(self.timeout_ms),
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

/// How the ledger drives the gateway: per-attempt timeout, attempt budget and
/// the base delay of the exponential backoff between retryable failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, doubling each time.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        GatewayConfig::default().retry_policy()
    }
}
