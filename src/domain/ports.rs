use super::account::{AccountId, Wallet};
use super::money::Rate;
use super::withdrawal::WithdrawalRequest;
use crate::error::Result;
use async_trait::async_trait;
use thiserror::Error;

/// Snapshot storage of wallets. Callers serialize writes per account.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn store(&self, wallet: Wallet) -> Result<()>;
    async fn get(&self, account: AccountId) -> Result<Option<Wallet>>;
    async fn all_accounts(&self) -> Result<Vec<Wallet>>;
}

/// Supplies the current game currency to USDC rate.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fails with `LedgerError::RateUnavailable` when no rate can be obtained.
    async fn rate(&self) -> Result<Rate>;
}

/// Gateway confirmation of a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReceipt {
    pub transaction_id: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Transient failure (network, timeout, 5xx); the same request may be retried.
    #[error("retryable gateway failure: {0}")]
    Retryable(String),
    /// The gateway refused the request; retrying will not help.
    #[error("gateway rejected withdrawal: {0}")]
    Permanent(String),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Retryable(_))
    }
}

/// External service that executes a crypto withdrawal.
#[async_trait]
pub trait WithdrawalGateway: Send + Sync {
    async fn send(
        &self,
        request: &WithdrawalRequest,
    ) -> std::result::Result<GatewayReceipt, GatewayError>;
}

pub type AccountStoreBox = Box<dyn AccountStore>;
pub type RateSourceBox = Box<dyn RateSource>;
pub type WithdrawalGatewayBox = Box<dyn WithdrawalGateway>;
