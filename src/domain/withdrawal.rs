use crate::domain::account::AccountId;
use crate::domain::money::Amount;
use crate::error::{LedgerError, Result};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

const MAX_ADDRESS_LEN: usize = 128;

/// Destination of a withdrawal.
///
/// The target chain is not fixed, so validation is chain-agnostic: a trimmed,
/// non-empty ASCII string of letters, digits and `_ - : .`, at most 128 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(raw: &str) -> Result<Self> {
        let address = raw.trim();
        if address.is_empty() {
            return Err(LedgerError::InvalidInput(
                "destination address must not be empty".to_string(),
            ));
        }
        if address.len() > MAX_ADDRESS_LEN {
            return Err(LedgerError::InvalidInput(format!(
                "destination address is longer than {MAX_ADDRESS_LEN} characters"
            )));
        }
        if let Some(c) = address
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')))
        {
            return Err(LedgerError::InvalidInput(format!(
                "destination address contains invalid character {c:?}"
            )));
        }
        Ok(Self(address.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A withdrawal handed to the gateway.
///
/// The idempotency key is generated once per withdrawal and reused for every
/// retry, so the gateway can drop duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalRequest {
    pub account: AccountId,
    pub destination: WalletAddress,
    pub amount: Amount,
    pub idempotency_key: Uuid,
}

impl WithdrawalRequest {
    pub fn new(account: AccountId, destination: WalletAddress, amount: Amount) -> Self {
        Self {
            account,
            destination,
            amount,
            idempotency_key: Uuid::new_v4(),
        }
    }
}

/// Result of a successful withdrawal.
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalReceipt {
    pub account: AccountId,
    pub destination: WalletAddress,
    pub amount: Amount,
    pub transaction_id: String,
}

impl fmt::Display for WithdrawalReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Withdrawn {} USDC to wallet {} (transaction {}).",
            self.amount, self.destination, self.transaction_id
        )
    }
}
