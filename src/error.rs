use crate::domain::account::AccountId;
use crate::domain::money::Currency;
use crate::domain::ports::GatewayError;
use miette::Diagnostic;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    #[diagnostic(code(ledger::invalid_input))]
    InvalidInput(String),

    #[error("Insufficient {currency} balance: requested {requested}, available {available}")]
    #[diagnostic(code(ledger::insufficient_funds))]
    InsufficientFunds {
        currency: Currency,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Conversion rate unavailable: {0}")]
    #[diagnostic(code(ledger::rate_unavailable))]
    RateUnavailable(String),

    #[error("Withdrawal of {amount} USDC to {destination} failed: {reason}")]
    #[diagnostic(
        code(ledger::withdrawal_failed),
        help("the reserved funds were returned to the USDC balance")
    )]
    WithdrawalFailed {
        destination: String,
        amount: Decimal,
        #[source]
        reason: GatewayError,
    },

    #[error("Unknown account {0}")]
    #[diagnostic(code(ledger::unknown_account))]
    UnknownAccount(AccountId),

    #[error("Account {0} already exists")]
    #[diagnostic(code(ledger::account_exists))]
    AccountExists(AccountId),

    #[error("Operation interrupted: {0}")]
    #[diagnostic(code(ledger::interrupted))]
    Interrupted(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(ledger::config))]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
