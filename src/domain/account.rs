use crate::domain::money::{Amount, Balance, Currency, Rate};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an account within a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u16);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The balances of a single account.
///
/// `usdc` is the spendable USDC balance. Funds of an in-flight withdrawal sit
/// in `reserved_usdc` until the gateway answers, then they are either settled
/// (removed) or released back into `usdc`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Wallet {
    pub account: AccountId,
    pub game_currency: Balance,
    pub usdc: Balance,
    pub reserved_usdc: Balance,
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub account: AccountId,
    pub game_currency: Decimal,
    pub usdc: Decimal,
    pub rate: Rate,
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Converted {} game currency to {} USDC.",
            self.game_currency, self.usdc
        )
    }
}

impl Wallet {
    pub fn new(account: AccountId, game_currency: Balance) -> Self {
        Self {
            account,
            game_currency,
            usdc: Balance::ZERO,
            reserved_usdc: Balance::ZERO,
        }
    }

    /// Fails with `InsufficientFunds` unless `amount` game currency is available.
    pub fn ensure_game_currency(&self, amount: Amount) -> Result<()> {
        if self.game_currency >= Balance::from(amount) {
            Ok(())
        } else {
            Err(insufficient(Currency::GameCurrency, amount, self.game_currency))
        }
    }

    /// Debits `amount` game currency and credits its USDC value at `rate`.
    pub fn convert(&mut self, amount: Amount, rate: Rate) -> Result<Conversion> {
        self.ensure_game_currency(amount)?;
        let usdc = rate.to_usdc(amount)?;
        if usdc.is_zero() {
            return Err(LedgerError::InvalidInput(format!(
                "{amount} game currency is worth less than the smallest USDC unit"
            )));
        }
        let credited = self.usdc.checked_add(Balance(usdc)).ok_or_else(|| {
            LedgerError::InvalidInput(format!(
                "crediting {usdc} USDC would overflow the balance of account {}",
                self.account
            ))
        })?;

        self.game_currency -= Balance::from(amount);
        self.usdc = credited;
        Ok(Conversion {
            account: self.account,
            game_currency: amount.value(),
            usdc,
            rate,
        })
    }

    /// Moves funds from the spendable USDC balance into the reservation.
    pub fn reserve_usdc(&mut self, amount: Amount) -> Result<()> {
        if self.usdc >= Balance::from(amount) {
            self.usdc -= Balance::from(amount);
            self.reserved_usdc += Balance::from(amount);
            Ok(())
        } else {
            Err(insufficient(Currency::Usdc, amount, self.usdc))
        }
    }

    /// Returns reserved funds to the spendable balance (compensating credit).
    pub fn release_usdc(&mut self, amount: Amount) -> Result<()> {
        self.take_reserved(amount)?;
        self.usdc += Balance::from(amount);
        Ok(())
    }

    /// Removes reserved funds for good once the withdrawal went through.
    pub fn settle_usdc(&mut self, amount: Amount) -> Result<()> {
        self.take_reserved(amount)
    }

    fn take_reserved(&mut self, amount: Amount) -> Result<()> {
        if self.reserved_usdc >= Balance::from(amount) {
            self.reserved_usdc -= Balance::from(amount);
            Ok(())
        } else {
            Err(LedgerError::InvalidInput(format!(
                "reserved USDC mismatch: {} reserved, {amount} requested",
                self.reserved_usdc
            )))
        }
    }
}

fn insufficient(currency: Currency, requested: Amount, available: Balance) -> LedgerError {
    LedgerError::InsufficientFunds {
        currency,
        requested: requested.value(),
        available: available.value(),
    }
}
