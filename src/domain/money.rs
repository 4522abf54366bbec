use crate::error::{LedgerError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Fractional digits accepted for game currency amounts.
pub const GAME_CURRENCY_SCALE: u32 = 4;
/// Fractional digits of the USDC token.
pub const USDC_SCALE: u32 = 6;

/// The two denominations an account holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    GameCurrency,
    Usdc,
}

impl Currency {
    pub fn scale(self) -> u32 {
        match self {
            Currency::GameCurrency => GAME_CURRENCY_SCALE,
            Currency::Usdc => USDC_SCALE,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::GameCurrency => f.write_str("game currency"),
            Currency::Usdc => f.write_str("USDC"),
        }
    }
}

/// A non-negative monetary value held by an account.
///
/// Wraps `rust_decimal::Decimal` so balances and operation inputs cannot be
/// mixed up. Arithmetic is plain decimal arithmetic; the caller checks for
/// sufficient funds before subtracting.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a balance, rejecting negative values.
    pub fn new(value: Decimal) -> Result<Self> {
        if value < Decimal::ZERO {
            return Err(LedgerError::InvalidInput(format!(
                "balance must not be negative, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Balance {
    /// Adds `rhs`, or `None` when the sum overflows.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A strictly positive amount used as the input of a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidInput(format!(
                "amount must be positive, got {value}"
            )))
        }
    }

    /// Creates an amount of `currency`, rejecting values more precise than the
    /// currency allows.
    pub fn of(currency: Currency, value: Decimal) -> Result<Self> {
        let amount = Self::new(value)?;
        if value.normalize().scale() > currency.scale() {
            return Err(LedgerError::InvalidInput(format!(
                "{currency} amounts allow at most {} fractional digits, got {value}",
                currency.scale()
            )));
        }
        Ok(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Price of one unit of game currency expressed in USDC. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Rate(Decimal);

impl Rate {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidInput(format!(
                "conversion rate must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Converts a game currency amount into USDC, rounding half-to-even at
    /// the USDC precision. Fails when the product does not fit a `Decimal`.
    pub fn to_usdc(&self, game_currency: Amount) -> Result<Decimal> {
        let usdc = game_currency.0.checked_mul(self.0).ok_or_else(|| {
            LedgerError::InvalidInput(format!(
                "{game_currency} game currency at rate {self} exceeds the representable USDC range"
            ))
        })?;
        Ok(usdc.round_dp_with_strategy(USDC_SCALE, RoundingStrategy::MidpointNearestEven))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_arithmetic() {
        let b1 = Balance(dec!(10.0));
        let b2 = Balance(dec!(5.0));
        assert_eq!(b1 + b2, Balance(dec!(15.0)));
        assert_eq!(b1 - b2, Balance(dec!(5.0)));
    }

    #[test]
    fn test_balance_rejects_negative() {
        assert!(Balance::new(dec!(0)).is_ok());
        assert!(matches!(
            Balance::new(dec!(-0.01)),
            Err(LedgerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(LedgerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_amount_precision_per_currency() {
        assert!(Amount::of(Currency::Usdc, dec!(0.000001)).is_ok());
        assert!(Amount::of(Currency::Usdc, dec!(0.0000001)).is_err());
        assert!(Amount::of(Currency::GameCurrency, dec!(1.0001)).is_ok());
        assert!(Amount::of(Currency::GameCurrency, dec!(1.00001)).is_err());
        // Trailing zeros do not count as precision.
        assert!(Amount::of(Currency::GameCurrency, dec!(2.500000)).is_ok());
    }

    #[test]
    fn test_rate_must_be_positive() {
        assert!(Rate::new(dec!(0.01)).is_ok());
        assert!(Rate::new(dec!(0)).is_err());
        assert!(Rate::new(dec!(-0.01)).is_err());
    }

    #[test]
    fn test_conversion_is_exact_for_default_rate() {
        let rate = Rate::new(dec!(0.01)).unwrap();
        let amount = Amount::new(dec!(500)).unwrap();
        assert_eq!(rate.to_usdc(amount).unwrap(), dec!(5.00));
    }

    #[test]
    fn test_conversion_rounds_half_to_even() {
        let one = Amount::new(dec!(1)).unwrap();
        let up = Rate::new(dec!(0.0000015)).unwrap();
        let down = Rate::new(dec!(0.0000025)).unwrap();
        assert_eq!(up.to_usdc(one).unwrap(), dec!(0.000002));
        assert_eq!(down.to_usdc(one).unwrap(), dec!(0.000002));
    }

    #[test]
    fn test_conversion_overflow_is_an_error() {
        let rate = Rate::new(dec!(100000)).unwrap();
        let amount = Amount::new(dec!(79228162514264337593543950)).unwrap();
        assert!(matches!(
            rate.to_usdc(amount),
            Err(LedgerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_balance_checked_add() {
        assert_eq!(
            Balance(dec!(1.5)).checked_add(Balance(dec!(2))),
            Some(Balance(dec!(3.5)))
        );
        assert_eq!(Balance(Decimal::MAX).checked_add(Balance(dec!(1))), None);
    }
}
