use crate::domain::money::Rate;
use crate::domain::ports::RateSource;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// A rate source that always answers with the same rate.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateSource {
    rate: Rate,
}

impl FixedRateSource {
    /// Fails with `InvalidInput` unless `rate` is positive.
    pub fn new(rate: Decimal) -> Result<Self> {
        Ok(Self {
            rate: Rate::new(rate)?,
        })
    }
}

#[async_trait]
impl RateSource for FixedRateSource {
    async fn rate(&self) -> Result<Rate> {
        Ok(self.rate)
    }
}
