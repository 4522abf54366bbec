use crate::domain::account::Wallet;
use crate::error::Result;
use std::io::Write;

pub const HEADER: [&str; 4] = ["account", "game_currency", "usdc", "reserved_usdc"];

/// Writes final account balances as CSV.
///
/// Decimals are normalized, so `5.00` is written as `5`.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_accounts(&mut self, wallets: impl IntoIterator<Item = Wallet>) -> Result<()> {
        self.writer.write_record(HEADER)?;
        for wallet in wallets {
            self.writer.write_record([
                wallet.account.to_string(),
                wallet.game_currency.value().normalize().to_string(),
                wallet.usdc.value().normalize().to_string(),
                wallet.reserved_usdc.value().normalize().to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
