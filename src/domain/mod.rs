//! Domain model: balances, wallets, commands and the ports the ledger talks to.

pub mod account;
pub mod command;
pub mod money;
pub mod ports;
pub mod withdrawal;
