//! Application layer containing the ledger orchestration.
//!
//! `BalanceLedger` is the entry point for conversions and withdrawals. It
//! serializes operations per account with `tokio` mutexes and drives the
//! rate source and withdrawal gateway through the domain ports.

pub mod ledger;
