//! CSV command scripts in, account balances out.

pub mod account_writer;
pub mod command_reader;
