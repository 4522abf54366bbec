use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;
use usdc_ledger::application::ledger::BalanceLedger;
use usdc_ledger::config::RetryPolicy;
use usdc_ledger::domain::money::Balance;
use usdc_ledger::infrastructure::in_memory::InMemoryAccountStore;
use usdc_ledger::infrastructure::rate::FixedRateSource;
use usdc_ledger::infrastructure::simulated::SimulatedGateway;

pub const ADDRESS: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

/// A ledger at the default rate of 0.01 backed by `gateway`, with fast retries.
pub fn ledger(gateway: SimulatedGateway) -> BalanceLedger {
    BalanceLedger::new(
        Box::new(InMemoryAccountStore::new()),
        Box::new(FixedRateSource::new(dec!(0.01)).unwrap()),
        Box::new(gateway),
    )
    .with_retry_policy(RetryPolicy {
        timeout: Duration::from_millis(500),
        max_attempts: 2,
        backoff: Duration::from_millis(1),
    })
    .with_initial_game_currency(Balance(dec!(1000)))
}

#[allow(dead_code)]
pub fn assert_non_negative(value: Balance) {
    assert!(value.value() >= Decimal::ZERO, "negative balance {value}");
}
