use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use usdc_ledger::domain::account::AccountId;
use usdc_ledger::domain::money::Balance;
use usdc_ledger::domain::ports::GatewayError;
use usdc_ledger::error::LedgerError;
use usdc_ledger::infrastructure::simulated::SimulatedGateway;

mod common;
use common::ADDRESS;

enum Op {
    Convert(Decimal),
    Withdraw(Decimal),
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations_never_overdraw() {
    let gateway = SimulatedGateway::new().with_latency(Duration::from_millis(1));
    let ledger = Arc::new(common::ledger(gateway.clone()));
    let account = AccountId(1);
    ledger.open_account(account, None).await.unwrap();

    let (ops, failures): (Vec<Op>, Vec<GatewayError>) = {
        let mut rng = rand::thread_rng();
        let ops = (0..200)
            .map(|_| {
                if rng.gen_bool(0.5) {
                    Op::Convert(Decimal::from(rng.gen_range(1..=60i64)))
                } else {
                    Op::Withdraw(Decimal::new(rng.gen_range(1..=300), 2))
                }
            })
            .collect();
        let failures = (0..40)
            .map(|i| {
                if rng.gen_bool(0.5) {
                    GatewayError::Permanent(format!("rejected #{i}"))
                } else {
                    GatewayError::Retryable(format!("unavailable #{i}"))
                }
            })
            .collect();
        (ops, failures)
    };
    // Gateway answers start with a burst of failures, so releases race with
    // conversions and other withdrawals on the same account.
    for failure in failures {
        gateway.push_outcome(Err(failure)).await;
    }

    let handles: Vec<_> = ops
        .into_iter()
        .map(|op| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move {
                match op {
                    Op::Convert(amount) => ledger
                        .convert(account, amount)
                        .await
                        .map(|_| (amount, Decimal::ZERO)),
                    Op::Withdraw(amount) => ledger
                        .withdraw(account, ADDRESS, amount)
                        .await
                        .map(|_| (Decimal::ZERO, amount)),
                }
            })
        })
        .collect();

    let mut converted = Decimal::ZERO;
    let mut withdrawn = Decimal::ZERO;
    for handle in handles {
        match handle.await.unwrap() {
            Ok((c, w)) => {
                converted += c;
                withdrawn += w;
            }
            Err(
                LedgerError::InsufficientFunds { .. } | LedgerError::WithdrawalFailed { .. },
            ) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
        let wallet = ledger.balances(account).await.unwrap();
        common::assert_non_negative(wallet.game_currency);
        common::assert_non_negative(wallet.usdc);
        common::assert_non_negative(wallet.reserved_usdc);
    }

    // Integer amounts at a rate of 0.01 convert without rounding, so value is conserved exactly.
    let wallet = ledger.balances(account).await.unwrap();
    assert_eq!(wallet.game_currency, Balance(dec!(1000) - converted));
    assert_eq!(wallet.usdc, Balance(converted * dec!(0.01) - withdrawn));
    assert_eq!(wallet.reserved_usdc, Balance::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_withdrawals_spend_balance_once() {
    let gateway = SimulatedGateway::new().with_latency(Duration::from_millis(5));
    let ledger = Arc::new(common::ledger(gateway.clone()));
    let account = AccountId(1);
    ledger.open_account(account, None).await.unwrap();
    ledger.convert(account, dec!(100)).await.unwrap();

    // Balance is 1 USDC; ten racing withdrawals of 1 USDC must yield exactly one success.
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.withdraw(account, ADDRESS, dec!(1)).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(gateway.requests().await.len(), 1);
    let wallet = ledger.balances(account).await.unwrap();
    assert_eq!(wallet.usdc, Balance::ZERO);
}
