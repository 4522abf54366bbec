use crate::config::RetryPolicy;
use crate::domain::account::{AccountId, Conversion, Wallet};
use crate::domain::command::{Command, CommandType};
use crate::domain::money::{Amount, Balance, Currency};
use crate::domain::ports::{
    AccountStore, AccountStoreBox, GatewayError, GatewayReceipt, RateSourceBox,
    WithdrawalGateway, WithdrawalGatewayBox,
};
use crate::domain::withdrawal::{WalletAddress, WithdrawalReceipt, WithdrawalRequest};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Opened(Wallet),
    Converted(Conversion),
    Withdrawn(WithdrawalReceipt),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Opened(wallet) => write!(
                f,
                "Opened account {} with {} game currency.",
                wallet.account, wallet.game_currency
            ),
            Outcome::Converted(conversion) => fmt::Display::fmt(conversion, f),
            Outcome::Withdrawn(receipt) => fmt::Display::fmt(receipt, f),
        }
    }
}

/// Converts game currency into USDC and withdraws USDC through a gateway.
///
/// Every mutating operation holds the account's lock from the funds check
/// until the final store, including the rate fetch and the gateway call.
/// Two operations on the same account therefore never interleave, while
/// different accounts proceed independently.
pub struct BalanceLedger {
    account_store: Arc<dyn AccountStore>,
    rate_source: RateSourceBox,
    gateway: Arc<dyn WithdrawalGateway>,
    retry: RetryPolicy,
    initial_game_currency: Balance,
    locks: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl BalanceLedger {
    /// Creates a new `BalanceLedger`.
    ///
    /// # Arguments
    ///
    /// * `account_store` - Where wallet snapshots live.
    /// * `rate_source` - Supplies the game currency to USDC rate.
    /// * `gateway` - Executes withdrawals.
    pub fn new(
        account_store: AccountStoreBox,
        rate_source: RateSourceBox,
        gateway: WithdrawalGatewayBox,
    ) -> Self {
        Self {
            account_store: Arc::from(account_store),
            rate_source,
            gateway: Arc::from(gateway),
            retry: RetryPolicy::default(),
            initial_game_currency: Balance::ZERO,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Game currency credited by `open_account` when no balance is given.
    pub fn with_initial_game_currency(mut self, initial: Balance) -> Self {
        self.initial_game_currency = initial;
        self
    }

    /// Opens an account with `initial` game currency, or the configured
    /// default when `None`.
    pub async fn open_account(
        &self,
        account: AccountId,
        initial: Option<Decimal>,
    ) -> Result<Wallet> {
        let game_currency = match initial {
            Some(value) => {
                let balance = Balance::new(value)?;
                if !value.is_zero() {
                    Amount::of(Currency::GameCurrency, value)?;
                }
                balance
            }
            None => self.initial_game_currency,
        };

        let lock = self.lock_for(account).await;
        let _guard = lock.lock().await;

        if self.account_store.get(account).await?.is_some() {
            return Err(LedgerError::AccountExists(account));
        }
        let wallet = Wallet::new(account, game_currency);
        self.account_store.store(wallet.clone()).await?;
        info!(%account, %game_currency, "account opened");
        Ok(wallet)
    }

    /// Converts `amount` game currency into USDC at the current rate.
    pub async fn convert(&self, account: AccountId, amount: Decimal) -> Result<Conversion> {
        let amount = Amount::of(Currency::GameCurrency, amount)?;

        let lock = self.lock_existing(account).await?;
        let _guard = lock.lock().await;

        let mut wallet = self.load(account).await?;
        wallet.ensure_game_currency(amount)?;

        let rate = self.rate_source.rate().await?;
        let conversion = wallet.convert(amount, rate)?;
        self.account_store.store(wallet).await?;

        info!(%account, game_currency = %conversion.game_currency, usdc = %conversion.usdc, %rate, "{conversion}");
        Ok(conversion)
    }

    /// Withdraws `amount` USDC to `destination`.
    ///
    /// The funds are reserved before the gateway is called. They are settled
    /// when the gateway confirms and released back to the USDC balance on any
    /// failure, including timeouts and exhausted retries.
    ///
    /// Once the account lock is taken the withdrawal runs in its own task,
    /// which keeps the lock until the reservation is settled or released.
    /// Dropping the returned future stops the wait, not the withdrawal.
    pub async fn withdraw(
        &self,
        account: AccountId,
        destination: &str,
        amount: Decimal,
    ) -> Result<WithdrawalReceipt> {
        let destination = WalletAddress::parse(destination)?;
        let amount = Amount::of(Currency::Usdc, amount)?;

        let guard = self.lock_existing(account).await?.lock_owned().await;
        let store = Arc::clone(&self.account_store);
        let gateway = Arc::clone(&self.gateway);
        let retry = self.retry;

        tokio::spawn(async move {
            let _guard = guard;
            let request = WithdrawalRequest::new(account, destination, amount);
            run_withdrawal(store.as_ref(), gateway.as_ref(), retry, request).await
        })
        .await
        .map_err(|e| {
            LedgerError::Interrupted(format!("withdrawal for account {account}: {e}"))
        })?
    }

    /// Current balances of `account`.
    pub async fn balances(&self, account: AccountId) -> Result<Wallet> {
        self.load(account).await
    }

    /// Dispatches one command from a command script.
    pub async fn execute(&self, command: Command) -> Result<Outcome> {
        match command.r#type {
            CommandType::Open => self
                .open_account(command.account, command.amount)
                .await
                .map(Outcome::Opened),
            CommandType::Convert => {
                let amount = required_amount(&command)?;
                self.convert(command.account, amount)
                    .await
                    .map(Outcome::Converted)
            }
            CommandType::Withdraw => {
                let amount = required_amount(&command)?;
                let address = command.address.as_deref().unwrap_or_default();
                self.withdraw(command.account, address, amount)
                    .await
                    .map(Outcome::Withdrawn)
            }
        }
    }

    /// Consumes the ledger and returns the final state of all accounts,
    /// ordered by account id.
    pub async fn into_results(self) -> Result<Vec<Wallet>> {
        let mut wallets = self.account_store.all_accounts().await?;
        wallets.sort_by_key(|wallet| wallet.account);
        Ok(wallets)
    }

    async fn load(&self, account: AccountId) -> Result<Wallet> {
        self.account_store
            .get(account)
            .await?
            .ok_or(LedgerError::UnknownAccount(account))
    }

    async fn lock_for(&self, account: AccountId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(account).or_default().clone()
    }

    /// Like `lock_for`, but only for accounts that exist. Accounts are never
    /// removed, so the check stays valid once the lock is taken.
    async fn lock_existing(&self, account: AccountId) -> Result<Arc<Mutex<()>>> {
        self.load(account).await?;
        Ok(self.lock_for(account).await)
    }
}

async fn run_withdrawal(
    store: &dyn AccountStore,
    gateway: &dyn WithdrawalGateway,
    retry: RetryPolicy,
    request: WithdrawalRequest,
) -> Result<WithdrawalReceipt> {
    let account = request.account;
    let amount = request.amount;

    let mut wallet = store
        .get(account)
        .await?
        .ok_or(LedgerError::UnknownAccount(account))?;
    wallet.reserve_usdc(amount)?;
    store.store(wallet.clone()).await?;

    match send_with_retry(gateway, retry, &request).await {
        Ok(gateway_receipt) => {
            wallet.settle_usdc(amount)?;
            store.store(wallet).await?;

            let receipt = WithdrawalReceipt {
                account,
                destination: request.destination,
                amount,
                transaction_id: gateway_receipt.transaction_id,
            };
            info!(%account, %amount, transaction_id = %receipt.transaction_id, "{receipt}");
            Ok(receipt)
        }
        Err(reason) => {
            wallet.release_usdc(amount)?;
            store.store(wallet).await?;

            warn!(%account, %amount, %reason, "withdrawal failed, reserved funds released");
            Err(LedgerError::WithdrawalFailed {
                destination: request.destination.to_string(),
                amount: amount.value(),
                reason,
            })
        }
    }
}

async fn send_with_retry(
    gateway: &dyn WithdrawalGateway,
    retry: RetryPolicy,
    request: &WithdrawalRequest,
) -> std::result::Result<GatewayReceipt, GatewayError> {
    let mut attempt = 1;
    loop {
        debug!(account = %request.account, attempt, key = %request.idempotency_key, "sending withdrawal");
        let outcome = match tokio::time::timeout(retry.timeout, gateway.send(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(GatewayError::Retryable(format!(
                "no answer within {:?}",
                retry.timeout
            ))),
        };

        match outcome {
            Err(error) if error.is_retryable() && attempt < retry.max_attempts => {
                let delay = retry.delay_after(attempt);
                warn!(account = %request.account, attempt, %error, ?delay, "retrying withdrawal");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

fn required_amount(command: &Command) -> Result<Decimal> {
    command.amount.ok_or_else(|| {
        LedgerError::InvalidInput(format!("{:?} command requires an amount", command.r#type))
    })
}
