use clap::Parser;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use usdc_ledger::application::ledger::BalanceLedger;
use usdc_ledger::config::LedgerConfig;
use usdc_ledger::domain::money::Balance;
use usdc_ledger::domain::ports::{AccountStoreBox, RateSourceBox, WithdrawalGatewayBox};
use usdc_ledger::infrastructure::http_gateway::HttpWithdrawalGateway;
use usdc_ledger::infrastructure::in_memory::InMemoryAccountStore;
use usdc_ledger::infrastructure::rate::FixedRateSource;
use usdc_ledger::infrastructure::simulated::SimulatedGateway;
use usdc_ledger::interfaces::csv::account_writer::AccountWriter;
use usdc_ledger::interfaces::csv::command_reader::CommandReader;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command script CSV (columns: type, account, amount, address)
    input: PathBuf,

    /// JSON config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// USDC paid for one unit of game currency
    #[arg(long)]
    rate: Option<Decimal>,

    /// Game currency of accounts opened without an explicit balance
    #[arg(long)]
    initial_game_currency: Option<Decimal>,

    /// Withdrawal endpoint. Without it withdrawals are simulated.
    #[arg(long)]
    gateway_url: Option<String>,

    /// Bearer token for the withdrawal endpoint
    #[arg(long, env = "USDC_GATEWAY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl Cli {
    fn load_config(&self) -> Result<LedgerConfig> {
        let mut config = match &self.config {
            Some(path) => LedgerConfig::from_path(path)?,
            None => LedgerConfig::default(),
        };
        if let Some(rate) = self.rate {
            config.conversion_rate = rate;
        }
        if let Some(initial) = self.initial_game_currency {
            config.initial_game_currency = initial;
        }
        if let Some(url) = &self.gateway_url {
            config.gateway.endpoint = Some(url.clone());
        }
        if let Some(key) = &self.api_key {
            config.gateway.api_key = Some(key.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    let gateway: WithdrawalGatewayBox = match (&config.gateway.endpoint, &config.gateway.api_key) {
        (Some(endpoint), Some(api_key)) => Box::new(HttpWithdrawalGateway::new(
            endpoint.clone(),
            api_key.clone(),
            config.gateway.retry_policy().timeout,
        )?),
        _ => {
            warn!("No gateway endpoint configured. Withdrawals are simulated and no funds leave the ledger.");
            Box::new(SimulatedGateway::new())
        }
    };
    let account_store: AccountStoreBox = Box::new(InMemoryAccountStore::new());
    let rate_source: RateSourceBox = Box::new(FixedRateSource::new(config.conversion_rate)?);

    let ledger = BalanceLedger::new(account_store, rate_source, gateway)
        .with_retry_policy(config.gateway.retry_policy())
        .with_initial_game_currency(Balance::new(config.initial_game_currency)?);

    // Process commands
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for command in reader.commands() {
        match command {
            Ok(command) => match ledger.execute(command).await {
                Ok(outcome) => info!("{outcome}"),
                Err(e) => warn!("{e}"),
            },
            Err(e) => error!("Error reading command: {e}"),
        }
    }

    let wallets = ledger.into_results().await?;

    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(wallets)?;

    Ok(())
}
