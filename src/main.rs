// Entry point for the testnet-fixtures binary
use clap::Parser;
use log::{error, LevelFilter};
use std::path::Path;
use std::process;
use testnet_fixtures::core::monetary::conversions::format_amount;
use testnet_fixtures::{
    create_default_assets, testnet, Chain, ChainStore, Command, FeeSchedule, FeesArg,
    FixtureSettings, LocalTestnet, NodeGenesis, PrivateKey,
};

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = testnet_fixtures::Opt::parse();

    let settings = match load_settings(opt.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_command(opt.command, settings) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn load_settings(path: Option<&Path>) -> testnet_fixtures::Result<FixtureSettings> {
    match path {
        Some(path) => FixtureSettings::from_file(path)?.apply_overrides(|key| std::env::var(key).ok()),
        None => FixtureSettings::from_env(),
    }
}

fn connect(settings: &FixtureSettings) -> Result<Chain, Box<dyn std::error::Error>> {
    let node = settings
        .node
        .as_deref()
        .ok_or("No node configured: set TESTNET_NODE or `node` in the config file")?;
    Ok(Chain::connect(node, settings.keyring()?, settings.retry_policy())?)
}

fn run_command(command: Command, settings: FixtureSettings) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::StartTestnet {
            listen,
            keyfile,
            genesis,
            data_dir,
            fees,
        } => {
            let fees = match fees {
                FeesArg::Default => FeeSchedule::default(),
                FeesArg::Free => FeeSchedule::free(),
            };
            let store = match &data_dir {
                Some(dir) => ChainStore::open(&dir.join("chain"))?,
                None => ChainStore::temporary()?,
            };
            let setup = NodeGenesis::prepare(
                genesis.as_deref(),
                data_dir.as_deref(),
                keyfile.as_deref(),
                settings.keyring()?,
                &settings.default_account,
            )?;

            let testnet = LocalTestnet::start_on(&listen, store, &setup.genesis, setup.keys, fees)?;
            println!("Node: {}", testnet.node_url());
            println!("Chain id: {}", testnet.ledger().chain_id());
            println!("Default account: {}", testnet.default_account());
            for public_key in testnet.keys().public_keys() {
                println!("Key: {public_key}");
            }
            testnet.wait()?;
        }
        Command::Bootstrap => {
            let chain = connect(&settings)?;
            let account = settings.default_account.as_str();
            testnet::claim_balance(&chain, &settings.genesis_balance, account)?;
            create_default_assets(&chain, account)?;
            print_balances(&chain, account)?;
        }
        Command::UnusedAsset => {
            let chain = connect(&settings)?;
            println!("{}", testnet::unused_asset(&chain)?);
        }
        Command::UnusedAccount => {
            let chain = connect(&settings)?;
            println!("{}", testnet::unused_account(&chain)?);
        }
        Command::Balances { account } => {
            let chain = connect(&settings)?;
            print_balances(&chain, &account)?;
        }
        Command::Genkey => {
            let key = PrivateKey::generate()?;
            println!("Public key: {}", key.public_key());
            println!("Private key: {}", key.to_wif());
        }
    }
    Ok(())
}

fn print_balances(chain: &Chain, account: &str) -> Result<(), Box<dyn std::error::Error>> {
    let balances = chain.balances(account)?;
    if balances.is_empty() {
        println!("{account} holds nothing");
    }
    for balance in balances {
        let asset = chain.get_asset(&balance.asset_id.to_string())?;
        println!("{}", format_amount(balance.amount, asset.precision, &asset.symbol)?);
    }
    Ok(())
}
