//! Session fixtures for tests that run against a test network
//!
//! The free functions take the chain handle explicitly. [`TestSession`]
//! wires them together once per process: connect, register the shared
//! instance, claim the genesis balance, then hand out the ready chain.

use crate::client::{set_shared_instance, Chain};
use crate::config::FixtureSettings;
use crate::core::{
    max_supply_for_precision, validate_precision, AssetObject, TransactionConfirmation,
};
use crate::error::{FixtureError, Result};
use crate::testnet::identifiers::{
    first_unused, is_missing_account, is_missing_asset, random_symbol, random_worker_name,
};
use crate::testnet::LocalTestnet;
use crate::wallet::{Keyring, PrivateKey};
use log::info;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Assets every session can create on demand: (symbol, precision)
pub const DEFAULT_ASSETS: [(&str, u8); 2] = [("USD", 3), ("GOLD", 3)];

/// Whole USD units issued to the default account by [`create_default_assets`]
pub const DEFAULT_USD_ISSUE: f64 = 1000.0;

/// Connect to the configured node and register the result as the shared instance
pub fn connect_instance(settings: &FixtureSettings, keys: Keyring) -> Result<Arc<Chain>> {
    let node = settings
        .node
        .as_deref()
        .ok_or_else(|| FixtureError::Config("No node configured".to_string()))?;
    let chain = Arc::new(Chain::connect(node, keys, settings.retry_policy())?);
    set_shared_instance(Arc::clone(&chain));
    Ok(chain)
}

/// Claim the whole genesis balance `balance_id` into `account`
pub fn claim_balance(
    chain: &Chain,
    balance_id: &str,
    account: &str,
) -> Result<TransactionConfirmation> {
    let balance = chain.genesis_balance(balance_id)?;
    chain.claim_balance(&balance, account)
}

/// Create `symbol` issued by `account`; the max supply always comes to
/// 10^15 base units whatever the precision
pub fn create_asset(chain: &Chain, account: &str, symbol: &str, precision: u8) -> Result<AssetObject> {
    validate_precision(precision)?;
    chain.create_asset(symbol, precision, max_supply_for_precision(precision)?, account)
}

/// Issue `amount` whole units of `symbol` to account `to`
pub fn issue_asset(chain: &Chain, symbol: &str, amount: f64, to: &str) -> Result<TransactionConfirmation> {
    chain.issue_asset(symbol, amount, to)
}

/// Create USD and GOLD, then issue 1000 USD to `account`
pub fn create_default_assets(chain: &Chain, account: &str) -> Result<()> {
    for (symbol, precision) in DEFAULT_ASSETS {
        create_asset(chain, account, symbol, precision)?;
    }
    issue_asset(chain, "USD", DEFAULT_USD_ISSUE, account)?;
    Ok(())
}

/// A seven letter symbol no asset uses yet
pub fn unused_asset(chain: &Chain) -> Result<String> {
    let mut rng = rand::thread_rng();
    first_unused(
        || random_symbol(&mut rng),
        |symbol| chain.get_asset(symbol),
        is_missing_asset,
    )
}

/// A `worker-N` name no account uses yet
pub fn unused_account(chain: &Chain) -> Result<String> {
    let mut rng = rand::thread_rng();
    first_unused(
        || random_worker_name(&mut rng),
        |name| chain.get_account(name),
        is_missing_account,
    )
}

static SESSION: OnceCell<TestSession> = OnceCell::new();

/// One connected, funded chain shared by every test in the process
pub struct TestSession {
    settings: FixtureSettings,
    chain: Arc<Chain>,
    default_assets: OnceCell<()>,
    testnet: Option<LocalTestnet>,
}

impl TestSession {
    /// The process-wide session, started from the environment on first use
    pub fn shared() -> Result<&'static TestSession> {
        SESSION.get_or_try_init(|| TestSession::start(FixtureSettings::from_env()?))
    }

    /// Start a session. Without a configured node a local testnet is started
    /// whose genesis funds `settings.default_account`.
    pub fn start(mut settings: FixtureSettings) -> Result<TestSession> {
        let mut keys = settings.keyring()?;
        let testnet = match settings.node {
            Some(_) => None,
            None => {
                let testnet = LocalTestnet::with_account(&settings.default_account)?;
                for wif in testnet.private_keys() {
                    keys.add(PrivateKey::from_wif(&wif)?);
                }
                settings.node = Some(testnet.node_url());
                Some(testnet)
            }
        };

        let chain = connect_instance(&settings, keys)?;
        claim_balance(&chain, &settings.genesis_balance, &settings.default_account)?;
        info!(
            "Test session ready on {} as {}",
            chain.node(),
            settings.default_account
        );

        Ok(TestSession {
            settings,
            chain,
            default_assets: OnceCell::new(),
            testnet,
        })
    }

    pub fn chain(&self) -> &Arc<Chain> {
        &self.chain
    }

    pub fn settings(&self) -> &FixtureSettings {
        &self.settings
    }

    pub fn default_account(&self) -> &str {
        &self.settings.default_account
    }

    /// The node this session started, if it did not connect to an existing one
    pub fn testnet(&self) -> Option<&LocalTestnet> {
        self.testnet.as_ref()
    }

    /// Create the default assets the first time any caller asks for them
    pub fn ensure_default_assets(&self) -> Result<()> {
        self.default_assets
            .get_or_try_init(|| create_default_assets(&self.chain, self.default_account()))?;
        Ok(())
    }

    pub fn create_asset(&self, symbol: &str, precision: u8) -> Result<AssetObject> {
        create_asset(&self.chain, self.default_account(), symbol, precision)
    }

    pub fn issue_asset(&self, symbol: &str, amount: f64, to: &str) -> Result<TransactionConfirmation> {
        issue_asset(&self.chain, symbol, amount, to)
    }

    pub fn unused_asset(&self) -> Result<String> {
        unused_asset(&self.chain)
    }

    pub fn unused_account(&self) -> Result<String> {
        unused_account(&self.chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{precision_factor, CORE_ASSET_ID, DEFAULT_GENESIS_AMOUNT, MAX_SHARE_SUPPLY};

    fn session() -> TestSession {
        let _ = env_logger::builder().is_test(true).try_init();
        TestSession::start(FixtureSettings::default()).unwrap()
    }

    #[test]
    fn test_session_claims_genesis_balance() {
        let session = session();
        let chain = session.chain();
        assert_eq!(
            chain.balance(session.default_account(), "TEST").unwrap(),
            DEFAULT_GENESIS_AMOUNT
        );
        assert!(session.testnet().is_some());

        let err = claim_balance(chain, "1.15.0", session.default_account()).unwrap_err();
        assert_eq!(err, FixtureError::ObjectNotFound("1.15.0".to_string()));
    }

    #[test]
    fn test_default_assets_created_once() {
        let session = session();
        session.ensure_default_assets().unwrap();
        session.ensure_default_assets().unwrap();

        let chain = session.chain();
        let usd = chain.get_asset("USD").unwrap();
        assert_eq!(usd.precision, 3);
        assert_eq!(usd.max_supply, MAX_SHARE_SUPPLY);
        assert_eq!(usd.current_supply, 1000 * precision_factor(3).unwrap());
        assert!(chain.get_asset("GOLD").is_ok());
        assert_eq!(
            chain.balance(session.default_account(), "USD").unwrap(),
            1000 * precision_factor(3).unwrap()
        );
    }

    #[test]
    fn test_unused_identifiers_are_free() {
        let session = session();
        let symbol = session.unused_asset().unwrap();
        assert_eq!(
            session.chain().get_asset(&symbol).unwrap_err(),
            FixtureError::AssetDoesNotExist(symbol.clone())
        );

        let name = session.unused_account().unwrap();
        assert!(name.starts_with("worker-"));
        assert_eq!(
            session.chain().get_account(&name).unwrap_err(),
            FixtureError::AccountDoesNotExist(name.clone())
        );
    }

    #[test]
    fn test_connect_instance_needs_node() {
        let result = connect_instance(&FixtureSettings::default(), Keyring::new());
        assert!(matches!(result, Err(FixtureError::Config(_))));
    }

    #[test]
    fn test_create_asset_keeps_base_supply_constant() {
        let session = session();
        for precision in [0, 5, 12] {
            let symbol = session.unused_asset().unwrap();
            let asset = session.create_asset(&symbol, precision).unwrap();
            assert_eq!(asset.max_supply, MAX_SHARE_SUPPLY);
            assert_eq!(asset.issuer, session.chain().get_account("init0").unwrap().id);
        }
        assert_eq!(session.chain().properties().core_asset, CORE_ASSET_ID);
    }

    #[test]
    fn test_create_asset_rejects_oversized_precision() {
        let session = session();
        for precision in [13, 20, u8::MAX] {
            let symbol = session.unused_asset().unwrap();
            let err = create_asset(session.chain(), session.default_account(), &symbol, precision)
                .unwrap_err();
            assert!(matches!(err, FixtureError::InvalidTransaction(_)), "{err:?}");
            assert_eq!(
                session.chain().get_asset(&symbol).unwrap_err(),
                FixtureError::AssetDoesNotExist(symbol.clone())
            );
        }
    }
}
