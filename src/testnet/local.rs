//! An in-process test network node
//!
//! The node runs a [`Ledger`] behind a [`NodeServer`] on its own thread and
//! stops when the [`LocalTestnet`] is dropped.

use crate::core::{FeeSchedule, GenesisConfig, DEFAULT_ACCOUNT, DEFAULT_GENESIS_AMOUNT};
use crate::error::{FixtureError, Result};
use crate::network::{NodeServer, ShutdownHandle};
use crate::storage::ChainStore;
use crate::testnet::Ledger;
use crate::wallet::{Keyring, PrivateKey};
use log::{info, warn};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub const LOCAL_LISTEN_ADDR: &str = "127.0.0.1:0";

/// Name of the genesis file a persistent node keeps in its data directory
pub const GENESIS_FILE: &str = "genesis.json";

/// The genesis a standalone node starts from, and the keys that can sign for it
pub struct NodeGenesis {
    pub genesis: GenesisConfig,
    pub keys: Keyring,
    /// True when the genesis key was created by this call
    pub generated: bool,
}

impl NodeGenesis {
    /// Pick the genesis for a standalone node.
    ///
    /// An explicit genesis file wins, then one saved in `data_dir` by an
    /// earlier run. Either way `configured` keys are used, plus the keyfile
    /// if it exists. Otherwise a single-account genesis for `account` is built
    /// around a fresh key, and only then is that key written to `keyfile`.
    /// The chosen genesis is saved into `data_dir` when one is given.
    pub fn prepare(
        explicit: Option<&Path>,
        data_dir: Option<&Path>,
        keyfile: Option<&Path>,
        configured: Keyring,
        account: &str,
    ) -> Result<NodeGenesis> {
        let saved = data_dir.map(|dir| dir.join(GENESIS_FILE));
        let existing = explicit
            .map(Path::to_path_buf)
            .or_else(|| saved.clone().filter(|path| path.exists()));

        let setup = match existing {
            Some(path) => {
                let mut keys = configured;
                if let Some(keyfile) = keyfile.filter(|path| path.exists()) {
                    keys.merge(Keyring::load_from_file(keyfile)?);
                }
                info!("Reusing genesis from {}", path.display());
                NodeGenesis {
                    genesis: GenesisConfig::load(&path)?,
                    keys,
                    generated: false,
                }
            }
            None => {
                let key = PrivateKey::generate()?;
                let genesis = GenesisConfig::single_account(
                    account,
                    &key.public_key().to_string(),
                    DEFAULT_GENESIS_AMOUNT,
                );
                let mut keys = Keyring::new();
                keys.add(key);
                if let Some(keyfile) = keyfile {
                    keys.save_to_file(keyfile)?;
                    info!("Wrote {} key(s) to {}", keys.len(), keyfile.display());
                }
                NodeGenesis {
                    genesis,
                    keys,
                    generated: true,
                }
            }
        };

        if let Some(path) = &saved {
            setup.genesis.save(path)?;
        }
        Ok(setup)
    }
}

pub struct LocalTestnet {
    address: SocketAddr,
    ledger: Arc<Ledger>,
    keys: Keyring,
    default_account: String,
    shutdown: ShutdownHandle,
    server: Option<JoinHandle<Result<()>>>,
}

impl LocalTestnet {
    /// Start a node on an ephemeral port over a throwaway store
    pub fn start(genesis: &GenesisConfig, keys: Keyring) -> Result<LocalTestnet> {
        LocalTestnet::start_on(
            LOCAL_LISTEN_ADDR,
            ChainStore::temporary()?,
            genesis,
            keys,
            FeeSchedule::default(),
        )
    }

    pub fn start_on(
        listen: &str,
        store: ChainStore,
        genesis: &GenesisConfig,
        keys: Keyring,
        fees: FeeSchedule,
    ) -> Result<LocalTestnet> {
        let ledger = Arc::new(Ledger::new(store, genesis, fees)?);
        let server = NodeServer::bind(listen, Arc::clone(&ledger))?;
        let address = server.local_addr()?;
        let shutdown = server.shutdown_handle()?;

        let handle = thread::Builder::new()
            .name("testnet-node".to_string())
            .spawn(move || server.run())?;

        let default_account = genesis
            .initial_accounts
            .first()
            .map(|account| account.name.clone())
            .unwrap_or_else(|| DEFAULT_ACCOUNT.to_string());
        info!(
            "Local testnet running at {address}, chain id {}",
            ledger.chain_id()
        );

        Ok(LocalTestnet {
            address,
            ledger,
            keys,
            default_account,
            shutdown,
            server: Some(handle),
        })
    }

    /// A node whose genesis gives `init0` one claimable balance
    pub fn with_default_genesis() -> Result<LocalTestnet> {
        LocalTestnet::with_account(DEFAULT_ACCOUNT)
    }

    /// A node whose genesis gives `name` one claimable balance, with a fresh key
    pub fn with_account(name: &str) -> Result<LocalTestnet> {
        let key = PrivateKey::generate()?;
        let genesis = GenesisConfig::single_account(
            name,
            &key.public_key().to_string(),
            DEFAULT_GENESIS_AMOUNT,
        );
        let mut keys = Keyring::new();
        keys.add(key);
        LocalTestnet::start(&genesis, keys)
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn node_url(&self) -> String {
        format!("tcp://{}", self.address)
    }

    pub fn keys(&self) -> &Keyring {
        &self.keys
    }

    /// WIF text of every key the genesis was built with
    pub fn private_keys(&self) -> Vec<String> {
        self.keys.to_wifs()
    }

    pub fn default_account(&self) -> &str {
        &self.default_account
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Block until the node thread exits
    pub fn wait(mut self) -> Result<()> {
        match self.server.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| FixtureError::Network("Node thread panicked".to_string()))?,
            None => Ok(()),
        }
    }
}

impl Drop for LocalTestnet {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.server.take() {
            match handle.join() {
                Ok(Err(e)) => warn!("Node at {} stopped with error: {e}", self.address),
                Err(_) => warn!("Node thread at {} panicked", self.address),
                Ok(Ok(())) => {}
            }
        }
        if let Err(e) = self.ledger.store().flush() {
            warn!("Failed to flush node store: {e}");
        }
    }
}
