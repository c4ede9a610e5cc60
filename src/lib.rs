//! # Testnet Fixtures - Session Setup for Tests Against a Test Network
//!
//! This is the scaffolding I use to get a funded client in front of a test
//! network before any test body runs. When I come back to this code, here's
//! what I need to remember:
//!
//! ## What It Does
//! - **Session**: One connected `Chain` per process, registered as the shared instance
//! - **Funding**: Claims the genesis balance `1.15.0` into the working account once
//! - **Assets**: Creates assets with a precision-scaled max supply and issues them
//! - **Free identifiers**: Draws random symbols and `worker-N` names until one is unused
//! - **Local node**: Starts an in-process test network when no node is configured
//!
//! ## How I Organized My Code
//! - `testnet/`: Fixtures, the local node, its ledger, identifier generators
//! - `client/`: The `Chain` session handle and the shared instance registry
//! - `network/`: JSON-over-TCP protocol, reconnecting client, node server
//! - `core/`: Object ids, amounts, accounts, assets, operations, fees
//! - `storage/`: Sled-backed state of the local node
//! - `wallet/`: Key text formats and the keyring the client signs with
//! - `config/`: Fixture settings from TOML and `TESTNET_*` variables
//! - `utils/`: Hashing, encodings, signing helpers
//! - `cli/`: Command-line interface for running a node and bootstrapping it
//!
//! ## When I Need to Understand Something
//! 1. Start with `testnet/fixtures.rs` to see the session flow
//! 2. Look at `client/chain.rs` for what each call sends
//! 3. Check `testnet/ledger.rs` for how the node decides
//! 4. Review `network/protocol.rs` for the wire format

pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod storage;
pub mod testnet;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use cli::{Command, FeesArg, Opt};
pub use client::{clear_shared_instance, set_shared_instance, shared_instance, Chain};
pub use config::FixtureSettings;
pub use core::{
    max_supply_for_precision, AccountObject, AssetAmount, AssetObject, FeeSchedule,
    GenesisBalance, GenesisConfig, ObjectId, Operation, Transaction, TransactionConfirmation,
    CORE_ASSET_ID, DEFAULT_ACCOUNT, DEFAULT_GENESIS_AMOUNT, DEFAULT_GENESIS_BALANCE,
    MAX_PRECISION, MAX_SHARE_SUPPLY,
};
pub use error::{FixtureError, Result};
pub use network::{NodeClient, NodeServer, RetryPolicy};
pub use storage::ChainStore;
pub use testnet::{
    claim_balance, connect_instance, create_asset, create_default_assets, issue_asset,
    unused_account, unused_asset, Ledger, LocalTestnet, NodeGenesis, TestSession,
};
pub use wallet::{Keyring, PrivateKey, PublicKey};
