//! Local test network and the fixtures that run against it
//!
//! `LocalTestnet` serves a `Ledger` in-process; `fixtures` connects a
//! client to it (or to any configured node), funds the working account and
//! hands out helpers for assets and free identifiers.

pub mod fixtures;
pub mod identifiers;
pub mod ledger;
pub mod local;

pub use fixtures::{
    claim_balance, connect_instance, create_asset, create_default_assets, issue_asset,
    unused_account, unused_asset, TestSession,
};
pub use identifiers::{
    first_unused, is_missing_account, is_missing_asset, random_symbol, random_worker_name,
};
pub use ledger::{Ledger, COMMITTEE_ACCOUNT};
pub use local::{LocalTestnet, NodeGenesis, GENESIS_FILE};
