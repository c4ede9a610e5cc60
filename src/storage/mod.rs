//! Persistence for the local test network
//!
//! Accounts, assets, genesis balances and account balances live in sled
//! trees, encoded with bincode.

pub mod chain_store;

pub use chain_store::{AppliedTransaction, ChainStore};
