//! Genesis state of the local test network

use crate::core::monetary::{CORE_ASSET_PRECISION, CORE_ASSET_SYMBOL};
use crate::core::{AssetAmount, ObjectId};
use crate::error::{FixtureError, Result};
use crate::utils::{hex_encode, sha256_digest};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Id of the balance the session fixture claims
pub const DEFAULT_GENESIS_BALANCE: &str = "1.15.0";

/// Name of the account the local testnet creates by default
pub const DEFAULT_ACCOUNT: &str = "init0";

/// Core units pre-allocated to the default genesis balance (one million TEST)
pub const DEFAULT_GENESIS_AMOUNT: u64 = 100_000_000_000;

/// A pre-allocated balance waiting for a claim transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct GenesisBalance {
    pub id: ObjectId,
    /// Public key text allowed to claim this balance
    pub owner: String,
    pub balance: AssetAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub name: String,
    pub owner_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAllocation {
    pub owner_key: String,
    /// Core asset base units
    pub amount: u64,
}

/// Everything a fresh test network starts with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    #[serde(default = "default_core_symbol")]
    pub core_symbol: String,
    #[serde(default = "default_core_precision")]
    pub core_precision: u8,
    pub initial_accounts: Vec<GenesisAccount>,
    pub initial_balances: Vec<GenesisAllocation>,
}

fn default_core_symbol() -> String {
    CORE_ASSET_SYMBOL.to_string()
}

fn default_core_precision() -> u8 {
    CORE_ASSET_PRECISION
}

impl GenesisConfig {
    /// Genesis with one account and one claimable balance, both owned by `owner_key`
    pub fn single_account(name: &str, owner_key: &str, amount: u64) -> GenesisConfig {
        GenesisConfig {
            core_symbol: default_core_symbol(),
            core_precision: default_core_precision(),
            initial_accounts: vec![GenesisAccount {
                name: name.to_string(),
                owner_key: owner_key.to_string(),
            }],
            initial_balances: vec![GenesisAllocation {
                owner_key: owner_key.to_string(),
                amount,
            }],
        }
    }

    pub fn load(path: &Path) -> Result<GenesisConfig> {
        let text = fs::read_to_string(path).map_err(|e| {
            FixtureError::Config(format!("Failed to read genesis {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Chain id is the hex sha256 of the canonical genesis JSON
    pub fn chain_id(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex_encode(&sha256_digest(&bytes)))
    }

    /// The genesis balance objects, numbered in allocation order
    pub fn balance_objects(&self) -> Vec<GenesisBalance> {
        self.initial_balances
            .iter()
            .enumerate()
            .map(|(index, allocation)| GenesisBalance {
                id: ObjectId::balance(index as u64),
                owner: allocation.owner_key.clone(),
                balance: AssetAmount::new(allocation.amount, crate::core::CORE_ASSET_ID),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_balance_objects_are_numbered() {
        let mut genesis = GenesisConfig::single_account("init0", "TESTkey", 10);
        genesis.initial_balances.push(GenesisAllocation {
            owner_key: "TESTother".to_string(),
            amount: 20,
        });

        let balances = genesis.balance_objects();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].id.to_string(), DEFAULT_GENESIS_BALANCE);
        assert_eq!(balances[1].id.to_string(), "1.15.1");
        assert_eq!(balances[1].balance.amount, 20);
    }

    #[test]
    fn test_chain_id_depends_on_content() {
        let a = GenesisConfig::single_account("init0", "TESTkey", 10);
        let b = GenesisConfig::single_account("init0", "TESTkey", 11);
        assert_eq!(a.chain_id().unwrap(), a.chain_id().unwrap());
        assert_ne!(a.chain_id().unwrap(), b.chain_id().unwrap());
        assert_eq!(a.chain_id().unwrap().len(), 64);
    }

    #[test]
    fn test_load_fills_core_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("genesis.json");
        fs::write(
            &path,
            r#"{"initial_accounts":[{"name":"init0","owner_key":"TESTk"}],"initial_balances":[]}"#,
        )
        .unwrap();

        let genesis = GenesisConfig::load(&path).unwrap();
        assert_eq!(genesis.core_symbol, CORE_ASSET_SYMBOL);
        assert_eq!(genesis.core_precision, CORE_ASSET_PRECISION);
        assert_eq!(genesis.initial_accounts[0].name, "init0");
    }
}
