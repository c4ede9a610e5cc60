// State of the local test network, kept in sled trees keyed by object instance
use crate::core::{
    AccountObject, AssetAmount, AssetObject, GenesisBalance, ObjectId, TransactionConfirmation,
};
use crate::error::{FixtureError, Result};
use crate::utils::{deserialize, serialize};
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use std::path::Path;

const ACCOUNTS_TREE: &str = "accounts";
const ACCOUNT_NAMES_TREE: &str = "account_names";
const ASSETS_TREE: &str = "assets";
const ASSET_SYMBOLS_TREE: &str = "asset_symbols";
const GENESIS_BALANCES_TREE: &str = "genesis_balances";
const ACCOUNT_BALANCES_TREE: &str = "account_balances";
const APPLIED_TRANSACTIONS_TREE: &str = "applied_transactions";
const META_TREE: &str = "meta";

const NEXT_ACCOUNT_KEY: &str = "next_account";
const NEXT_ASSET_KEY: &str = "next_asset";

/// A confirmation kept for duplicate detection until its transaction expires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct AppliedTransaction {
    pub expiration: i64,
    pub confirmation: TransactionConfirmation,
}

#[derive(Clone)]
pub struct ChainStore {
    db: Db,
}

impl ChainStore {
    pub fn open(path: &Path) -> Result<ChainStore> {
        let db = sled::open(path)
            .map_err(|e| FixtureError::Database(format!("Failed to open database: {e}")))?;
        Ok(ChainStore { db })
    }

    /// In-memory store that disappears with the last handle
    pub fn temporary() -> Result<ChainStore> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| FixtureError::Database(format!("Failed to open database: {e}")))?;
        Ok(ChainStore { db })
    }

    fn tree(&self, name: &str) -> Result<Tree> {
        self.db
            .open_tree(name)
            .map_err(|e| FixtureError::Database(format!("Failed to open {name} tree: {e}")))
    }

    /// Whether genesis has already been written
    pub fn is_initialized(&self) -> Result<bool> {
        Ok(!self.tree(ASSETS_TREE)?.is_empty())
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn next_instance(&self, key: &str) -> Result<u64> {
        let meta = self.tree(META_TREE)?;
        let current = match meta.get(key)? {
            Some(bytes) => deserialize::<u64>(&bytes)?,
            None => 0,
        };
        meta.insert(key, serialize(&(current + 1))?)?;
        Ok(current)
    }

    pub fn next_account_id(&self) -> Result<ObjectId> {
        Ok(ObjectId::account(self.next_instance(NEXT_ACCOUNT_KEY)?))
    }

    pub fn next_asset_id(&self) -> Result<ObjectId> {
        Ok(ObjectId::asset(self.next_instance(NEXT_ASSET_KEY)?))
    }

    pub fn put_account(&self, account: &AccountObject) -> Result<()> {
        self.tree(ACCOUNTS_TREE)?
            .insert(account.id.instance_key(), serialize(account)?)?;
        self.tree(ACCOUNT_NAMES_TREE)?
            .insert(account.name.as_bytes(), account.id.instance_key().to_vec())?;
        Ok(())
    }

    pub fn get_account(&self, id: ObjectId) -> Result<Option<AccountObject>> {
        if !id.is_account() {
            return Ok(None);
        }
        match self.tree(ACCOUNTS_TREE)?.get(id.instance_key())? {
            Some(bytes) => Ok(Some(deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn find_account_by_name(&self, name: &str) -> Result<Option<AccountObject>> {
        match self.tree(ACCOUNT_NAMES_TREE)?.get(name.as_bytes())? {
            Some(key) => match self.tree(ACCOUNTS_TREE)?.get(key)? {
                Some(bytes) => Ok(Some(deserialize(&bytes)?)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    pub fn put_asset(&self, asset: &AssetObject) -> Result<()> {
        self.tree(ASSETS_TREE)?
            .insert(asset.id.instance_key(), serialize(asset)?)?;
        self.tree(ASSET_SYMBOLS_TREE)?
            .insert(asset.symbol.as_bytes(), asset.id.instance_key().to_vec())?;
        Ok(())
    }

    pub fn get_asset(&self, id: ObjectId) -> Result<Option<AssetObject>> {
        if !id.is_asset() {
            return Ok(None);
        }
        match self.tree(ASSETS_TREE)?.get(id.instance_key())? {
            Some(bytes) => Ok(Some(deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn find_asset_by_symbol(&self, symbol: &str) -> Result<Option<AssetObject>> {
        match self.tree(ASSET_SYMBOLS_TREE)?.get(symbol.as_bytes())? {
            Some(key) => match self.tree(ASSETS_TREE)?.get(key)? {
                Some(bytes) => Ok(Some(deserialize(&bytes)?)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    pub fn put_genesis_balance(&self, balance: &GenesisBalance) -> Result<()> {
        self.tree(GENESIS_BALANCES_TREE)?
            .insert(balance.id.instance_key(), serialize(balance)?)?;
        Ok(())
    }

    pub fn get_genesis_balance(&self, id: ObjectId) -> Result<Option<GenesisBalance>> {
        if !id.is_balance() {
            return Ok(None);
        }
        match self.tree(GENESIS_BALANCES_TREE)?.get(id.instance_key())? {
            Some(bytes) => Ok(Some(deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn remove_genesis_balance(&self, id: ObjectId) -> Result<()> {
        self.tree(GENESIS_BALANCES_TREE)?.remove(id.instance_key())?;
        Ok(())
    }

    fn balance_key(account: ObjectId, asset: ObjectId) -> Vec<u8> {
        let mut key = account.instance_key().to_vec();
        key.extend(asset.instance_key());
        key
    }

    /// Base units of `asset` held by `account`
    pub fn balance(&self, account: ObjectId, asset: ObjectId) -> Result<u64> {
        match self
            .tree(ACCOUNT_BALANCES_TREE)?
            .get(Self::balance_key(account, asset))?
        {
            Some(bytes) => deserialize(&bytes),
            None => Ok(0),
        }
    }

    pub fn credit(&self, account: ObjectId, amount: AssetAmount) -> Result<u64> {
        let current = self.balance(account, amount.asset_id)?;
        let updated = current.checked_add(amount.amount).ok_or_else(|| {
            FixtureError::InvalidTransaction(format!("balance of {account} overflows"))
        })?;
        self.store_balance(account, amount.asset_id, updated)?;
        Ok(updated)
    }

    pub fn debit(&self, account: ObjectId, amount: AssetAmount) -> Result<u64> {
        let current = self.balance(account, amount.asset_id)?;
        let updated =
            current
                .checked_sub(amount.amount)
                .ok_or(FixtureError::InsufficientFunds {
                    required: amount.amount,
                    available: current,
                })?;
        self.store_balance(account, amount.asset_id, updated)?;
        Ok(updated)
    }

    fn store_balance(&self, account: ObjectId, asset: ObjectId, amount: u64) -> Result<()> {
        let tree = self.tree(ACCOUNT_BALANCES_TREE)?;
        let key = Self::balance_key(account, asset);
        if amount == 0 {
            tree.remove(key)?;
        } else {
            tree.insert(key, serialize(&amount)?)?;
        }
        Ok(())
    }

    pub fn put_applied(&self, tx_id: &str, applied: &AppliedTransaction) -> Result<()> {
        self.tree(APPLIED_TRANSACTIONS_TREE)?
            .insert(tx_id.as_bytes(), serialize(applied)?)?;
        Ok(())
    }

    pub fn get_applied(&self, tx_id: &str) -> Result<Option<AppliedTransaction>> {
        match self.tree(APPLIED_TRANSACTIONS_TREE)?.get(tx_id.as_bytes())? {
            Some(bytes) => Ok(Some(deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Forget applied transactions that expired at or before `now`
    pub fn prune_applied(&self, now: i64) -> Result<usize> {
        let tree = self.tree(APPLIED_TRANSACTIONS_TREE)?;
        let mut expired = Vec::new();
        for item in tree.iter() {
            let (key, value) = item.map_err(|e| {
                FixtureError::Database(format!("Failed to iterate applied transactions: {e}"))
            })?;
            let applied: AppliedTransaction = deserialize(&value)?;
            if applied.expiration <= now {
                expired.push(key);
            }
        }
        for key in &expired {
            tree.remove(key)?;
        }
        Ok(expired.len())
    }

    /// Non-zero balances of an account, in asset id order
    pub fn account_balances(&self, account: ObjectId) -> Result<Vec<AssetAmount>> {
        let mut balances = Vec::new();
        for item in self
            .tree(ACCOUNT_BALANCES_TREE)?
            .scan_prefix(account.instance_key())
        {
            let (key, value) = item.map_err(|e| {
                FixtureError::Database(format!("Failed to iterate balances: {e}"))
            })?;
            let mut instance = [0u8; 8];
            instance.copy_from_slice(&key[8..16]);
            balances.push(AssetAmount::new(
                deserialize(&value)?,
                ObjectId::asset(u64::from_be_bytes(instance)),
            ));
        }
        Ok(balances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn account(store: &ChainStore, name: &str) -> AccountObject {
        let account = AccountObject {
            id: store.next_account_id().unwrap(),
            name: name.to_string(),
            owner_key: "TESTkey".to_string(),
            registrar: ObjectId::account(0),
        };
        store.put_account(&account).unwrap();
        account
    }

    #[test]
    fn test_ids_are_sequential() {
        let store = ChainStore::temporary().unwrap();
        assert_eq!(store.next_asset_id().unwrap(), ObjectId::asset(0));
        assert_eq!(store.next_asset_id().unwrap(), ObjectId::asset(1));
        assert_eq!(store.next_account_id().unwrap(), ObjectId::account(0));
    }

    #[test]
    fn test_account_lookup_by_name_and_id() {
        let store = ChainStore::temporary().unwrap();
        let init0 = account(&store, "init0");

        assert_eq!(store.find_account_by_name("init0").unwrap(), Some(init0.clone()));
        assert_eq!(store.get_account(init0.id).unwrap(), Some(init0));
        assert!(store.find_account_by_name("worker-1").unwrap().is_none());
        assert!(store.get_account(ObjectId::asset(0)).unwrap().is_none());
    }

    #[test]
    fn test_asset_lookup_by_symbol() {
        let store = ChainStore::temporary().unwrap();
        let asset = AssetObject {
            id: store.next_asset_id().unwrap(),
            symbol: "USD".to_string(),
            precision: 3,
            issuer: ObjectId::account(0),
            max_supply: 1_000,
            current_supply: 0,
        };
        store.put_asset(&asset).unwrap();

        assert!(store.is_initialized().unwrap());
        assert_eq!(store.find_asset_by_symbol("USD").unwrap(), Some(asset));
        assert!(store.find_asset_by_symbol("GOLD").unwrap().is_none());
    }

    #[test]
    fn test_applied_transactions_pruned_after_expiry() {
        let dir = tempdir().unwrap();
        let applied = |expiration: i64, id: &str| AppliedTransaction {
            expiration,
            confirmation: TransactionConfirmation {
                id: id.to_string(),
                result: crate::core::OperationResult::Void,
                fee: AssetAmount::new(0, ObjectId::asset(0)),
            },
        };
        {
            let store = ChainStore::open(dir.path()).unwrap();
            store.put_applied("old", &applied(1_000, "old")).unwrap();
            store.put_applied("live", &applied(5_000, "live")).unwrap();
            store.flush().unwrap();
        }

        let store = ChainStore::open(dir.path()).unwrap();
        assert_eq!(store.get_applied("live").unwrap(), Some(applied(5_000, "live")));
        assert_eq!(store.prune_applied(1_000).unwrap(), 1);
        assert!(store.get_applied("old").unwrap().is_none());
        assert!(store.get_applied("live").unwrap().is_some());
    }

    #[test]
    fn test_credit_and_debit() {
        let store = ChainStore::temporary().unwrap();
        let init0 = account(&store, "init0");
        let usd = ObjectId::asset(1);

        store.credit(init0.id, AssetAmount::new(500, usd)).unwrap();
        assert_eq!(store.debit(init0.id, AssetAmount::new(200, usd)).unwrap(), 300);

        let err = store.debit(init0.id, AssetAmount::new(301, usd)).unwrap_err();
        assert_eq!(
            err,
            FixtureError::InsufficientFunds {
                required: 301,
                available: 300
            }
        );
        assert_eq!(store.balance(init0.id, usd).unwrap(), 300);
    }

    #[test]
    fn test_account_balances_skip_other_accounts() {
        let store = ChainStore::temporary().unwrap();
        let init0 = account(&store, "init0");
        let other = account(&store, "worker-1");

        store
            .credit(init0.id, AssetAmount::new(7, ObjectId::asset(0)))
            .unwrap();
        store
            .credit(init0.id, AssetAmount::new(9, ObjectId::asset(2)))
            .unwrap();
        store
            .credit(other.id, AssetAmount::new(1, ObjectId::asset(0)))
            .unwrap();

        let balances = store.account_balances(init0.id).unwrap();
        assert_eq!(
            balances,
            vec![
                AssetAmount::new(7, ObjectId::asset(0)),
                AssetAmount::new(9, ObjectId::asset(2)),
            ]
        );
    }

    #[test]
    fn test_genesis_balance_removal() {
        let store = ChainStore::temporary().unwrap();
        let balance = GenesisBalance {
            id: ObjectId::balance(0),
            owner: "TESTkey".to_string(),
            balance: AssetAmount::new(10, ObjectId::asset(0)),
        };
        store.put_genesis_balance(&balance).unwrap();
        assert_eq!(
            store.get_genesis_balance(ObjectId::balance(0)).unwrap(),
            Some(balance)
        );

        store.remove_genesis_balance(ObjectId::balance(0)).unwrap();
        assert!(store
            .get_genesis_balance(ObjectId::balance(0))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chain");
        {
            let store = ChainStore::open(&path).unwrap();
            account(&store, "init0");
            store.flush().unwrap();
        }
        let store = ChainStore::open(&path).unwrap();
        assert!(store.find_account_by_name("init0").unwrap().is_some());
        assert_eq!(store.next_account_id().unwrap(), ObjectId::account(1));
    }
}
