use crate::core::monetary::conversions::to_base_units;
use crate::core::{
    validate_account_name, validate_precision, validate_symbol, AccountObject, AssetAmount,
    AssetObject, GenesisBalance, ObjectId, Operation, Transaction, TransactionConfirmation,
};
use crate::error::{FixtureError, Result};
use crate::network::{
    Call, ChainObject, ChainProperties, NodeClient, Reply, RetryPolicy, PROTOCOL_VERSION,
};
use crate::utils::current_timestamp;
use crate::wallet::{Keyring, PublicKey};
use log::{info, warn};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// How long a broadcast transaction stays valid
const TRANSACTION_LIFETIME_MS: i64 = 30_000;

fn unexpected(expected: &str, reply: &Reply) -> FixtureError {
    FixtureError::Rpc(format!(
        "Expected {expected} reply, got {}",
        reply.kind()
    ))
}

/// A connected session with a test network node.
///
/// All calls go through one connection and are strictly sequential; the
/// handle itself can be shared between threads.
pub struct Chain {
    node: String,
    client: Mutex<NodeClient>,
    keys: Keyring,
    properties: ChainProperties,
    nonce: AtomicU64,
}

impl Chain {
    pub fn connect(node: &str, keys: Keyring, retry: RetryPolicy) -> Result<Chain> {
        let mut client = NodeClient::connect(node, retry)?;
        let properties = match client.call(Call::GetChainProperties)? {
            Reply::ChainProperties(properties) => properties,
            other => return Err(unexpected("chain_properties", &other)),
        };

        info!(
            "Connected to {node}: chain id {}, core asset {} ({}) with precision {}",
            properties.chain_id,
            properties.core_symbol,
            properties.core_asset,
            properties.core_precision
        );
        if properties.protocol_version != PROTOCOL_VERSION {
            warn!(
                "Node speaks protocol {}, client expects {PROTOCOL_VERSION}",
                properties.protocol_version
            );
        }

        Ok(Chain {
            node: node.to_string(),
            client: Mutex::new(client),
            keys,
            properties,
            nonce: AtomicU64::new(rand::random()),
        })
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn properties(&self) -> &ChainProperties {
        &self.properties
    }

    pub fn keys(&self) -> &Keyring {
        &self.keys
    }

    fn call(&self, call: Call) -> Result<Reply> {
        let mut client = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        client.call(call)
    }

    pub fn get_object(&self, id: ObjectId) -> Result<Option<ChainObject>> {
        match self.call(Call::GetObjects { ids: vec![id] })? {
            Reply::Objects(mut objects) if objects.len() == 1 => Ok(objects.remove(0)),
            other => Err(unexpected("objects", &other)),
        }
    }

    /// Look up an account by name, or by id when given `1.2.x`
    pub fn get_account(&self, name_or_id: &str) -> Result<AccountObject> {
        if let Ok(id) = name_or_id.parse::<ObjectId>() {
            return match self.get_object(id)? {
                Some(ChainObject::Account(account)) => Ok(account),
                _ => Err(FixtureError::AccountDoesNotExist(name_or_id.to_string())),
            };
        }
        match self.call(Call::GetAccountByName {
            name: name_or_id.to_string(),
        })? {
            Reply::Account(Some(account)) => Ok(account),
            Reply::Account(None) => Err(FixtureError::AccountDoesNotExist(name_or_id.to_string())),
            other => Err(unexpected("account", &other)),
        }
    }

    /// Look up an asset by symbol, or by id when given `1.3.x`
    pub fn get_asset(&self, symbol_or_id: &str) -> Result<AssetObject> {
        if let Ok(id) = symbol_or_id.parse::<ObjectId>() {
            return match self.get_object(id)? {
                Some(ChainObject::Asset(asset)) => Ok(asset),
                _ => Err(FixtureError::AssetDoesNotExist(symbol_or_id.to_string())),
            };
        }
        match self.call(Call::LookupAssetSymbols {
            symbols: vec![symbol_or_id.to_string()],
        })? {
            Reply::Assets(mut assets) if assets.len() == 1 => assets
                .remove(0)
                .ok_or_else(|| FixtureError::AssetDoesNotExist(symbol_or_id.to_string())),
            other => Err(unexpected("assets", &other)),
        }
    }

    pub fn genesis_balance(&self, id: &str) -> Result<GenesisBalance> {
        let balance_id: ObjectId = id.parse()?;
        match self.get_object(balance_id)? {
            Some(ChainObject::GenesisBalance(balance)) => Ok(balance),
            _ => Err(FixtureError::ObjectNotFound(id.to_string())),
        }
    }

    /// Claim the whole genesis balance into `account`
    pub fn claim_balance(
        &self,
        balance: &GenesisBalance,
        account: &str,
    ) -> Result<TransactionConfirmation> {
        let account = self.get_account(account)?;
        let operation = Operation::BalanceClaim {
            deposit_to_account: account.id,
            balance_to_claim: balance.id,
            balance_owner_key: balance.owner.clone(),
            total_claimed: balance.balance,
        };
        let confirmation = self.sign_and_broadcast(operation, &balance.owner)?;
        info!(
            "Claimed {} of {} from {} into {}",
            balance.balance.amount, balance.balance.asset_id, balance.id, account.name
        );
        Ok(confirmation)
    }

    /// Create an asset issued by `account`; `max_supply` is in whole units
    pub fn create_asset(
        &self,
        symbol: &str,
        precision: u8,
        max_supply: f64,
        account: &str,
    ) -> Result<AssetObject> {
        validate_symbol(symbol)?;
        validate_precision(precision)?;
        let issuer = self.get_account(account)?;
        let operation = Operation::AssetCreate {
            issuer: issuer.id,
            symbol: symbol.to_string(),
            precision,
            max_supply: to_base_units(max_supply, precision)?,
        };
        let confirmation = self.sign_and_broadcast(operation, &issuer.owner_key)?;
        let asset = match confirmation.result.created_id() {
            Some(id) => self.get_asset(&id.to_string())?,
            None => self.get_asset(symbol)?,
        };
        info!(
            "Created asset {} ({}) issued by {}",
            asset.symbol, asset.id, issuer.name
        );
        Ok(asset)
    }

    /// Issue `amount` whole units of `symbol` to account `to`
    pub fn issue_asset(&self, symbol: &str, amount: f64, to: &str) -> Result<TransactionConfirmation> {
        let asset = self.get_asset(symbol)?;
        let issuer = self.get_account(&asset.issuer.to_string())?;
        let recipient = self.get_account(to)?;
        let operation = Operation::AssetIssue {
            issuer: issuer.id,
            asset_to_issue: asset.amount(to_base_units(amount, asset.precision)?),
            issue_to_account: recipient.id,
        };
        let confirmation = self.sign_and_broadcast(operation, &issuer.owner_key)?;
        info!("Issued {amount} {} to {}", asset.symbol, recipient.name);
        Ok(confirmation)
    }

    /// Register `name` controlled by `owner_key`, paid for by `registrar`
    pub fn create_account(
        &self,
        name: &str,
        owner_key: &PublicKey,
        registrar: &str,
    ) -> Result<AccountObject> {
        validate_account_name(name)?;
        let registrar = self.get_account(registrar)?;
        let operation = Operation::AccountCreate {
            registrar: registrar.id,
            name: name.to_string(),
            owner_key: owner_key.to_string(),
        };
        self.sign_and_broadcast(operation, &registrar.owner_key)?;
        let account = self.get_account(name)?;
        info!("Registered account {} ({})", account.name, account.id);
        Ok(account)
    }

    /// Move `amount` whole units of `symbol` between accounts
    pub fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: f64,
        symbol: &str,
    ) -> Result<TransactionConfirmation> {
        let asset = self.get_asset(symbol)?;
        let sender = self.get_account(from)?;
        let recipient = self.get_account(to)?;
        let operation = Operation::Transfer {
            from: sender.id,
            to: recipient.id,
            amount: asset.amount(to_base_units(amount, asset.precision)?),
        };
        self.sign_and_broadcast(operation, &sender.owner_key)
    }

    pub fn balances(&self, account: &str) -> Result<Vec<AssetAmount>> {
        let account = self.get_account(account)?;
        match self.call(Call::GetAccountBalances {
            account: account.id,
        })? {
            Reply::Balances(balances) => Ok(balances),
            other => Err(unexpected("balances", &other)),
        }
    }

    /// Base units of `symbol` held by `account`
    pub fn balance(&self, account: &str, symbol: &str) -> Result<u64> {
        let asset = self.get_asset(symbol)?;
        Ok(self
            .balances(account)?
            .iter()
            .filter(|balance| balance.asset_id == asset.id)
            .map(|balance| balance.amount)
            .sum())
    }

    fn sign_and_broadcast(
        &self,
        operation: Operation,
        signer: &str,
    ) -> Result<TransactionConfirmation> {
        let key = self
            .keys
            .get(signer)
            .ok_or_else(|| FixtureError::MissingKey(signer.to_string()))?;
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        let mut transaction =
            Transaction::new(operation, current_timestamp()? + TRANSACTION_LIFETIME_MS)
                .with_nonce(nonce);
        transaction.sign(key, &self.properties.chain_id)?;

        match self.call(Call::BroadcastTransaction { transaction })? {
            Reply::Confirmed(confirmation) => Ok(confirmation),
            other => Err(unexpected("confirmed", &other)),
        }
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("node", &self.node)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
