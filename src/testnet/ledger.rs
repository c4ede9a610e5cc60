//! Transaction evaluation for the local test network
//!
//! The ledger answers lookups from the chain store and applies signed
//! single-operation transactions. Evaluation is serialised behind one mutex;
//! each evaluator finishes all of its checks before it writes anything.

use crate::core::{
    validate_account_name, validate_precision, validate_symbol, AccountObject, AssetAmount,
    AssetObject, FeeSchedule, GenesisConfig, ObjectId, Operation, OperationResult, Transaction,
    TransactionConfirmation, CORE_ASSET_ID, MAX_SHARE_SUPPLY,
};
use crate::error::{FixtureError, Result};
use crate::network::{
    Call, ChainObject, ChainProperties, Reply, RequestHandler, RpcError, PROTOCOL_VERSION,
};
use crate::storage::{AppliedTransaction, ChainStore};
use crate::utils::current_timestamp;
use crate::wallet::PublicKey;
use log::{debug, info};
use std::sync::{Mutex, PoisonError};

/// Name of the account that owns the core asset and collects fees
pub const COMMITTEE_ACCOUNT: &str = "committee-account";

/// Transactions may not expire further out than one day
const MAX_TRANSACTION_LIFETIME_MS: i64 = 24 * 60 * 60 * 1000;

pub struct Ledger {
    store: ChainStore,
    fees: FeeSchedule,
    chain_id: String,
    core_symbol: String,
    core_precision: u8,
    /// Serialises evaluation
    evaluation: Mutex<()>,
}

impl Ledger {
    /// Open a ledger over `store`, writing genesis first if the store is empty
    pub fn new(store: ChainStore, genesis: &GenesisConfig, fees: FeeSchedule) -> Result<Ledger> {
        if !store.is_initialized()? {
            Self::apply_genesis(&store, genesis)?;
        }
        Ok(Ledger {
            store,
            fees,
            chain_id: genesis.chain_id()?,
            core_symbol: genesis.core_symbol.clone(),
            core_precision: genesis.core_precision,
            evaluation: Mutex::new(()),
        })
    }

    fn apply_genesis(store: &ChainStore, genesis: &GenesisConfig) -> Result<()> {
        validate_symbol(&genesis.core_symbol)?;
        validate_precision(genesis.core_precision)?;

        let committee = AccountObject {
            id: store.next_account_id()?,
            name: COMMITTEE_ACCOUNT.to_string(),
            owner_key: String::new(),
            registrar: ObjectId::account(0),
        };
        store.put_account(&committee)?;

        let mut allocated: u64 = 0;
        for allocation in &genesis.initial_balances {
            allocation.owner_key.parse::<PublicKey>()?;
            allocated = allocated
                .checked_add(allocation.amount)
                .filter(|total| *total <= MAX_SHARE_SUPPLY)
                .ok_or_else(|| {
                    FixtureError::Config("Genesis allocations exceed the max supply".to_string())
                })?;
        }

        let core_id = store.next_asset_id()?;
        store.put_asset(&AssetObject {
            id: core_id,
            symbol: genesis.core_symbol.clone(),
            precision: genesis.core_precision,
            issuer: committee.id,
            max_supply: MAX_SHARE_SUPPLY,
            current_supply: allocated,
        })?;

        for account in &genesis.initial_accounts {
            validate_account_name(&account.name)?;
            account.owner_key.parse::<PublicKey>()?;
            if store.find_account_by_name(&account.name)?.is_some() {
                return Err(FixtureError::AccountAlreadyExists(account.name.clone()));
            }
            store.put_account(&AccountObject {
                id: store.next_account_id()?,
                name: account.name.clone(),
                owner_key: account.owner_key.clone(),
                registrar: committee.id,
            })?;
        }

        for balance in genesis.balance_objects() {
            store.put_genesis_balance(&balance)?;
        }

        store.flush()?;
        info!(
            "Genesis written: {} account(s), {} balance(s), {allocated} {} allocated",
            genesis.initial_accounts.len(),
            genesis.initial_balances.len(),
            genesis.core_symbol
        );
        Ok(())
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn store(&self) -> &ChainStore {
        &self.store
    }

    pub fn properties(&self) -> Result<ChainProperties> {
        Ok(ChainProperties {
            chain_id: self.chain_id.clone(),
            core_asset: CORE_ASSET_ID,
            core_symbol: self.core_symbol.clone(),
            core_precision: self.core_precision,
            head_time: current_timestamp()?,
            protocol_version: PROTOCOL_VERSION,
        })
    }

    pub fn get_objects(&self, ids: &[ObjectId]) -> Result<Vec<Option<ChainObject>>> {
        ids.iter()
            .map(|id| {
                if id.is_account() {
                    Ok(self.store.get_account(*id)?.map(ChainObject::Account))
                } else if id.is_asset() {
                    Ok(self.store.get_asset(*id)?.map(ChainObject::Asset))
                } else if id.is_balance() {
                    Ok(self
                        .store
                        .get_genesis_balance(*id)?
                        .map(ChainObject::GenesisBalance))
                } else {
                    Ok(None)
                }
            })
            .collect()
    }

    pub fn lookup_asset_symbols(&self, symbols: &[String]) -> Result<Vec<Option<AssetObject>>> {
        symbols
            .iter()
            .map(|symbol| self.store.find_asset_by_symbol(symbol))
            .collect()
    }

    pub fn get_account_by_name(&self, name: &str) -> Result<Option<AccountObject>> {
        self.store.find_account_by_name(name)
    }

    pub fn get_account_balances(&self, account: ObjectId) -> Result<Vec<AssetAmount>> {
        self.account(account)?;
        self.store.account_balances(account)
    }

    fn account(&self, id: ObjectId) -> Result<AccountObject> {
        self.store
            .get_account(id)?
            .ok_or_else(|| FixtureError::ObjectNotFound(id.to_string()))
    }

    fn asset(&self, id: ObjectId) -> Result<AssetObject> {
        self.store
            .get_asset(id)?
            .ok_or_else(|| FixtureError::ObjectNotFound(id.to_string()))
    }

    /// Apply a signed transaction. Re-sending an applied transaction before
    /// it expires returns the first confirmation without applying it again.
    pub fn push_transaction(&self, transaction: &Transaction) -> Result<TransactionConfirmation> {
        let _guard = self.evaluation.lock().unwrap_or_else(PoisonError::into_inner);
        let now = current_timestamp()?;
        let pruned = self.store.prune_applied(now)?;
        if pruned > 0 {
            debug!("Forgot {pruned} expired transaction(s)");
        }

        let tx_id = transaction.id(&self.chain_id)?;
        if let Some(applied) = self.store.get_applied(&tx_id)? {
            debug!("Transaction {tx_id} already applied");
            return Ok(applied.confirmation);
        }

        if transaction.expiration <= now {
            return Err(FixtureError::InvalidTransaction(format!(
                "transaction {tx_id} expired"
            )));
        }
        if transaction.expiration > now + MAX_TRANSACTION_LIFETIME_MS {
            return Err(FixtureError::InvalidTransaction(format!(
                "transaction {tx_id} expires too far in the future"
            )));
        }
        if !transaction.verify(&self.chain_id)? {
            return Err(FixtureError::MissingAuthority(
                "signature does not match the signing key".to_string(),
            ));
        }

        let operation = &transaction.operation;
        let required_key = self.required_key(operation)?;
        if required_key.is_empty() || transaction.signer != required_key {
            return Err(FixtureError::MissingAuthority(format!(
                "{} must be signed by {required_key}",
                operation.name()
            )));
        }

        let fee = self.fees.fee_for(operation);
        let result = self.evaluate(operation, fee)?;
        let confirmation = TransactionConfirmation {
            id: tx_id.clone(),
            result,
            fee: AssetAmount::new(fee, CORE_ASSET_ID),
        };
        info!("Applied {} in transaction {tx_id}", operation.name());
        self.store.put_applied(
            &tx_id,
            &AppliedTransaction {
                expiration: transaction.expiration,
                confirmation: confirmation.clone(),
            },
        )?;
        Ok(confirmation)
    }

    /// Public key text the operation must be signed with
    fn required_key(&self, operation: &Operation) -> Result<String> {
        match operation {
            Operation::BalanceClaim {
                balance_owner_key, ..
            } => Ok(balance_owner_key.clone()),
            _ => Ok(self.account(operation.fee_payer())?.owner_key),
        }
    }

    fn check_funds(&self, account: ObjectId, asset: ObjectId, required: u64) -> Result<()> {
        let available = self.store.balance(account, asset)?;
        if available < required {
            return Err(FixtureError::InsufficientFunds {
                required,
                available,
            });
        }
        Ok(())
    }

    fn pay_fee(&self, payer: ObjectId, fee: u64) -> Result<()> {
        if fee == 0 {
            return Ok(());
        }
        let amount = AssetAmount::new(fee, CORE_ASSET_ID);
        self.store.debit(payer, amount)?;
        self.store.credit(ObjectId::account(0), amount)?;
        Ok(())
    }

    fn evaluate(&self, operation: &Operation, fee: u64) -> Result<OperationResult> {
        match operation {
            Operation::BalanceClaim {
                deposit_to_account,
                balance_to_claim,
                balance_owner_key,
                total_claimed,
            } => self.claim_balance(
                *deposit_to_account,
                *balance_to_claim,
                balance_owner_key,
                *total_claimed,
            ),
            Operation::AssetCreate {
                issuer,
                symbol,
                precision,
                max_supply,
            } => self.create_asset(*issuer, symbol, *precision, *max_supply, fee),
            Operation::AssetIssue {
                issuer,
                asset_to_issue,
                issue_to_account,
            } => self.issue_asset(*issuer, *asset_to_issue, *issue_to_account, fee),
            Operation::AccountCreate {
                registrar,
                name,
                owner_key,
            } => self.create_account(*registrar, name, owner_key, fee),
            Operation::Transfer { from, to, amount } => self.transfer(*from, *to, *amount, fee),
        }
    }

    fn claim_balance(
        &self,
        deposit_to: ObjectId,
        balance_id: ObjectId,
        owner_key: &str,
        claimed: AssetAmount,
    ) -> Result<OperationResult> {
        let mut balance = self
            .store
            .get_genesis_balance(balance_id)?
            .ok_or_else(|| FixtureError::ObjectNotFound(balance_id.to_string()))?;
        if balance.owner != owner_key {
            return Err(FixtureError::MissingAuthority(format!(
                "{balance_id} is not owned by {owner_key}"
            )));
        }
        if claimed.asset_id != balance.balance.asset_id {
            return Err(FixtureError::InvalidTransaction(format!(
                "{balance_id} holds {}, not {}",
                balance.balance.asset_id, claimed.asset_id
            )));
        }
        if claimed.amount == 0 || claimed.amount > balance.balance.amount {
            return Err(FixtureError::InvalidTransaction(format!(
                "cannot claim {} from {balance_id} holding {}",
                claimed.amount, balance.balance.amount
            )));
        }
        self.account(deposit_to)?;

        self.store.credit(deposit_to, claimed)?;
        balance.balance.amount -= claimed.amount;
        if balance.balance.amount == 0 {
            self.store.remove_genesis_balance(balance_id)?;
        } else {
            self.store.put_genesis_balance(&balance)?;
        }
        Ok(OperationResult::Void)
    }

    fn create_asset(
        &self,
        issuer: ObjectId,
        symbol: &str,
        precision: u8,
        max_supply: u64,
        fee: u64,
    ) -> Result<OperationResult> {
        validate_symbol(symbol)?;
        validate_precision(precision)?;
        if max_supply == 0 || max_supply > MAX_SHARE_SUPPLY {
            return Err(FixtureError::InvalidTransaction(format!(
                "max supply {max_supply} must be between 1 and {MAX_SHARE_SUPPLY}"
            )));
        }
        if self.store.find_asset_by_symbol(symbol)?.is_some() {
            return Err(FixtureError::AssetAlreadyExists(symbol.to_string()));
        }
        self.check_funds(issuer, CORE_ASSET_ID, fee)?;

        self.pay_fee(issuer, fee)?;
        let id = self.store.next_asset_id()?;
        self.store.put_asset(&AssetObject {
            id,
            symbol: symbol.to_string(),
            precision,
            issuer,
            max_supply,
            current_supply: 0,
        })?;
        Ok(OperationResult::ObjectCreated(id))
    }

    fn issue_asset(
        &self,
        issuer: ObjectId,
        amount: AssetAmount,
        to: ObjectId,
        fee: u64,
    ) -> Result<OperationResult> {
        let mut asset = self.asset(amount.asset_id)?;
        if asset.issuer != issuer {
            return Err(FixtureError::MissingAuthority(format!(
                "only {} may issue {}",
                asset.issuer, asset.symbol
            )));
        }
        if amount.amount == 0 {
            return Err(FixtureError::InvalidTransaction(
                "issue amount must be positive".to_string(),
            ));
        }
        self.account(to)?;
        let new_supply = asset
            .current_supply
            .checked_add(amount.amount)
            .filter(|supply| *supply <= asset.max_supply)
            .ok_or_else(|| FixtureError::SupplyExceeded {
                symbol: asset.symbol.clone(),
                max_supply: asset.max_supply,
                requested: asset.current_supply.saturating_add(amount.amount),
            })?;
        self.check_funds(issuer, CORE_ASSET_ID, fee)?;

        self.pay_fee(issuer, fee)?;
        self.store.credit(to, amount)?;
        asset.current_supply = new_supply;
        self.store.put_asset(&asset)?;
        Ok(OperationResult::Void)
    }

    fn create_account(
        &self,
        registrar: ObjectId,
        name: &str,
        owner_key: &str,
        fee: u64,
    ) -> Result<OperationResult> {
        validate_account_name(name)?;
        owner_key.parse::<PublicKey>()?;
        if self.store.find_account_by_name(name)?.is_some() {
            return Err(FixtureError::AccountAlreadyExists(name.to_string()));
        }
        self.check_funds(registrar, CORE_ASSET_ID, fee)?;

        self.pay_fee(registrar, fee)?;
        let id = self.store.next_account_id()?;
        self.store.put_account(&AccountObject {
            id,
            name: name.to_string(),
            owner_key: owner_key.to_string(),
            registrar,
        })?;
        Ok(OperationResult::ObjectCreated(id))
    }

    fn transfer(
        &self,
        from: ObjectId,
        to: ObjectId,
        amount: AssetAmount,
        fee: u64,
    ) -> Result<OperationResult> {
        if amount.amount == 0 {
            return Err(FixtureError::InvalidTransaction(
                "transfer amount must be positive".to_string(),
            ));
        }
        if from == to {
            return Err(FixtureError::InvalidTransaction(
                "cannot transfer to the sending account".to_string(),
            ));
        }
        self.asset(amount.asset_id)?;
        self.account(to)?;
        if amount.asset_id == CORE_ASSET_ID {
            let required = amount.amount.checked_add(fee).ok_or_else(|| {
                FixtureError::InvalidTransaction("transfer amount overflows".to_string())
            })?;
            self.check_funds(from, CORE_ASSET_ID, required)?;
        } else {
            self.check_funds(from, CORE_ASSET_ID, fee)?;
            self.check_funds(from, amount.asset_id, amount.amount)?;
        }

        self.pay_fee(from, fee)?;
        self.store.debit(from, amount)?;
        self.store.credit(to, amount)?;
        Ok(OperationResult::Void)
    }

    fn dispatch(&self, call: Call) -> Result<Reply> {
        match call {
            Call::GetChainProperties => Ok(Reply::ChainProperties(self.properties()?)),
            Call::GetObjects { ids } => Ok(Reply::Objects(self.get_objects(&ids)?)),
            Call::LookupAssetSymbols { symbols } => {
                Ok(Reply::Assets(self.lookup_asset_symbols(&symbols)?))
            }
            Call::GetAccountByName { name } => {
                Ok(Reply::Account(self.get_account_by_name(&name)?))
            }
            Call::GetAccountBalances { account } => {
                Ok(Reply::Balances(self.get_account_balances(account)?))
            }
            Call::BroadcastTransaction { transaction } => {
                Ok(Reply::Confirmed(self.push_transaction(&transaction)?))
            }
        }
    }
}

impl RequestHandler for Ledger {
    fn handle(&self, call: Call) -> std::result::Result<Reply, RpcError> {
        self.dispatch(call).map_err(RpcError::from)
    }
}
