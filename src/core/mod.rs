//! Chain objects and operations
//!
//! Object ids, amounts and precision, the account/asset/genesis objects the
//! local test network stores, and the operations the client signs.

pub mod account;
pub mod asset;
pub mod fees;
pub mod genesis;
pub mod ids;
pub mod monetary;
pub mod operation;

pub use account::{validate_account_name, AccountObject};
pub use asset::{validate_precision, validate_symbol, AssetAmount, AssetObject};
pub use fees::FeeSchedule;
pub use genesis::{
    GenesisAccount, GenesisAllocation, GenesisBalance, GenesisConfig, DEFAULT_ACCOUNT,
    DEFAULT_GENESIS_AMOUNT, DEFAULT_GENESIS_BALANCE,
};
pub use ids::{ObjectId, CORE_ASSET_ID};
pub use monetary::{
    max_supply_for_precision, precision_factor, CORE_ASSET_PRECISION, CORE_ASSET_SYMBOL,
    MAX_PRECISION, MAX_SHARE_SUPPLY,
};
pub use operation::{Operation, OperationResult, Transaction, TransactionConfirmation};
