//! Wire messages between the client and a test network node
//!
//! Every message is one JSON document terminated by a newline.

use crate::core::{
    AccountObject, AssetAmount, AssetObject, GenesisBalance, ObjectId, Transaction,
    TransactionConfirmation,
};
use crate::error::FixtureError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum Call {
    GetChainProperties,
    GetObjects { ids: Vec<ObjectId> },
    LookupAssetSymbols { symbols: Vec<String> },
    GetAccountByName { name: String },
    GetAccountBalances { account: ObjectId },
    BroadcastTransaction { transaction: Transaction },
}

impl Call {
    pub fn method(&self) -> &'static str {
        match self {
            Call::GetChainProperties => "get_chain_properties",
            Call::GetObjects { .. } => "get_objects",
            Call::LookupAssetSymbols { .. } => "lookup_asset_symbols",
            Call::GetAccountByName { .. } => "get_account_by_name",
            Call::GetAccountBalances { .. } => "get_account_balances",
            Call::BroadcastTransaction { .. } => "broadcast_transaction",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub call: Call,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProperties {
    pub chain_id: String,
    pub core_asset: ObjectId,
    pub core_symbol: String,
    pub core_precision: u8,
    /// Milliseconds since the unix epoch
    pub head_time: i64,
    pub protocol_version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "object", rename_all = "snake_case")]
pub enum ChainObject {
    Account(AccountObject),
    Asset(AssetObject),
    GenesisBalance(GenesisBalance),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Reply {
    ChainProperties(ChainProperties),
    Objects(Vec<Option<ChainObject>>),
    Assets(Vec<Option<AssetObject>>),
    Account(Option<AccountObject>),
    Balances(Vec<AssetAmount>),
    Confirmed(TransactionConfirmation),
}

impl Reply {
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::ChainProperties(_) => "chain_properties",
            Reply::Objects(_) => "objects",
            Reply::Assets(_) => "assets",
            Reply::Account(_) => "account",
            Reply::Balances(_) => "balances",
            Reply::Confirmed(_) => "confirmed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcErrorCode {
    BadRequest,
    ObjectNotFound,
    AssetNotFound,
    AccountNotFound,
    AssetExists,
    AccountExists,
    MissingAuthority,
    InsufficientFunds,
    SupplyExceeded,
    InvalidTransaction,
    Internal,
}

/// Rejection sent back by the node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
    /// The offending symbol, name or id, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// (required, available) for funds, (max_supply, requested) for supply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amounts: Option<(u64, u64)>,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl From<FixtureError> for RpcError {
    fn from(err: FixtureError) -> Self {
        let message = err.to_string();
        let mut amounts = None;
        let (code, subject) = match err {
            FixtureError::ObjectNotFound(id) => (RpcErrorCode::ObjectNotFound, Some(id)),
            FixtureError::AssetDoesNotExist(symbol) => (RpcErrorCode::AssetNotFound, Some(symbol)),
            FixtureError::AccountDoesNotExist(name) => (RpcErrorCode::AccountNotFound, Some(name)),
            FixtureError::AssetAlreadyExists(symbol) => (RpcErrorCode::AssetExists, Some(symbol)),
            FixtureError::AccountAlreadyExists(name) => (RpcErrorCode::AccountExists, Some(name)),
            FixtureError::MissingAuthority(_) => (RpcErrorCode::MissingAuthority, None),
            FixtureError::InsufficientFunds {
                required,
                available,
            } => {
                amounts = Some((required, available));
                (RpcErrorCode::InsufficientFunds, None)
            }
            FixtureError::SupplyExceeded {
                symbol,
                max_supply,
                requested,
            } => {
                amounts = Some((max_supply, requested));
                (RpcErrorCode::SupplyExceeded, Some(symbol))
            }
            FixtureError::InvalidTransaction(_)
            | FixtureError::InvalidSymbol(_)
            | FixtureError::InvalidAccountName(_)
            | FixtureError::InvalidKey(_)
            | FixtureError::InvalidAmount(_)
            | FixtureError::MissingKey(_) => (RpcErrorCode::InvalidTransaction, None),
            FixtureError::Serialization(_) => (RpcErrorCode::BadRequest, None),
            _ => (RpcErrorCode::Internal, None),
        };
        RpcError {
            code,
            message,
            subject,
            amounts,
        }
    }
}

impl From<RpcError> for FixtureError {
    fn from(err: RpcError) -> Self {
        let subject = err.subject.clone().unwrap_or_default();
        match err.code {
            RpcErrorCode::ObjectNotFound => FixtureError::ObjectNotFound(subject),
            RpcErrorCode::AssetNotFound => FixtureError::AssetDoesNotExist(subject),
            RpcErrorCode::AccountNotFound => FixtureError::AccountDoesNotExist(subject),
            RpcErrorCode::AssetExists => FixtureError::AssetAlreadyExists(subject),
            RpcErrorCode::AccountExists => FixtureError::AccountAlreadyExists(subject),
            RpcErrorCode::MissingAuthority => FixtureError::MissingAuthority(err.message),
            RpcErrorCode::InsufficientFunds => match err.amounts {
                Some((required, available)) => FixtureError::InsufficientFunds {
                    required,
                    available,
                },
                None => FixtureError::InvalidTransaction(err.message),
            },
            RpcErrorCode::SupplyExceeded => match err.amounts {
                Some((max_supply, requested)) => FixtureError::SupplyExceeded {
                    symbol: subject,
                    max_supply,
                    requested,
                },
                None => FixtureError::InvalidTransaction(err.message),
            },
            RpcErrorCode::InvalidTransaction => FixtureError::InvalidTransaction(err.message),
            RpcErrorCode::BadRequest | RpcErrorCode::Internal => FixtureError::Rpc(err.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub result: std::result::Result<Reply, RpcError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_json_shape() {
        let request = Request {
            id: 7,
            call: Call::LookupAssetSymbols {
                symbols: vec!["USD".to_string()],
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["call"]["method"], "lookup_asset_symbols");
        assert_eq!(json["call"]["params"]["symbols"][0], "USD");

        let unit = serde_json::to_value(Call::GetChainProperties).unwrap();
        assert_eq!(unit["method"], "get_chain_properties");
    }

    #[test]
    fn test_missing_asset_reply_is_null() {
        let response = Response {
            id: 1,
            result: Ok(Reply::Assets(vec![None])),
        };
        let text = serde_json::to_string(&response).unwrap();
        assert!(text.contains("null"));
        let back: Response = serde_json::from_str(&text).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn test_error_mapping_keeps_subject() {
        let rpc: RpcError = FixtureError::AccountAlreadyExists("worker-3".to_string()).into();
        assert_eq!(rpc.code, RpcErrorCode::AccountExists);

        let err: FixtureError = rpc.into();
        assert_eq!(err, FixtureError::AccountAlreadyExists("worker-3".to_string()));
    }

    #[test]
    fn test_insufficient_funds_keeps_amounts() {
        let rpc: RpcError = FixtureError::InsufficientFunds {
            required: 10,
            available: 3,
        }
        .into();
        let text = serde_json::to_string(&rpc).unwrap();
        let err: FixtureError = serde_json::from_str::<RpcError>(&text).unwrap().into();
        assert_eq!(
            err,
            FixtureError::InsufficientFunds {
                required: 10,
                available: 3
            }
        );
    }

    #[test]
    fn test_authority_errors_survive_the_wire() {
        let rpc: RpcError = FixtureError::MissingAuthority("not the issuer".to_string()).into();
        let text = serde_json::to_string(&rpc).unwrap();
        let err: FixtureError = serde_json::from_str::<RpcError>(&text).unwrap().into();
        assert!(matches!(err, FixtureError::MissingAuthority(_)));
    }
}
