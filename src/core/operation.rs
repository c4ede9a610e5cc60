//! Operations and the signed transactions that carry them

use crate::core::{AssetAmount, ObjectId};
use crate::error::Result;
use crate::utils::{hex_decode, hex_encode, sha256_digest};
use crate::wallet::{PrivateKey, PublicKey};
use serde::{Deserialize, Serialize};

/// Length of a transaction id in bytes
const TRANSACTION_ID_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    BalanceClaim {
        deposit_to_account: ObjectId,
        balance_to_claim: ObjectId,
        balance_owner_key: String,
        total_claimed: AssetAmount,
    },
    AssetCreate {
        issuer: ObjectId,
        symbol: String,
        precision: u8,
        /// Base units
        max_supply: u64,
    },
    AssetIssue {
        issuer: ObjectId,
        asset_to_issue: AssetAmount,
        issue_to_account: ObjectId,
    },
    AccountCreate {
        registrar: ObjectId,
        name: String,
        owner_key: String,
    },
    Transfer {
        from: ObjectId,
        to: ObjectId,
        amount: AssetAmount,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::BalanceClaim { .. } => "balance_claim",
            Operation::AssetCreate { .. } => "asset_create",
            Operation::AssetIssue { .. } => "asset_issue",
            Operation::AccountCreate { .. } => "account_create",
            Operation::Transfer { .. } => "transfer",
        }
    }

    /// Account charged the operation fee
    pub fn fee_payer(&self) -> ObjectId {
        match self {
            Operation::BalanceClaim {
                deposit_to_account, ..
            } => *deposit_to_account,
            Operation::AssetCreate { issuer, .. } | Operation::AssetIssue { issuer, .. } => *issuer,
            Operation::AccountCreate { registrar, .. } => *registrar,
            Operation::Transfer { from, .. } => *from,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum OperationResult {
    Void,
    ObjectCreated(ObjectId),
}

impl OperationResult {
    pub fn created_id(&self) -> Option<ObjectId> {
        match self {
            OperationResult::ObjectCreated(id) => Some(*id),
            OperationResult::Void => None,
        }
    }
}

/// What the node reports back once a transaction is applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TransactionConfirmation {
    pub id: String,
    pub result: OperationResult,
    pub fee: AssetAmount,
}

/// A single operation signed by the key of its required authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub operation: Operation,
    /// Milliseconds since the unix epoch
    pub expiration: i64,
    /// Distinguishes otherwise identical transactions
    pub nonce: u64,
    pub signer: String,
    pub signature: String,
}

impl Transaction {
    pub fn new(operation: Operation, expiration: i64) -> Transaction {
        Transaction {
            operation,
            expiration,
            nonce: 0,
            signer: String::new(),
            signature: String::new(),
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Transaction {
        self.nonce = nonce;
        self
    }

    /// sha256 over chain id, operation JSON, expiration and nonce
    pub fn digest(&self, chain_id: &str) -> Result<Vec<u8>> {
        let mut payload = chain_id.as_bytes().to_vec();
        payload.extend(serde_json::to_vec(&self.operation)?);
        payload.extend(self.expiration.to_be_bytes());
        payload.extend(self.nonce.to_be_bytes());
        Ok(sha256_digest(&payload))
    }

    pub fn id(&self, chain_id: &str) -> Result<String> {
        let digest = self.digest(chain_id)?;
        Ok(hex_encode(&digest[..TRANSACTION_ID_LEN]))
    }

    pub fn sign(&mut self, key: &PrivateKey, chain_id: &str) -> Result<()> {
        let digest = self.digest(chain_id)?;
        self.signature = hex_encode(&key.sign(&digest)?);
        self.signer = key.public_key().to_string();
        Ok(())
    }

    /// Whether the signature matches `signer` on this chain
    pub fn verify(&self, chain_id: &str) -> Result<bool> {
        if self.signer.is_empty() || self.signature.is_empty() {
            return Ok(false);
        }
        let key: PublicKey = self.signer.parse()?;
        let signature = hex_decode(&self.signature)?;
        Ok(key.verify(&self.digest(chain_id)?, &signature))
    }
}
