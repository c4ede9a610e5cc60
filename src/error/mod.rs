//! Error handling for the fixtures and their collaborators
//!
//! Every fallible operation in the crate returns [`FixtureError`]. The two
//! "does not exist" variants are the signals the unused-identifier helpers
//! wait for; everything else is propagated to the caller.

use std::fmt;

/// Result type alias for fixture operations
pub type Result<T> = std::result::Result<T, FixtureError>;

/// Error types for fixture, client and local node operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureError {
    /// No asset is registered under this symbol
    AssetDoesNotExist(String),
    /// No account is registered under this name
    AccountDoesNotExist(String),
    /// An object id did not resolve to anything on chain
    ObjectNotFound(String),
    /// Asset symbol is already taken
    AssetAlreadyExists(String),
    /// Account name is already taken
    AccountAlreadyExists(String),
    /// The keyring holds no private key for the required public key
    MissingKey(String),
    /// The transaction was not signed by the required authority
    MissingAuthority(String),
    /// Fee payer or sender cannot cover the amount
    InsufficientFunds { required: u64, available: u64 },
    /// Issuing would push an asset over its maximum supply
    SupplyExceeded { symbol: String, max_supply: u64, requested: u64 },
    /// Transaction rejected for any other reason
    InvalidTransaction(String),
    /// Asset symbol violates the symbol rules
    InvalidSymbol(String),
    /// Account name violates the naming rules
    InvalidAccountName(String),
    /// Key text could not be decoded
    InvalidKey(String),
    /// Amount is negative, not finite, or overflows base units
    InvalidAmount(String),
    /// Connection or transport errors
    Network(String),
    /// Node returned an error that has no dedicated variant
    Rpc(String),
    /// Database-related errors
    Database(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// Cryptographic operation errors
    Crypto(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureError::AssetDoesNotExist(symbol) => write!(f, "Asset {symbol} does not exist"),
            FixtureError::AccountDoesNotExist(name) => {
                write!(f, "Account {name} does not exist")
            }
            FixtureError::ObjectNotFound(id) => write!(f, "Object {id} not found"),
            FixtureError::AssetAlreadyExists(symbol) => {
                write!(f, "Asset {symbol} already exists")
            }
            FixtureError::AccountAlreadyExists(name) => {
                write!(f, "Account {name} already exists")
            }
            FixtureError::MissingKey(key) => write!(f, "No private key for {key}"),
            FixtureError::MissingAuthority(msg) => write!(f, "Missing authority: {msg}"),
            FixtureError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            FixtureError::SupplyExceeded {
                symbol,
                max_supply,
                requested,
            } => write!(
                f,
                "Supply of {symbol} would reach {requested}, max supply is {max_supply}"
            ),
            FixtureError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            FixtureError::InvalidSymbol(msg) => write!(f, "Invalid asset symbol: {msg}"),
            FixtureError::InvalidAccountName(msg) => write!(f, "Invalid account name: {msg}"),
            FixtureError::InvalidKey(msg) => write!(f, "Invalid key: {msg}"),
            FixtureError::InvalidAmount(msg) => write!(f, "Invalid amount: {msg}"),
            FixtureError::Network(msg) => write!(f, "Network error: {msg}"),
            FixtureError::Rpc(msg) => write!(f, "Node error: {msg}"),
            FixtureError::Database(msg) => write!(f, "Database error: {msg}"),
            FixtureError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            FixtureError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            FixtureError::Config(msg) => write!(f, "Configuration error: {msg}"),
            FixtureError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for FixtureError {}

impl From<std::io::Error> for FixtureError {
    fn from(err: std::io::Error) -> Self {
        FixtureError::Io(err.to_string())
    }
}

impl From<sled::Error> for FixtureError {
    fn from(err: sled::Error) -> Self {
        FixtureError::Database(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for FixtureError {
    fn from(err: bincode::error::EncodeError) -> Self {
        FixtureError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for FixtureError {
    fn from(err: bincode::error::DecodeError) -> Self {
        FixtureError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for FixtureError {
    fn from(err: serde_json::Error) -> Self {
        FixtureError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for FixtureError {
    fn from(err: toml::de::Error) -> Self {
        FixtureError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_missing_identifier() {
        let err = FixtureError::AssetDoesNotExist("USD".to_string());
        assert_eq!(err.to_string(), "Asset USD does not exist");

        let err = FixtureError::AccountDoesNotExist("worker-7".to_string());
        assert_eq!(err.to_string(), "Account worker-7 does not exist");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: FixtureError = io.into();
        assert!(matches!(err, FixtureError::Io(_)));
    }
}
