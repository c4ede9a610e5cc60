use crate::core::monetary::MAX_PRECISION;
use crate::core::ObjectId;
use crate::error::{FixtureError, Result};
use serde::{Deserialize, Serialize};

const MIN_SYMBOL_LENGTH: usize = 3;
const MAX_SYMBOL_LENGTH: usize = 16;

/// Amount in base units of a given asset
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct AssetAmount {
    pub amount: u64,
    pub asset_id: ObjectId,
}

impl AssetAmount {
    pub fn new(amount: u64, asset_id: ObjectId) -> AssetAmount {
        AssetAmount { amount, asset_id }
    }
}

/// A registered asset; supplies are in base units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct AssetObject {
    pub id: ObjectId,
    pub symbol: String,
    pub precision: u8,
    pub issuer: ObjectId,
    pub max_supply: u64,
    pub current_supply: u64,
}

impl AssetObject {
    /// Base units that can still be issued
    pub fn remaining_supply(&self) -> u64 {
        self.max_supply.saturating_sub(self.current_supply)
    }

    pub fn amount(&self, amount: u64) -> AssetAmount {
        AssetAmount::new(amount, self.id)
    }
}

/// Check a symbol against the asset symbol rules.
///
/// Symbols are 3 to 16 characters of uppercase letters, digits and at most
/// one dot, starting with a letter and ending with a letter or digit.
pub fn validate_symbol(symbol: &str) -> Result<()> {
    let bytes = symbol.as_bytes();
    if bytes.len() < MIN_SYMBOL_LENGTH || bytes.len() > MAX_SYMBOL_LENGTH {
        return Err(FixtureError::InvalidSymbol(format!(
            "{symbol}: length must be between {MIN_SYMBOL_LENGTH} and {MAX_SYMBOL_LENGTH}"
        )));
    }
    if !bytes[0].is_ascii_uppercase() {
        return Err(FixtureError::InvalidSymbol(format!(
            "{symbol}: must start with an uppercase letter"
        )));
    }
    let last = bytes[bytes.len() - 1];
    if !(last.is_ascii_uppercase() || last.is_ascii_digit()) {
        return Err(FixtureError::InvalidSymbol(format!(
            "{symbol}: must end with a letter or digit"
        )));
    }

    let mut dots = 0;
    for c in bytes {
        match c {
            b'A'..=b'Z' | b'0'..=b'9' => {}
            b'.' => dots += 1,
            _ => {
                return Err(FixtureError::InvalidSymbol(format!(
                    "{symbol}: only uppercase letters, digits and '.' are allowed"
                )))
            }
        }
    }
    if dots > 1 {
        return Err(FixtureError::InvalidSymbol(format!(
            "{symbol}: at most one '.' is allowed"
        )));
    }

    Ok(())
}

pub fn validate_precision(precision: u8) -> Result<()> {
    if precision > MAX_PRECISION {
        return Err(FixtureError::InvalidTransaction(format!(
            "precision {precision} exceeds maximum of {MAX_PRECISION}"
        )));
    }
    Ok(())
}
