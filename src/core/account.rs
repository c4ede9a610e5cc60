use crate::core::ObjectId;
use crate::error::{FixtureError, Result};
use serde::{Deserialize, Serialize};

const MIN_NAME_LENGTH: usize = 3;
const MAX_NAME_LENGTH: usize = 63;

/// A registered account and the key that controls it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct AccountObject {
    pub id: ObjectId,
    pub name: String,
    /// Public key text of the owner authority
    pub owner_key: String,
    pub registrar: ObjectId,
}

/// Check an account name against the naming rules.
///
/// Names are 3 to 63 characters of dot-separated labels. Every label starts
/// with a lowercase letter, ends with a lowercase letter or digit, and contains
/// only lowercase letters, digits and hyphens.
pub fn validate_account_name(name: &str) -> Result<()> {
    if name.len() < MIN_NAME_LENGTH || name.len() > MAX_NAME_LENGTH {
        return Err(FixtureError::InvalidAccountName(format!(
            "{name}: length must be between {MIN_NAME_LENGTH} and {MAX_NAME_LENGTH}"
        )));
    }

    for label in name.split('.') {
        let bytes = label.as_bytes();
        let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
            return Err(FixtureError::InvalidAccountName(format!(
                "{name}: empty label"
            )));
        };
        if !first.is_ascii_lowercase() {
            return Err(FixtureError::InvalidAccountName(format!(
                "{name}: label {label} must start with a lowercase letter"
            )));
        }
        if !(last.is_ascii_lowercase() || last.is_ascii_digit()) {
            return Err(FixtureError::InvalidAccountName(format!(
                "{name}: label {label} must end with a letter or digit"
            )));
        }
        if !bytes
            .iter()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == b'-')
        {
            return Err(FixtureError::InvalidAccountName(format!(
                "{name}: only lowercase letters, digits and hyphens are allowed"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_account_name("init0").is_ok());
        assert!(validate_account_name("worker-100000").is_ok());
        assert!(validate_account_name("faucet.test").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(validate_account_name("ab").is_err());
        assert!(validate_account_name("Worker-1").is_err());
        assert!(validate_account_name("1worker").is_err());
        assert!(validate_account_name("worker-").is_err());
        assert!(validate_account_name("work..er").is_err());
        assert!(validate_account_name("worker_1").is_err());
        assert!(validate_account_name(&"a".repeat(64)).is_err());
    }
}
