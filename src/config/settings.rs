use crate::core::{DEFAULT_ACCOUNT, DEFAULT_GENESIS_BALANCE};
use crate::error::{FixtureError, Result};
use crate::network::{parse_node_address, RetryPolicy};
use crate::wallet::{Keyring, PrivateKey};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_PATH_KEY: &str = "TESTNET_CONFIG";
const NODE_KEY: &str = "TESTNET_NODE";
const ACCOUNT_KEY: &str = "TESTNET_ACCOUNT";
const KEYS_KEY: &str = "TESTNET_KEYS";
const NUM_RETRIES_KEY: &str = "TESTNET_NUM_RETRIES";
const GENESIS_BALANCE_KEY: &str = "TESTNET_GENESIS_BALANCE";
const KEYFILE_KEY: &str = "TESTNET_KEYFILE";

/// Where the fixtures connect and which account they work with.
///
/// With no `node` set the session starts its own local testnet and uses the
/// keys that network was created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureSettings {
    pub node: Option<String>,
    pub default_account: String,
    /// WIF private keys handed to the client
    pub private_keys: Vec<String>,
    /// Keyfile written by `start-testnet`, merged with `private_keys`
    pub keyfile: Option<PathBuf>,
    /// Reconnect attempts; -1 retries forever
    pub num_retries: i64,
    pub genesis_balance: String,
}

impl Default for FixtureSettings {
    fn default() -> Self {
        FixtureSettings {
            node: None,
            default_account: DEFAULT_ACCOUNT.to_string(),
            private_keys: Vec::new(),
            keyfile: None,
            num_retries: -1,
            genesis_balance: DEFAULT_GENESIS_BALANCE.to_string(),
        }
    }
}

impl FixtureSettings {
    pub fn from_file(path: &Path) -> Result<FixtureSettings> {
        let text = fs::read_to_string(path).map_err(|e| {
            FixtureError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let settings: FixtureSettings = toml::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings from `TESTNET_CONFIG` (if set) with the other `TESTNET_*`
    /// variables layered on top
    pub fn from_env() -> Result<FixtureSettings> {
        let base = match env::var(CONFIG_PATH_KEY) {
            Ok(path) => FixtureSettings::from_file(Path::new(&path))?,
            Err(_) => FixtureSettings::default(),
        };
        base.apply_overrides(|key| env::var(key).ok())
    }

    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<FixtureSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(node) = lookup(NODE_KEY) {
            self.node = Some(node);
        }
        if let Some(account) = lookup(ACCOUNT_KEY) {
            self.default_account = account;
        }
        if let Some(keys) = lookup(KEYS_KEY) {
            self.private_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(keyfile) = lookup(KEYFILE_KEY) {
            self.keyfile = Some(PathBuf::from(keyfile));
        }
        if let Some(retries) = lookup(NUM_RETRIES_KEY) {
            self.num_retries = retries.trim().parse().map_err(|_| {
                FixtureError::Config(format!("{NUM_RETRIES_KEY} must be an integer, got {retries}"))
            })?;
        }
        if let Some(balance) = lookup(GENESIS_BALANCE_KEY) {
            self.genesis_balance = balance;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(node) = &self.node {
            parse_node_address(node)?;
        }
        if self.default_account.is_empty() {
            return Err(FixtureError::Config("default_account is empty".to_string()));
        }
        self.genesis_balance.parse::<crate::core::ObjectId>()?;
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_num_retries(self.num_retries)
    }

    pub fn keyring(&self) -> Result<Keyring> {
        let mut keyring = match &self.keyfile {
            Some(path) => Keyring::load_from_file(path)?,
            None => Keyring::new(),
        };
        for wif in &self.private_keys {
            keyring.add(PrivateKey::from_wif(wif)?);
        }
        Ok(keyring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = FixtureSettings::default();
        assert_eq!(settings.node, None);
        assert_eq!(settings.default_account, "init0");
        assert_eq!(settings.genesis_balance, "1.15.0");
        assert_eq!(settings.retry_policy().max_retries, None);
    }

    #[test]
    fn test_from_file_fills_missing_fields() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "node = \"tcp://127.0.0.1:8090\"").unwrap();
        writeln!(file, "num_retries = 3").unwrap();

        let settings = FixtureSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.node.as_deref(), Some("tcp://127.0.0.1:8090"));
        assert_eq!(settings.num_retries, 3);
        assert_eq!(settings.default_account, "init0");
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TESTNET_NODE", "localhost:9000"),
            ("TESTNET_ACCOUNT", "alice"),
            ("TESTNET_KEYS", "key1, key2,"),
            ("TESTNET_NUM_RETRIES", "0"),
        ]
        .into_iter()
        .collect();

        let settings = FixtureSettings::default()
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(settings.node.as_deref(), Some("localhost:9000"));
        assert_eq!(settings.default_account, "alice");
        assert_eq!(settings.private_keys, vec!["key1", "key2"]);
        assert_eq!(settings.retry_policy(), RetryPolicy::never());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_retries = FixtureSettings::default()
            .apply_overrides(|key| (key == "TESTNET_NUM_RETRIES").then(|| "many".to_string()));
        assert!(matches!(bad_retries, Err(FixtureError::Config(_))));

        let bad_node = FixtureSettings {
            node: Some("ws://127.0.0.1:8090".to_string()),
            ..FixtureSettings::default()
        };
        assert!(bad_node.validate().is_err());
    }

    #[test]
    fn test_keyring_merges_keyfile_and_inline_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testnet.keys");
        let mut from_file = Keyring::new();
        from_file.create_key().unwrap();
        from_file.save_to_file(&path).unwrap();

        let inline = PrivateKey::generate().unwrap();
        let settings = FixtureSettings {
            keyfile: Some(path),
            private_keys: vec![inline.to_wif()],
            ..FixtureSettings::default()
        };
        let keyring = settings.keyring().unwrap();
        assert_eq!(keyring.len(), 2);
        assert!(keyring.get(&inline.public_key().to_string()).is_some());
    }
}
