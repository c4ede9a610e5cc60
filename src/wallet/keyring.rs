use crate::error::{FixtureError, Result};
use crate::utils::{deserialize, serialize};
use crate::wallet::{PrivateKey, PublicKey};
use log::info;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Private keys the client may sign with, indexed by public key text
#[derive(Default, Clone)]
pub struct Keyring {
    keys: HashMap<String, PrivateKey>,
}

impl Keyring {
    pub fn new() -> Keyring {
        Keyring {
            keys: HashMap::new(),
        }
    }

    pub fn from_wifs<S: AsRef<str>>(wifs: &[S]) -> Result<Keyring> {
        let mut keyring = Keyring::new();
        for wif in wifs {
            keyring.add(PrivateKey::from_wif(wif.as_ref())?);
        }
        Ok(keyring)
    }

    pub fn add(&mut self, key: PrivateKey) -> PublicKey {
        let public_key = key.public_key().clone();
        self.keys.insert(public_key.to_string(), key);
        public_key
    }

    /// Take every key from `other`, keeping ours on a clash
    pub fn merge(&mut self, other: Keyring) {
        for (public_key, key) in other.keys {
            self.keys.entry(public_key).or_insert(key);
        }
    }

    /// Generate a fresh key, keep it, and return its public half
    pub fn create_key(&mut self) -> Result<PublicKey> {
        Ok(self.add(PrivateKey::generate()?))
    }

    pub fn get(&self, public_key: &str) -> Option<&PrivateKey> {
        self.keys.get(public_key)
    }

    pub fn public_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.keys.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn to_wifs(&self) -> Vec<String> {
        self.keys.values().map(PrivateKey::to_wif).collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn load_from_file(path: &Path) -> Result<Keyring> {
        let mut file = File::open(path).map_err(|e| {
            FixtureError::Config(format!("Failed to open keyfile {}: {e}", path.display()))
        })?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        let wifs: Vec<String> = deserialize(&buf)?;
        let keyring = Keyring::from_wifs(&wifs)?;
        info!("Loaded {} key(s) from {}", keyring.len(), path.display());
        Ok(keyring)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);
        let bytes = serialize(&self.to_wifs())?;
        writer.write_all(bytes.as_slice())?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_keys_are_indexed_by_public_key() {
        let mut keyring = Keyring::new();
        let public_key = keyring.create_key().unwrap();

        assert_eq!(keyring.len(), 1);
        let key = keyring.get(&public_key.to_string()).unwrap();
        assert_eq!(key.public_key(), &public_key);
        assert!(keyring.get("TESTmissing").is_none());
    }

    #[test]
    fn test_merge_keeps_both_sets() {
        let mut first = Keyring::new();
        let kept = first.create_key().unwrap();
        let mut second = first.clone();
        let added = second.create_key().unwrap();

        first.merge(second);
        assert_eq!(first.len(), 2);
        assert!(first.get(&kept.to_string()).is_some());
        assert!(first.get(&added.to_string()).is_some());
    }

    #[test]
    fn test_from_wifs_rejects_bad_key() {
        let key = PrivateKey::generate().unwrap();
        let keyring = Keyring::from_wifs(&[key.to_wif()]).unwrap();
        assert_eq!(keyring.public_keys(), vec![key.public_key().to_string()]);

        assert!(Keyring::from_wifs(&["not-a-key"]).is_err());
    }

    #[test]
    fn test_keyfile_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("testnet.keys");

        let mut keyring = Keyring::new();
        keyring.create_key().unwrap();
        keyring.create_key().unwrap();
        keyring.save_to_file(&path).unwrap();

        let loaded = Keyring::load_from_file(&path).unwrap();
        assert_eq!(loaded.public_keys(), keyring.public_keys());
    }

    #[test]
    fn test_missing_keyfile_is_config_error() {
        let dir = tempdir().unwrap();
        let result = Keyring::load_from_file(&dir.path().join("absent.keys"));
        assert!(matches!(result, Err(FixtureError::Config(_))));
    }
}
