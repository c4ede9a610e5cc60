use crate::error::{FixtureError, Result};
use crate::utils::{
    base58_decode, base58_encode, double_sha256_digest, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, ripemd160_digest,
};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Prefix of public key text on the test network
pub const KEY_PREFIX: &str = "TEST";
pub const KEY_CHECKSUM_LEN: usize = 4;
const WIF_VERSION: u8 = 0x80;

/// ECDSA P-256 private key, held as PKCS#8 and wiped on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    pkcs8: Vec<u8>,
    #[zeroize(skip)]
    public_key: PublicKey,
}

impl PrivateKey {
    pub fn generate() -> Result<PrivateKey> {
        let pkcs8 = new_key_pair()?;
        PrivateKey::from_pkcs8(pkcs8)
    }

    pub fn from_pkcs8(pkcs8: Vec<u8>) -> Result<PrivateKey> {
        let rng = SystemRandom::new();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
                .map_err(|e| {
                    FixtureError::InvalidKey(format!("Failed to create key pair from PKCS8: {e}"))
                })?;
        let public_key = PublicKey(key_pair.public_key().as_ref().to_vec());
        Ok(PrivateKey { pkcs8, public_key })
    }

    /// Parse wallet import format: base58(0x80 || pkcs8 || checksum)
    pub fn from_wif(wif: &str) -> Result<PrivateKey> {
        let mut payload = base58_decode(wif.trim())?;
        if payload.len() <= KEY_CHECKSUM_LEN + 1 || payload[0] != WIF_VERSION {
            payload.zeroize();
            return Err(FixtureError::InvalidKey("Not a private key".to_string()));
        }
        let split = payload.len() - KEY_CHECKSUM_LEN;
        let valid = wif_checksum(&payload[..split]) == payload[split..];
        let pkcs8 = payload[1..split].to_vec();
        payload.zeroize();
        if !valid {
            return Err(FixtureError::InvalidKey(
                "Private key checksum mismatch".to_string(),
            ));
        }
        PrivateKey::from_pkcs8(pkcs8)
    }

    pub fn to_wif(&self) -> String {
        let mut payload = vec![WIF_VERSION];
        payload.extend(self.pkcs8.as_slice());
        let checksum = wif_checksum(&payload);
        payload.extend(checksum);
        let wif = base58_encode(&payload);
        payload.zeroize();
        wif
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        ecdsa_p256_sha256_sign_digest(&self.pkcs8, message)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key.to_string())
            .finish_non_exhaustive()
    }
}

/// Uncompressed ECDSA P-256 public key.
///
/// Text form is `TEST` followed by base58(key || ripemd160(key)[..4]).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        ecdsa_p256_sha256_sign_verify(&self.0, signature, message)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut payload = self.0.clone();
        payload.extend(key_checksum(&self.0));
        write!(f, "{KEY_PREFIX}{}", base58_encode(&payload))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl FromStr for PublicKey {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self> {
        let encoded = s.strip_prefix(KEY_PREFIX).ok_or_else(|| {
            FixtureError::InvalidKey(format!("{s}: public keys start with {KEY_PREFIX}"))
        })?;
        let payload = base58_decode(encoded)?;
        if payload.len() <= KEY_CHECKSUM_LEN {
            return Err(FixtureError::InvalidKey(format!("{s}: too short")));
        }
        let (key, checksum) = payload.split_at(payload.len() - KEY_CHECKSUM_LEN);
        if key_checksum(key) != checksum {
            return Err(FixtureError::InvalidKey(format!("{s}: checksum mismatch")));
        }
        Ok(PublicKey(key.to_vec()))
    }
}

fn key_checksum(key: &[u8]) -> Vec<u8> {
    ripemd160_digest(key)[..KEY_CHECKSUM_LEN].to_vec()
}

fn wif_checksum(payload: &[u8]) -> Vec<u8> {
    double_sha256_digest(payload)[..KEY_CHECKSUM_LEN].to_vec()
}
