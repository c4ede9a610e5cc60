use ring::digest::{Context, SHA256};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_FIXED, ECDSA_P256_SHA256_FIXED_SIGNING};
use ripemd::{Digest as RipemdDigest, Ripemd160};

use crate::error::{FixtureError, Result};
use data_encoding::HEXLOWER;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the unix epoch
pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| FixtureError::Crypto(format!("System time error: {e}")))?
        .as_millis();

    if duration > i64::MAX as u128 {
        return Err(FixtureError::Crypto("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

pub fn double_sha256_digest(data: &[u8]) -> Vec<u8> {
    sha256_digest(sha256_digest(data).as_slice())
}

pub fn ripemd160_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

pub fn base58_decode(data: &str) -> Result<Vec<u8>> {
    bs58::decode(data)
        .into_vec()
        .map_err(|e| FixtureError::InvalidKey(format!("Invalid base58 encoding: {e}")))
}

pub fn hex_encode(data: &[u8]) -> String {
    HEXLOWER.encode(data)
}

pub fn hex_decode(data: &str) -> Result<Vec<u8>> {
    HEXLOWER
        .decode(data.as_bytes())
        .map_err(|e| FixtureError::Serialization(format!("Invalid hex encoding: {e}")))
}

pub fn new_key_pair() -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| FixtureError::Crypto(format!("Failed to generate ECDSA key pair: {e}")))?
        .as_ref()
        .to_vec();
    Ok(pkcs8)
}

pub fn ecdsa_p256_sha256_sign_digest(pkcs8: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| FixtureError::Crypto(format!("Failed to create key pair from PKCS8: {e}")))?;
    let signature = key_pair
        .sign(&rng, message)
        .map_err(|e| FixtureError::Crypto(format!("Failed to sign message: {e}")))?
        .as_ref()
        .to_vec();
    Ok(signature)
}

pub fn ecdsa_p256_sha256_sign_verify(public_key: &[u8], signature: &[u8], message: &[u8]) -> bool {
    let peer_public_key =
        ring::signature::UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, public_key);
    peer_public_key.verify(message, signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::signature::KeyPair;

    #[test]
    fn test_sign_and_verify() {
        let pkcs8 = new_key_pair().unwrap();
        let rng = SystemRandom::new();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &pkcs8, &rng).unwrap();
        let public_key = key_pair.public_key().as_ref().to_vec();

        let signature = ecdsa_p256_sha256_sign_digest(&pkcs8, b"claim 1.15.0").unwrap();
        assert!(ecdsa_p256_sha256_sign_verify(
            &public_key,
            &signature,
            b"claim 1.15.0"
        ));
        assert!(!ecdsa_p256_sha256_sign_verify(
            &public_key,
            &signature,
            b"claim 1.15.1"
        ));
    }

    #[test]
    fn test_hex_round_trip_and_rejects_garbage() {
        let encoded = hex_encode(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(encoded, "deadbeef");
        assert_eq!(hex_decode(&encoded).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(hex_decode("xyz").is_err());
    }

    #[test]
    fn test_base58_rejects_invalid_alphabet() {
        assert!(base58_decode("0OIl").is_err());
    }
}
