//! Utility functions and helpers
//!
//! Hashing, text encodings, ECDSA signing and the bincode helpers used by the
//! chain store.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, current_timestamp, double_sha256_digest,
    ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify, hex_decode, hex_encode,
    new_key_pair, ripemd160_digest, sha256_digest,
};

pub use serialization::{deserialize, serialize};
