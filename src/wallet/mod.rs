//! Key management
//!
//! Private and public key text formats and the keyring the client signs
//! transactions with.

pub mod keyring;
pub mod keys;

pub use keyring::Keyring;
pub use keys::{PrivateKey, PublicKey, KEY_PREFIX};
