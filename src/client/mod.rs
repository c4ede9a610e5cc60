//! Client library for a test network node
//!
//! [`Chain`] is the connected session handle: account, asset and genesis
//! balance lookups, balance claims, asset creation and issuance. The shared
//! instance registry lets code pick up the session without passing it around.

pub mod chain;
pub mod instance;

pub use chain::Chain;
pub use instance::{clear_shared_instance, set_shared_instance, shared_instance};
