//! Configuration management
//!
//! Fixture settings come from defaults, an optional TOML file and
//! `TESTNET_*` environment variables, in that order.

pub mod settings;

pub use settings::FixtureSettings;
