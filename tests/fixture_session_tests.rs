//! Fixture session integration tests
//!
//! Every test shares one session: a local testnet started on first use, a
//! connected chain registered as the shared instance, and the genesis balance
//! already claimed into `init0`.

use std::sync::Arc;
use testnet_fixtures::core::precision_factor;
use testnet_fixtures::{
    shared_instance, Chain, FixtureError, PrivateKey, TestSession, MAX_SHARE_SUPPLY,
};

fn session() -> &'static TestSession {
    let _ = env_logger::builder().is_test(true).try_init();
    TestSession::shared().unwrap()
}

fn chain() -> &'static Arc<Chain> {
    session().chain()
}

#[test]
fn test_shared_instance_is_the_session_chain() {
    let session = session();
    let shared = shared_instance().unwrap();
    assert_eq!(shared.properties().chain_id, session.chain().properties().chain_id);
}

#[test]
fn test_genesis_balance_is_claimed_only_once() {
    let session = session();
    let chain = chain();
    assert!(chain.balance(session.default_account(), "TEST").unwrap() > 0);

    let err = testnet_fixtures::claim_balance(chain, "1.15.0", session.default_account())
        .unwrap_err();
    assert_eq!(err, FixtureError::ObjectNotFound("1.15.0".to_string()));
}

#[test]
fn test_default_assets() {
    let session = session();
    session.ensure_default_assets().unwrap();

    let usd = chain().get_asset("USD").unwrap();
    let gold = chain().get_asset("GOLD").unwrap();
    assert_eq!((usd.precision, gold.precision), (3, 3));
    assert!(chain().balance(session.default_account(), "USD").unwrap() >= 1000 * precision_factor(3).unwrap());
}

#[test]
fn test_created_asset_supply_scales_with_precision() {
    let session = session();
    let symbol = session.unused_asset().unwrap();
    let asset = session.create_asset(&symbol, 4).unwrap();
    assert_eq!(asset.symbol, symbol);
    assert_eq!(asset.max_supply, MAX_SHARE_SUPPLY);
    assert_eq!(asset.current_supply, 0);

    let err = session.create_asset(&symbol, 2).unwrap_err();
    assert_eq!(err, FixtureError::AssetAlreadyExists(symbol));
}

#[test]
fn test_issue_asset_credits_recipient() {
    let session = session();
    let symbol = session.unused_asset().unwrap();
    session.create_asset(&symbol, 2).unwrap();

    session.issue_asset(&symbol, 12.5, session.default_account()).unwrap();
    assert_eq!(chain().balance(session.default_account(), &symbol).unwrap(), 1250);
    assert_eq!(chain().get_asset(&symbol).unwrap().current_supply, 1250);
}

#[test]
fn test_issue_past_max_supply_fails() {
    let session = session();
    let symbol = session.unused_asset().unwrap();
    session.create_asset(&symbol, 0).unwrap();

    session.issue_asset(&symbol, 1e15, session.default_account()).unwrap();
    let err = session.issue_asset(&symbol, 1.0, session.default_account()).unwrap_err();
    assert!(matches!(err, FixtureError::SupplyExceeded { .. }));
}

#[test]
fn test_operations_need_a_held_key() {
    let session = session();
    let chain = chain();

    // An account whose key the session does not hold
    let name = session.unused_account().unwrap();
    let stranger = PrivateKey::generate().unwrap();
    let account = chain
        .create_account(&name, stranger.public_key(), session.default_account())
        .unwrap();
    assert_eq!(account.name, name);

    let symbol = session.unused_asset().unwrap();
    let err = chain.create_asset(&symbol, 3, 1000.0, &name).unwrap_err();
    assert!(matches!(err, FixtureError::MissingKey(_)));
}

#[test]
fn test_unused_identifiers() {
    let session = session();
    let symbol = session.unused_asset().unwrap();
    assert_eq!(symbol.len(), 7);
    assert!(symbol.chars().all(|c| c.is_ascii_uppercase()));

    let name = session.unused_account().unwrap();
    let number: u32 = name.strip_prefix("worker-").unwrap().parse().unwrap();
    assert!((1..=100_000).contains(&number));
}

#[test]
fn test_missing_objects_have_named_errors() {
    let chain = chain();
    assert_eq!(
        chain.get_asset("NOSUCHASSET").unwrap_err(),
        FixtureError::AssetDoesNotExist("NOSUCHASSET".to_string())
    );
    assert_eq!(
        chain.get_account("nobody-here").unwrap_err(),
        FixtureError::AccountDoesNotExist("nobody-here".to_string())
    );
}

#[test]
fn test_transfer_between_accounts() {
    let session = session();
    let chain = chain();

    let owner = PrivateKey::generate().unwrap();
    let name = session.unused_account().unwrap();
    chain
        .create_account(&name, owner.public_key(), session.default_account())
        .unwrap();
    chain.transfer(session.default_account(), &name, 2.5, "TEST").unwrap();
    assert_eq!(chain.balance(&name, "TEST").unwrap(), 250_000);

    let err = chain.transfer(&name, session.default_account(), 1.0, "TEST").unwrap_err();
    assert!(matches!(err, FixtureError::MissingKey(_)));
}
