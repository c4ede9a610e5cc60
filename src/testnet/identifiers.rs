//! Random identifiers that are not yet registered on chain

use crate::error::{FixtureError, Result};
use log::debug;
use rand::Rng;

pub const SYMBOL_LENGTH: usize = 7;
pub const WORKER_PREFIX: &str = "worker-";
pub const MAX_WORKER_NUMBER: u32 = 100_000;

/// Seven random uppercase ASCII letters
pub fn random_symbol<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..SYMBOL_LENGTH)
        .map(|_| char::from(rng.gen_range(b'A'..=b'Z')))
        .collect()
}

/// `worker-N` with N drawn from 1..=100000
pub fn random_worker_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{WORKER_PREFIX}{}", rng.gen_range(1..=MAX_WORKER_NUMBER))
}

pub fn is_missing_asset(err: &FixtureError) -> bool {
    matches!(err, FixtureError::AssetDoesNotExist(_))
}

pub fn is_missing_account(err: &FixtureError) -> bool {
    matches!(err, FixtureError::AccountDoesNotExist(_))
}

/// Draw candidates until `lookup` fails with an error `is_absent` accepts.
///
/// A successful lookup means the candidate is taken. Every other error is
/// returned as is. There is no attempt limit.
pub fn first_unused<T, G, L>(
    mut generate: G,
    mut lookup: L,
    is_absent: fn(&FixtureError) -> bool,
) -> Result<String>
where
    G: FnMut() -> String,
    L: FnMut(&str) -> Result<T>,
{
    loop {
        let candidate = generate();
        match lookup(&candidate) {
            Ok(_) => debug!("{candidate} is taken"),
            Err(e) if is_absent(&e) => return Ok(candidate),
            Err(e) => return Err(e),
        }
    }
}
