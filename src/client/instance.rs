// Process-wide default chain handle, so helpers need not thread one through
use crate::client::Chain;
use once_cell::sync::Lazy;
use std::sync::{Arc, PoisonError, RwLock};

static SHARED_INSTANCE: Lazy<RwLock<Option<Arc<Chain>>>> = Lazy::new(|| RwLock::new(None));

/// Make `chain` the instance returned by [`shared_instance`]
pub fn set_shared_instance(chain: Arc<Chain>) {
    let mut shared = SHARED_INSTANCE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *shared = Some(chain);
}

pub fn shared_instance() -> Option<Arc<Chain>> {
    SHARED_INSTANCE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn clear_shared_instance() {
    let mut shared = SHARED_INSTANCE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *shared = None;
}
