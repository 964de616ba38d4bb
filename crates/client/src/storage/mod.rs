//! Durable key-value storage capability.
//!
//! The cart store and the auth session both persist their state through the
//! [`Storage`] trait: a synchronous, process-local string map that survives
//! restarts. Each consumer owns a disjoint key namespace (see [`keys`]);
//! collisions are a bug.
//!
//! Reads of corrupt or missing values are treated as "absent" by callers,
//! never as hard errors.

mod file;

use std::collections::HashMap;
use std::sync::Mutex;

pub use file::{FileStorage, StorageError};

/// Well-known storage keys, grouped so namespace disjointness is visible in
/// one place.
pub mod keys {
    /// Serialized cart item sequence.
    pub const CART_ITEMS: &str = "cart.items";
    /// Access token for the current session.
    pub const ACCESS_TOKEN: &str = "auth.access_token";
    /// Refresh token for the current session.
    pub const REFRESH_TOKEN: &str = "auth.refresh_token";
    /// Serialized snapshot of the signed-in user.
    pub const CURRENT_USER: &str = "auth.current_user";
}

/// Synchronous durable key-value storage.
///
/// Implementations are expected to be cheap to call from async contexts:
/// no operation may block on the network, and file-backed implementations
/// keep writes small (the whole value is rewritten on every `set`).
pub trait Storage: Send + Sync {
    /// Read a value, `None` when the key is absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str);

    /// Remove a key; absent keys are a no-op.
    fn remove(&self, key: &str);
}

/// Volatile in-memory storage, used in tests and as a fallback when no
/// durable directory is available.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
    }
}
