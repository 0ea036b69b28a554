//! # Symbols — Identity Values with a Global Registry
//!
//! A [`Symbol`] is equal only to itself. Two symbols created with
//! [`Symbol::new`] never compare equal, even with the same description.
//!
//! [`Symbol::for_key`] goes through a process-wide registry: every call with
//! the same key returns the same symbol. Only registered symbols can be
//! written to a textual wire format, because only they can be recovered
//! from their key on the way back in ([`Symbol::key_for`]).

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

static REGISTRY: Lazy<Mutex<HashMap<String, Symbol>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Identity-compared symbol with an optional description.
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Option<Arc<str>>,
}

impl Symbol {
    fn fresh(description: Option<Arc<str>>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description,
        }
    }

    /// Create a new unique symbol. Never registered.
    pub fn new(description: impl Into<String>) -> Self {
        Self::fresh(Some(Arc::from(description.into())))
    }

    /// Create a new unique symbol without a description.
    pub fn anonymous() -> Self {
        Self::fresh(None)
    }

    /// Return the registered symbol for `key`, creating it on first use.
    pub fn for_key(key: &str) -> Self {
        let mut registry = REGISTRY.lock();
        registry
            .entry(key.to_string())
            .or_insert_with(|| Self::fresh(Some(Arc::from(key))))
            .clone()
    }

    /// The registry key of this symbol, if this exact symbol is registered.
    ///
    /// A symbol created with [`Symbol::new`] returns `None` even when a
    /// registered symbol with the same description exists.
    pub fn key_for(&self) -> Option<String> {
        let description = self.description.as_deref()?;
        let registry = REGISTRY.lock();
        registry
            .get(description)
            .filter(|registered| registered.id == self.id)
            .map(|_| description.to_string())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol#{}({})", self.id, self.description().unwrap_or(""))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}
