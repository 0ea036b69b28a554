//! # Context — Explicit Service Environment
//!
//! Getters may need capabilities from their caller (a clock, a lookup
//! table, a resolver). Instead of encoding those requirements in the type,
//! they are looked up at run time from a [`Context`] threaded through every
//! `run` call. Getters that need nothing simply ignore it.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::issue::Issue;

/// Typed map of services, keyed by their Rust type.
#[derive(Clone, Default)]
pub struct Context {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with<T: Any + Send + Sync>(mut self, service: T) -> Self {
        self.insert(service);
        self
    }

    /// Register `service`, replacing any previous service of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, service: T) {
        self.services.insert(TypeId::of::<T>(), Arc::new(service));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|service| service.downcast_ref::<T>())
    }

    /// Like [`Context::get`], but a missing service is an issue.
    pub fn require<T: Any + Send + Sync>(&self) -> Result<&T, Issue> {
        self.get::<T>().ok_or_else(|| {
            Issue::invalid_value(None, format!("missing service {}", type_name::<T>()))
        })
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("services", &self.services.len())
            .finish()
    }
}
