//! # Annotations and the Serializer Registry
//!
//! Every node carries an [`Annotations`] bag of human-facing metadata.
//! Behavioral extension points are not stored there. Instead, the JSON
//! serializer looks up declarations by tag in a typed
//! [`SerializerRegistry`], so a declaration either has a registered
//! `defaultJsonSerializer` or it does not; there is nothing to probe.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::{Ast, Link, NodeId};

/// Descriptive metadata attached to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    /// Replaces the structural rendering in issue messages.
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Message used when a required key of this type is absent.
    pub missing_message: Option<String>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_missing_message(mut self, message: impl Into<String>) -> Self {
        self.missing_message = Some(message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Builds the JSON encoding link for a declaration.
///
/// Receives the arena and the declaration's type parameters, already
/// serialized. The returned link's target is serialized again by the
/// caller, so it may point at any node.
pub type DeclarationSerializer = dyn Fn(&Ast, &[NodeId]) -> Link + Send + Sync;

/// Declaration tag → `defaultJsonSerializer`.
#[derive(Clone, Default)]
pub struct SerializerRegistry {
    entries: HashMap<String, Arc<DeclarationSerializer>>,
}

impl SerializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `serializer` for declarations tagged `tag`, replacing any
    /// previous entry.
    pub fn register<F>(&mut self, tag: impl Into<String>, serializer: F)
    where
        F: Fn(&Ast, &[NodeId]) -> Link + Send + Sync + 'static,
    {
        self.entries.insert(tag.into(), Arc::new(serializer));
    }

    pub fn get(&self, tag: &str) -> Option<Arc<DeclarationSerializer>> {
        self.entries.get(tag).cloned()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("SerializerRegistry").field("tags", &tags).finish()
    }
}
