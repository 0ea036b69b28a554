//! # JSON Serializer — Memoized AST Rewriter
//!
//! Rewrites a schema so that its full encode pipeline ends in a
//! JSON-representable value (null, boolean, number, string, array, object).
//! The type side of every node is left alone; only encoding chains are
//! added or retargeted.
//!
//! ## Rewrite Rules
//!
//! | Node | Rewrite |
//! |------|---------|
//! | string, number, boolean, null, literal, template literal, enums | unchanged |
//! | symbol, unique symbol | link to `string` via the symbol registry |
//! | bigint | link to `string` via `bigintFromString` |
//! | never, any, unknown, undefined, void, object | link to `unknown`; encode is `Forbidden` |
//! | struct, tuple, union | children rewritten, annotations and checks kept |
//! | suspend | new suspend that rewrites its target when forced |
//! | declaration | registered `defaultJsonSerializer`, else `Forbidden` on encode |
//!
//! A node that already has an encoding chain keeps every link; only the
//! target of the last link is rewritten.
//!
//! ## Memoization
//!
//! Output ids are memoized per input [`NodeId`]. Container and chain nodes
//! reserve their output slot and record it *before* recursing, so a node
//! that refers to itself (directly or through a suspend) resolves to the
//! slot under construction instead of unrolling forever. Shared subtrees
//! are rewritten once.
//!
//! The memo is shared with the suspend thunks this serializer creates. No
//! lock is held while recursing. A pass that fails forgets every entry it
//! added, so a later pass never hits a slot that was reserved but never
//! defined.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use strux_core::{Getter, Issue, Symbol, Transformation, Value};

use crate::annotations::Annotations;
use crate::ast::{Ast, Declaration, Element, IndexSignature, Link, Node, NodeId, NodeKind, PropertySignature};
use crate::error::SchemaError;

/// Encode failure for declarations without a registered serializer.
pub const MISSING_JSON_SERIALIZER: &str =
    "cannot serialize to JSON, required `defaultJsonSerializer` annotation";

/// Rewrites schemas into JSON-encodable schemas.
///
/// One serializer instance is one memo scope: serializing the same node
/// twice through the same instance returns the same output id.
#[derive(Clone, Default)]
pub struct JsonSerializer {
    state: Arc<State>,
}

#[derive(Default)]
struct State {
    memo: Mutex<HashMap<NodeId, NodeId>>,
    handled: AtomicUsize,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite `id` and return the id of its JSON-encodable counterpart.
    pub fn serialize(&self, ast: &Ast, id: NodeId) -> Result<NodeId, SchemaError> {
        self.state.pass(ast, id)
    }

    /// Number of nodes rewritten so far (memo hits excluded).
    pub fn handled(&self) -> usize {
        self.state.handled.load(Ordering::Relaxed)
    }

    /// Number of memoized nodes.
    pub fn memoized(&self) -> usize {
        self.state.memo.lock().len()
    }
}

impl std::fmt::Debug for JsonSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSerializer")
            .field("handled", &self.handled())
            .field("memoized", &self.memoized())
            .finish()
    }
}

impl State {
    fn lookup(&self, id: NodeId) -> Option<NodeId> {
        self.memo.lock().get(&id).copied()
    }

    fn remember(&self, id: NodeId, out: NodeId) {
        self.memo.lock().insert(id, out);
    }

    /// Reserve the output slot for `id` and memoize it before recursing.
    fn reserve(&self, ast: &Ast, id: NodeId) -> NodeId {
        let out = ast.reserve();
        self.remember(id, out);
        out
    }

    /// One top-level rewrite. On failure the memo is restored to the keys
    /// it had before the pass.
    fn pass(self: &Arc<Self>, ast: &Ast, id: NodeId) -> Result<NodeId, SchemaError> {
        let before: HashSet<NodeId> = self.memo.lock().keys().copied().collect();
        let result = self.go(ast, id);
        if let Err(err) = &result {
            let mut memo = self.memo.lock();
            let added = memo.len().saturating_sub(before.len());
            memo.retain(|key, _| before.contains(key));
            tracing::debug!(node = %id, forgotten = added, error = %err, "json serializer pass failed");
        }
        result
    }

    fn go(self: &Arc<Self>, ast: &Ast, id: NodeId) -> Result<NodeId, SchemaError> {
        if let Some(out) = self.lookup(id) {
            tracing::trace!(node = %id, out = %out, "json serializer memo hit");
            return Ok(out);
        }
        self.handled.fetch_add(1, Ordering::Relaxed);
        let node = ast.get(id)?;
        tracing::debug!(node = %id, kind = node.kind.name(), "serializing schema node to JSON");

        if let Some(last) = node.links().last() {
            return self.chain(ast, id, &node, last.to);
        }

        match &node.kind {
            NodeKind::Literal(_)
            | NodeKind::Null
            | NodeKind::String
            | NodeKind::Number
            | NodeKind::Boolean
            | NodeKind::TemplateLiteral { .. }
            | NodeKind::Enums(_) => {
                self.remember(id, id);
                Ok(id)
            }
            NodeKind::UniqueSymbol(_) | NodeKind::Symbol => {
                let link = Link::new(ast.string(), symbol_from_key());
                Ok(self.leaf(ast, id, &node, link))
            }
            NodeKind::BigInt => {
                let link = Link::new(ast.string(), Transformation::bigint_from_string());
                Ok(self.leaf(ast, id, &node, link))
            }
            NodeKind::Never
            | NodeKind::Any
            | NodeKind::Unknown
            | NodeKind::Undefined
            | NodeKind::Void
            | NodeKind::Object => {
                let message = format!(
                    "cannot serialize to JSON, {} has no JSON representation",
                    ast.describe(id)
                );
                let link = forbidden_link(ast, message);
                Ok(self.leaf(ast, id, &node, link))
            }
            NodeKind::TypeLiteral {
                properties,
                index_signatures,
            } => {
                let out = self.reserve(ast, id);
                let properties = properties
                    .iter()
                    .map(|p| {
                        Ok(PropertySignature {
                            name: p.name.clone(),
                            type_: self.go(ast, p.type_)?,
                            optional: p.optional,
                        })
                    })
                    .collect::<Result<Vec<_>, SchemaError>>()?;
                let index_signatures = index_signatures
                    .iter()
                    .map(|sig| {
                        Ok(IndexSignature {
                            parameter: self.go(ast, sig.parameter)?,
                            type_: self.go(ast, sig.type_)?,
                        })
                    })
                    .collect::<Result<Vec<_>, SchemaError>>()?;
                self.define(
                    ast,
                    out,
                    &node,
                    NodeKind::TypeLiteral {
                        properties,
                        index_signatures,
                    },
                )
            }
            NodeKind::Tuple { elements, rest } => {
                let out = self.reserve(ast, id);
                let elements = elements
                    .iter()
                    .map(|e| {
                        Ok(Element {
                            type_: self.go(ast, e.type_)?,
                            optional: e.optional,
                        })
                    })
                    .collect::<Result<Vec<_>, SchemaError>>()?;
                let rest = self.all(ast, rest)?;
                self.define(ast, out, &node, NodeKind::Tuple { elements, rest })
            }
            NodeKind::Union { types, mode } => {
                let out = self.reserve(ast, id);
                let types = self.all(ast, types)?;
                self.define(ast, out, &node, NodeKind::Union { types, mode: *mode })
            }
            NodeKind::Suspend(_) => {
                let state = Arc::clone(self);
                let out = ast.suspend_fallible(move |ast| {
                    tracing::trace!(node = %id, "forcing serialized suspend");
                    let target = ast.force(id)?;
                    state.pass(ast, target)
                });
                self.remember(id, out);
                Ok(out)
            }
            NodeKind::Declaration(declaration) => self.declaration(ast, id, &node, declaration),
        }
    }

    fn all(self: &Arc<Self>, ast: &Ast, ids: &[NodeId]) -> Result<Vec<NodeId>, SchemaError> {
        ids.iter().map(|id| self.go(ast, *id)).collect()
    }

    fn define(&self, ast: &Ast, out: NodeId, node: &Node, kind: NodeKind) -> Result<NodeId, SchemaError> {
        ast.define(
            out,
            Node {
                kind,
                annotations: node.annotations.clone(),
                checks: node.checks.clone(),
                encoding: None,
            },
        )?;
        Ok(out)
    }

    /// Wrap a leaf with exactly one link.
    fn leaf(&self, ast: &Ast, id: NodeId, node: &Node, link: Link) -> NodeId {
        let out = ast.add(Node::clone(node).with_encoding(vec![link]));
        self.remember(id, out);
        out
    }

    /// Keep every link, rewrite the target of the last one.
    fn chain(self: &Arc<Self>, ast: &Ast, id: NodeId, node: &Node, last: NodeId) -> Result<NodeId, SchemaError> {
        let out = self.reserve(ast, id);
        let target = self.go(ast, last)?;
        let mut links = node.links().to_vec();
        if let Some(tail) = links.last_mut() {
            tail.to = target;
        }
        ast.define(out, Node::clone(node).with_encoding(links))?;
        Ok(out)
    }

    fn declaration(
        self: &Arc<Self>,
        ast: &Ast,
        id: NodeId,
        node: &Node,
        declaration: &Declaration,
    ) -> Result<NodeId, SchemaError> {
        let Some(serializer) = ast.json_serializer(&declaration.tag) else {
            tracing::debug!(tag = %declaration.tag, "declaration has no defaultJsonSerializer");
            let link = forbidden_link(ast, MISSING_JSON_SERIALIZER);
            return Ok(self.leaf(ast, id, node, link));
        };
        let out = self.reserve(ast, id);
        let type_parameters = self.all(ast, &declaration.type_parameters)?;
        let link = serializer(ast, &type_parameters);
        let target = self.go(ast, link.to)?;
        ast.define(
            out,
            Node::clone(node).with_encoding(vec![Link::new(target, link.transformation)]),
        )?;
        Ok(out)
    }
}

/// Link to an annotated `unknown` node: decode passes through, encode
/// always fails with `message`.
fn forbidden_link(ast: &Ast, message: impl Into<String>) -> Link {
    let target = ast.add(
        Node::new(NodeKind::Unknown)
            .with_annotations(Annotations::new().with_description("decode-only JSON value")),
    );
    let transformation = Transformation::make(Getter::passthrough(), Getter::forbidden(message))
        .named("forbiddenJsonEncoding");
    Link::new(target, transformation)
}

/// Registered symbols ↔ their registry key.
fn symbol_from_key() -> Transformation {
    Transformation::transform_or_fail(
        |value| match value {
            Value::String(key) => Ok(Value::Symbol(Symbol::for_key(&key))),
            other => Err(Issue::invalid_type("string", Some(other))),
        },
        |value| match value {
            Value::Symbol(symbol) => match symbol.key_for() {
                Some(key) if !key.is_empty() => Ok(Value::String(key)),
                _ => Err(Issue::forbidden(
                    Some(Value::Symbol(symbol)),
                    "cannot serialize to JSON, Symbol is not registered",
                )),
            },
            other => Err(Issue::invalid_type("symbol", Some(other))),
        },
    )
    .named("symbolFromKey")
}
