//! # Schema AST — Arena of Nodes
//!
//! Schemas are graphs, not trees: a recursive type refers to itself either
//! through a [`NodeKind::Suspend`] thunk or directly, by id. Nodes therefore
//! live in an arena ([`Ast`]) and refer to each other by stable
//! [`NodeId`]s. Nodes are immutable once defined; every "modifying"
//! operation adds a new node and returns its id.
//!
//! ## Encoding Chains
//!
//! A node describes its decoded (type) side. If it also carries an
//! `encoding`, that is an ordered, non-empty chain of [`Link`]s from the
//! step closest to the decoded side to the step closest to the wire. Each
//! link's transformation decodes from `link.to` into the previous step.
//!
//! ## Self-Reference
//!
//! [`Ast::reserve`] hands out an id before the node exists, so a node can
//! mention itself; [`Ast::define`] fills the slot in later. The serializer
//! uses the same mechanism to record its output before recursing.
//!
//! ## Locking
//!
//! The arena is a `parking_lot::RwLock` over `Arc<Node>` slots. Readers
//! clone the `Arc` and release the lock immediately, so a Suspend thunk
//! forced in the middle of a decode may add nodes.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use regex::Regex;
use strux_core::{format_number, CheckResult, Symbol, Transformation, Value};

use crate::annotations::{Annotations, DeclarationSerializer, SerializerRegistry};
use crate::error::SchemaError;

/// Stable index of a node in an [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One step of an encoding chain.
#[derive(Debug, Clone)]
pub struct Link {
    /// The node one step further from the decoded side.
    pub to: NodeId,
    /// Decodes from `to`, encodes into `to`.
    pub transformation: Transformation,
}

impl Link {
    pub fn new(to: NodeId, transformation: Transformation) -> Self {
        Self { to, transformation }
    }
}

// ─── Node kinds ──────────────────────────────────────────────────────

/// Value of a literal type.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::String(s) => Value::String(s.clone()),
            Literal::Number(n) => Value::Number(*n),
            Literal::Boolean(b) => Value::Bool(*b),
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Literal::String(a), Value::String(b)) => a == b,
            (Literal::Number(a), Value::Number(b)) => a == b,
            (Literal::Boolean(a), Value::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Boolean(b)
    }
}

/// Segment of a template literal type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    /// Fixed text.
    Literal(String),
    /// `${string}`
    String,
    /// `${number}`
    Number,
}

const STRING_PATTERN: &str = r"[\s\S]*?";
const NUMBER_PATTERN: &str = r"[+-]?\d*\.?\d+(?:[Ee][+-]?\d+)?";

fn template_pattern(parts: &[TemplatePart]) -> Result<Regex, regex::Error> {
    let mut pattern = String::from("^");
    for part in parts {
        match part {
            TemplatePart::Literal(text) => pattern.push_str(&regex::escape(text)),
            TemplatePart::String => pattern.push_str(STRING_PATTERN),
            TemplatePart::Number => pattern.push_str(NUMBER_PATTERN),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySignature {
    pub name: String,
    pub type_: NodeId,
    pub optional: bool,
}

impl PropertySignature {
    pub fn required(name: impl Into<String>, type_: NodeId) -> Self {
        Self {
            name: name.into(),
            type_,
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, type_: NodeId) -> Self {
        Self {
            name: name.into(),
            type_,
            optional: true,
        }
    }
}

/// `[key: parameter]: type_`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSignature {
    pub parameter: NodeId,
    pub type_: NodeId,
}

/// Positional tuple element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub type_: NodeId,
    pub optional: bool,
}

impl Element {
    pub fn required(type_: NodeId) -> Self {
        Self {
            type_,
            optional: false,
        }
    }

    pub fn optional(type_: NodeId) -> Self {
        Self {
            type_,
            optional: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnionMode {
    /// The first matching member wins.
    #[default]
    AnyOf,
    /// Exactly one member may match.
    OneOf,
}

/// Deferred reference, resolved on first force.
pub type Thunk = dyn Fn(&Ast) -> Result<NodeId, SchemaError> + Send + Sync;

/// Lazily resolved Suspend target.
///
/// The thunk runs at most once successfully; the result is cached. A thunk
/// must not force its own suspension.
pub struct Suspension {
    thunk: Box<Thunk>,
    resolved: OnceCell<NodeId>,
}

impl Suspension {
    pub fn new<F>(thunk: F) -> Self
    where
        F: Fn(&Ast) -> Result<NodeId, SchemaError> + Send + Sync + 'static,
    {
        Self {
            thunk: Box::new(thunk),
            resolved: OnceCell::new(),
        }
    }

    pub fn resolve(&self, ast: &Ast) -> Result<NodeId, SchemaError> {
        self.resolved.get_or_try_init(|| (self.thunk)(ast)).copied()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

impl fmt::Debug for Suspension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suspension")
            .field("resolved", &self.resolved.get())
            .finish()
    }
}

/// Type guard of a declaration.
pub type Guard = dyn Fn(&Value) -> bool + Send + Sync;

/// Opaque or custom type, identified by its tag.
#[derive(Clone)]
pub struct Declaration {
    pub tag: String,
    pub type_parameters: Vec<NodeId>,
    guard: Arc<Guard>,
}

impl Declaration {
    pub fn new<F>(tag: impl Into<String>, type_parameters: Vec<NodeId>, guard: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            tag: tag.into(),
            type_parameters,
            guard: Arc::new(guard),
        }
    }

    pub fn is(&self, value: &Value) -> bool {
        (self.guard)(value)
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("tag", &self.tag)
            .field("type_parameters", &self.type_parameters)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Literal(Literal),
    Null,
    String,
    Number,
    Boolean,
    TemplateLiteral {
        parts: Vec<TemplatePart>,
        pattern: Regex,
    },
    /// Named members of an enum; values are strings or numbers.
    Enums(Vec<(String, Value)>),
    UniqueSymbol(Symbol),
    Symbol,
    BigInt,
    Never,
    Any,
    Unknown,
    Undefined,
    Void,
    Object,
    TypeLiteral {
        properties: Vec<PropertySignature>,
        index_signatures: Vec<IndexSignature>,
    },
    /// `rest[0]` is the repeated type; `rest[1..]` are post-rest elements.
    Tuple {
        elements: Vec<Element>,
        rest: Vec<NodeId>,
    },
    Union {
        types: Vec<NodeId>,
        mode: UnionMode,
    },
    Suspend(Arc<Suspension>),
    Declaration(Declaration),
}

impl NodeKind {
    /// Catalog name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Literal(_) => "LiteralType",
            NodeKind::Null => "NullKeyword",
            NodeKind::String => "StringKeyword",
            NodeKind::Number => "NumberKeyword",
            NodeKind::Boolean => "BooleanKeyword",
            NodeKind::TemplateLiteral { .. } => "TemplateLiteral",
            NodeKind::Enums(_) => "Enums",
            NodeKind::UniqueSymbol(_) => "UniqueSymbol",
            NodeKind::Symbol => "SymbolKeyword",
            NodeKind::BigInt => "BigIntKeyword",
            NodeKind::Never => "NeverKeyword",
            NodeKind::Any => "AnyKeyword",
            NodeKind::Unknown => "UnknownKeyword",
            NodeKind::Undefined => "UndefinedKeyword",
            NodeKind::Void => "VoidKeyword",
            NodeKind::Object => "ObjectKeyword",
            NodeKind::TypeLiteral { .. } => "TypeLiteral",
            NodeKind::Tuple { .. } => "TupleType",
            NodeKind::Union { .. } => "UnionType",
            NodeKind::Suspend(_) => "Suspend",
            NodeKind::Declaration(_) => "Declaration",
        }
    }
}

/// Named refinement run after a successful type match.
#[derive(Clone)]
pub struct Check {
    name: Cow<'static, str>,
    predicate: Arc<dyn Fn(&Value) -> CheckResult + Send + Sync>,
}

impl Check {
    pub fn new<F, R>(name: impl Into<Cow<'static, str>>, predicate: F) -> Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<CheckResult>,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(move |value| predicate(value).into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run(&self, value: &Value) -> CheckResult {
        (self.predicate)(value)
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Check({})", self.name)
    }
}

/// A schema node.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub annotations: Annotations,
    pub checks: Vec<Check>,
    /// Non-empty when present.
    pub encoding: Option<Vec<Link>>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            annotations: Annotations::default(),
            checks: Vec::new(),
            encoding: None,
        }
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    /// Replace the chain; an empty chain removes it.
    pub fn with_encoding(mut self, links: Vec<Link>) -> Self {
        self.encoding = if links.is_empty() { None } else { Some(links) };
        self
    }

    pub fn links(&self) -> &[Link] {
        self.encoding.as_deref().unwrap_or(&[])
    }
}

// ─── Arena ───────────────────────────────────────────────────────────

#[derive(Default)]
struct Arena {
    nodes: RwLock<Vec<Option<Arc<Node>>>>,
    registry: RwLock<SerializerRegistry>,
}

/// Shared arena of schema nodes. Cloning is cheap and shares the arena.
#[derive(Clone, Default)]
pub struct Ast {
    inner: Arc<Arena>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, node: Node) -> NodeId {
        let mut nodes = self.inner.nodes.write();
        let id = NodeId(nodes.len() as u32);
        nodes.push(Some(Arc::new(node)));
        id
    }

    /// Allocate an id whose node is supplied later with [`Ast::define`].
    pub fn reserve(&self) -> NodeId {
        let mut nodes = self.inner.nodes.write();
        let id = NodeId(nodes.len() as u32);
        nodes.push(None);
        id
    }

    pub fn define(&self, id: NodeId, node: Node) -> Result<(), SchemaError> {
        let mut nodes = self.inner.nodes.write();
        match nodes.get_mut(id.index()) {
            Some(slot) if slot.is_none() => {
                *slot = Some(Arc::new(node));
                Ok(())
            }
            Some(_) => Err(SchemaError::AlreadyDefined(id)),
            None => Err(SchemaError::UnknownNode(id)),
        }
    }

    pub fn get(&self, id: NodeId) -> Result<Arc<Node>, SchemaError> {
        self.inner
            .nodes
            .read()
            .get(id.index())
            .and_then(Clone::clone)
            .ok_or(SchemaError::UnknownNode(id))
    }

    pub fn len(&self) -> usize {
        self.inner.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register the `defaultJsonSerializer` for declarations tagged `tag`.
    pub fn register_json_serializer<F>(&self, tag: impl Into<String>, serializer: F)
    where
        F: Fn(&Ast, &[NodeId]) -> Link + Send + Sync + 'static,
    {
        self.inner.registry.write().register(tag, serializer);
    }

    pub fn json_serializer(&self, tag: &str) -> Option<Arc<DeclarationSerializer>> {
        self.inner.registry.read().get(tag)
    }

    /// Follow Suspend nodes until a concrete node is reached.
    pub fn force(&self, id: NodeId) -> Result<NodeId, SchemaError> {
        let mut current = id;
        // A chain of distinct suspensions cannot be longer than the arena.
        for _ in 0..=self.len() {
            let node = self.get(current)?;
            match &node.kind {
                NodeKind::Suspend(suspension) => {
                    tracing::trace!(node = %current, "forcing suspended schema");
                    current = suspension.resolve(self)?;
                }
                _ => return Ok(current),
            }
        }
        Err(SchemaError::UnresolvedSuspend(id))
    }
}

impl fmt::Debug for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ast")
            .field("nodes", &self.len())
            .field("registry", &*self.inner.registry.read())
            .finish()
    }
}

// ─── Constructors ────────────────────────────────────────────────────

impl Ast {
    fn keyword(&self, kind: NodeKind) -> NodeId {
        self.add(Node::new(kind))
    }

    pub fn string(&self) -> NodeId {
        self.keyword(NodeKind::String)
    }

    pub fn number(&self) -> NodeId {
        self.keyword(NodeKind::Number)
    }

    pub fn boolean(&self) -> NodeId {
        self.keyword(NodeKind::Boolean)
    }

    pub fn null(&self) -> NodeId {
        self.keyword(NodeKind::Null)
    }

    pub fn bigint(&self) -> NodeId {
        self.keyword(NodeKind::BigInt)
    }

    pub fn symbol(&self) -> NodeId {
        self.keyword(NodeKind::Symbol)
    }

    pub fn never(&self) -> NodeId {
        self.keyword(NodeKind::Never)
    }

    pub fn any(&self) -> NodeId {
        self.keyword(NodeKind::Any)
    }

    pub fn unknown(&self) -> NodeId {
        self.keyword(NodeKind::Unknown)
    }

    pub fn undefined(&self) -> NodeId {
        self.keyword(NodeKind::Undefined)
    }

    pub fn void(&self) -> NodeId {
        self.keyword(NodeKind::Void)
    }

    pub fn object(&self) -> NodeId {
        self.keyword(NodeKind::Object)
    }

    pub fn literal(&self, literal: impl Into<Literal>) -> NodeId {
        self.keyword(NodeKind::Literal(literal.into()))
    }

    pub fn unique_symbol(&self, symbol: Symbol) -> NodeId {
        self.keyword(NodeKind::UniqueSymbol(symbol))
    }

    pub fn enums<K: Into<String>>(&self, members: impl IntoIterator<Item = (K, Value)>) -> NodeId {
        let members = members.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.keyword(NodeKind::Enums(members))
    }

    pub fn template_literal(&self, parts: Vec<TemplatePart>) -> Result<NodeId, SchemaError> {
        let pattern = template_pattern(&parts)?;
        Ok(self.keyword(NodeKind::TemplateLiteral { parts, pattern }))
    }

    pub fn struct_(
        &self,
        properties: Vec<PropertySignature>,
        index_signatures: Vec<IndexSignature>,
    ) -> NodeId {
        self.keyword(NodeKind::TypeLiteral {
            properties,
            index_signatures,
        })
    }

    /// `{ [key: key]: value }`
    pub fn record(&self, key: NodeId, value: NodeId) -> NodeId {
        self.struct_(
            Vec::new(),
            vec![IndexSignature {
                parameter: key,
                type_: value,
            }],
        )
    }

    pub fn tuple(&self, elements: Vec<Element>, rest: Vec<NodeId>) -> NodeId {
        self.keyword(NodeKind::Tuple { elements, rest })
    }

    pub fn array(&self, item: NodeId) -> NodeId {
        self.tuple(Vec::new(), vec![item])
    }

    pub fn union(&self, types: Vec<NodeId>) -> NodeId {
        self.keyword(NodeKind::Union {
            types,
            mode: UnionMode::AnyOf,
        })
    }

    /// Union where exactly one member may match.
    pub fn one_of(&self, types: Vec<NodeId>) -> NodeId {
        self.keyword(NodeKind::Union {
            types,
            mode: UnionMode::OneOf,
        })
    }

    pub fn suspend<F>(&self, thunk: F) -> NodeId
    where
        F: Fn(&Ast) -> NodeId + Send + Sync + 'static,
    {
        self.suspend_fallible(move |ast| Ok(thunk(ast)))
    }

    pub fn suspend_fallible<F>(&self, thunk: F) -> NodeId
    where
        F: Fn(&Ast) -> Result<NodeId, SchemaError> + Send + Sync + 'static,
    {
        self.keyword(NodeKind::Suspend(Arc::new(Suspension::new(thunk))))
    }

    pub fn declaration<F>(
        &self,
        tag: impl Into<String>,
        type_parameters: Vec<NodeId>,
        guard: F,
    ) -> NodeId
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.keyword(NodeKind::Declaration(Declaration::new(
            tag,
            type_parameters,
            guard,
        )))
    }
}

// ─── Derived nodes ───────────────────────────────────────────────────

impl Ast {
    fn derive(&self, id: NodeId, f: impl FnOnce(Node) -> Node) -> Result<NodeId, SchemaError> {
        let node = Node::clone(&*self.get(id)?);
        Ok(self.add(f(node)))
    }

    /// Copy of `id` with its encoding chain replaced by `links`.
    pub fn replace_encoding(&self, id: NodeId, links: Vec<Link>) -> Result<NodeId, SchemaError> {
        self.derive(id, |node| node.with_encoding(links))
    }

    /// Copy of `id` with `link` appended to its chain.
    pub fn with_encoding(&self, id: NodeId, link: Link) -> Result<NodeId, SchemaError> {
        self.derive(id, |node| {
            let mut links = node.links().to_vec();
            links.push(link);
            node.with_encoding(links)
        })
    }

    /// A node decoding from `from` into `to` via `transformation`.
    pub fn transform(
        &self,
        from: NodeId,
        to: NodeId,
        transformation: Transformation,
    ) -> Result<NodeId, SchemaError> {
        self.with_encoding(to, Link::new(from, transformation))
    }

    pub fn refine(&self, id: NodeId, check: Check) -> Result<NodeId, SchemaError> {
        self.derive(id, |node| node.with_check(check))
    }

    pub fn annotate(&self, id: NodeId, annotations: Annotations) -> Result<NodeId, SchemaError> {
        self.derive(id, |node| node.with_annotations(annotations))
    }
}

// ─── Descriptions ────────────────────────────────────────────────────

impl Ast {
    /// Human-readable rendering of a node, used as `expected` in issues.
    pub fn describe(&self, id: NodeId) -> String {
        self.render(id, &mut HashSet::new())
    }

    fn render(&self, id: NodeId, visiting: &mut HashSet<NodeId>) -> String {
        let Ok(node) = self.get(id) else {
            return format!("<undefined {id}>");
        };
        if let Some(identifier) = &node.annotations.identifier {
            return identifier.clone();
        }
        if !visiting.insert(id) {
            return "<recursive>".to_string();
        }
        let type_side = self.render_kind(&node.kind, visiting);
        let rendered = match node.links().last() {
            Some(last) => format!("({} <-> {type_side})", self.render(last.to, visiting)),
            None => type_side,
        };
        visiting.remove(&id);
        rendered
    }

    fn render_kind(&self, kind: &NodeKind, visiting: &mut HashSet<NodeId>) -> String {
        match kind {
            NodeKind::Literal(Literal::String(s)) => Value::String(s.clone()).to_string(),
            NodeKind::Literal(Literal::Number(n)) => format_number(*n),
            NodeKind::Literal(Literal::Boolean(b)) => b.to_string(),
            NodeKind::Null => "null".to_string(),
            NodeKind::String => "string".to_string(),
            NodeKind::Number => "number".to_string(),
            NodeKind::Boolean => "boolean".to_string(),
            NodeKind::TemplateLiteral { parts, .. } => {
                let body: String = parts
                    .iter()
                    .map(|part| match part {
                        TemplatePart::Literal(text) => text.as_str(),
                        TemplatePart::String => "${string}",
                        TemplatePart::Number => "${number}",
                    })
                    .collect();
                format!("`{body}`")
            }
            NodeKind::Enums(members) => {
                let values: Vec<String> = members.iter().map(|(_, v)| v.to_string()).collect();
                format!("<enum {} value(s): {}>", members.len(), values.join(" | "))
            }
            NodeKind::UniqueSymbol(symbol) => symbol.to_string(),
            NodeKind::Symbol => "symbol".to_string(),
            NodeKind::BigInt => "bigint".to_string(),
            NodeKind::Never => "never".to_string(),
            NodeKind::Any => "any".to_string(),
            NodeKind::Unknown => "unknown".to_string(),
            NodeKind::Undefined => "undefined".to_string(),
            NodeKind::Void => "void".to_string(),
            NodeKind::Object => "object".to_string(),
            NodeKind::TypeLiteral {
                properties,
                index_signatures,
            } => {
                let mut members: Vec<String> = properties
                    .iter()
                    .map(|p| {
                        let marker = if p.optional { "?" } else { "" };
                        format!(
                            "readonly {}{marker}: {}",
                            p.name,
                            self.render(p.type_, visiting)
                        )
                    })
                    .collect();
                members.extend(index_signatures.iter().map(|sig| {
                    format!(
                        "readonly [x: {}]: {}",
                        self.render(sig.parameter, visiting),
                        self.render(sig.type_, visiting)
                    )
                }));
                if members.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{ {} }}", members.join("; "))
                }
            }
            NodeKind::Tuple { elements, rest } if elements.is_empty() && rest.len() == 1 => {
                format!("ReadonlyArray<{}>", self.render(rest[0], visiting))
            }
            NodeKind::Tuple { elements, rest } => {
                let mut members: Vec<String> = elements
                    .iter()
                    .map(|e| {
                        let marker = if e.optional { "?" } else { "" };
                        format!("{}{marker}", self.render(e.type_, visiting))
                    })
                    .collect();
                if let Some((head, post)) = rest.split_first() {
                    members.push(format!("...{}[]", self.render(*head, visiting)));
                    members.extend(post.iter().map(|id| self.render(*id, visiting)));
                }
                format!("readonly [{}]", members.join(", "))
            }
            NodeKind::Union { types, .. } => types
                .iter()
                .map(|id| self.render(*id, visiting))
                .collect::<Vec<_>>()
                .join(" | "),
            NodeKind::Suspend(_) => "<suspended schema>".to_string(),
            NodeKind::Declaration(declaration) if declaration.type_parameters.is_empty() => {
                declaration.tag.clone()
            }
            NodeKind::Declaration(declaration) => {
                let params: Vec<String> = declaration
                    .type_parameters
                    .iter()
                    .map(|id| self.render(*id, visiting))
                    .collect();
                format!("{}<{}>", declaration.tag, params.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let ast = Ast::new();
        let s = ast.string();
        assert_eq!(ast.get(s).expect("node").kind.name(), "StringKeyword");
        assert_eq!(ast.len(), 1);
    }

    #[test]
    fn test_unknown_node() {
        let ast = Ast::new();
        let err = ast.get(NodeId(7)).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownNode(NodeId(7))));
    }

    #[test]
    fn test_reserve_then_define() {
        let ast = Ast::new();
        let id = ast.reserve();
        assert!(ast.get(id).is_err());
        let items = ast.array(id);
        ast.define(
            id,
            Node::new(NodeKind::TypeLiteral {
                properties: vec![PropertySignature::required("children", items)],
                index_signatures: vec![],
            }),
        )
        .expect("define");
        assert!(ast.get(id).is_ok());
        let again = ast.define(id, Node::new(NodeKind::Null)).unwrap_err();
        assert!(matches!(again, SchemaError::AlreadyDefined(_)));
        assert_eq!(
            ast.describe(id),
            "{ readonly children: ReadonlyArray<<recursive>> }"
        );
    }

    #[test]
    fn test_force_resolves_once() {
        let ast = Ast::new();
        let target = ast.number();
        let suspended = ast.suspend(move |_| target);
        let outer = ast.suspend(move |_| suspended);
        assert_eq!(ast.force(outer).expect("force"), target);
        let node = ast.get(suspended).expect("node");
        match &node.kind {
            NodeKind::Suspend(s) => assert!(s.is_resolved()),
            other => panic!("Expected Suspend, got: {}", other.name()),
        }
    }

    #[test]
    fn test_force_detects_self_resolving_cycle() {
        let ast = Ast::new();
        let a = ast.reserve();
        let b = ast.suspend(move |_| a);
        ast.define(a, Node::new(NodeKind::Suspend(Arc::new(Suspension::new(move |_| Ok(b))))))
            .expect("define");
        assert!(matches!(
            ast.force(a),
            Err(SchemaError::UnresolvedSuspend(_))
        ));
    }

    #[test]
    fn test_replace_and_append_encoding() {
        let ast = Ast::new();
        let s = ast.string();
        let n = ast.number();
        let encoded = ast
            .transform(s, n, Transformation::number_from_string())
            .expect("transform");
        assert_eq!(ast.get(encoded).expect("node").links().len(), 1);
        assert!(ast.get(n).expect("node").encoding.is_none());
        assert_eq!(ast.describe(encoded), "(string <-> number)");

        let cleared = ast.replace_encoding(encoded, vec![]).expect("replace");
        assert!(ast.get(cleared).expect("node").encoding.is_none());
    }

    #[test]
    fn test_template_literal_pattern() {
        let ast = Ast::new();
        let id = ast
            .template_literal(vec![
                TemplatePart::Literal("v".into()),
                TemplatePart::Number,
                TemplatePart::Literal(".".into()),
                TemplatePart::String,
            ])
            .expect("template");
        let node = ast.get(id).expect("node");
        let NodeKind::TemplateLiteral { pattern, .. } = &node.kind else {
            panic!("Expected TemplateLiteral");
        };
        assert!(pattern.is_match("v1.beta"));
        assert!(pattern.is_match("v2."));
        assert!(!pattern.is_match("vx.beta"));
        assert_eq!(ast.describe(id), "`v${number}.${string}`");
    }

    #[test]
    fn test_describe_shapes() {
        let ast = Ast::new();
        let s = ast.string();
        let n = ast.number();
        let lit = ast.literal("a");
        let person = ast.struct_(
            vec![
                PropertySignature::required("name", s),
                PropertySignature::optional("age", n),
            ],
            vec![],
        );
        assert_eq!(
            ast.describe(person),
            "{ readonly name: string; readonly age?: number }"
        );
        let tuple = ast.tuple(vec![Element::required(s), Element::optional(n)], vec![lit]);
        assert_eq!(ast.describe(tuple), "readonly [string, number?, ...\"a\"[]]");
        let union = ast.union(vec![s, n]);
        assert_eq!(ast.describe(union), "string | number");
        let named = ast
            .annotate(person, Annotations::new().with_identifier("Person"))
            .expect("annotate");
        assert_eq!(ast.describe(named), "Person");
        let date = ast.declaration("Date", vec![], |v| matches!(v, Value::Date(_)));
        assert_eq!(ast.describe(date), "Date");
    }

    #[test]
    fn test_registry_is_shared_across_clones() {
        let ast = Ast::new();
        let clone = ast.clone();
        clone.register_json_serializer("Date", |ast, _| {
            Link::new(ast.string(), Transformation::date_from_string())
        });
        assert!(ast.json_serializer("Date").is_some());
        assert!(ast.json_serializer("Set").is_none());
    }
}
