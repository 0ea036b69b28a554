//! # Decode/Encode Driver
//!
//! Walks the arena and runs a value through a schema in one of three
//! directions:
//!
//! - **Decode**: wire side → type side. A node with an encoding chain first
//!   decodes its last link's target, then applies each link's `decode` from
//!   the wire end back towards the node, validating every intermediate
//!   target, and finally validates the node's own type side.
//! - **Encode**: the mirror image. Validate the type side, apply the links'
//!   `encode` from the node outwards, then encode into the last target.
//! - **Validate**: type side only. Encoding chains are ignored; this is the
//!   guard used between links and by unions in encode position.
//!
//! ## Containers
//!
//! Structs, tuples and unions are decoded member by member. Child issues
//! are wrapped in a [`Issue::Pointer`] with their key or index and folded
//! into a [`Issue::Composite`] naming the container. With
//! [`ErrorsMode::First`](strux_core::ErrorsMode::First) the composite holds
//! the first child issue only.

use std::collections::BTreeMap;

use strux_core::{Context, Issue, OnExcessProperty, ParseOptions, PathKey, Value};

use crate::ast::{Ast, Element, IndexSignature, Link, Node, NodeId, NodeKind, PropertySignature, UnionMode};
use crate::error::SchemaError;

type Outcome = Result<Option<Value>, SchemaError>;

/// Direction of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Decode,
    Encode,
    Validate,
}

/// Child issues of one container.
struct Collector {
    all: bool,
    issues: Vec<Issue>,
}

impl Collector {
    fn new(options: &ParseOptions) -> Self {
        Self {
            all: options.collects_all(),
            issues: Vec::new(),
        }
    }

    /// Record a child failure under `path`. Non-issue errors abort the walk.
    fn record(&mut self, path: PathKey, err: SchemaError) -> Result<(), SchemaError> {
        match err {
            SchemaError::Issue(issue) => {
                self.push(path, issue);
                Ok(())
            }
            other => Err(other),
        }
    }

    fn push(&mut self, path: PathKey, issue: Issue) {
        self.issues.push(Issue::pointer(vec![path], issue));
    }

    fn should_stop(&self) -> bool {
        !self.all && !self.issues.is_empty()
    }

    fn composite(self, expected: String, actual: Value) -> SchemaError {
        SchemaError::Issue(Issue::Composite {
            expected,
            actual: Some(actual),
            issues: self.issues,
        })
    }
}

/// Tree-walking interpreter over an [`Ast`].
pub struct Parser<'a> {
    ast: &'a Ast,
    options: &'a ParseOptions,
    context: &'a Context,
}

impl<'a> Parser<'a> {
    pub fn new(ast: &'a Ast, options: &'a ParseOptions, context: &'a Context) -> Self {
        Self {
            ast,
            options,
            context,
        }
    }

    pub fn decode(&self, id: NodeId, input: Option<Value>) -> Outcome {
        self.go(Direction::Decode, id, input)
    }

    pub fn encode(&self, id: NodeId, input: Option<Value>) -> Outcome {
        self.go(Direction::Encode, id, input)
    }

    /// Check `value` against the type side of `id`.
    pub fn validate(&self, id: NodeId, value: &Value) -> Result<(), SchemaError> {
        self.go(Direction::Validate, id, Some(value.clone()))
            .map(|_| ())
    }

    /// Type guard: `true` when `value` belongs to the type side of `id`.
    pub fn is(&self, id: NodeId, value: &Value) -> Result<bool, SchemaError> {
        match self.validate(id, value) {
            Ok(()) => Ok(true),
            Err(SchemaError::Issue(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    pub fn go(&self, direction: Direction, id: NodeId, input: Option<Value>) -> Outcome {
        let node = self.ast.get(id)?;
        let links = node.links();
        match direction {
            Direction::Decode if !links.is_empty() => self.decode_chain(id, links, input),
            Direction::Encode if !links.is_empty() => self.encode_chain(id, links, input),
            _ => self.structural(direction, id, &node, input),
        }
    }

    fn decode_chain(&self, id: NodeId, links: &[Link], input: Option<Value>) -> Outcome {
        tracing::trace!(node = %id, links = links.len(), "decoding through encoding chain");
        let mut current = match links.last() {
            Some(last) => self.go(Direction::Decode, last.to, input)?,
            None => input,
        };
        for (i, link) in links.iter().enumerate().rev() {
            current = link
                .transformation
                .decode()
                .run(current, self.options, self.context)?;
            if i > 0 {
                current = self.go(Direction::Validate, links[i - 1].to, current)?;
            }
        }
        self.go(Direction::Validate, id, current)
    }

    fn encode_chain(&self, id: NodeId, links: &[Link], input: Option<Value>) -> Outcome {
        tracing::trace!(node = %id, links = links.len(), "encoding through encoding chain");
        let mut current = self.go(Direction::Validate, id, input)?;
        for (i, link) in links.iter().enumerate() {
            current = link
                .transformation
                .encode()
                .run(current, self.options, self.context)?;
            if i + 1 < links.len() {
                current = self.go(Direction::Validate, link.to, current)?;
            }
        }
        match links.last() {
            Some(last) => self.go(Direction::Encode, last.to, current),
            None => Ok(current),
        }
    }

    fn structural(
        &self,
        direction: Direction,
        id: NodeId,
        node: &Node,
        input: Option<Value>,
    ) -> Outcome {
        let Some(value) = input else {
            return Ok(None);
        };
        // Checks always see the type side.
        if direction == Direction::Encode {
            self.run_checks(id, node, &value)?;
        }
        let output = match &node.kind {
            NodeKind::TypeLiteral {
                properties,
                index_signatures,
            } => Some(self.type_literal(direction, id, properties, index_signatures, value)?),
            NodeKind::Tuple { elements, rest } => {
                Some(self.tuple(direction, id, elements, rest, value)?)
            }
            NodeKind::Union { types, mode } => self.union(direction, id, types, *mode, value)?,
            NodeKind::Suspend(_) => {
                let target = self.ast.force(id)?;
                self.go(direction, target, Some(value))?
            }
            kind if leaf_matches(kind, &value) => Some(value),
            _ => return Err(Issue::invalid_type(self.ast.describe(id), Some(value)).into()),
        };
        if direction != Direction::Encode {
            if let Some(value) = &output {
                self.run_checks(id, node, value)?;
            }
        }
        Ok(output)
    }

    fn run_checks(&self, id: NodeId, node: &Node, value: &Value) -> Result<(), SchemaError> {
        let mut issues = Vec::new();
        for check in &node.checks {
            if let Some(issue) = check.run(value).into_issue(value) {
                if !self.options.collects_all() {
                    return Err(issue.into());
                }
                issues.push(issue);
            }
        }
        if issues.len() > 1 {
            return Err(Issue::Composite {
                expected: self.ast.describe(id),
                actual: Some(value.clone()),
                issues,
            }
            .into());
        }
        match issues.pop() {
            Some(issue) => Err(issue.into()),
            None => Ok(()),
        }
    }

    fn missing_key(&self, type_: NodeId) -> Issue {
        let message = self
            .ast
            .get(type_)
            .ok()
            .and_then(|node| node.annotations.missing_message.clone());
        Issue::MissingKey { message }
    }

    fn type_literal(
        &self,
        direction: Direction,
        id: NodeId,
        properties: &[PropertySignature],
        index_signatures: &[IndexSignature],
        value: Value,
    ) -> Result<Value, SchemaError> {
        let Value::Object(input) = value else {
            return Err(Issue::invalid_type(self.ast.describe(id), Some(value)).into());
        };
        let mut output = BTreeMap::new();
        let mut collector = Collector::new(self.options);

        for property in properties {
            let path = PathKey::from(property.name.as_str());
            match input.get(&property.name) {
                None if property.optional => continue,
                None => collector.push(path, self.missing_key(property.type_)),
                Some(v) => match self.go(direction, property.type_, Some(v.clone())) {
                    Ok(Some(out)) => {
                        output.insert(property.name.clone(), out);
                    }
                    Ok(None) => {}
                    Err(err) => collector.record(path, err)?,
                },
            }
            if collector.should_stop() {
                return Err(collector.composite(self.ast.describe(id), Value::Object(input)));
            }
        }

        for (key, v) in &input {
            if properties.iter().any(|p| &p.name == key) {
                continue;
            }
            let mut signature = None;
            for candidate in index_signatures {
                if self.is(candidate.parameter, &Value::String(key.clone()))? {
                    signature = Some(candidate);
                    break;
                }
            }
            match signature {
                Some(sig) => match self.go(direction, sig.type_, Some(v.clone())) {
                    Ok(Some(out)) => {
                        output.insert(key.clone(), out);
                    }
                    Ok(None) => {}
                    Err(err) => collector.record(PathKey::from(key.as_str()), err)?,
                },
                None => match self.options.on_excess_property {
                    OnExcessProperty::Ignore => {}
                    OnExcessProperty::Preserve => {
                        output.insert(key.clone(), v.clone());
                    }
                    OnExcessProperty::Error => collector.push(
                        PathKey::from(key.as_str()),
                        Issue::UnexpectedKey { actual: v.clone() },
                    ),
                },
            }
            if collector.should_stop() {
                return Err(collector.composite(self.ast.describe(id), Value::Object(input.clone())));
            }
        }

        if collector.issues.is_empty() {
            Ok(Value::Object(output))
        } else {
            Err(collector.composite(self.ast.describe(id), Value::Object(input)))
        }
    }

    fn element(
        &self,
        direction: Direction,
        type_: NodeId,
        index: usize,
        item: &Value,
        output: &mut Vec<Value>,
        collector: &mut Collector,
    ) -> Result<(), SchemaError> {
        match self.go(direction, type_, Some(item.clone())) {
            Ok(Some(out)) => {
                output.push(out);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => collector.record(PathKey::Index(index), err),
        }
    }

    fn tuple(
        &self,
        direction: Direction,
        id: NodeId,
        elements: &[Element],
        rest: &[NodeId],
        value: Value,
    ) -> Result<Value, SchemaError> {
        let Value::Array(items) = value else {
            return Err(Issue::invalid_type(self.ast.describe(id), Some(value)).into());
        };
        let mut output = Vec::with_capacity(items.len());
        let mut collector = Collector::new(self.options);
        let stop = |collector: Collector| {
            Err(collector.composite(self.ast.describe(id), Value::Array(items.clone())))
        };

        for (i, element) in elements.iter().enumerate() {
            match items.get(i) {
                None if element.optional => continue,
                None => collector.push(PathKey::Index(i), self.missing_key(element.type_)),
                Some(item) => {
                    self.element(direction, element.type_, i, item, &mut output, &mut collector)?
                }
            }
            if collector.should_stop() {
                return stop(collector);
            }
        }

        match rest.split_first() {
            Some((head, post)) => {
                let start = elements.len();
                let post_start = items.len().saturating_sub(post.len()).max(start);
                for (i, item) in items.iter().enumerate().take(post_start).skip(start) {
                    self.element(direction, *head, i, item, &mut output, &mut collector)?;
                    if collector.should_stop() {
                        return stop(collector);
                    }
                }
                for (j, type_) in post.iter().enumerate() {
                    let i = post_start + j;
                    match items.get(i) {
                        None => collector.push(PathKey::Index(i), self.missing_key(*type_)),
                        Some(item) => {
                            self.element(direction, *type_, i, item, &mut output, &mut collector)?
                        }
                    }
                    if collector.should_stop() {
                        return stop(collector);
                    }
                }
            }
            None => {
                for (i, item) in items.iter().enumerate().skip(elements.len()) {
                    collector.push(
                        PathKey::Index(i),
                        Issue::UnexpectedKey {
                            actual: item.clone(),
                        },
                    );
                    if collector.should_stop() {
                        return stop(collector);
                    }
                }
            }
        }

        if collector.issues.is_empty() {
            Ok(Value::Array(output))
        } else {
            stop(collector)
        }
    }

    fn union(
        &self,
        direction: Direction,
        id: NodeId,
        types: &[NodeId],
        mode: UnionMode,
        value: Value,
    ) -> Outcome {
        let mut issues = Vec::new();
        let mut first = None;
        let mut matches = 0;
        for member in types {
            match self.go(direction, *member, Some(value.clone())) {
                Ok(out) => {
                    matches += 1;
                    if first.is_none() {
                        first = Some(out);
                    }
                    if mode == UnionMode::AnyOf {
                        break;
                    }
                }
                Err(SchemaError::Issue(issue)) => issues.push(issue),
                Err(other) => return Err(other),
            }
        }
        if matches > 1 {
            return Err(Issue::OneOf {
                expected: self.ast.describe(id),
                actual: value,
                matches,
            }
            .into());
        }
        match first {
            Some(out) => Ok(out),
            None => Err(Issue::Composite {
                expected: self.ast.describe(id),
                actual: Some(value),
                issues,
            }
            .into()),
        }
    }
}

fn leaf_matches(kind: &NodeKind, value: &Value) -> bool {
    match kind {
        NodeKind::Literal(literal) => literal.matches(value),
        NodeKind::Null => matches!(value, Value::Null),
        NodeKind::String => matches!(value, Value::String(_)),
        NodeKind::Number => matches!(value, Value::Number(_)),
        NodeKind::Boolean => matches!(value, Value::Bool(_)),
        NodeKind::TemplateLiteral { pattern, .. } => {
            value.as_str().map_or(false, |s| pattern.is_match(s))
        }
        NodeKind::Enums(members) => members.iter().any(|(_, member)| member == value),
        NodeKind::UniqueSymbol(symbol) => matches!(value, Value::Symbol(s) if s == symbol),
        NodeKind::Symbol => matches!(value, Value::Symbol(_)),
        NodeKind::BigInt => matches!(value, Value::BigInt(_)),
        NodeKind::Never => false,
        NodeKind::Any | NodeKind::Unknown => true,
        NodeKind::Undefined | NodeKind::Void => matches!(value, Value::Undefined),
        NodeKind::Object => matches!(
            value,
            Value::Array(_) | Value::Object(_) | Value::Date(_) | Value::Bytes(_) | Value::Opaque(_)
        ),
        NodeKind::Declaration(declaration) => declaration.is(value),
        NodeKind::TypeLiteral { .. }
        | NodeKind::Tuple { .. }
        | NodeKind::Union { .. }
        | NodeKind::Suspend(_) => false,
    }
}
