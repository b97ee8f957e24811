//! Cypher upsert statements.
//!
//! All statements use MERGE (upsert) semantics. Nodes are identified by their
//! full key property list, and relationship statements re-state both endpoint
//! keys so every statement can be executed on its own, in any session.
//!
//! A statement renders two ways:
//! - literal (`Display`), for `.cypher` files: values are inlined as quoted literals
//! - parameterized, for live sessions: values become `$p0, $p1, ...`

use std::fmt;

use serde_json::Value;

// ── Property Values ──────────────────────────────────────────────

/// A property value written into the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    String(String),
    List(Vec<String>),
}

impl PropertyValue {
    /// Convert a JSON value into a property value.
    ///
    /// Strings are taken verbatim, `null` becomes the empty string, arrays
    /// become lists of their rendered elements, and anything else is kept as
    /// its JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::List(items.iter().map(json_text).collect()),
            other => Self::String(json_text(other)),
        }
    }

    /// The string payload, if this is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::List(_) => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Render a JSON scalar the way it should appear as a graph property.
pub fn json_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Patterns and Statements ──────────────────────────────────────

/// A labeled node pattern keyed by an ordered list of properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePattern {
    pub variable: String,
    pub label: String,
    pub key: Vec<(String, PropertyValue)>,
}

impl NodePattern {
    pub fn new(variable: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            label: label.into(),
            key: Vec::new(),
        }
    }

    /// Append a key property.
    pub fn with(mut self, property: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.key.push((property.into(), value.into()));
        self
    }

    /// Look up a key property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.key.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// The `name` key property, if present.
    pub fn name(&self) -> Option<&str> {
        self.property("name").and_then(PropertyValue::as_str)
    }
}

/// A single, independently idempotent graph write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Upsert a node by its key, then set any non-key properties.
    MergeNode {
        node: NodePattern,
        set: Vec<(String, PropertyValue)>,
    },
    /// Upsert both endpoints by key and the typed relationship between them.
    MergeRelationship {
        from: NodePattern,
        rel_type: String,
        to: NodePattern,
    },
}

impl Statement {
    pub fn merge_node(node: NodePattern) -> Self {
        Self::MergeNode {
            node,
            set: Vec::new(),
        }
    }

    pub fn merge_node_with(node: NodePattern, set: Vec<(String, PropertyValue)>) -> Self {
        Self::MergeNode { node, set }
    }

    pub fn merge_relationship(
        from: NodePattern,
        rel_type: impl Into<String>,
        to: NodePattern,
    ) -> Self {
        Self::MergeRelationship {
            from,
            rel_type: rel_type.into(),
            to,
        }
    }

    /// Label of the upserted node, for node statements.
    pub fn node_label(&self) -> Option<&str> {
        match self {
            Self::MergeNode { node, .. } => Some(&node.label),
            Self::MergeRelationship { .. } => None,
        }
    }

    /// Relationship type, for relationship statements.
    pub fn rel_type(&self) -> Option<&str> {
        match self {
            Self::MergeNode { .. } => None,
            Self::MergeRelationship { rel_type, .. } => Some(rel_type),
        }
    }

    /// Render with `$pN` placeholders, returning the text and its parameters in order.
    pub fn parameterized(&self) -> (String, Vec<(String, PropertyValue)>) {
        let mut renderer = Renderer {
            params: Some(Vec::new()),
        };
        let text = renderer.statement(self);
        (text, renderer.params.unwrap_or_default())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut renderer = Renderer { params: None };
        f.write_str(&renderer.statement(self))
    }
}

// ── Rendering ────────────────────────────────────────────────────

struct Renderer {
    params: Option<Vec<(String, PropertyValue)>>,
}

impl Renderer {
    fn statement(&mut self, statement: &Statement) -> String {
        match statement {
            Statement::MergeNode { node, set } => {
                let mut out = format!("MERGE {}", self.pattern(node));
                if !set.is_empty() {
                    let var = identifier(&node.variable);
                    let assignments = set
                        .iter()
                        .map(|(k, v)| format!("{var}.{} = {}", identifier(k), self.value(v)))
                        .collect::<Vec<_>>()
                        .join(", ");
                    out.push_str(" SET ");
                    out.push_str(&assignments);
                }
                out
            }
            Statement::MergeRelationship { from, rel_type, to } => {
                let from_pattern = self.pattern(from);
                let to_pattern = self.pattern(to);
                format!(
                    "MERGE {from_pattern} MERGE {to_pattern} MERGE ({})-[:{}]->({})",
                    identifier(&from.variable),
                    identifier(rel_type),
                    identifier(&to.variable),
                )
            }
        }
    }

    fn pattern(&mut self, node: &NodePattern) -> String {
        let props = node
            .key
            .iter()
            .map(|(k, v)| format!("{}: {}", identifier(k), self.value(v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "({}:{} {{{props}}})",
            identifier(&node.variable),
            identifier(&node.label)
        )
    }

    fn value(&mut self, value: &PropertyValue) -> String {
        match &mut self.params {
            Some(params) => {
                let name = format!("p{}", params.len());
                params.push((name.clone(), value.clone()));
                format!("${name}")
            }
            None => literal(value),
        }
    }
}

/// Inline a property value as a Cypher literal.
fn literal(value: &PropertyValue) -> String {
    match value {
        PropertyValue::String(s) => quote(s),
        PropertyValue::List(items) => {
            let rendered: Vec<String> = items.iter().map(|s| quote(s)).collect();
            format!("[{}]", rendered.join(", "))
        }
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Backtick-quote labels, relationship types, and keys that are not plain identifiers.
fn identifier(s: &str) -> String {
    let mut chars = s.chars();
    let plain = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if plain {
        s.to_string()
    } else {
        format!("`{}`", s.replace('`', "``"))
    }
}
