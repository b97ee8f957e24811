//! Generic labeled-tree converter.
//!
//! Any JSON tree of `{label, value, lineage, children}` objects becomes one
//! node upsert per tree node plus a `HAS_CHILD` link per non-root node.
//! Nodes get synthetic identifiers (`node0`, `node1`, ...) in pre-order: parent
//! before children, children in source order.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use conjugraph_core::types::{DEFAULT_LABEL, HAS_CHILD};
use conjugraph_core::{NodePattern, PropertyValue, Statement};

use crate::error::Result;

/// One node of a generic labeled tree.
///
/// Every field is optional: a missing (or `null`) `children` list means a leaf.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub value: Value,
    /// Annotations copied onto the node as extra properties, in source order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub lineage: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<TreeNode>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read a tree document from disk.
pub fn load_tree(path: impl AsRef<Path>) -> Result<TreeNode> {
    let json = fs::read_to_string(path.as_ref())?;
    let tree = serde_json::from_str(&json)?;
    Ok(tree)
}

/// Cypher variable for a synthetic node identifier.
pub fn variable(id: usize) -> String {
    format!("node{id}")
}

/// Generate the full statement sequence for a tree, in pre-order.
pub fn generate_statements(root: &TreeNode) -> Vec<Statement> {
    let mut walk = TreeWalk::default();
    walk.visit(root, None);
    tracing::debug!(
        nodes = walk.next_id,
        statements = walk.statements.len(),
        "Tree walked"
    );
    walk.statements
}

/// Traversal-local state: the identifier counter and the output so far.
#[derive(Default)]
struct TreeWalk {
    next_id: usize,
    statements: Vec<Statement>,
}

impl TreeWalk {
    fn visit(&mut self, node: &TreeNode, parent: Option<&NodePattern>) {
        let id = self.next_id;
        self.next_id += 1;

        let pattern = node_pattern(node, id);
        self.statements.push(Statement::merge_node(pattern.clone()));

        if let Some(parent) = parent {
            self.statements.push(Statement::merge_relationship(
                parent.clone(),
                HAS_CHILD,
                pattern.clone(),
            ));
        }

        for child in &node.children {
            self.visit(child, Some(&pattern));
        }
    }
}

fn node_pattern(node: &TreeNode, id: usize) -> NodePattern {
    let label = node.label.as_deref().unwrap_or(DEFAULT_LABEL);
    let pattern = NodePattern::new(variable(id), label).with("name", PropertyValue::from_json(&node.value));
    node.lineage
        .iter()
        .fold(pattern, |p, (key, value)| p.with(key.as_str(), PropertyValue::from_json(value)))
}
