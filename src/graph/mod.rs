//! Resource graph built from Terraform state
//!
//! Nodes live in an ordered arena with an id → index map; edges refer to
//! nodes by id only. Insertion order is preserved because diagram output
//! must be reproducible for identical input.

pub mod builder;

pub use builder::{GraphOptions, StateGraphBuilder, TerraformStateGraph};

use serde_json::Value;
use std::collections::HashMap;

/// A single resource instance in the graph
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique id within the graph
    pub id: String,
    /// Stable dotted address, e.g. `module.net.aws_vpc.main`
    pub canonical: String,
    /// Resource display name, e.g. `main`
    pub name: String,
    /// Fully qualified resource type, e.g. `aws_vpc`
    pub resource_type: String,
    /// Raw instance attributes, kept only when requested
    pub attributes: HashMap<String, Value>,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        canonical: impl Into<String>,
        name: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            canonical: canonical.into(),
            name: name.into(),
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
        }
    }
}

/// A directed connection between two nodes, by id
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{}->{}", source, target),
            source,
            target,
        }
    }
}

/// Ordered node arena plus ordered edge list
#[derive(Debug, Default, Clone)]
pub struct ResourceGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<String, usize>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node. Returns false and leaves the graph untouched when the id is taken.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Append an edge. Endpoints are not checked here; lookups fail at assembly time.
    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Arena position of a node id
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[cfg(test)]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|idx| &self.nodes[idx])
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
