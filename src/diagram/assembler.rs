use log::debug;
use serde::Serialize;

use super::template::D2Template;
use crate::error::{Endpoint, Result, Tf2d2Error};
use crate::graph::ResourceGraph;
use crate::provider::ProviderRegistry;

/// Character substituted for every separator in a canonical name
const ID_SEPARATOR: char = '_';

/// A drawable node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeDescriptor {
    pub id: String,
    pub label: String,
    pub icon: Option<&'static str>,
}

/// Arrowhead placement on a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Arrow {
    /// Arrowhead at the target end
    #[serde(rename = "->")]
    PointsAtTarget,
}

/// A drawable edge between two shapes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionDescriptor {
    pub source: String,
    pub target: String,
    pub arrow: Arrow,
}

impl ConnectionDescriptor {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            arrow: Arrow::PointsAtTarget,
        }
    }
}

/// d2 script text produced from a resource graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramSource(String);

impl DiagramSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DiagramSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turn a canonical resource address into a d2-safe shape id
pub fn sanitize_id(canonical: &str) -> String {
    canonical
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == ID_SEPARATOR {
                c
            } else {
                ID_SEPARATOR
            }
        })
        .collect()
}

/// Builds d2 script text from a resource graph
///
/// Nodes whose resource type has no catalog entry are skipped, as are edges
/// touching them. An edge naming an id that is not in the graph at all is a
/// hard error.
pub struct DiagramAssembler<'a> {
    registry: &'a ProviderRegistry,
    template: D2Template,
}

impl<'a> DiagramAssembler<'a> {
    pub fn new(registry: &'a ProviderRegistry) -> Result<Self> {
        debug!(providers:? = registry.prefixes(); "creating diagram assembler");
        Ok(Self {
            registry,
            template: D2Template::new()?,
        })
    }

    /// Assemble the d2 script for a graph, preserving node and edge order
    pub fn assemble(&self, graph: &ResourceGraph) -> Result<DiagramSource> {
        let (shapes, accepted) = self.shapes(graph);
        let connections = self.connections(graph, &accepted)?;

        if shapes.is_empty() {
            return Err(Tf2d2Error::Validation("no shapes found".to_string()));
        }

        debug!(shapes = shapes.len(), connections = connections.len(); "assembled diagram descriptors");

        let text = self.template.render(&shapes, &connections)?;
        Ok(DiagramSource::new(text))
    }

    /// One shape per diagram-worthy node, plus an acceptance flag per arena slot
    fn shapes(&self, graph: &ResourceGraph) -> (Vec<ShapeDescriptor>, Vec<bool>) {
        let mut shapes = Vec::new();
        let mut accepted = Vec::with_capacity(graph.node_count());

        for node in graph.nodes() {
            let keep = self.registry.is_diagram_node(&node.resource_type);
            accepted.push(keep);
            if !keep {
                continue;
            }

            shapes.push(ShapeDescriptor {
                id: sanitize_id(&node.canonical),
                label: node.name.clone(),
                icon: self.registry.resolve_icon(&node.resource_type),
            });
        }

        (shapes, accepted)
    }

    fn connections(
        &self,
        graph: &ResourceGraph,
        accepted: &[bool],
    ) -> Result<Vec<ConnectionDescriptor>> {
        let mut connections = Vec::new();

        for edge in graph.edges() {
            let source = graph
                .index_of(&edge.source)
                .ok_or_else(|| Tf2d2Error::Reference {
                    endpoint: Endpoint::Source,
                    id: edge.source.clone(),
                })?;
            let target = graph
                .index_of(&edge.target)
                .ok_or_else(|| Tf2d2Error::Reference {
                    endpoint: Endpoint::Target,
                    id: edge.target.clone(),
                })?;

            if !accepted[source] || !accepted[target] {
                continue;
            }

            let nodes = graph.nodes();
            connections.push(ConnectionDescriptor::new(
                sanitize_id(&nodes[source].canonical),
                sanitize_id(&nodes[target].canonical),
            ));
        }

        Ok(connections)
    }
}
