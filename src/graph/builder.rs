use log::{debug, info};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use super::{Edge, Node, ResourceGraph};
use crate::error::{Result, Tf2d2Error};

/// Only state format version 4 (Terraform >= 0.12) is understood
const SUPPORTED_STATE_VERSION: u64 = 4;

/// Options controlling how a state document becomes a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphOptions {
    /// Keep raw instance attributes on each node
    pub raw: bool,
    /// Drop data sources and other non-managed noise
    pub clean: bool,
    /// Compute edges from instance dependencies
    pub connections: bool,
    /// Add nodes for dependencies that are not part of the state
    pub external_nodes: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            raw: true,
            clean: true,
            connections: true,
            external_nodes: true,
        }
    }
}

/// Turns raw Terraform state bytes into a resource graph
pub trait StateGraphBuilder {
    fn build(&self, state: &[u8], options: &GraphOptions) -> Result<ResourceGraph>;
}

/// Builds graphs from Terraform JSON state (format version 4)
pub struct TerraformStateGraph;

/// One resource instance as read from the state, before graph assembly
struct Instance {
    /// Resource address without the instance key, as dependencies name it
    address: String,
    node: Node,
    dependencies: Vec<String>,
}

impl StateGraphBuilder for TerraformStateGraph {
    fn build(&self, state: &[u8], options: &GraphOptions) -> Result<ResourceGraph> {
        let state: Value = serde_json::from_slice(state)?;

        Self::check_version(&state)?;

        if let Some(version) = state.get("terraform_version").and_then(|v| v.as_str()) {
            debug!(terraform_version = version; "parsing terraform state");
        }

        let instances = Self::extract_instances(&state, options)?;

        // resource address (without instance key) -> node ids
        let mut by_address: HashMap<String, Vec<String>> = HashMap::new();
        let mut graph = ResourceGraph::new();
        for instance in &instances {
            by_address
                .entry(instance.address.clone())
                .or_default()
                .push(instance.node.id.clone());
            graph.add_node(instance.node.clone());
        }

        if options.connections {
            Self::add_connections(&mut graph, &instances, &by_address, options);
        }

        info!(nodes = graph.node_count(), edges = graph.edge_count(); "generated terraform resource graph");

        Ok(graph)
    }
}

impl TerraformStateGraph {
    fn check_version(state: &Value) -> Result<()> {
        match state.get("version").and_then(|v| v.as_u64()) {
            Some(SUPPORTED_STATE_VERSION) => Ok(()),
            Some(other) => Err(Tf2d2Error::StateParse(format!(
                "unsupported state version {}",
                other
            ))),
            None => Err(Tf2d2Error::StateParse(
                "missing state version".to_string(),
            )),
        }
    }

    /// Extract every resource instance in document order
    fn extract_instances(state: &Value, options: &GraphOptions) -> Result<Vec<Instance>> {
        let mut instances = Vec::new();

        let Some(resources) = state.get("resources") else {
            return Ok(instances);
        };
        let resources = resources
            .as_array()
            .ok_or_else(|| Tf2d2Error::StateParse("resources is not an array".to_string()))?;

        for resource in resources {
            let mode = resource
                .get("mode")
                .and_then(|m| m.as_str())
                .unwrap_or("managed");
            if options.clean && mode != "managed" {
                continue;
            }

            let resource_type = resource
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| Tf2d2Error::StateParse("resource without type".to_string()))?;
            let resource_name = resource
                .get("name")
                .and_then(|n| n.as_str())
                .ok_or_else(|| Tf2d2Error::StateParse("resource without name".to_string()))?;

            let mut address = format!("{}.{}", resource_type, resource_name);
            if mode == "data" {
                address = format!("data.{}", address);
            }
            if let Some(module) = resource.get("module").and_then(|m| m.as_str()) {
                address = format!("{}.{}", module, address);
            }

            let Some(state_instances) = resource.get("instances").and_then(|i| i.as_array())
            else {
                continue;
            };

            for instance in state_instances {
                let canonical = match instance.get("index_key") {
                    Some(Value::Number(n)) => format!("{}[{}]", address, n),
                    Some(Value::String(s)) => format!("{}[\"{}\"]", address, s),
                    _ => address.clone(),
                };

                let mut node = Node::new(&canonical, &canonical, resource_name, resource_type);
                if options.raw {
                    if let Some(attrs) = instance.get("attributes").and_then(|a| a.as_object()) {
                        node.attributes = attrs
                            .iter()
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect();
                    }
                }

                let dependencies = instance
                    .get("dependencies")
                    .and_then(|d| d.as_array())
                    .map(|deps| {
                        deps.iter()
                            .filter_map(|d| d.as_str().map(|s| s.to_string()))
                            .collect()
                    })
                    .unwrap_or_default();

                instances.push(Instance {
                    address: address.clone(),
                    node,
                    dependencies,
                });
            }
        }

        Ok(instances)
    }

    /// Add one edge per (dependency, dependent) pair, dependency first
    fn add_connections(
        graph: &mut ResourceGraph,
        instances: &[Instance],
        by_address: &HashMap<String, Vec<String>>,
        options: &GraphOptions,
    ) {
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for instance in instances {
            let target = &instance.node.id;

            for dependency in &instance.dependencies {
                if options.clean && is_data_address(dependency) {
                    continue;
                }

                let sources = match by_address.get(dependency.as_str()) {
                    Some(ids) => ids.clone(),
                    None if options.external_nodes => {
                        graph.add_node(external_node(dependency));
                        vec![dependency.clone()]
                    }
                    None => {
                        debug!(dependency = dependency.as_str(); "dropping edge to resource outside state");
                        continue;
                    }
                };

                for source in sources {
                    if &source == target {
                        continue;
                    }
                    if seen.insert((source.clone(), target.clone())) {
                        graph.add_edge(Edge::new(source, target.clone()));
                    }
                }
            }
        }
    }
}

fn is_data_address(address: &str) -> bool {
    address.starts_with("data.") || address.contains(".data.")
}

/// Placeholder node for an address referenced by a dependency but absent from the state
fn external_node(address: &str) -> Node {
    let segments: Vec<&str> = address.split('.').collect();
    let (resource_type, name) = match segments.as_slice() {
        [.., resource_type, name] => (*resource_type, *name),
        _ => (address, address),
    };
    Node::new(address, address, name, resource_type)
}
