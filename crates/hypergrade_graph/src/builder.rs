// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node and link construction against a node-type catalog.
//!
//! Recipes never insert nodes or links directly; they go through a
//! [`GraphBuilder`], which resolves type tags through the registry and keeps
//! a running tally of what succeeded.

use crate::graph::{ConnectError, Graph};
use crate::link::Link;
use crate::node::{Node, NodeRegistry};
use crate::property::PropertyValue;
use crate::socket::SocketRef;
use std::fmt;

/// Running tally of a multi-step build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Nodes created
    pub nodes_created: usize,
    /// Node creations that failed
    pub nodes_failed: usize,
    /// Links made
    pub links_made: usize,
    /// Links that could not be made
    pub links_failed: usize,
}

impl BuildStats {
    /// Whether every attempted step succeeded
    pub fn is_complete(&self) -> bool {
        self.nodes_failed == 0 && self.links_failed == 0
    }
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} nodes, {} of {} links",
            self.nodes_created,
            self.nodes_created + self.nodes_failed,
            self.links_made,
            self.links_made + self.links_failed,
        )
    }
}

/// Builds nodes and links into a graph
pub struct GraphBuilder<'a> {
    graph: &'a mut Graph,
    registry: &'a NodeRegistry,
    stats: BuildStats,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder over a graph
    pub fn new(graph: &'a mut Graph, registry: &'a NodeRegistry) -> Self {
        Self {
            graph,
            registry,
            stats: BuildStats::default(),
        }
    }

    /// The graph being built
    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// The graph being built, mutably
    pub fn graph_mut(&mut self) -> &mut Graph {
        self.graph
    }

    /// The node-type catalog
    pub fn registry(&self) -> &NodeRegistry {
        self.registry
    }

    /// Tally so far
    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Create a node of a registered type. Returns the new node's name.
    pub fn create_node(
        &mut self,
        type_tag: &str,
        location: [f32; 2],
        label: &str,
    ) -> Result<String, BuildError> {
        let Some(node_type) = self.registry.get(type_tag) else {
            self.stats.nodes_failed += 1;
            tracing::warn!("Unknown node type: {}", type_tag);
            return Err(BuildError::UnknownNodeType(type_tag.to_string()));
        };

        let node = Node::new(node_type, node_type.name.clone())
            .with_location(location[0], location[1])
            .with_label(label);
        let name = self.graph.add_node(node);
        self.stats.nodes_created += 1;
        tracing::debug!("Created node {} ({})", name, type_tag);
        Ok(name)
    }

    /// Link two sockets, logging and returning false on failure
    pub fn connect(
        &mut self,
        from_node: &str,
        from_socket: impl Into<SocketRef>,
        to_node: &str,
        to_socket: impl Into<SocketRef>,
    ) -> bool {
        match self.try_connect(from_node, from_socket, to_node, to_socket) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Error connecting nodes: {}", e);
                false
            }
        }
    }

    /// Link two sockets, returning the reason on failure
    pub fn try_connect(
        &mut self,
        from_node: &str,
        from_socket: impl Into<SocketRef>,
        to_node: &str,
        to_socket: impl Into<SocketRef>,
    ) -> Result<Link, ConnectError> {
        let result = self.graph.connect(from_node, &from_socket.into(), to_node, &to_socket.into());
        match result {
            Ok(_) => self.stats.links_made += 1,
            Err(_) => self.stats.links_failed += 1,
        }
        result
    }

    /// Set a property the node kind defines. Unknown keys are ignored.
    pub fn set_property(&mut self, node: &str, key: &str, value: impl Into<PropertyValue>) -> bool {
        let Some(node) = self.graph.node_mut(node) else {
            return false;
        };
        match node.properties.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => {
                tracing::debug!("Node {} has no property {}", node.name, key);
                false
            }
        }
    }

    /// Set the unlinked value of an input socket
    pub fn set_input_default(
        &mut self,
        node: &str,
        socket: impl Into<SocketRef>,
        value: impl Into<PropertyValue>,
    ) -> bool {
        let socket = socket.into();
        match self.graph.node_mut(node).and_then(|n| n.input_mut(&socket)) {
            Some(input) => {
                input.default_value = Some(value.into());
                true
            }
            None => {
                tracing::debug!("Cannot set default: no input {} on {}", socket, node);
                false
            }
        }
    }

    /// Set the value an output socket emits (constant nodes such as RGB)
    pub fn set_output_default(
        &mut self,
        node: &str,
        socket: impl Into<SocketRef>,
        value: impl Into<PropertyValue>,
    ) -> bool {
        let socket = socket.into();
        let Some(node) = self.graph.node_mut(node) else {
            return false;
        };
        let Some(identifier) = node.output(&socket).map(|s| s.identifier.clone()) else {
            return false;
        };
        match node.outputs.iter_mut().find(|s| s.identifier == identifier) {
            Some(output) => {
                output.default_value = Some(value.into());
                true
            }
            None => false,
        }
    }

    /// Give a node a custom body color
    pub fn set_custom_color(&mut self, node: &str, color: [f32; 3]) -> bool {
        match self.graph.node_mut(node) {
            Some(node) => {
                node.use_custom_color = true;
                node.color = color;
                true
            }
            None => false,
        }
    }

    /// Finish building and return the tally
    pub fn finish(self) -> BuildStats {
        self.stats
    }
}

/// Error when creating a node
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// Type tag not in the registry
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),
}
