// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph store containing nodes and links.

use crate::link::Link;
use crate::node::Node;
use crate::socket::SocketRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Type tag of the primary input (render layers) node
pub const PRIMARY_INPUT_TYPE: &str = "CompositorNodeRLayers";

/// A compositing node graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes keyed by name, in insertion order
    nodes: IndexMap<String, Node>,
    /// Links between nodes
    links: Vec<Link>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            links: Vec::new(),
        }
    }

    /// Add a node, renaming it if its name is taken. Returns the final name.
    pub fn add_node(&mut self, mut node: Node) -> String {
        node.name = self.unique_name(&node.name);
        let name = node.name.clone();
        self.nodes.insert(name.clone(), node);
        name
    }

    /// First free name of the form `base`, `base.001`, `base.002`, ...
    pub fn unique_name(&self, base: &str) -> String {
        if !self.nodes.contains_key(base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{base}.{i:03}"))
            .find(|candidate| !self.nodes.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Remove a node and its links
    pub fn remove_node(&mut self, name: &str) -> Option<Node> {
        self.links.retain(|l| !l.involves_node(name));
        self.nodes.shift_remove(name)
    }

    /// Get a node by name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Get a mutable node by name
    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.get_mut(name)
    }

    /// Whether a node with this name exists
    pub fn contains_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Get all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all nodes mutably in insertion order
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Get all node names in insertion order
    pub fn node_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.keys().map(String::as_str)
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Link an output socket to an input socket.
    ///
    /// A single-capacity input keeps only the newest link. Linking the same
    /// pair of sockets twice leaves one link.
    pub fn connect(
        &mut self,
        from_node: &str,
        from_socket: &SocketRef,
        to_node: &str,
        to_socket: &SocketRef,
    ) -> Result<Link, ConnectError> {
        let source = self.nodes.get(from_node)
            .ok_or_else(|| ConnectError::NodeNotFound(from_node.to_string()))?;
        let target = self.nodes.get(to_node)
            .ok_or_else(|| ConnectError::NodeNotFound(to_node.to_string()))?;

        let output = source.output(from_socket).ok_or_else(|| ConnectError::SocketNotFound {
            node: from_node.to_string(),
            socket: from_socket.clone(),
        })?;
        let input = target.input(to_socket).ok_or_else(|| ConnectError::SocketNotFound {
            node: to_node.to_string(),
            socket: to_socket.clone(),
        })?;

        if from_node == to_node {
            return Err(ConnectError::SelfLoop(from_node.to_string()));
        }

        let link = Link::new(from_node, &output.identifier, to_node, &input.identifier);
        if self.links.contains(&link) {
            return Ok(link);
        }
        if !input.multi_connect {
            self.links.retain(|l| !l.targets(&link.to_node, &link.to_socket));
        }
        self.links.push(link.clone());
        Ok(link)
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Links feeding one input socket of a node
    pub fn links_into<'a>(&'a self, node: &'a str, socket: &'a str) -> impl Iterator<Item = &'a Link> {
        self.links.iter().filter(move |l| l.targets(node, socket))
    }

    /// Links ending at a node
    pub fn incoming_links<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Link> {
        self.links.iter().filter(move |l| l.to_node == node)
    }

    /// Links starting at a node
    pub fn outgoing_links<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Link> {
        self.links.iter().filter(move |l| l.from_node == node)
    }

    /// Whether an input socket has an incoming link
    pub fn is_input_linked(&self, node: &str, socket: &str) -> bool {
        self.links_into(node, socket).next().is_some()
    }

    /// All nodes with the given type tag, in insertion order
    pub fn find_by_type(&self, node_type: &str) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.node_type == node_type).collect()
    }

    /// First node with the given label, in insertion order
    pub fn find_by_label(&self, label: &str) -> Option<&Node> {
        self.nodes.values().find(|n| n.label == label)
    }

    /// The primary input node, if any
    pub fn primary_input(&self) -> Option<&Node> {
        self.nodes.values().find(|n| n.node_type == PRIMARY_INPUT_TYPE)
    }

    /// The primary input node, or an error describing its absence
    pub fn require_primary_input(&self) -> Result<&Node, MissingAnchor> {
        self.primary_input().ok_or_else(|| MissingAnchor {
            node_type: PRIMARY_INPUT_TYPE.to_string(),
        })
    }

    /// Selected nodes in insertion order
    pub fn selected_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| n.select)
    }

    /// Set the selection state of one node. Returns false if it doesn't exist.
    pub fn set_selected(&mut self, name: &str, select: bool) -> bool {
        match self.nodes.get_mut(name) {
            Some(node) => {
                node.select = select;
                true
            }
            None => false,
        }
    }

    /// Deselect every node
    pub fn deselect_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.select = false;
        }
    }

    /// Remove all nodes and links
    pub fn clear(&mut self) {
        self.links.clear();
        self.nodes.clear();
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Compositing")
    }
}

/// Error when creating a link
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Socket not found on node
    #[error("Socket {socket} not found on node {node}")]
    SocketNotFound {
        /// Node name
        node: String,
        /// Unresolved socket reference
        socket: SocketRef,
    },

    /// Self-loop not allowed
    #[error("Self-loop not allowed on node {0}")]
    SelfLoop(String),
}

/// A well-known anchor node is missing from the graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("No input node found (expected a {node_type} node)")]
pub struct MissingAnchor {
    /// Type tag that was searched for
    pub node_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::{Socket, SocketKind};

    fn image_node(node_type: &str, name: &str) -> Node {
        Node::from_parts(
            node_type,
            name,
            vec![Socket::input("Image", SocketKind::Color)],
            vec![Socket::output("Image", SocketKind::Color)],
        )
    }

    #[test]
    fn test_add_node_generates_unique_names() {
        let mut graph = Graph::default();
        assert_eq!(graph.add_node(image_node("Blur", "Blur")), "Blur");
        assert_eq!(graph.add_node(image_node("Blur", "Blur")), "Blur.001");
        assert_eq!(graph.add_node(image_node("Blur", "Blur")), "Blur.002");
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_single_input_link_is_replaced() {
        let mut graph = Graph::default();
        let a = graph.add_node(image_node("Blur", "A"));
        let b = graph.add_node(image_node("Blur", "B"));
        let c = graph.add_node(image_node("Blur", "C"));
        let image = SocketRef::from("Image");

        graph.connect(&a, &image, &c, &image).unwrap();
        graph.connect(&b, &image, &c, &image).unwrap();

        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.links().next().unwrap().from_node, "B");
    }

    #[test]
    fn test_duplicate_link_is_idempotent() {
        let mut graph = Graph::default();
        let a = graph.add_node(image_node("Blur", "A"));
        let b = graph.add_node(image_node("Blur", "B"));
        let image = SocketRef::from("Image");

        graph.connect(&a, &image, &b, &image).unwrap();
        graph.connect(&a, &image, &b, &image).unwrap();
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn test_connect_errors() {
        let mut graph = Graph::default();
        let a = graph.add_node(image_node("Blur", "A"));
        let image = SocketRef::from("Image");

        assert_eq!(
            graph.connect(&a, &image, "X", &image),
            Err(ConnectError::NodeNotFound("X".into()))
        );
        assert!(matches!(
            graph.connect(&a, &SocketRef::from("Depth"), &a, &image),
            Err(ConnectError::SocketNotFound { .. })
        ));
        assert_eq!(graph.connect(&a, &image, &a, &image), Err(ConnectError::SelfLoop("A".into())));
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn test_remove_node_drops_links() {
        let mut graph = Graph::default();
        let a = graph.add_node(image_node("Blur", "A"));
        let b = graph.add_node(image_node("Blur", "B"));
        graph.connect(&a, &SocketRef::Index(0), &b, &SocketRef::Index(0)).unwrap();

        assert!(graph.remove_node(&a).is_some());
        assert_eq!(graph.link_count(), 0);
        assert_eq!(graph.node_names().collect::<Vec<_>>(), vec!["B"]);
    }

    #[test]
    fn test_lookup_first_match_in_insertion_order() {
        let mut graph = Graph::default();
        graph.add_node(image_node("Blur", "A").with_label("Soft"));
        graph.add_node(image_node("Glare", "B").with_label("Soft"));
        graph.add_node(image_node("Blur", "C"));

        assert_eq!(graph.find_by_label("Soft").unwrap().name, "A");
        let blurs: Vec<_> = graph.find_by_type("Blur").iter().map(|n| n.name.as_str()).collect();
        assert_eq!(blurs, vec!["A", "C"]);
        assert!(graph.find_by_type("Viewer").is_empty());
        assert!(graph.find_by_label("Missing").is_none());
    }

    #[test]
    fn test_missing_primary_input_is_reported() {
        let mut graph = Graph::default();
        let err = graph.require_primary_input().unwrap_err();
        assert!(err.to_string().contains("No input node found"));

        graph.add_node(image_node(PRIMARY_INPUT_TYPE, "Render Layers"));
        assert_eq!(graph.require_primary_input().unwrap().name, "Render Layers");
    }

    #[test]
    fn test_clear_and_selection() {
        let mut graph = Graph::default();
        let a = graph.add_node(image_node("Blur", "A"));
        graph.add_node(image_node("Blur", "B"));
        assert!(graph.set_selected(&a, true));
        assert!(!graph.set_selected("Missing", true));
        assert_eq!(graph.selected_nodes().count(), 1);

        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.link_count(), 0);
    }
}
