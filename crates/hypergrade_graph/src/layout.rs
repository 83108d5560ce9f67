// SPDX-License-Identifier: MIT OR Apache-2.0
//! Depth-based auto-layout.
//!
//! Each node's depth is the longest chain of links feeding it. Nodes are
//! placed in columns by depth and stacked downward within a column in graph
//! insertion order.

use crate::graph::Graph;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Grid parameters for [`layout`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    /// X of the depth-0 column
    pub start_x: f32,
    /// Y of the first node in each column
    pub start_y: f32,
    /// Horizontal distance between columns
    pub spacing_x: f32,
    /// Vertical distance between nodes in a column
    pub spacing_y: f32,
}

impl LayoutParams {
    /// Create layout parameters
    pub fn new(start_x: f32, start_y: f32, spacing_x: f32, spacing_y: f32) -> Self {
        Self {
            start_x,
            start_y,
            spacing_x,
            spacing_y,
        }
    }
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self::new(0.0, 0.0, 300.0, 200.0)
    }
}

/// Depth of a node: 0 without incoming links, otherwise one more than its
/// deepest predecessor.
///
/// A node reached again while it is still on the current path counts as
/// depth 0, so cycles terminate. Reaching a node again through a separate
/// branch walks it in full.
pub fn node_depth(graph: &Graph, name: &str) -> usize {
    let mut path = HashSet::new();
    depth_from(graph, name, &mut path)
}

fn depth_from(graph: &Graph, name: &str, path: &mut HashSet<String>) -> usize {
    if !path.insert(name.to_string()) {
        return 0;
    }
    let mut max_depth = 0;
    if let Some(node) = graph.node(name) {
        for socket in &node.inputs {
            for link in graph.links_into(name, &socket.identifier) {
                let depth = depth_from(graph, &link.from_node, path);
                max_depth = max_depth.max(depth + 1);
            }
        }
    }
    path.remove(name);
    max_depth
}

/// Depth of every node, in graph insertion order
pub fn depths(graph: &Graph) -> IndexMap<String, usize> {
    graph
        .node_names()
        .map(|name| (name.to_string(), node_depth(graph, name)))
        .collect()
}

/// Position every node on a grid by depth
pub fn layout(graph: &mut Graph, params: &LayoutParams) {
    let mut layers: IndexMap<usize, Vec<String>> = IndexMap::new();
    for (name, depth) in depths(graph) {
        layers.entry(depth).or_default().push(name);
    }
    layers.sort_keys();

    for (depth, names) in &layers {
        for (index, name) in names.iter().enumerate() {
            if let Some(node) = graph.node_mut(name) {
                node.location = [
                    params.start_x + *depth as f32 * params.spacing_x,
                    params.start_y - index as f32 * params.spacing_y,
                ];
            }
        }
    }
    tracing::debug!("Laid out {} nodes in {} columns", graph.node_count(), layers.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::socket::{Socket, SocketKind, SocketRef};

    fn add(graph: &mut Graph, name: &str) -> String {
        graph.add_node(Node::from_parts(
            "CompositorNodeMixRGB",
            name,
            vec![Socket::input("Image", SocketKind::Color), Socket::input("Image", SocketKind::Color)],
            vec![Socket::output("Image", SocketKind::Color)],
        ))
    }

    fn link(graph: &mut Graph, from: &str, to: &str, input: usize) {
        graph.connect(from, &SocketRef::Index(0), to, &SocketRef::Index(input)).unwrap();
    }

    #[test]
    fn test_fan_in_depths() {
        let mut graph = Graph::default();
        let a = add(&mut graph, "A");
        let b = add(&mut graph, "B");
        let c = add(&mut graph, "C");
        link(&mut graph, &a, &c, 0);
        link(&mut graph, &b, &c, 1);

        assert_eq!(node_depth(&graph, &a), 0);
        assert_eq!(node_depth(&graph, &b), 0);
        assert_eq!(node_depth(&graph, &c), 1);
    }

    #[test]
    fn test_longest_path_wins() {
        let mut graph = Graph::default();
        let a = add(&mut graph, "A");
        let b = add(&mut graph, "B");
        let c = add(&mut graph, "C");
        link(&mut graph, &a, &b, 0);
        link(&mut graph, &a, &c, 0);
        link(&mut graph, &b, &c, 1);

        assert_eq!(node_depth(&graph, &c), 2);
    }

    #[test]
    fn test_rejoining_branches_keep_increasing() {
        let mut graph = Graph::default();
        let s = add(&mut graph, "S");
        let a = add(&mut graph, "A");
        let b = add(&mut graph, "B");
        let c = add(&mut graph, "C");
        let mix = add(&mut graph, "Mix");
        link(&mut graph, &s, &a, 0);
        link(&mut graph, &a, &b, 0);
        link(&mut graph, &b, &c, 0);
        link(&mut graph, &b, &mix, 0);
        link(&mut graph, &c, &mix, 1);

        let all = depths(&graph);
        assert_eq!(all[&c], 3);
        assert_eq!(all[&mix], 4);
        for l in graph.links() {
            assert!(all[&l.to_node] > all[&l.from_node], "{} -> {}", l.from_node, l.to_node);
        }
    }

    #[test]
    fn test_cycle_terminates() {
        let mut graph = Graph::default();
        let a = add(&mut graph, "A");
        let b = add(&mut graph, "B");
        link(&mut graph, &a, &b, 0);
        link(&mut graph, &b, &a, 0);

        // A -> B -> A(revisited, 0): B = 1, A = 2
        assert_eq!(node_depth(&graph, &a), 2);
        assert_eq!(node_depth(&graph, &b), 2);
    }

    #[test]
    fn test_layout_grid() {
        let mut graph = Graph::default();
        let a = add(&mut graph, "A");
        let b = add(&mut graph, "B");
        let c = add(&mut graph, "C");
        link(&mut graph, &a, &c, 0);
        link(&mut graph, &b, &c, 1);

        layout(&mut graph, &LayoutParams::new(100.0, 50.0, 300.0, 200.0));
        assert_eq!(graph.node(&a).unwrap().location, [100.0, 50.0]);
        assert_eq!(graph.node(&b).unwrap().location, [100.0, -150.0]);
        assert_eq!(graph.node(&c).unwrap().location, [400.0, 50.0]);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let mut graph = Graph::default();
        let a = add(&mut graph, "A");
        let b = add(&mut graph, "B");
        link(&mut graph, &a, &b, 0);

        let params = LayoutParams::default();
        layout(&mut graph, &params);
        let first: Vec<_> = graph.nodes().map(|n| n.location).collect();
        layout(&mut graph, &params);
        let second: Vec<_> = graph.nodes().map(|n| n.location).collect();
        assert_eq!(first, second);
    }
}
