// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structural snapshots of node graphs.
//!
//! A [`Snapshot`] is the on-disk form used by presets, blueprints and
//! sequence captures:
//!
//! ```json
//! { "nodes": [ { "type": "...", "name": "...", "label": "", "location": [0, 0],
//!                "width": 140, "height": 100, "use_custom_color": false,
//!                "color": null, "blend_type": "MIX" } ],
//!   "links": [ { "from_node": "...", "from_socket": "...",
//!                "to_node": "...", "to_socket": "..." } ] }
//! ```
//!
//! Only the properties in [`SERIALIZED_PROPERTIES`] are captured. Applying a
//! snapshot is best-effort: every node and link that can be recreated is,
//! and the rest are listed in the returned [`ApplyReport`].

use crate::graph::{ConnectError, Graph};
use crate::node::{Node, NodeRegistry};
use crate::property::PropertyValue;
use crate::socket::{Socket, SocketKind, SocketRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Property keys written to and read from snapshots
pub const SERIALIZED_PROPERTIES: [&str; 3] = ["blend_type", "filter_type", "operation"];

/// Link endpoint name standing for the group's input ports
pub const GROUP_INPUT: &str = "GROUP_INPUT";

/// Link endpoint name standing for the group's output ports
pub const GROUP_OUTPUT: &str = "GROUP_OUTPUT";

/// Type tag of the node exposing a group's input ports inside the group
pub const GROUP_INPUT_TYPE: &str = "NodeGroupInput";

/// Type tag of the node collecting a group's output ports inside the group
pub const GROUP_OUTPUT_TYPE: &str = "NodeGroupOutput";

/// Captured node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Node type tag
    #[serde(rename = "type")]
    pub node_type: String,
    /// Node name at capture time
    pub name: String,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// Position
    #[serde(default)]
    pub location: [f32; 2],
    /// Width
    #[serde(default = "default_width")]
    pub width: f32,
    /// Height
    #[serde(default = "default_height")]
    pub height: f32,
    /// Whether `color` is in use
    #[serde(default)]
    pub use_custom_color: bool,
    /// Custom color, present only when `use_custom_color` is set
    #[serde(default)]
    pub color: Option<[f32; 3]>,
    /// Mix blend mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_type: Option<String>,
    /// Filter kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<String>,
    /// Math operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

fn default_width() -> f32 {
    140.0
}

fn default_height() -> f32 {
    100.0
}

impl NodeDescriptor {
    /// Capture a live node
    pub fn from_node(node: &Node) -> Self {
        let captured = |key: &str| node.property(key).and_then(PropertyValue::as_str).map(str::to_string);
        Self {
            node_type: node.node_type.clone(),
            name: node.name.clone(),
            label: node.label.clone(),
            location: node.location,
            width: node.width,
            height: node.height,
            use_custom_color: node.use_custom_color,
            color: node.use_custom_color.then_some(node.color),
            blend_type: captured("blend_type"),
            filter_type: captured("filter_type"),
            operation: captured("operation"),
        }
    }

    /// Allow-listed properties present in this descriptor
    pub fn properties(&self) -> impl Iterator<Item = (&'static str, &str)> {
        SERIALIZED_PROPERTIES
            .into_iter()
            .zip([&self.blend_type, &self.filter_type, &self.operation])
            .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }

    fn apply_to(&self, node: &mut Node) {
        node.label = self.label.clone();
        node.location = self.location;
        node.width = self.width;
        node.height = self.height;
        if self.use_custom_color {
            node.use_custom_color = true;
            if let Some(color) = self.color {
                node.color = color;
            }
        }
        for (key, value) in self.properties() {
            match node.properties.get_mut(key) {
                Some(slot) => *slot = PropertyValue::Enum(value.to_string()),
                None => tracing::debug!("Skipping {} on {}: not defined by {}", key, node.name, node.node_type),
            }
        }
    }
}

/// Captured link, referencing sockets by identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkDescriptor {
    /// Source node name
    pub from_node: String,
    /// Source socket identifier
    pub from_socket: String,
    /// Target node name
    pub to_node: String,
    /// Target socket identifier
    pub to_socket: String,
}

impl LinkDescriptor {
    fn crosses_boundary(&self) -> bool {
        self.from_node == GROUP_INPUT || self.to_node == GROUP_OUTPUT
    }
}

/// Boundary port recorded when a sub-selection has links leaving it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDescriptor {
    /// Port identifier used by boundary links (`Input_0`, `Output_1`)
    pub identifier: String,
    /// Name of the socket the boundary link attached to
    pub name: String,
    /// Host socket class name
    #[serde(rename = "type", default = "default_port_type")]
    pub socket_type: String,
}

fn default_port_type() -> String {
    SocketKind::Color.idname().to_string()
}

impl PortDescriptor {
    /// Socket exposing this port, as an output (`output = true`) or input
    pub fn socket(&self, output: bool) -> Socket {
        let kind = SocketKind::from_idname(&self.socket_type);
        let socket = if output {
            Socket::output(&self.name, kind)
        } else {
            Socket::input(&self.name, kind)
        };
        socket.with_identifier(&self.identifier)
    }
}

/// Whether applying replaces the target graph's contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyMode {
    /// Clear the target first (whole-graph restore)
    #[default]
    Replace,
    /// Add to the existing contents (sub-unit restore)
    Merge,
}

/// Structural capture of a set of nodes and the links between them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Boundary input ports (sub-selection captures only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<PortDescriptor>,
    /// Boundary output ports (sub-selection captures only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<PortDescriptor>,
    /// Captured nodes
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    /// Captured links
    #[serde(default)]
    pub links: Vec<LinkDescriptor>,
}

impl Snapshot {
    /// Capture every node and link in a graph
    pub fn capture(graph: &Graph) -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            nodes: graph.nodes().map(NodeDescriptor::from_node).collect(),
            links: graph
                .links()
                .map(|l| LinkDescriptor {
                    from_node: l.from_node.clone(),
                    from_socket: l.from_socket.clone(),
                    to_node: l.to_node.clone(),
                    to_socket: l.to_socket.clone(),
                })
                .collect(),
        }
    }

    /// Capture a subset of nodes.
    ///
    /// Links with one end outside the subset become boundary ports plus a
    /// link to or from [`GROUP_INPUT`] / [`GROUP_OUTPUT`].
    pub fn capture_nodes<'a>(graph: &Graph, names: impl IntoIterator<Item = &'a str>) -> Self {
        let names: HashSet<&str> = names.into_iter().filter(|n| graph.contains_node(n)).collect();
        let mut snapshot = Self {
            nodes: graph
                .nodes()
                .filter(|n| names.contains(n.name.as_str()))
                .map(NodeDescriptor::from_node)
                .collect(),
            ..Self::default()
        };

        for link in graph.links() {
            let from_inside = names.contains(link.from_node.as_str());
            let to_inside = names.contains(link.to_node.as_str());
            match (from_inside, to_inside) {
                (true, true) => snapshot.links.push(LinkDescriptor {
                    from_node: link.from_node.clone(),
                    from_socket: link.from_socket.clone(),
                    to_node: link.to_node.clone(),
                    to_socket: link.to_socket.clone(),
                }),
                (false, true) => {
                    let Some(socket) = graph
                        .node(&link.to_node)
                        .and_then(|n| n.input(&SocketRef::Name(link.to_socket.clone())))
                    else {
                        continue;
                    };
                    let identifier = format!("Input_{}", snapshot.inputs.len());
                    snapshot.inputs.push(PortDescriptor {
                        identifier: identifier.clone(),
                        name: socket.name.clone(),
                        socket_type: socket.kind.idname().to_string(),
                    });
                    snapshot.links.push(LinkDescriptor {
                        from_node: GROUP_INPUT.to_string(),
                        from_socket: identifier,
                        to_node: link.to_node.clone(),
                        to_socket: link.to_socket.clone(),
                    });
                }
                (true, false) => {
                    let Some(socket) = graph
                        .node(&link.from_node)
                        .and_then(|n| n.output(&SocketRef::Name(link.from_socket.clone())))
                    else {
                        continue;
                    };
                    let identifier = format!("Output_{}", snapshot.outputs.len());
                    snapshot.outputs.push(PortDescriptor {
                        identifier: identifier.clone(),
                        name: socket.name.clone(),
                        socket_type: socket.kind.idname().to_string(),
                    });
                    snapshot.links.push(LinkDescriptor {
                        from_node: link.from_node.clone(),
                        from_socket: link.from_socket.clone(),
                        to_node: GROUP_OUTPUT.to_string(),
                        to_socket: identifier,
                    });
                }
                (false, false) => {}
            }
        }

        snapshot
    }

    /// Capture the currently selected nodes
    pub fn capture_selection(graph: &Graph) -> Self {
        let selected: Vec<&str> = graph.selected_nodes().map(|n| n.name.as_str()).collect();
        Self::capture_nodes(graph, selected)
    }

    /// Whether the snapshot has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recreate the captured nodes and links in `graph`.
    ///
    /// Links to the group boundary are ignored here; use
    /// [`Snapshot::instantiate_group`] to keep them.
    pub fn apply(&self, graph: &mut Graph, registry: &NodeRegistry, mode: ApplyMode) -> ApplyReport {
        if mode == ApplyMode::Replace {
            graph.clear();
        }
        let mut report = ApplyReport::default();
        self.populate(graph, registry, &mut report, false);
        tracing::info!("Applied snapshot to {}: {}", graph.name, report);
        report
    }

    /// Build a standalone group graph whose interface nodes expose the
    /// captured boundary ports.
    pub fn instantiate_group(&self, name: &str, registry: &NodeRegistry) -> (Graph, ApplyReport) {
        let mut group = Graph::new(name);
        let mut report = ApplyReport::default();

        let inputs = self.inputs.iter().map(|p| p.socket(true)).collect();
        let group_input = Node::from_parts(GROUP_INPUT_TYPE, "Group Input", Vec::new(), inputs)
            .with_location(0.0, 0.0);
        let input_name = group.add_node(group_input);
        report.name_map.insert(GROUP_INPUT.to_string(), input_name);

        let outputs = self.outputs.iter().map(|p| p.socket(false)).collect();
        let group_output = Node::from_parts(GROUP_OUTPUT_TYPE, "Group Output", outputs, Vec::new())
            .with_location(600.0, 0.0);
        let output_name = group.add_node(group_output);
        report.name_map.insert(GROUP_OUTPUT.to_string(), output_name);

        self.populate(&mut group, registry, &mut report, true);
        tracing::info!("Instantiated group {}: {}", name, report);
        (group, report)
    }

    fn populate(&self, graph: &mut Graph, registry: &NodeRegistry, report: &mut ApplyReport, with_boundary: bool) {
        report.nodes_total += self.nodes.len();
        for desc in &self.nodes {
            let Some(node_type) = registry.get(&desc.node_type) else {
                tracing::warn!("Error creating node {}: unknown type {}", desc.name, desc.node_type);
                report.issues.push(ApplyIssue::UnknownNodeType {
                    name: desc.name.clone(),
                    node_type: desc.node_type.clone(),
                });
                continue;
            };
            let mut node = Node::new(node_type, &desc.name);
            desc.apply_to(&mut node);
            let created = graph.add_node(node);
            report.name_map.insert(desc.name.clone(), created);
            report.nodes_created += 1;
        }

        for desc in &self.links {
            if !with_boundary && desc.crosses_boundary() {
                continue;
            }
            report.links_total += 1;

            let (Some(from), Some(to)) = (report.name_map.get(&desc.from_node), report.name_map.get(&desc.to_node)) else {
                tracing::warn!("Skipping link {} -> {}: endpoint not restored", desc.from_node, desc.to_node);
                report.issues.push(ApplyIssue::MissingEndpoint {
                    from_node: desc.from_node.clone(),
                    to_node: desc.to_node.clone(),
                });
                continue;
            };

            match graph.connect(from, &SocketRef::Name(desc.from_socket.clone()), to, &SocketRef::Name(desc.to_socket.clone())) {
                Ok(_) => report.links_created += 1,
                Err(source) => {
                    tracing::warn!("Skipping link {} -> {}: {}", desc.from_node, desc.to_node, source);
                    report.issues.push(ApplyIssue::Link {
                        from_node: desc.from_node.clone(),
                        to_node: desc.to_node.clone(),
                        source,
                    });
                }
            }
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    pub fn from_json(s: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

/// Parse `json` and apply it. The graph is untouched if parsing fails.
pub fn apply_json(
    json: &str,
    graph: &mut Graph,
    registry: &NodeRegistry,
    mode: ApplyMode,
) -> Result<ApplyReport, SnapshotError> {
    let snapshot = Snapshot::from_json(json)?;
    Ok(snapshot.apply(graph, registry, mode))
}

/// Outcome of applying a snapshot
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    /// Node descriptors processed
    pub nodes_total: usize,
    /// Nodes created
    pub nodes_created: usize,
    /// Link descriptors processed
    pub links_total: usize,
    /// Links created
    pub links_created: usize,
    /// Captured name to created name
    pub name_map: IndexMap<String, String>,
    /// Everything that was skipped
    pub issues: Vec<ApplyIssue>,
}

impl ApplyReport {
    /// Whether everything was recreated
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }

    /// Whether some, but not all, of the snapshot was recreated
    pub fn is_partial(&self) -> bool {
        !self.is_complete() && (self.nodes_created > 0 || self.links_created > 0)
    }

    /// Number of node descriptors that could not be recreated
    pub fn node_failures(&self) -> usize {
        self.nodes_total - self.nodes_created
    }

    /// Number of link descriptors that could not be recreated
    pub fn link_failures(&self) -> usize {
        self.links_total - self.links_created
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_complete() {
            "complete"
        } else if self.is_partial() {
            "partial success"
        } else {
            "failed"
        };
        write!(
            f,
            "{status}, {} of {} nodes created, {} of {} links made",
            self.nodes_created, self.nodes_total, self.links_created, self.links_total,
        )
    }
}

/// One skipped piece of a snapshot
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApplyIssue {
    /// Node type not in the registry
    #[error("Node {name}: unknown type {node_type}")]
    UnknownNodeType {
        /// Captured node name
        name: String,
        /// Unrecognized type tag
        node_type: String,
    },

    /// A link endpoint was not recreated
    #[error("Link {from_node} -> {to_node}: endpoint missing")]
    MissingEndpoint {
        /// Captured source name
        from_node: String,
        /// Captured target name
        to_node: String,
    },

    /// The link's sockets could not be connected
    #[error("Link {from_node} -> {to_node}: {source}")]
    Link {
        /// Captured source name
        from_node: String,
        /// Captured target name
        to_node: String,
        /// Connection failure
        source: ConnectError,
    },
}

/// Error reading or writing a snapshot
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// File I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON was malformed or missing required keys
    #[error("Invalid snapshot data: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::graphs::compositor::create_compositor_registry;

    fn two_node_graph(registry: &NodeRegistry) -> Graph {
        let mut graph = Graph::default();
        let mut builder = GraphBuilder::new(&mut graph, registry);
        let blur = builder.create_node("CompositorNodeBlur", [0.0, 0.0], "Soft").unwrap();
        let mix = builder.create_node("CompositorNodeMixRGB", [200.0, 0.0], "").unwrap();
        builder.set_property(&mix, "blend_type", PropertyValue::Enum("SCREEN".into()));
        builder.set_custom_color(&mix, [0.2, 0.4, 0.6]);
        builder.connect(&blur, "Image", &mix, 2);
        graph
    }

    #[test]
    fn test_capture_records_curated_properties() {
        let registry = create_compositor_registry();
        let graph = two_node_graph(&registry);
        let snapshot = Snapshot::capture(&graph);

        assert_eq!(snapshot.nodes.len(), 2);
        let mix = &snapshot.nodes[1];
        assert_eq!(mix.blend_type.as_deref(), Some("SCREEN"));
        assert_eq!(mix.color, Some([0.2, 0.4, 0.6]));
        assert!(snapshot.nodes[0].color.is_none());
        assert_eq!(snapshot.nodes[0].filter_type.as_deref(), Some("GAUSS"));
        assert_eq!(snapshot.links[0].to_socket, "Image_001");
    }

    #[test]
    fn test_json_shape() {
        let registry = create_compositor_registry();
        let json = Snapshot::capture(&two_node_graph(&registry)).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let node = &value["nodes"][1];
        assert_eq!(node["type"], "CompositorNodeMixRGB");
        assert_eq!(node["blend_type"], "SCREEN");
        assert!(node.get("operation").is_none());
        assert!(value["nodes"][0]["color"].is_null());
        assert!(value.get("inputs").is_none());
        assert_eq!(value["links"][0]["from_socket"], "Image");
    }

    #[test]
    fn test_unknown_property_is_skipped_on_apply() {
        let registry = create_compositor_registry();
        let json = r#"{
            "nodes": [{"type": "CompositorNodeBlur", "name": "Blur", "operation": "ADD", "filter_type": "FLAT"}],
            "links": []
        }"#;
        let mut graph = Graph::default();
        let report = apply_json(json, &mut graph, &registry, ApplyMode::Replace).unwrap();

        assert!(report.is_complete());
        let blur = graph.node("Blur").unwrap();
        assert!(!blur.has_property("operation"));
        assert_eq!(blur.property("filter_type").and_then(PropertyValue::as_str), Some("FLAT"));
    }

    #[test]
    fn test_malformed_json_leaves_graph_untouched() {
        let registry = create_compositor_registry();
        let mut graph = two_node_graph(&registry);

        assert!(apply_json("{ not json", &mut graph, &registry, ApplyMode::Replace).is_err());
        assert!(apply_json(r#"{"nodes": [{"name": "NoType"}]}"#, &mut graph, &registry, ApplyMode::Replace).is_err());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn test_merge_renames_on_collision() {
        let registry = create_compositor_registry();
        let mut graph = two_node_graph(&registry);
        let snapshot = Snapshot::capture(&graph);

        let report = snapshot.apply(&mut graph, &registry, ApplyMode::Merge);
        assert!(report.is_complete());
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.link_count(), 2);
        assert_eq!(report.name_map["Blur"], "Blur.001");
    }

    #[test]
    fn test_missing_socket_skips_only_that_link() {
        let registry = create_compositor_registry();
        let json = r#"{
            "nodes": [
                {"type": "CompositorNodeBlur", "name": "A"},
                {"type": "CompositorNodeBlur", "name": "B"}
            ],
            "links": [
                {"from_node": "A", "from_socket": "Image", "to_node": "B", "to_socket": "Nope"},
                {"from_node": "A", "from_socket": "Image", "to_node": "B", "to_socket": "Image"}
            ]
        }"#;
        let mut graph = Graph::default();
        let report = apply_json(json, &mut graph, &registry, ApplyMode::Replace).unwrap();

        assert!(report.is_partial());
        assert_eq!(report.links_created, 1);
        assert_eq!(report.link_failures(), 1);
        assert!(matches!(report.issues[0], ApplyIssue::Link { .. }));
        assert_eq!(report.to_string(), "partial success, 2 of 2 nodes created, 1 of 2 links made");
    }

    #[test]
    fn test_selection_capture_records_boundary_ports() {
        let registry = create_compositor_registry();
        let mut graph = Graph::default();
        let mut builder = GraphBuilder::new(&mut graph, &registry);
        let rl = builder.create_node("CompositorNodeRLayers", [0.0, 0.0], "").unwrap();
        let hue = builder.create_node("CompositorNodeHueSat", [200.0, 0.0], "").unwrap();
        let contrast = builder.create_node("CompositorNodeBrightContrast", [400.0, 0.0], "").unwrap();
        let comp = builder.create_node("CompositorNodeComposite", [600.0, 0.0], "").unwrap();
        builder.connect(&rl, "Image", &hue, "Image");
        builder.connect(&hue, "Image", &contrast, "Image");
        builder.connect(&contrast, "Image", &comp, "Image");
        graph.set_selected(&hue, true);
        graph.set_selected(&contrast, true);

        let snapshot = Snapshot::capture_selection(&graph);
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.inputs.len(), 1);
        assert_eq!(snapshot.outputs.len(), 1);
        assert_eq!(snapshot.inputs[0].socket_type, "NodeSocketColor");
        assert_eq!(snapshot.links.len(), 3);

        // Plain apply ignores boundary links
        let mut target = Graph::default();
        let report = snapshot.apply(&mut target, &registry, ApplyMode::Merge);
        assert!(report.is_complete());
        assert_eq!(report.links_total, 1);

        let (group, report) = snapshot.instantiate_group("Look", &registry);
        assert!(report.is_complete());
        assert_eq!(group.node_count(), 4);
        assert_eq!(group.link_count(), 3);
        let input = group.find_by_type(GROUP_INPUT_TYPE)[0];
        assert_eq!(input.outputs[0].identifier, "Input_0");
        assert_eq!(input.outputs[0].name, "Image");
    }

    #[test]
    fn test_file_round_trip() {
        let registry = create_compositor_registry();
        let snapshot = Snapshot::capture(&two_node_graph(&registry));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.json");

        snapshot.save(&path).unwrap();
        assert_eq!(Snapshot::load(&path).unwrap(), snapshot);
        assert!(matches!(Snapshot::load(&dir.path().join("missing.json")), Err(SnapshotError::Io(_))));
    }
}
