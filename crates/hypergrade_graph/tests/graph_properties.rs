// SPDX-License-Identifier: MIT OR Apache-2.0
//! Whole-graph behavior across the store, builder, snapshot and layout modules.

use hypergrade_graph::graphs::compositor::create_compositor_registry;
use hypergrade_graph::{
    depths, layout, node_depth, ApplyIssue, ApplyMode, Graph, GraphBuilder, LayoutParams,
    NodeRegistry, PropertyValue, Snapshot, PRIMARY_INPUT_TYPE,
};

type NodeShape = (String, Vec<(&'static str, String)>);
type LinkShape = (String, String, String, String);

/// Name-independent structure of a graph: sorted node shapes and link shapes
fn shape(graph: &Graph) -> (Vec<NodeShape>, Vec<LinkShape>) {
    let snapshot = Snapshot::capture(graph);
    let mut nodes: Vec<NodeShape> = snapshot
        .nodes
        .iter()
        .map(|n| {
            let props = n.properties().map(|(k, v)| (k, v.to_string())).collect();
            (n.node_type.clone(), props)
        })
        .collect();
    nodes.sort();

    let type_of = |name: &str| graph.node(name).map(|n| n.node_type.clone()).unwrap_or_default();
    let mut links: Vec<LinkShape> = graph
        .links()
        .map(|l| (type_of(&l.from_node), l.from_socket.clone(), type_of(&l.to_node), l.to_socket.clone()))
        .collect();
    links.sort();
    (nodes, links)
}

fn grading_chain(registry: &NodeRegistry) -> Graph {
    let mut graph = Graph::default();
    let mut builder = GraphBuilder::new(&mut graph, registry);
    let rl = builder.create_node(PRIMARY_INPUT_TYPE, [0.0, 0.0], "").unwrap();
    let blur = builder.create_node("CompositorNodeBlur", [200.0, 0.0], "Soft").unwrap();
    let mix = builder.create_node("CompositorNodeMixRGB", [400.0, 0.0], "").unwrap();
    let comp = builder.create_node("CompositorNodeComposite", [600.0, 0.0], "").unwrap();
    builder.set_property(&blur, "filter_type", PropertyValue::Enum("FAST_GAUSS".into()));
    builder.set_property(&mix, "blend_type", PropertyValue::Enum("SCREEN".into()));
    assert!(builder.connect(&rl, "Image", &blur, "Image"));
    assert!(builder.connect(&blur, "Image", &mix, 1));
    assert!(builder.connect(&rl, "Image", &mix, 2));
    assert!(builder.connect(&mix, "Image", &comp, "Image"));
    assert!(builder.finish().is_complete());
    graph
}

#[test]
fn test_capture_apply_round_trip_is_isomorphic() {
    let registry = create_compositor_registry();
    let graph = grading_chain(&registry);

    let mut restored = Graph::new("Restored");
    let report = Snapshot::capture(&graph).apply(&mut restored, &registry, ApplyMode::Replace);

    assert!(report.is_complete());
    assert_eq!(shape(&restored), shape(&graph));
}

#[test]
fn test_layout_twice_gives_same_positions() {
    let registry = create_compositor_registry();
    let mut graph = grading_chain(&registry);
    let params = LayoutParams::default();

    layout(&mut graph, &params);
    let first: Vec<[f32; 2]> = graph.nodes().map(|n| n.location).collect();
    layout(&mut graph, &params);
    let second: Vec<[f32; 2]> = graph.nodes().map(|n| n.location).collect();
    assert_eq!(first, second);
}

#[test]
fn test_depth_increases_along_links() {
    let registry = create_compositor_registry();
    let graph = grading_chain(&registry);
    let depths = depths(&graph);

    for link in graph.links() {
        assert!(
            depths[&link.to_node] >= depths[&link.from_node] + 1,
            "{} -> {}",
            link.from_node,
            link.to_node
        );
    }
    assert_eq!(depths["Composite"], 3);
}

#[test]
fn test_depth_increases_where_branches_rejoin() {
    let registry = create_compositor_registry();
    let mut graph = Graph::default();
    let mut builder = GraphBuilder::new(&mut graph, &registry);
    let rl = builder.create_node(PRIMARY_INPUT_TYPE, [0.0, 0.0], "").unwrap();
    let a = builder.create_node("CompositorNodeBlur", [0.0, 0.0], "").unwrap();
    let b = builder.create_node("CompositorNodeBlur", [0.0, 0.0], "").unwrap();
    let c = builder.create_node("CompositorNodeBlur", [0.0, 0.0], "").unwrap();
    let mix = builder.create_node("CompositorNodeMixRGB", [0.0, 0.0], "").unwrap();
    assert!(builder.connect(&rl, "Image", &a, "Image"));
    assert!(builder.connect(&a, "Image", &b, "Image"));
    assert!(builder.connect(&b, "Image", &c, "Image"));
    assert!(builder.connect(&b, "Image", &mix, 1));
    assert!(builder.connect(&c, "Image", &mix, 2));

    let depths = depths(&graph);
    for link in graph.links() {
        assert!(
            depths[&link.to_node] >= depths[&link.from_node] + 1,
            "{} -> {}: {} vs {}",
            link.from_node,
            link.to_node,
            depths[&link.from_node],
            depths[&link.to_node]
        );
    }
    assert_eq!(depths[&c], 3);
    assert_eq!(depths[&mix], 4);
}

#[test]
fn test_connect_to_missing_socket_is_tolerated() {
    let registry = create_compositor_registry();
    let mut graph = grading_chain(&registry);
    let before = graph.link_count();

    let mut builder = GraphBuilder::new(&mut graph, &registry);
    assert!(!builder.connect("Blur", "Image", "Composite", "NoSuchSocket"));
    assert_eq!(builder.stats().links_failed, 1);
    assert_eq!(graph.link_count(), before);
}

#[test]
fn test_unknown_type_fails_exactly_one_node() {
    let registry = create_compositor_registry();
    let mut snapshot = Snapshot::capture(&grading_chain(&registry));
    snapshot.nodes[1].node_type = "CompositorNodeDoesNotExist".to_string();

    let mut graph = Graph::default();
    let report = snapshot.apply(&mut graph, &registry, ApplyMode::Replace);

    assert_eq!(report.node_failures(), 1);
    assert_eq!(report.nodes_created, 3);
    assert!(report.is_partial());
    assert_eq!(graph.node_count(), 3);
    // Only the two links touching the missing blur are lost
    assert_eq!(report.links_created, 2);
    assert!(matches!(report.issues[0], ApplyIssue::UnknownNodeType { .. }));
}

#[test]
fn test_connect_to_missing_node_keeps_graph_intact() {
    let registry = create_compositor_registry();
    let mut graph = Graph::default();
    let mut builder = GraphBuilder::new(&mut graph, &registry);
    let rl = builder.create_node(PRIMARY_INPUT_TYPE, [0.0, 0.0], "RL").unwrap();

    assert!(!builder.connect(&rl, "Image", "X", "Image"));
    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.link_count(), 0);
}

#[test]
fn test_two_node_capture_restore_recapture() {
    let registry = create_compositor_registry();
    let mut graph = Graph::default();
    let mut builder = GraphBuilder::new(&mut graph, &registry);
    let a = builder.create_node("CompositorNodeBlur", [0.0, 0.0], "A").unwrap();
    let b = builder.create_node("CompositorNodeHueSat", [200.0, 0.0], "B").unwrap();
    assert!(builder.connect(&a, "Image", &b, "Image"));

    let first = Snapshot::capture(&graph);
    let mut restored = Graph::default();
    first.apply(&mut restored, &registry, ApplyMode::Replace);
    assert_eq!(restored.node_count(), 2);
    assert_eq!(restored.link_count(), 1);

    let second = Snapshot::capture(&restored);
    assert_eq!(shape(&restored), shape(&graph));
    assert_eq!(first.nodes.len(), second.nodes.len());
    assert_eq!(first.links.len(), second.links.len());
}

#[test]
fn test_fan_in_depths() {
    let registry = create_compositor_registry();
    let mut graph = Graph::default();
    let mut builder = GraphBuilder::new(&mut graph, &registry);
    let a = builder.create_node("CompositorNodeBlur", [0.0, 0.0], "A").unwrap();
    let b = builder.create_node("CompositorNodeBlur", [0.0, 0.0], "B").unwrap();
    let c = builder.create_node("CompositorNodeMixRGB", [0.0, 0.0], "C").unwrap();
    builder.connect(&a, "Image", &c, 1);
    builder.connect(&b, "Image", &c, 2);

    assert_eq!(node_depth(&graph, &a), 0);
    assert_eq!(node_depth(&graph, &b), 0);
    assert_eq!(node_depth(&graph, &c), 1);
}
