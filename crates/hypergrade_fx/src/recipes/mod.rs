// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compositing recipes.
//!
//! A recipe looks up the render-layers node, checks that the passes it reads
//! are present, and only then adds and wires its nodes through a
//! [`GraphBuilder`]. Wiring is best-effort: a link that cannot be made is
//! counted in the returned [`RecipeSummary`] rather than aborting the recipe.

pub mod edges;
pub mod fog;
pub mod fx_layers;
pub mod glow;
pub mod grading;

use hypergrade_graph::graphs::compositor::{COMPOSITE, VIEWER};
use hypergrade_graph::{BuildError, BuildStats, Graph, GraphBuilder, MissingAnchor, SocketRef};
use std::fmt;

/// X position of the first node a recipe adds
pub const RECIPE_ORIGIN_X: f32 = 400.0;

/// Outcome of a recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSummary {
    /// Build tally
    pub stats: BuildStats,
    /// Name of the node producing the recipe's result
    pub output: String,
}

impl fmt::Display for RecipeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.output, self.stats)
    }
}

/// Error when a recipe cannot run
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecipeError {
    /// No render-layers node in the graph
    #[error(transparent)]
    MissingAnchor(#[from] MissingAnchor),

    /// The render-layers node lacks a pass the recipe reads
    #[error("{pass} pass not available on {node}")]
    MissingPass {
        /// Render-layers node name
        node: String,
        /// Output socket that was expected
        pass: String,
    },

    /// A node type was missing from the registry
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Render-layers node a recipe draws from
#[derive(Debug, Clone)]
pub(crate) struct Source {
    pub name: String,
}

impl Source {
    /// Find the render-layers node and check it exposes `passes`
    pub fn require(graph: &Graph, passes: &[&str]) -> Result<Self, RecipeError> {
        let node = graph.require_primary_input()?;
        for pass in passes {
            if node.output(&SocketRef::from(*pass)).is_none() {
                return Err(RecipeError::MissingPass {
                    node: node.name.clone(),
                    pass: (*pass).to_string(),
                });
            }
        }
        Ok(Self { name: node.name.clone() })
    }

    pub fn has_pass(&self, graph: &Graph, pass: &str) -> bool {
        graph
            .node(&self.name)
            .is_some_and(|n| n.output(&SocketRef::from(pass)).is_some())
    }
}

/// Add a labelled viewer fed by `from`'s `Image` output
pub(crate) fn add_viewer(
    builder: &mut GraphBuilder<'_>,
    from: &str,
    label: &str,
    location: [f32; 2],
) -> Result<String, RecipeError> {
    let viewer = builder.create_node(VIEWER, location, label)?;
    builder.connect(from, "Image", &viewer, "Image");
    Ok(viewer)
}

fn location_of(builder: &GraphBuilder<'_>, node: &str) -> [f32; 2] {
    builder.graph().node(node).map(|n| n.location).unwrap_or_default()
}

/// Link `node`'s output into the Composite node, creating one to its right
/// if the graph has none. Returns the Composite node's name.
pub fn connect_to_composite(
    builder: &mut GraphBuilder<'_>,
    node: &str,
    socket: impl Into<SocketRef>,
) -> Result<String, RecipeError> {
    let existing = builder.graph().find_by_type(COMPOSITE).first().map(|n| n.name.clone());
    let composite = match existing {
        Some(name) => name,
        None => {
            let [x, y] = location_of(builder, node);
            builder.create_node(COMPOSITE, [x + 300.0, y], "Composite Output")?
        }
    };
    builder.connect(node, socket, &composite, "Image");
    Ok(composite)
}

/// Link `node`'s output into the preview viewer (the first viewer whose
/// label mentions "Preview"), creating one to its right if needed. Returns
/// the viewer's name.
pub fn attach_viewer(
    builder: &mut GraphBuilder<'_>,
    node: &str,
    socket: impl Into<SocketRef>,
) -> Result<String, RecipeError> {
    let existing = builder
        .graph()
        .find_by_type(VIEWER)
        .into_iter()
        .find(|n| n.label.contains("Preview"))
        .map(|n| n.name.clone());
    let viewer = match existing {
        Some(name) => name,
        None => {
            let [x, y] = location_of(builder, node);
            builder.create_node(VIEWER, [x + 250.0, y], "HGFX Preview")?
        }
    };
    builder.connect(node, socket, &viewer, "Image");
    Ok(viewer)
}

/// Route `node`'s `Image` output to both the preview viewer and the
/// Composite node
pub(crate) fn preview(builder: &mut GraphBuilder<'_>, node: &str) -> Result<(), RecipeError> {
    attach_viewer(builder, node, "Image")?;
    connect_to_composite(builder, node, "Image")?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use hypergrade_graph::graphs::compositor::create_compositor_registry;
    use hypergrade_graph::{Graph, GraphBuilder, Node, NodeRegistry, Socket, SocketKind, PRIMARY_INPUT_TYPE};

    pub fn registry() -> NodeRegistry {
        create_compositor_registry()
    }

    /// Graph holding one render-layers node named "Render Layers"
    pub fn render_graph(registry: &NodeRegistry) -> Graph {
        let mut graph = Graph::default();
        GraphBuilder::new(&mut graph, registry)
            .create_node(PRIMARY_INPUT_TYPE, [0.0, 0.0], "")
            .unwrap();
        graph
    }

    /// Graph whose render-layers node only has an `Image` output
    pub fn image_only_graph() -> Graph {
        let mut graph = Graph::default();
        graph.add_node(Node::from_parts(
            PRIMARY_INPUT_TYPE,
            "Render Layers",
            Vec::new(),
            vec![Socket::output("Image", SocketKind::Color)],
        ));
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_missing_anchor() {
        let graph = Graph::default();
        let err = Source::require(&graph, &[]).unwrap_err();
        assert!(matches!(err, RecipeError::MissingAnchor(_)));
        assert_eq!(err.to_string(), "No input node found (expected a CompositorNodeRLayers node)");
    }

    #[test]
    fn test_missing_pass() {
        let graph = image_only_graph();
        let err = Source::require(&graph, &["Image", "Depth"]).unwrap_err();
        assert_eq!(
            err,
            RecipeError::MissingPass {
                node: "Render Layers".into(),
                pass: "Depth".into()
            }
        );
    }

    #[test]
    fn test_composite_is_reused() {
        let registry = registry();
        let mut graph = render_graph(&registry);
        let mut builder = GraphBuilder::new(&mut graph, &registry);
        let blur = builder.create_node("CompositorNodeBlur", [400.0, 0.0], "").unwrap();

        let first = connect_to_composite(&mut builder, &blur, "Image").unwrap();
        let second = connect_to_composite(&mut builder, "Render Layers", "Image").unwrap();
        assert_eq!(first, second);
        assert_eq!(builder.graph().node(&first).unwrap().location, [700.0, 0.0]);
        assert_eq!(builder.graph().find_by_type(COMPOSITE).len(), 1);

        // The single-capacity input now holds the newer link only
        let links: Vec<_> = builder.graph().links_into(&first, "Image").collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].from_node, "Render Layers");
    }

    #[test]
    fn test_viewer_lookup_requires_preview_label() {
        let registry = registry();
        let mut graph = render_graph(&registry);
        let mut builder = GraphBuilder::new(&mut graph, &registry);
        builder.create_node(VIEWER, [0.0, -300.0], "Backdrop").unwrap();

        let viewer = attach_viewer(&mut builder, "Render Layers", "Image").unwrap();
        assert_eq!(builder.graph().node(&viewer).unwrap().label, "HGFX Preview");
        assert_eq!(attach_viewer(&mut builder, "Render Layers", "Image").unwrap(), viewer);
        assert_eq!(builder.graph().find_by_type(VIEWER).len(), 2);
    }
}
