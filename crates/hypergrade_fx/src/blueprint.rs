// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reusable node-group presets.
//!
//! A [`Blueprint`] stores a sub-selection capture together with its boundary
//! ports. Applying it builds a group graph in the scene's node-group library
//! and drops a Group node referencing it into the compositor graph.

use crate::{variant_key, UnknownVariant};
use hypergrade_graph::graphs::compositor::GROUP;
use hypergrade_graph::snapshot::{GROUP_INPUT, GROUP_OUTPUT};
use hypergrade_graph::{
    ApplyReport, BuildError, Graph, GraphBuilder, LinkDescriptor, NodeDescriptor, NodeRegistry,
    PortDescriptor, PropertyValue, Snapshot, SocketKind,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Where an applied blueprint's Group node is placed
pub const GROUP_NODE_LOCATION: [f32; 2] = [400.0, 0.0];

/// Unique identifier for a blueprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlueprintId(pub Uuid);

impl BlueprintId {
    /// Create a new random blueprint ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlueprintId {
    fn default() -> Self {
        Self::new()
    }
}

/// Blueprint category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlueprintCategory {
    /// General grading
    #[default]
    ColorGrading,
    /// Look development
    LookDevelopment,
    /// Film stock emulation
    FilmEmulation,
    /// Stylized looks
    Stylized,
    /// High dynamic range
    Hdr,
    /// Technical transforms
    Technical,
    /// Effects
    Fx,
}

impl BlueprintCategory {
    /// All categories
    pub const ALL: [BlueprintCategory; 7] = [
        Self::ColorGrading,
        Self::LookDevelopment,
        Self::FilmEmulation,
        Self::Stylized,
        Self::Hdr,
        Self::Technical,
        Self::Fx,
    ];

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            Self::ColorGrading => "Color Grading",
            Self::LookDevelopment => "Look Development",
            Self::FilmEmulation => "Film Emulation",
            Self::Stylized => "Stylized",
            Self::Hdr => "HDR",
            Self::Technical => "Technical",
            Self::Fx => "FX",
        }
    }
}

impl fmt::Display for BlueprintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BlueprintCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match variant_key(s).as_str() {
            "COLOR_GRADING" => Ok(Self::ColorGrading),
            "LOOK_DEVELOPMENT" => Ok(Self::LookDevelopment),
            "FILM_EMULATION" => Ok(Self::FilmEmulation),
            "STYLIZED" => Ok(Self::Stylized),
            "HDR" => Ok(Self::Hdr),
            "TECHNICAL" => Ok(Self::Technical),
            "FX" => Ok(Self::Fx),
            _ => Err(UnknownVariant::new("blueprint category", s)),
        }
    }
}

/// A stored node-group preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Unique blueprint ID
    pub id: BlueprintId,
    /// Display name, also the label of applied Group nodes
    pub name: String,
    /// Category
    pub category: BlueprintCategory,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Captured nodes, links and boundary ports
    pub node_data: Snapshot,
    /// Shipped with the library rather than saved by the user
    #[serde(default)]
    pub builtin: bool,
}

impl Blueprint {
    /// Create a user blueprint
    pub fn new(name: impl Into<String>, category: BlueprintCategory, node_data: Snapshot) -> Self {
        Self {
            id: BlueprintId::new(),
            name: name.into(),
            category,
            description: String::new(),
            node_data,
            builtin: false,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Result of applying a blueprint
#[derive(Debug, Clone)]
pub struct BlueprintApplied {
    /// Name of the group graph added to the node-group library
    pub group_name: String,
    /// Name of the Group node added to the compositor graph
    pub node: String,
    /// How completely the group graph was rebuilt
    pub report: ApplyReport,
}

/// Blueprint operation failure
#[derive(Debug, thiserror::Error)]
pub enum BlueprintError {
    /// Nothing was selected to save
    #[error("No nodes selected")]
    NoSelection,

    /// No blueprint at that index
    #[error("Invalid blueprint index {0}")]
    InvalidIndex(usize),

    /// The blueprint holds no nodes
    #[error("Blueprint {0} has no node data")]
    Empty(String),

    /// The Group node could not be created
    #[error(transparent)]
    Build(#[from] BuildError),

    /// File I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Preset JSON was malformed
    #[error("Invalid blueprint preset: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ordered blueprint collection with an active entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlueprintLibrary {
    blueprints: Vec<Blueprint>,
    active_index: usize,
}

impl BlueprintLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library holding the built-in blueprints
    pub fn with_builtins() -> Self {
        let mut library = Self::new();
        for blueprint in builtin_blueprints() {
            library.push(blueprint);
        }
        library.active_index = 0;
        library
    }

    /// Append a blueprint and make it active
    pub fn push(&mut self, blueprint: Blueprint) -> BlueprintId {
        let id = blueprint.id;
        self.blueprints.push(blueprint);
        self.active_index = self.blueprints.len() - 1;
        id
    }

    /// Save the selected nodes of `graph` as a new blueprint
    pub fn save_from_selection(
        &mut self,
        graph: &Graph,
        name: &str,
        category: BlueprintCategory,
        description: &str,
    ) -> Result<BlueprintId, BlueprintError> {
        let node_data = Snapshot::capture_selection(graph);
        if node_data.is_empty() {
            return Err(BlueprintError::NoSelection);
        }
        tracing::info!("Saved blueprint {} ({} nodes)", name, node_data.nodes.len());
        Ok(self.push(Blueprint::new(name, category, node_data).with_description(description)))
    }

    /// Remove a blueprint. The active index moves back by one.
    pub fn delete(&mut self, index: usize) -> Result<Blueprint, BlueprintError> {
        if index >= self.blueprints.len() {
            return Err(BlueprintError::InvalidIndex(index));
        }
        let removed = self.blueprints.remove(index);
        self.active_index = index.saturating_sub(1);
        tracing::info!("Deleted blueprint {}", removed.name);
        Ok(removed)
    }

    /// Instantiate a blueprint: its group graph goes into `node_groups`
    /// under a free name, and a Group node labelled with the blueprint name
    /// is added to `graph`.
    pub fn apply(
        &self,
        index: usize,
        graph: &mut Graph,
        node_groups: &mut IndexMap<String, Graph>,
        registry: &NodeRegistry,
    ) -> Result<BlueprintApplied, BlueprintError> {
        let blueprint = self.blueprints.get(index).ok_or(BlueprintError::InvalidIndex(index))?;
        if blueprint.node_data.is_empty() {
            return Err(BlueprintError::Empty(blueprint.name.clone()));
        }

        let group_name = unique_group_name(node_groups, &format!("HGFX_{}", blueprint.name));
        let (group, report) = blueprint.node_data.instantiate_group(&group_name, registry);

        let mut builder = GraphBuilder::new(graph, registry);
        let node = builder.create_node(GROUP, GROUP_NODE_LOCATION, &blueprint.name)?;
        builder.set_property(&node, "node_tree", PropertyValue::String(group_name.clone()));
        if let Some(group_node) = builder.graph_mut().node_mut(&node) {
            group_node.inputs = blueprint.node_data.inputs.iter().map(|p| p.socket(false)).collect();
            group_node.outputs = blueprint.node_data.outputs.iter().map(|p| p.socket(true)).collect();
        }
        node_groups.insert(group_name.clone(), group);

        tracing::info!("Applied blueprint {} as {}: {}", blueprint.name, group_name, report);
        Ok(BlueprintApplied { group_name, node, report })
    }

    /// Get a blueprint
    pub fn get(&self, index: usize) -> Option<&Blueprint> {
        self.blueprints.get(index)
    }

    /// Find a blueprint's index by name
    pub fn index_by_name(&self, name: &str) -> Option<usize> {
        self.blueprints.iter().position(|b| b.name == name)
    }

    /// Get all blueprints
    pub fn iter(&self) -> impl Iterator<Item = &Blueprint> {
        self.blueprints.iter()
    }

    /// Blueprints in one category
    pub fn in_category(&self, category: BlueprintCategory) -> impl Iterator<Item = &Blueprint> {
        self.blueprints.iter().filter(move |b| b.category == category)
    }

    /// Get blueprint count
    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    /// Whether there are no blueprints
    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }

    /// Index of the active blueprint
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Preset for a blueprint
    pub fn export_preset(&self, index: usize) -> Result<BlueprintPreset, BlueprintError> {
        self.blueprints
            .get(index)
            .map(BlueprintPreset::from)
            .ok_or(BlueprintError::InvalidIndex(index))
    }

    /// Append a blueprint built from a preset and make it active
    pub fn import_preset(&mut self, preset: BlueprintPreset) -> BlueprintId {
        tracing::info!("Loaded blueprint preset {}", preset.name);
        self.push(
            Blueprint::new(preset.name, preset.category, preset.node_data).with_description(preset.description),
        )
    }
}

fn unique_group_name(node_groups: &IndexMap<String, Graph>, base: &str) -> String {
    if !node_groups.contains_key(base) {
        return base.to_string();
    }
    (1..)
        .map(|i| format!("{}.{:03}", base, i))
        .find(|candidate| !node_groups.contains_key(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// On-disk form of a blueprint: `{name, category, description, node_data}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintPreset {
    /// Blueprint name
    pub name: String,
    /// Category
    #[serde(default)]
    pub category: BlueprintCategory,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Captured nodes, links and boundary ports
    pub node_data: Snapshot,
}

impl BlueprintPreset {
    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, BlueprintError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    pub fn from_json(s: &str) -> Result<Self, BlueprintError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), BlueprintError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, BlueprintError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl From<&Blueprint> for BlueprintPreset {
    fn from(blueprint: &Blueprint) -> Self {
        Self {
            name: blueprint.name.clone(),
            category: blueprint.category,
            description: blueprint.description.clone(),
            node_data: blueprint.node_data.clone(),
        }
    }
}

// ============================================================================
// Built-in blueprints
// ============================================================================

fn color_port(identifier: &str) -> PortDescriptor {
    PortDescriptor {
        identifier: identifier.to_string(),
        name: "Image".to_string(),
        socket_type: SocketKind::Color.idname().to_string(),
    }
}

fn link(from_node: &str, from_socket: &str, to_node: &str, to_socket: &str) -> LinkDescriptor {
    LinkDescriptor {
        from_node: from_node.to_string(),
        from_socket: from_socket.to_string(),
        to_node: to_node.to_string(),
        to_socket: to_socket.to_string(),
    }
}

/// Image-in, image-out chain of `(type, label)` nodes spaced 200 apart
fn image_chain(stages: &[(&str, &str)]) -> Snapshot {
    let nodes: Vec<NodeDescriptor> = stages
        .iter()
        .enumerate()
        .map(|(i, (node_type, label))| NodeDescriptor {
            node_type: (*node_type).to_string(),
            name: (*label).to_string(),
            label: (*label).to_string(),
            location: [i as f32 * 200.0, 0.0],
            width: 140.0,
            height: 100.0,
            use_custom_color: false,
            color: None,
            blend_type: None,
            filter_type: None,
            operation: None,
        })
        .collect();

    let mut links = Vec::with_capacity(nodes.len() + 1);
    if let (Some(first), Some(last)) = (nodes.first(), nodes.last()) {
        links.push(link(GROUP_INPUT, "Input_0", &first.name, "Image"));
        for pair in nodes.windows(2) {
            links.push(link(&pair[0].name, "Image", &pair[1].name, "Image"));
        }
        links.push(link(&last.name, "Image", GROUP_OUTPUT, "Output_0"));
    }

    Snapshot {
        inputs: vec![color_port("Input_0")],
        outputs: vec![color_port("Output_0")],
        nodes,
        links,
    }
}

fn builtin(name: &str, category: BlueprintCategory, description: &str, stages: &[(&str, &str)]) -> Blueprint {
    let mut blueprint = Blueprint::new(name, category, image_chain(stages)).with_description(description);
    blueprint.builtin = true;
    blueprint
}

/// Blueprints shipped with every library
pub fn builtin_blueprints() -> Vec<Blueprint> {
    vec![
        builtin(
            "Netflix HDR",
            BlueprintCategory::Hdr,
            "Separate shadow, midtone and highlight correction for HDR delivery",
            &[
                ("CompositorNodeColorCorrection", "Shadows"),
                ("CompositorNodeColorCorrection", "Midtones"),
                ("CompositorNodeColorCorrection", "Highlights"),
            ],
        ),
        builtin(
            "Grunge Look",
            BlueprintCategory::Stylized,
            "Desaturated, high-contrast grit",
            &[
                ("CompositorNodeHueSat", "Desaturate"),
                ("CompositorNodeBrightContrast", "Contrast"),
            ],
        ),
        builtin(
            "Teal & Orange",
            BlueprintCategory::LookDevelopment,
            "Blockbuster complementary grade",
            &[("CompositorNodeColorBalance", "Color Balance")],
        ),
    ]
}
