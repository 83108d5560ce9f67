// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene document: compositor graph plus everything attached to it.

use crate::blueprint::{BlueprintApplied, BlueprintCategory, BlueprintError, BlueprintId, BlueprintLibrary};
use crate::sequence::{SequenceError, SequenceId, SequenceManager};
use hypergrade_graph::graphs::compositor::COMPOSITE;
use hypergrade_graph::{ApplyReport, Graph, GraphBuilder, NodeRegistry, PRIMARY_INPUT_TYPE};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current scene file format version
pub const SCENE_FORMAT_VERSION: u32 = 1;

/// A compositing scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Scene file format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Scene name
    pub name: String,
    /// Compositor graph
    pub graph: Graph,
    /// Node-group library, keyed by group name
    #[serde(default)]
    pub node_groups: IndexMap<String, Graph>,
    /// First frame
    pub frame_start: i32,
    /// Last frame (inclusive)
    pub frame_end: i32,
    /// Shot sequences
    #[serde(default)]
    pub sequences: SequenceManager,
    /// Node-group presets
    #[serde(default = "BlueprintLibrary::with_builtins")]
    pub blueprints: BlueprintLibrary,
}

fn default_version() -> u32 {
    SCENE_FORMAT_VERSION
}

impl Scene {
    /// Create a scene with an empty compositor graph, frames 1-250 and the
    /// built-in blueprints
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: SCENE_FORMAT_VERSION,
            name: name.into(),
            graph: Graph::default(),
            node_groups: IndexMap::new(),
            frame_start: 1,
            frame_end: 250,
            sequences: SequenceManager::new(),
            blueprints: BlueprintLibrary::with_builtins(),
        }
    }

    /// Create a scene whose graph links render layers to a Composite node
    pub fn new_default(name: impl Into<String>, registry: &NodeRegistry) -> Self {
        let mut scene = Self::new(name);
        let mut builder = GraphBuilder::new(&mut scene.graph, registry);
        if let (Ok(source), Ok(output)) = (
            builder.create_node(PRIMARY_INPUT_TYPE, [0.0, 0.0], ""),
            builder.create_node(COMPOSITE, [400.0, 0.0], ""),
        ) {
            builder.connect(&source, "Image", &output, "Image");
        }
        scene
    }

    /// Capture the current graph as a new sequence over the scene's frame
    /// range
    pub fn add_sequence(&mut self, name: impl Into<String>) -> SequenceId {
        self.sequences.add(name, &self.graph, self.frame_start, self.frame_end)
    }

    /// Restore a sequence's graph and adopt its frame range
    pub fn apply_sequence(&mut self, index: usize, registry: &NodeRegistry) -> Result<ApplyReport, SequenceError> {
        let report = self.sequences.apply(index, &mut self.graph, registry)?;
        if let Some(sequence) = self.sequences.get(index) {
            self.frame_start = sequence.frame_start;
            self.frame_end = sequence.frame_end;
        }
        Ok(report)
    }

    /// Save the selected nodes as a blueprint
    pub fn save_blueprint_from_selection(
        &mut self,
        name: &str,
        category: BlueprintCategory,
        description: &str,
    ) -> Result<BlueprintId, BlueprintError> {
        self.blueprints.save_from_selection(&self.graph, name, category, description)
    }

    /// Instantiate a blueprint into the graph and the node-group library
    pub fn apply_blueprint(&mut self, index: usize, registry: &NodeRegistry) -> Result<BlueprintApplied, BlueprintError> {
        self.blueprints.apply(index, &mut self.graph, &mut self.node_groups, registry)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON, rejecting files from a newer format
    pub fn from_json(s: &str) -> Result<Self, SceneError> {
        let scene: Self = serde_json::from_str(s)?;
        if scene.version > SCENE_FORMAT_VERSION {
            return Err(SceneError::UnsupportedVersion(scene.version));
        }
        Ok(scene)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), SceneError> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!("Saved scene {} to {}", self.name, path.display());
        Ok(())
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Scene")
    }
}

/// Error reading or writing a scene
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// File I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON was malformed
    #[error("Invalid scene data: {0}")]
    Json(#[from] serde_json::Error),

    /// Written by a newer version
    #[error("Scene version {0} is newer than supported version {max}", max = SCENE_FORMAT_VERSION)]
    UnsupportedVersion(u32),
}
