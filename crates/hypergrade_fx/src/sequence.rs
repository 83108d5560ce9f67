// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shot-level compositing.
//!
//! A [`Sequence`] is a named frame range with its own capture of the
//! compositor graph. Applying it restores that capture, so one scene can
//! carry a different compositing setup per shot and render them in a batch.

use hypergrade_graph::{ApplyMode, ApplyReport, Graph, NodeRegistry, Snapshot};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Unique identifier for a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceId(pub Uuid);

impl SequenceId {
    /// Create a new random sequence ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SequenceId {
    fn default() -> Self {
        Self::new()
    }
}

/// A shot: frame range plus compositor capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    /// Unique sequence ID
    pub id: SequenceId,
    /// Sequence name
    pub name: String,
    /// First frame
    pub frame_start: i32,
    /// Last frame (inclusive)
    pub frame_end: i32,
    /// Captured compositor graph
    #[serde(default)]
    pub comp_setup: Option<Snapshot>,
    /// Whether the sequence takes part in applies and batch renders
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Sequence {
    /// Create an enabled sequence over frames 1-250 with no capture
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SequenceId::new(),
            name: name.into(),
            frame_start: 1,
            frame_end: 250,
            comp_setup: None,
            enabled: true,
        }
    }

    /// Set the frame range
    pub fn with_frames(mut self, start: i32, end: i32) -> Self {
        self.frame_start = start;
        self.frame_end = end;
        self
    }

    /// Number of frames in the range
    pub fn frame_count(&self) -> i32 {
        (self.frame_end - self.frame_start + 1).max(0)
    }

    /// Whether a non-empty capture is stored
    pub fn has_setup(&self) -> bool {
        self.comp_setup.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// One entry of a batch render plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    /// Sequence to apply before rendering
    pub id: SequenceId,
    /// Sequence name
    pub name: String,
    /// First frame
    pub frame_start: i32,
    /// Last frame
    pub frame_end: i32,
    /// Render output path prefix, `<base><name>_`
    pub output_prefix: String,
}

/// Ordered list of sequences with an active entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceManager {
    sequences: Vec<Sequence>,
    active_index: usize,
}

impl SequenceManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sequence capturing `graph` and make it active
    pub fn add(&mut self, name: impl Into<String>, graph: &Graph, frame_start: i32, frame_end: i32) -> SequenceId {
        let mut sequence = Sequence::new(name).with_frames(frame_start, frame_end);
        sequence.comp_setup = Some(Snapshot::capture(graph));
        tracing::info!("Added sequence {} ({}-{})", sequence.name, frame_start, frame_end);
        self.push(sequence)
    }

    /// Append an existing sequence and make it active
    pub fn push(&mut self, sequence: Sequence) -> SequenceId {
        let id = sequence.id;
        self.sequences.push(sequence);
        self.active_index = self.sequences.len() - 1;
        id
    }

    /// Remove a sequence. The active index moves back by one.
    pub fn remove(&mut self, index: usize) -> Result<Sequence, SequenceError> {
        if index >= self.sequences.len() {
            return Err(SequenceError::InvalidIndex(index));
        }
        let removed = self.sequences.remove(index);
        self.active_index = index.saturating_sub(1);
        tracing::info!("Removed sequence {}", removed.name);
        Ok(removed)
    }

    /// Get a sequence
    pub fn get(&self, index: usize) -> Option<&Sequence> {
        self.sequences.get(index)
    }

    /// Get a mutable sequence
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Sequence> {
        self.sequences.get_mut(index)
    }

    /// Find a sequence's index by ID
    pub fn index_of(&self, id: SequenceId) -> Option<usize> {
        self.sequences.iter().position(|s| s.id == id)
    }

    /// Find a sequence's index by name
    pub fn index_by_name(&self, name: &str) -> Option<usize> {
        self.sequences.iter().position(|s| s.name == name)
    }

    /// Get all sequences
    pub fn iter(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.iter()
    }

    /// Get sequence count
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Whether there are no sequences
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Index of the active sequence
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// The active sequence, if any
    pub fn active(&self) -> Option<&Sequence> {
        self.sequences.get(self.active_index)
    }

    /// Make a sequence active
    pub fn set_active(&mut self, index: usize) -> Result<(), SequenceError> {
        if index >= self.sequences.len() {
            return Err(SequenceError::InvalidIndex(index));
        }
        self.active_index = index;
        Ok(())
    }

    /// Replace a sequence's capture with the current graph
    pub fn recapture(&mut self, index: usize, graph: &Graph) -> Result<(), SequenceError> {
        let sequence = self.sequences.get_mut(index).ok_or(SequenceError::InvalidIndex(index))?;
        sequence.comp_setup = Some(Snapshot::capture(graph));
        Ok(())
    }

    /// Restore a sequence's capture into `graph`, replacing its contents.
    ///
    /// Disabled sequences and sequences without a capture are refused
    /// before the graph is touched.
    pub fn apply(&self, index: usize, graph: &mut Graph, registry: &NodeRegistry) -> Result<ApplyReport, SequenceError> {
        let sequence = self.sequences.get(index).ok_or(SequenceError::InvalidIndex(index))?;
        if !sequence.enabled {
            return Err(SequenceError::Disabled(sequence.name.clone()));
        }
        let setup = match &sequence.comp_setup {
            Some(setup) if !setup.is_empty() => setup,
            _ => return Err(SequenceError::NoSetup(sequence.name.clone())),
        };
        let report = setup.apply(graph, registry, ApplyMode::Replace);
        tracing::info!("Applied sequence {}: {}", sequence.name, report);
        Ok(report)
    }

    /// Render jobs for every enabled sequence, in order
    pub fn render_plan(&self, base_output: &str) -> Vec<RenderJob> {
        self.sequences
            .iter()
            .filter(|s| s.enabled)
            .map(|s| RenderJob {
                id: s.id,
                name: s.name.clone(),
                frame_start: s.frame_start,
                frame_end: s.frame_end,
                output_prefix: format!("{}{}_", base_output, s.name),
            })
            .collect()
    }

    /// Preset for a sequence
    pub fn export_preset(&self, index: usize) -> Result<SequencePreset, SequenceError> {
        self.sequences
            .get(index)
            .map(SequencePreset::from)
            .ok_or(SequenceError::InvalidIndex(index))
    }

    /// Append a sequence built from a preset and make it active
    pub fn import_preset(&mut self, preset: SequencePreset) -> SequenceId {
        tracing::info!("Loaded sequence preset {}", preset.name);
        self.push(preset.into_sequence())
    }
}

/// On-disk form of a sequence:
/// `{name, frame_start, frame_end, comp_setup}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencePreset {
    /// Sequence name
    pub name: String,
    /// First frame
    pub frame_start: i32,
    /// Last frame
    pub frame_end: i32,
    /// Captured compositor graph
    #[serde(default)]
    pub comp_setup: Option<Snapshot>,
}

impl SequencePreset {
    /// Build a new enabled sequence with a fresh ID
    pub fn into_sequence(self) -> Sequence {
        let mut sequence = Sequence::new(self.name).with_frames(self.frame_start, self.frame_end);
        sequence.comp_setup = self.comp_setup;
        sequence
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, SequenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    pub fn from_json(s: &str) -> Result<Self, SequenceError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), SequenceError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, SequenceError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl From<&Sequence> for SequencePreset {
    fn from(sequence: &Sequence) -> Self {
        Self {
            name: sequence.name.clone(),
            frame_start: sequence.frame_start,
            frame_end: sequence.frame_end,
            comp_setup: sequence.comp_setup.clone(),
        }
    }
}

/// Sequence operation failure
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    /// No sequence at that index
    #[error("Invalid sequence index {0}")]
    InvalidIndex(usize),

    /// The sequence is switched off
    #[error("Sequence {0} is disabled")]
    Disabled(String),

    /// The sequence has no stored compositor setup
    #[error("No compositor setup stored for sequence {0}")]
    NoSetup(String),

    /// File I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Preset JSON was malformed
    #[error("Invalid sequence preset: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypergrade_graph::graphs::compositor::{create_compositor_registry, COMPOSITE};
    use hypergrade_graph::{GraphBuilder, PRIMARY_INPUT_TYPE};

    fn shot_graph(registry: &NodeRegistry, with_blur: bool) -> Graph {
        let mut graph = Graph::default();
        let mut b = GraphBuilder::new(&mut graph, registry);
        let rl = b.create_node(PRIMARY_INPUT_TYPE, [0.0, 0.0], "").unwrap();
        let out = b.create_node(COMPOSITE, [600.0, 0.0], "").unwrap();
        if with_blur {
            let blur = b.create_node("CompositorNodeBlur", [300.0, 0.0], "").unwrap();
            b.connect(&rl, "Image", &blur, "Image");
            b.connect(&blur, "Image", &out, "Image");
        } else {
            b.connect(&rl, "Image", &out, "Image");
        }
        graph
    }

    #[test]
    fn test_add_and_remove_moves_active_index() {
        let registry = create_compositor_registry();
        let graph = shot_graph(&registry, false);
        let mut manager = SequenceManager::new();

        manager.add("Intro", &graph, 1, 100);
        manager.add("Chase", &graph, 101, 220);
        manager.add("Outro", &graph, 221, 300);
        assert_eq!(manager.active_index(), 2);

        manager.set_active(1).unwrap();
        let removed = manager.remove(1).unwrap();
        assert_eq!(removed.name, "Chase");
        assert_eq!(manager.active_index(), 0);

        manager.remove(0).unwrap();
        assert_eq!(manager.active_index(), 0);
        assert_eq!(manager.active().unwrap().name, "Outro");
        assert!(matches!(manager.remove(5), Err(SequenceError::InvalidIndex(5))));
    }

    #[test]
    fn test_apply_restores_capture() {
        let registry = create_compositor_registry();
        let mut manager = SequenceManager::new();
        manager.add("Blurred", &shot_graph(&registry, true), 1, 50);

        let mut graph = shot_graph(&registry, false);
        let report = manager.apply(0, &mut graph, &registry).unwrap();
        assert!(report.is_complete());
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.link_count(), 2);
    }

    #[test]
    fn test_apply_refuses_disabled_and_empty() {
        let registry = create_compositor_registry();
        let mut graph = shot_graph(&registry, false);
        let mut manager = SequenceManager::new();
        manager.push(Sequence::new("Empty"));
        manager.add("Off", &graph, 1, 10);
        manager.get_mut(1).unwrap().enabled = false;

        assert!(matches!(manager.apply(0, &mut graph, &registry), Err(SequenceError::NoSetup(_))));
        assert!(matches!(manager.apply(1, &mut graph, &registry), Err(SequenceError::Disabled(_))));
        assert!(matches!(manager.apply(9, &mut graph, &registry), Err(SequenceError::InvalidIndex(9))));
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_render_plan_skips_disabled() {
        let graph = Graph::default();
        let mut manager = SequenceManager::new();
        manager.add("A", &graph, 1, 10);
        manager.add("B", &graph, 11, 20);
        manager.add("C", &graph, 21, 30);
        manager.get_mut(1).unwrap().enabled = false;

        let plan = manager.render_plan("//render/");
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].output_prefix, "//render/A_");
        assert_eq!(plan[1].name, "C");
        assert_eq!(plan[1].frame_start, 21);
    }

    #[test]
    fn test_preset_file() {
        let registry = create_compositor_registry();
        let mut manager = SequenceManager::new();
        manager.add("Hero", &shot_graph(&registry, true), 10, 90);
        let preset = manager.export_preset(0).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.json");
        preset.save(&path).unwrap();
        let loaded = SequencePreset::load(&path).unwrap();
        assert_eq!(loaded, preset);

        let id = manager.import_preset(loaded);
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.active_index(), 1);
        assert_ne!(manager.get(0).unwrap().id, id);
        assert_eq!(manager.get(1).unwrap().frame_count(), 81);
    }

    #[test]
    fn test_malformed_preset() {
        assert!(matches!(SequencePreset::from_json("{\"name\": 3}"), Err(SequenceError::Json(_))));
    }
}
