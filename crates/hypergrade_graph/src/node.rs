// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph core.

use crate::property::{PropertyBag, PropertyValue};
use crate::socket::{dedupe_identifiers, Socket, SocketRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default node body color when no custom color is set
pub const DEFAULT_NODE_COLOR: [f32; 3] = [0.608, 0.608, 0.608];

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Sources (render layers, constants)
    Input,
    /// Sinks (composite, viewer)
    Output,
    /// Color adjustments
    Color,
    /// Type conversions, math, ramps
    Converter,
    /// Blur, glare, convolution filters
    Filter,
    /// Vector operations
    Vector,
    /// Masks and keying
    Matte,
    /// Distortion
    Distort,
    /// Frames and reroutes
    Layout,
    /// Node groups and their interface nodes
    Group,
}

impl NodeCategory {
    /// Color used when a recipe marks nodes of this category
    pub fn color(&self) -> [f32; 3] {
        match self {
            Self::Input => [0.4, 0.6, 1.0],
            Self::Color => [1.0, 0.6, 0.4],
            Self::Filter => [0.4, 1.0, 0.6],
            Self::Vector => [1.0, 0.4, 0.6],
            Self::Matte => [0.8, 0.8, 0.4],
            Self::Output => [0.6, 0.4, 1.0],
            Self::Converter | Self::Distort | Self::Layout | Self::Group => DEFAULT_NODE_COLOR,
        }
    }
}

/// Node type definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeType {
    /// Unique type tag (`CompositorNodeMixRGB`)
    pub id: String,
    /// Display name, also the base for generated node names
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Default input sockets
    pub inputs: Vec<Socket>,
    /// Default output sockets
    pub outputs: Vec<Socket>,
    /// Properties this kind defines, with their defaults
    pub properties: PropertyBag,
    /// Default width and height
    pub size: [f32; 2],
}

impl NodeType {
    /// Create a type with no sockets or properties
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            properties: PropertyBag::new(),
            size: [140.0, 100.0],
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the input sockets
    pub fn with_inputs(mut self, inputs: Vec<Socket>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Set the output sockets
    pub fn with_outputs(mut self, outputs: Vec<Socket>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Declare a property with its default value
    pub fn with_property(mut self, key: impl Into<String>, default: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), default.into());
        self
    }

    /// Set the default size
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = [width, height];
        self
    }
}

/// A node instance in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Name, unique within the owning graph
    pub name: String,
    /// Node type tag
    pub node_type: String,
    /// Display label (may be empty, need not be unique)
    pub label: String,
    /// Position in the editor
    pub location: [f32; 2],
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// Input sockets
    pub inputs: Vec<Socket>,
    /// Output sockets
    pub outputs: Vec<Socket>,
    /// Type-specific properties
    pub properties: PropertyBag,
    /// Whether `color` overrides the theme color
    pub use_custom_color: bool,
    /// Custom body color
    pub color: [f32; 3],
    /// Selection state
    pub select: bool,
}

impl Node {
    /// Create a new node from a type definition
    pub fn new(node_type: &NodeType, name: impl Into<String>) -> Self {
        Self {
            properties: node_type.properties.clone(),
            width: node_type.size[0],
            height: node_type.size[1],
            ..Self::from_parts(&node_type.id, name, node_type.inputs.clone(), node_type.outputs.clone())
        }
    }

    /// Create a node with an explicit socket layout and no properties
    pub fn from_parts(
        node_type: impl Into<String>,
        name: impl Into<String>,
        mut inputs: Vec<Socket>,
        mut outputs: Vec<Socket>,
    ) -> Self {
        dedupe_identifiers(&mut inputs);
        dedupe_identifiers(&mut outputs);
        Self {
            name: name.into(),
            node_type: node_type.into(),
            label: String::new(),
            location: [0.0, 0.0],
            width: 140.0,
            height: 100.0,
            inputs,
            outputs,
            properties: PropertyBag::new(),
            use_custom_color: false,
            color: DEFAULT_NODE_COLOR,
            select: false,
        }
    }

    /// Set the position
    pub fn with_location(mut self, x: f32, y: f32) -> Self {
        self.location = [x, y];
        self
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Label if set, otherwise the node name
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }

    /// Resolve an input socket
    pub fn input(&self, socket: &SocketRef) -> Option<&Socket> {
        socket.resolve(&self.inputs)
    }

    /// Resolve an output socket
    pub fn output(&self, socket: &SocketRef) -> Option<&Socket> {
        socket.resolve(&self.outputs)
    }

    /// Resolve an input socket for modification
    pub fn input_mut(&mut self, socket: &SocketRef) -> Option<&mut Socket> {
        let identifier = self.input(socket)?.identifier.clone();
        self.inputs.iter_mut().find(|s| s.identifier == identifier)
    }

    /// Whether this node kind defines `key`
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Get a property value
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// Registry of available node types
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    /// Registered node types by ID
    types: IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register a node type, replacing any previous type with the same ID
    pub fn register(&mut self, mut node_type: NodeType) {
        dedupe_identifiers(&mut node_type.inputs);
        dedupe_identifiers(&mut node_type.outputs);
        self.types.insert(node_type.id.clone(), node_type);
    }

    /// Get a node type by ID
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id)
    }

    /// Whether a type ID is known
    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeType> {
        self.types.values().filter(move |t| t.category == category)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
