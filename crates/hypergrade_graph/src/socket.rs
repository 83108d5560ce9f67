// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket definitions for node inputs/outputs.

use crate::property::PropertyValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Socket direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketDirection {
    /// Input socket
    Input,
    /// Output socket
    Output,
}

/// Data type carried by a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketKind {
    /// RGBA image or color
    Color,
    /// Scalar value or grayscale image
    Value,
    /// Vector data (normals, motion vectors)
    Vector,
}

impl SocketKind {
    /// Host socket class name written into boundary port descriptors
    pub fn idname(&self) -> &'static str {
        match self {
            Self::Color => "NodeSocketColor",
            Self::Value => "NodeSocketFloat",
            Self::Vector => "NodeSocketVector",
        }
    }

    /// Parse a host socket class name, treating anything unknown as color
    pub fn from_idname(idname: &str) -> Self {
        match idname {
            "NodeSocketFloat" | "NodeSocketFloatFactor" => Self::Value,
            "NodeSocketVector" => Self::Vector,
            _ => Self::Color,
        }
    }
}

/// A socket on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Socket {
    /// Identifier, unique among the node's inputs (or outputs)
    pub identifier: String,
    /// Display name, not necessarily unique
    pub name: String,
    /// Socket direction
    pub direction: SocketDirection,
    /// Data type
    pub kind: SocketKind,
    /// Value used while the input is unlinked
    pub default_value: Option<PropertyValue>,
    /// Whether multiple links may attach to this socket
    pub multi_connect: bool,
}

impl Socket {
    /// Create a new input socket
    pub fn input(name: impl Into<String>, kind: SocketKind) -> Self {
        let name = name.into();
        Self {
            identifier: name.clone(),
            name,
            direction: SocketDirection::Input,
            kind,
            default_value: None,
            multi_connect: false,
        }
    }

    /// Create a new output socket
    pub fn output(name: impl Into<String>, kind: SocketKind) -> Self {
        let name = name.into();
        Self {
            identifier: name.clone(),
            name,
            direction: SocketDirection::Output,
            kind,
            default_value: None,
            multi_connect: true, // Outputs fan out by default
        }
    }

    /// Override the identifier
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Set the default value
    pub fn with_default(mut self, value: impl Into<PropertyValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Reference to a socket, either by name or by position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketRef {
    /// Socket identifier, falling back to display name
    Name(String),
    /// Position in the node's ordered input or output list
    Index(usize),
}

impl SocketRef {
    /// Resolve this reference against an ordered socket list.
    ///
    /// Names match identifiers first and then display names, first match wins.
    pub fn resolve<'a>(&self, sockets: &'a [Socket]) -> Option<&'a Socket> {
        match self {
            Self::Index(index) => sockets.get(*index),
            Self::Name(name) => sockets
                .iter()
                .find(|s| s.identifier == *name)
                .or_else(|| sockets.iter().find(|s| s.name == *name)),
        }
    }
}

impl From<&str> for SocketRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for SocketRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for SocketRef {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<usize> for SocketRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<i32> for SocketRef {
    fn from(index: i32) -> Self {
        // Negative positions never resolve
        Self::Index(usize::try_from(index).unwrap_or(usize::MAX))
    }
}

impl fmt::Display for SocketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "'{name}'"),
            Self::Index(index) => write!(f, "#{index}"),
        }
    }
}

/// Give duplicate identifiers a numeric suffix (`Image`, `Image_001`, ...)
pub(crate) fn dedupe_identifiers(sockets: &mut [Socket]) {
    for i in 1..sockets.len() {
        let base = sockets[i].identifier.clone();
        let mut candidate = base.clone();
        let mut counter = 0;
        while sockets[..i].iter().any(|s| s.identifier == candidate) {
            counter += 1;
            candidate = format!("{base}_{counter:03}");
        }
        sockets[i].identifier = candidate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mix_inputs() -> Vec<Socket> {
        let mut inputs = vec![
            Socket::input("Fac", SocketKind::Value),
            Socket::input("Image", SocketKind::Color),
            Socket::input("Image", SocketKind::Color),
        ];
        dedupe_identifiers(&mut inputs);
        inputs
    }

    #[test]
    fn test_duplicate_names_get_unique_identifiers() {
        let inputs = mix_inputs();
        assert_eq!(inputs[1].identifier, "Image");
        assert_eq!(inputs[2].identifier, "Image_001");
        assert_eq!(inputs[2].name, "Image");
    }

    #[test]
    fn test_resolve_by_name_and_index() {
        let inputs = mix_inputs();
        assert_eq!(SocketRef::from("Image_001").resolve(&inputs).map(|s| s.identifier.as_str()), Some("Image_001"));
        assert_eq!(SocketRef::from("Image").resolve(&inputs).map(|s| s.identifier.as_str()), Some("Image"));
        assert_eq!(SocketRef::from(2).resolve(&inputs).map(|s| s.identifier.as_str()), Some("Image_001"));
        assert!(SocketRef::from(3).resolve(&inputs).is_none());
        assert!(SocketRef::from("Alpha").resolve(&inputs).is_none());
    }

    #[test]
    fn test_idname_round_trip() {
        for kind in [SocketKind::Color, SocketKind::Value, SocketKind::Vector] {
            assert_eq!(SocketKind::from_idname(kind.idname()), kind);
        }
        assert_eq!(SocketKind::from_idname("NodeSocketShader"), SocketKind::Color);
    }
}
