// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dynamic node property values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Open, insertion-ordered property bag of a node
pub type PropertyBag = IndexMap<String, PropertyValue>;

/// Value that can be stored in a node property or a socket default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// Arbitrary-length float vector (ramp stops, 2D/3D vectors)
    Vector(Vec<f32>),
    /// Color (RGBA)
    Color([f32; 4]),
    /// Enum identifier such as a blend mode (`"MULTIPLY"`)
    Enum(String),
    /// Free-form string
    String(String),
}

impl PropertyValue {
    /// Get the value as a string slice, for enum and string values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Enum(s) | Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a float, converting integers
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// Get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether `other` may replace this value without changing its kind.
    ///
    /// Enum and string values are interchangeable, as are integers and floats.
    pub fn same_kind(&self, other: &PropertyValue) -> bool {
        matches!(
            (self, other),
            (Self::Bool(_), Self::Bool(_))
                | (Self::Int(_) | Self::Float(_), Self::Int(_) | Self::Float(_))
                | (Self::Vector(_), Self::Vector(_))
                | (Self::Color(_), Self::Color(_))
                | (Self::Enum(_) | Self::String(_), Self::Enum(_) | Self::String(_))
        )
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value as f32)
    }
}

impl From<[f32; 4]> for PropertyValue {
    fn from(value: [f32; 4]) -> Self {
        Self::Color(value)
    }
}

impl From<Vec<f32>> for PropertyValue {
    fn from(value: Vec<f32>) -> Self {
        Self::Vector(value)
    }
}
