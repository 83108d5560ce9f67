// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compositing recipes and scene-level tooling for `HyperGradeFX`.
//!
//! This crate provides everything built on top of the node graph core:
//! - Recipes that assemble fog, glow, edge, grading and distortion setups
//! - Shot-level sequences with their own compositor captures
//! - Node-group blueprints and a directory-backed preset library
//! - An `ffmpeg` front end for encoding rendered frames
//!
//! ## Architecture
//!
//! A [`Scene`] owns the compositor graph together with its node-group
//! library, frame range, sequences and blueprints. Recipes operate on a bare
//! [`hypergrade_graph::Graph`] and never touch the rest of the scene.

pub mod blueprint;
pub mod color;
pub mod encoder;
pub mod library;
pub mod recipes;
pub mod scene;
pub mod sequence;

pub use blueprint::{Blueprint, BlueprintApplied, BlueprintCategory, BlueprintError, BlueprintId, BlueprintLibrary, BlueprintPreset};
pub use encoder::{EncodeJob, EncoderError, FfmpegEncoder, ProxyResolution, Quality, VideoCodec};
pub use library::{LibraryError, PresetKind, PresetLibrary};
pub use recipes::{RecipeError, RecipeSummary};
pub use scene::{Scene, SceneError};
pub use sequence::{RenderJob, Sequence, SequenceError, SequenceId, SequenceManager, SequencePreset};

/// A name that matches none of an enum's variants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// What was being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Normalize a user-supplied variant name: `"split-complementary"` and
/// `"Split Complementary"` both become `"SPLIT_COMPLEMENTARY"`.
pub(crate) fn variant_key(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c.to_ascii_uppercase() })
        .collect()
}
