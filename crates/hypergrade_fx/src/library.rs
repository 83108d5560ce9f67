// SPDX-License-Identifier: MIT OR Apache-2.0
//! Directory-backed preset store.
//!
//! ```text
//! <root>/
//!   blueprints/<name>.json   BlueprintPreset
//!   sequences/<name>.json    SequencePreset
//! ```

use crate::blueprint::{BlueprintError, BlueprintPreset};
use crate::sequence::{SequenceError, SequencePreset};
use std::path::{Path, PathBuf};

const BLUEPRINTS_DIR: &str = "blueprints";
const SEQUENCES_DIR: &str = "sequences";
const PRESET_EXTENSION: &str = "json";

/// Preset kind, one subdirectory each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetKind {
    /// Node-group blueprints
    Blueprint,
    /// Shot sequences
    Sequence,
}

impl PresetKind {
    fn dir_name(&self) -> &'static str {
        match self {
            Self::Blueprint => BLUEPRINTS_DIR,
            Self::Sequence => SEQUENCES_DIR,
        }
    }
}

/// Preset store rooted at the preferences' preset directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetLibrary {
    root: PathBuf,
}

impl PresetLibrary {
    /// Open a library rooted at `root`. Nothing is created until a preset
    /// is saved.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Library root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one kind of preset
    pub fn dir(&self, kind: PresetKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Path a preset with this name is saved to
    pub fn preset_path(&self, kind: PresetKind, name: &str) -> PathBuf {
        self.dir(kind).join(format!("{}.{}", sanitize_file_name(name), PRESET_EXTENSION))
    }

    /// Preset files of one kind, sorted by path. A missing directory is an
    /// empty list.
    pub fn list(&self, kind: PresetKind) -> Result<Vec<PathBuf>, LibraryError> {
        let dir = self.dir(kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            let is_preset = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(PRESET_EXTENSION));
            if is_preset {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Preset names (file stems) of one kind
    pub fn names(&self, kind: PresetKind) -> Result<Vec<String>, LibraryError> {
        Ok(self
            .list(kind)?
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect())
    }

    /// Resolve a preset by name or by path
    pub fn find(&self, kind: PresetKind, name_or_path: &str) -> Result<PathBuf, LibraryError> {
        let direct = Path::new(name_or_path);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }
        let path = self.preset_path(kind, name_or_path);
        if path.is_file() {
            Ok(path)
        } else {
            Err(LibraryError::NotFound(name_or_path.to_string()))
        }
    }

    fn prepare(&self, kind: PresetKind, name: &str) -> Result<PathBuf, LibraryError> {
        std::fs::create_dir_all(self.dir(kind))?;
        Ok(self.preset_path(kind, name))
    }

    /// Save a blueprint preset. Returns the file written.
    pub fn save_blueprint(&self, preset: &BlueprintPreset) -> Result<PathBuf, LibraryError> {
        let path = self.prepare(PresetKind::Blueprint, &preset.name)?;
        preset.save(&path)?;
        tracing::info!("Saved blueprint preset to {}", path.display());
        Ok(path)
    }

    /// Load a blueprint preset by name or path
    pub fn load_blueprint(&self, name_or_path: &str) -> Result<BlueprintPreset, LibraryError> {
        let path = self.find(PresetKind::Blueprint, name_or_path)?;
        Ok(BlueprintPreset::load(&path)?)
    }

    /// Save a sequence preset. Returns the file written.
    pub fn save_sequence(&self, preset: &SequencePreset) -> Result<PathBuf, LibraryError> {
        let path = self.prepare(PresetKind::Sequence, &preset.name)?;
        preset.save(&path)?;
        tracing::info!("Saved sequence preset to {}", path.display());
        Ok(path)
    }

    /// Load a sequence preset by name or path
    pub fn load_sequence(&self, name_or_path: &str) -> Result<SequencePreset, LibraryError> {
        let path = self.find(PresetKind::Sequence, name_or_path)?;
        Ok(SequencePreset::load(&path)?)
    }
}

/// File stem for a preset name: letters, digits, `-` and `_` are kept,
/// everything else becomes `_`
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if sanitized.is_empty() {
        "preset".to_string()
    } else {
        sanitized
    }
}

/// Preset store failure
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// No preset with that name or path
    #[error("Preset not found: {0}")]
    NotFound(String),

    /// File I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory scan failed
    #[error("Cannot scan preset directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Blueprint preset could not be read or written
    #[error(transparent)]
    Blueprint(#[from] BlueprintError),

    /// Sequence preset could not be read or written
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}
