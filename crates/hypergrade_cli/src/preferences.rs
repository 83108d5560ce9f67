// SPDX-License-Identifier: MIT OR Apache-2.0
//! User preferences, stored as RON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Current preferences format version
pub const PREFS_FORMAT_VERSION: u32 = 1;

/// Preferences file used when neither `--prefs` nor `HYPERGRADE_PREFS` is set
pub const DEFAULT_PREFS_FILE: &str = "hypergrade.ron";

/// Preset directory used when none is configured
pub const DEFAULT_PRESET_DIR: &str = "./presets";

/// Working color space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorSpace {
    /// Standard RGB
    Srgb,
    /// Scene-linear
    #[default]
    Linear,
    /// ACES
    Aces,
    /// Filmic
    Filmic,
}

impl ColorSpace {
    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Srgb => "sRGB",
            Self::Linear => "Linear",
            Self::Aces => "ACES",
            Self::Filmic => "Filmic",
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ColorSpace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "srgb" => Ok(Self::Srgb),
            "linear" => Ok(Self::Linear),
            "aces" => Ok(Self::Aces),
            "filmic" => Ok(Self::Filmic),
            other => Err(format!("Unknown color space: {other}")),
        }
    }
}

/// Preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Preferences format version
    pub version: u32,
    /// Directory for blueprint and sequence presets; blank means
    /// [`DEFAULT_PRESET_DIR`]
    #[serde(default)]
    pub preset_directory: String,
    /// Path or name of the `ffmpeg` binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    /// Keep the preview viewer updated
    #[serde(default = "default_true")]
    pub live_preview: bool,
    /// Route a recipe's result into the Composite node
    #[serde(default = "default_true")]
    pub auto_connect_passes: bool,
    /// Working color space
    #[serde(default)]
    pub color_space: ColorSpace,
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFS_FORMAT_VERSION,
            preset_directory: String::new(),
            ffmpeg_path: default_ffmpeg_path(),
            live_preview: true,
            auto_connect_passes: true,
            color_space: ColorSpace::default(),
        }
    }
}

impl Preferences {
    /// Load preferences, falling back to defaults when the file is missing
    pub fn load_or_default(path: &Path) -> std::io::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No preferences at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load preferences from a file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let prefs: Preferences = ron::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        if prefs.version > PREFS_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Preferences version {} is newer than supported version {}",
                    prefs.version, PREFS_FORMAT_VERSION
                ),
            ));
        }

        Ok(prefs)
    }

    /// Save preferences to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Effective preset directory
    pub fn preset_dir(&self) -> PathBuf {
        let configured = self.preset_directory.trim();
        if configured.is_empty() {
            PathBuf::from(DEFAULT_PRESET_DIR)
        } else {
            PathBuf::from(configured)
        }
    }

    /// Set one field from its name and a string value
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let parse_bool = |v: &str| match v.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(true),
            "false" | "off" | "no" | "0" => Ok(false),
            other => Err(format!("Expected a boolean, got {other}")),
        };
        match key {
            "preset_directory" => self.preset_directory = value.to_string(),
            "ffmpeg_path" => self.ffmpeg_path = value.to_string(),
            "live_preview" => self.live_preview = parse_bool(value)?,
            "auto_connect_passes" => self.auto_connect_passes = parse_bool(value)?,
            "color_space" => self.color_space = value.parse()?,
            other => return Err(format!("Unknown preference: {other}")),
        }
        Ok(())
    }
}
