// SPDX-License-Identifier: MIT OR Apache-2.0
//! Depth-based post fog and volumetric light rays.

use super::{add_viewer, RecipeError, RecipeSummary, Source, RECIPE_ORIGIN_X};
use crate::color::{to_rgba, Rgb};
use crate::{variant_key, UnknownVariant};
use hypergrade_graph::{Graph, GraphBuilder, NodeRegistry, PropertyValue};
use std::str::FromStr;

/// Post fog parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FogSettings {
    /// Fog density, `0.0..=1.0`
    pub density: f32,
    /// Distance where fog starts
    pub start: f32,
    /// Distance where fog reaches full density
    pub end: f32,
    /// Fog color
    pub color: Rgb,
    /// Exponential instead of linear falloff
    pub exponential: bool,
    /// Scatter fog into shadowed areas
    pub affect_shadows: bool,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            density: 0.5,
            start: 5.0,
            end: 25.0,
            color: [0.5, 0.5, 0.6],
            exponential: false,
            affect_shadows: true,
        }
    }
}

/// Named fog presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FogPreset {
    /// Subtle atmospheric mist
    LightMist,
    /// Moderate fog density
    #[default]
    MediumFog,
    /// Dense fog
    HeavyFog,
    /// Long-distance atmospheric haze
    VolumetricHaze,
}

impl FogPreset {
    /// All presets
    pub const ALL: [FogPreset; 4] = [Self::LightMist, Self::MediumFog, Self::HeavyFog, Self::VolumetricHaze];

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            Self::LightMist => "Light Mist",
            Self::MediumFog => "Medium Fog",
            Self::HeavyFog => "Heavy Fog",
            Self::VolumetricHaze => "Volumetric Haze",
        }
    }

    /// Density, start and end of the preset over default settings
    pub fn settings(&self) -> FogSettings {
        let (density, start, end) = match self {
            Self::LightMist => (0.2, 10.0, 50.0),
            Self::MediumFog => (0.5, 5.0, 25.0),
            Self::HeavyFog => (0.8, 2.0, 15.0),
            Self::VolumetricHaze => (0.3, 0.0, 100.0),
        };
        FogSettings {
            density,
            start,
            end,
            ..FogSettings::default()
        }
    }
}

impl FromStr for FogPreset {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match variant_key(s).as_str() {
            "LIGHT_MIST" => Ok(Self::LightMist),
            "MEDIUM_FOG" => Ok(Self::MediumFog),
            "HEAVY_FOG" => Ok(Self::HeavyFog),
            "VOLUMETRIC_HAZE" => Ok(Self::VolumetricHaze),
            _ => Err(UnknownVariant::new("fog preset", s)),
        }
    }
}

/// Build the fog chain: normalized depth mapped into the fog range drives a
/// mix between the render and the fog color.
pub fn apply_post_fog(graph: &mut Graph, registry: &NodeRegistry, settings: &FogSettings) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image", "Depth"])?;
    let scatter = settings.affect_shadows && source.has_pass(graph, "Shadow");
    let x = RECIPE_ORIGIN_X;
    let mut b = GraphBuilder::new(graph, registry);

    let normalize = b.create_node("CompositorNodeNormalize", [x, 0.0], "Normalize Depth")?;
    b.connect(&source.name, "Depth", &normalize, "Value");

    // Depth values depend on the camera; the range is normalized by 100 units
    let map_range = b.create_node("CompositorNodeMapRange", [x + 200.0, 0.0], "Fog Range")?;
    b.set_input_default(&map_range, "From Min", 0.0);
    b.set_input_default(&map_range, "From Max", 1.0);
    b.set_input_default(&map_range, "To Min", settings.start / 100.0);
    b.set_input_default(&map_range, "To Max", settings.end / 100.0);
    b.connect(&normalize, "Value", &map_range, "Value");

    let ramp = b.create_node("CompositorNodeValToRGB", [x + 400.0, 0.0], "Fog Density")?;
    let falloff_end = if settings.exponential { settings.density } else { 1.0 };
    b.set_property(&ramp, "ramp_positions", PropertyValue::Vector(vec![0.0, falloff_end]));
    b.connect(&map_range, "Value", &ramp, "Fac");

    let fog_color = b.create_node("CompositorNodeRGB", [x + 400.0, -200.0], "Fog Color")?;
    b.set_output_default(&fog_color, 0, PropertyValue::Color(to_rgba(settings.color)));

    let fog_mix = b.create_node("CompositorNodeMixRGB", [x + 600.0, 0.0], "Apply Fog")?;
    b.set_property(&fog_mix, "blend_type", PropertyValue::Enum("MIX".into()));
    b.set_input_default(&fog_mix, 0, settings.density);
    b.connect(&source.name, "Image", &fog_mix, 1);
    b.connect(&fog_color, "RGBA", &fog_mix, 2);
    b.connect(&ramp, "Alpha", &fog_mix, "Fac");

    if scatter {
        let invert = b.create_node("CompositorNodeInvert", [x + 600.0, -300.0], "Invert Shadows")?;
        b.connect(&source.name, "Shadow", &invert, "Color");

        let scatter_mix = b.create_node("CompositorNodeMixRGB", [x + 800.0, -300.0], "Shadow Scatter")?;
        b.set_property(&scatter_mix, "blend_type", PropertyValue::Enum("MULTIPLY".into()));
        b.set_input_default(&scatter_mix, 0, 0.3);
        b.connect(&fog_mix, "Image", &scatter_mix, 1);
        b.connect(&invert, "Color", &scatter_mix, 2);
    }

    add_viewer(&mut b, &fog_mix, "Fog Preview", [x + 800.0, 0.0])?;

    let stats = b.finish();
    tracing::info!("Applied post-fog effect: {}", stats);
    Ok(RecipeSummary { stats, output: fog_mix })
}

/// Apply a named fog preset
pub fn apply_fog_preset(graph: &mut Graph, registry: &NodeRegistry, preset: FogPreset) -> Result<RecipeSummary, RecipeError> {
    tracing::info!("Applying fog preset {}", preset.label());
    apply_post_fog(graph, registry, &preset.settings())
}

/// Glare-based light ray parameters
#[derive(Debug, Clone, PartialEq)]
pub struct VolumetricRaysSettings {
    /// Mix factor of the rays over the render
    pub intensity: f32,
    /// Brightness above which pixels emit rays
    pub threshold: f32,
    /// Number of streaks
    pub streaks: i32,
}

impl Default for VolumetricRaysSettings {
    fn default() -> Self {
        Self {
            intensity: 0.3,
            threshold: 0.8,
            streaks: 12,
        }
    }
}

/// Streak glare added over the render
pub fn create_volumetric_rays(
    graph: &mut Graph,
    registry: &NodeRegistry,
    settings: &VolumetricRaysSettings,
) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image"])?;
    let x = RECIPE_ORIGIN_X;
    let mut b = GraphBuilder::new(graph, registry);

    let glare = b.create_node("CompositorNodeGlare", [x, 0.0], "God Rays")?;
    b.set_property(&glare, "glare_type", PropertyValue::Enum("STREAKS".into()));
    b.set_property(&glare, "quality", PropertyValue::Enum("HIGH".into()));
    b.set_property(&glare, "streaks", settings.streaks);
    b.set_property(&glare, "threshold", settings.threshold);
    b.connect(&source.name, "Image", &glare, "Image");

    let mix = b.create_node("CompositorNodeMixRGB", [x + 250.0, 0.0], "Mix Rays")?;
    b.set_property(&mix, "blend_type", PropertyValue::Enum("ADD".into()));
    b.set_input_default(&mix, 0, settings.intensity);
    b.connect(&source.name, "Image", &mix, 1);
    b.connect(&glare, "Image", &mix, 2);

    add_viewer(&mut b, &mix, "Rays Preview", [x + 450.0, 0.0])?;

    let stats = b.finish();
    tracing::info!("Created volumetric rays: {}", stats);
    Ok(RecipeSummary { stats, output: mix })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::test_support::*;
    use hypergrade_graph::SocketRef;

    #[test]
    fn test_fog_chain() {
        let registry = registry();
        let mut graph = render_graph(&registry);
        let summary = apply_post_fog(&mut graph, &registry, &FogSettings::default()).unwrap();

        // RL + normalize, map range, ramp, rgb, mix, invert, scatter, viewer
        assert_eq!(graph.node_count(), 9);
        assert!(summary.stats.is_complete());
        assert_eq!(summary.stats.links_made, 10);

        let mix = graph.node(&summary.output).unwrap();
        assert_eq!(mix.label, "Apply Fog");
        assert_eq!(mix.inputs[0].default_value, Some(PropertyValue::Float(0.5)));
        assert!(graph.is_input_linked(&summary.output, "Fac"));

        let range = graph.find_by_label("Fog Range").unwrap();
        let to_max = range.input(&SocketRef::from("To Max")).unwrap();
        assert_eq!(to_max.default_value, Some(PropertyValue::Float(0.25)));
    }

    #[test]
    fn test_exponential_ramp_and_no_scatter() {
        let registry = registry();
        let mut graph = render_graph(&registry);
        let settings = FogSettings {
            exponential: true,
            affect_shadows: false,
            density: 0.7,
            ..FogSettings::default()
        };
        apply_post_fog(&mut graph, &registry, &settings).unwrap();

        assert!(graph.find_by_label("Shadow Scatter").is_none());
        let ramp = graph.find_by_label("Fog Density").unwrap();
        assert_eq!(ramp.property("ramp_positions"), Some(&PropertyValue::Vector(vec![0.0, 0.7])));
    }

    #[test]
    fn test_fog_needs_depth_before_mutating() {
        let registry = registry();
        let mut graph = image_only_graph();
        let err = apply_post_fog(&mut graph, &registry, &FogSettings::default()).unwrap_err();
        assert!(matches!(err, RecipeError::MissingPass { ref pass, .. } if pass == "Depth"));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_presets() {
        assert_eq!(FogPreset::HeavyFog.settings().density, 0.8);
        assert_eq!(FogPreset::LightMist.settings().end, 50.0);
        assert_eq!("volumetric haze".parse::<FogPreset>(), Ok(FogPreset::VolumetricHaze));

        let registry = registry();
        let mut graph = render_graph(&registry);
        let summary = apply_fog_preset(&mut graph, &registry, FogPreset::LightMist).unwrap();
        let mix = graph.node(&summary.output).unwrap();
        assert_eq!(mix.inputs[0].default_value, Some(PropertyValue::Float(0.2)));
    }

    #[test]
    fn test_volumetric_rays() {
        let registry = registry();
        let mut graph = render_graph(&registry);
        let summary = create_volumetric_rays(&mut graph, &registry, &VolumetricRaysSettings::default()).unwrap();

        let glare = graph.find_by_label("God Rays").unwrap();
        assert_eq!(glare.property("streaks"), Some(&PropertyValue::Int(12)));
        assert_eq!(summary.stats.links_made, 4);
        assert_eq!(graph.node(&summary.output).unwrap().property("blend_type"), Some(&PropertyValue::Enum("ADD".into())));
    }
}
