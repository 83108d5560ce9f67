// SPDX-License-Identifier: MIT OR Apache-2.0
//! Motion glow driven by the velocity pass.

use super::{add_viewer, RecipeError, RecipeSummary, Source, RECIPE_ORIGIN_X};
use crate::color::{to_rgba, Rgb};
use hypergrade_graph::{Graph, GraphBuilder, NodeRegistry, PropertyValue};

/// Motion glow parameters
#[derive(Debug, Clone, PartialEq)]
pub struct MotionGlowSettings {
    /// Vector blur factor
    pub intensity: f32,
    /// Glare threshold
    pub threshold: f32,
    /// Glow tint
    pub color: Rgb,
}

impl Default for MotionGlowSettings {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            threshold: 0.1,
            color: [1.0, 0.8, 0.4],
        }
    }
}

/// Vector blur, fog glow glare, tint and an additive mix over the render
pub fn create_motion_glow(graph: &mut Graph, registry: &NodeRegistry, settings: &MotionGlowSettings) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image", "Vector", "Depth"])?;
    let x = RECIPE_ORIGIN_X;
    let mut b = GraphBuilder::new(graph, registry);

    let vector_blur = b.create_node("CompositorNodeVecBlur", [x, 0.0], "Motion Blur")?;
    b.set_property(&vector_blur, "factor", settings.intensity);
    b.set_property(&vector_blur, "samples", 32);
    b.connect(&source.name, "Image", &vector_blur, "Image");
    b.connect(&source.name, "Vector", &vector_blur, "Speed");
    b.connect(&source.name, "Depth", &vector_blur, "Z");

    let glare = b.create_node("CompositorNodeGlare", [x + 250.0, 0.0], "Motion Glow")?;
    b.set_property(&glare, "glare_type", PropertyValue::Enum("FOG_GLOW".into()));
    b.set_property(&glare, "threshold", settings.threshold);
    b.connect(&vector_blur, "Image", &glare, "Image");

    let tint = b.create_node("CompositorNodeMixRGB", [x + 500.0, 0.0], "Color Glow")?;
    b.set_property(&tint, "blend_type", PropertyValue::Enum("MULTIPLY".into()));
    b.set_input_default(&tint, 2, PropertyValue::Color(to_rgba(settings.color)));
    b.connect(&glare, "Image", &tint, 1);

    let final_mix = b.create_node("CompositorNodeMixRGB", [x + 700.0, 0.0], "Apply Glow")?;
    b.set_property(&final_mix, "blend_type", PropertyValue::Enum("ADD".into()));
    b.connect(&source.name, "Image", &final_mix, 1);
    b.connect(&tint, "Image", &final_mix, 2);

    add_viewer(&mut b, &final_mix, "Glow Preview", [x + 900.0, 0.0])?;

    let stats = b.finish();
    tracing::info!("Created motion glow effect: {}", stats);
    Ok(RecipeSummary { stats, output: final_mix })
}
