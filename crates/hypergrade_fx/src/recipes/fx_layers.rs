// SPDX-License-Identifier: MIT OR Apache-2.0
//! Distortion layers: heat haze, shockwave, chromatic aberration and lens
//! distortion.

use super::{add_viewer, RecipeError, RecipeSummary, Source, RECIPE_ORIGIN_X};
use hypergrade_graph::{Graph, GraphBuilder, NodeRegistry, PropertyValue};

/// Heat haze parameters
#[derive(Debug, Clone, PartialEq)]
pub struct HeatHazeSettings {
    /// Displacement scale
    pub strength: f32,
    /// Noise texture scale
    pub scale: f32,
}

impl Default for HeatHazeSettings {
    fn default() -> Self {
        Self {
            strength: 0.05,
            scale: 5.0,
        }
    }
}

/// Render displaced by a noise texture
pub fn create_heat_haze(graph: &mut Graph, registry: &NodeRegistry, settings: &HeatHazeSettings) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image"])?;
    let x = RECIPE_ORIGIN_X;
    let mut b = GraphBuilder::new(graph, registry);

    let noise = b.create_node("CompositorNodeTexture", [x, -200.0], "Heat Pattern")?;
    b.set_input_default(&noise, "Scale", PropertyValue::Vector(vec![settings.scale; 3]));

    let displace = b.create_node("CompositorNodeDisplace", [x + 250.0, 0.0], "Heat Distortion")?;
    b.set_input_default(&displace, "X Scale", settings.strength);
    b.set_input_default(&displace, "Y Scale", settings.strength);
    b.connect(&source.name, "Image", &displace, "Image");
    b.connect(&noise, "Color", &displace, "Vector");

    add_viewer(&mut b, &displace, "Haze Preview", [x + 500.0, 0.0])?;

    let stats = b.finish();
    tracing::info!("Created heat haze: {}", stats);
    Ok(RecipeSummary { stats, output: displace })
}

/// Shockwave parameters; center and radius are in frame-relative units
#[derive(Debug, Clone, PartialEq)]
pub struct ShockwaveSettings {
    /// Horizontal center
    pub center_x: f32,
    /// Vertical center
    pub center_y: f32,
    /// Ring radius
    pub radius: f32,
    /// Displacement scale
    pub strength: f32,
}

impl Default for ShockwaveSettings {
    fn default() -> Self {
        Self {
            center_x: 0.5,
            center_y: 0.5,
            radius: 0.3,
            strength: 0.5,
        }
    }
}

/// Render displaced by a blurred ellipse ring
pub fn create_shockwave(graph: &mut Graph, registry: &NodeRegistry, settings: &ShockwaveSettings) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image"])?;
    let x = RECIPE_ORIGIN_X;
    let mut b = GraphBuilder::new(graph, registry);

    let mask = b.create_node("CompositorNodeEllipseMask", [x, -200.0], "Shockwave Mask")?;
    b.set_property(&mask, "x", settings.center_x);
    b.set_property(&mask, "y", settings.center_y);
    b.set_property(&mask, "width", settings.radius);
    b.set_property(&mask, "height", settings.radius);

    let blur = b.create_node("CompositorNodeBlur", [x + 200.0, -200.0], "Wave Blur")?;
    let size = (settings.radius * 100.0) as i32;
    b.set_property(&blur, "size_x", size);
    b.set_property(&blur, "size_y", size);
    b.connect(&mask, "Mask", &blur, "Image");

    let displace = b.create_node("CompositorNodeDisplace", [x + 400.0, 0.0], "Shockwave Displace")?;
    b.set_input_default(&displace, "X Scale", settings.strength);
    b.set_input_default(&displace, "Y Scale", settings.strength);
    b.connect(&source.name, "Image", &displace, "Image");
    b.connect(&blur, "Image", &displace, "Vector");

    add_viewer(&mut b, &displace, "Shockwave Preview", [x + 600.0, 0.0])?;

    let stats = b.finish();
    tracing::info!("Created shockwave: {}", stats);
    Ok(RecipeSummary { stats, output: displace })
}

/// Red and blue channels shifted apart horizontally by `strength` (fraction
/// of the frame, scaled to transform units)
pub fn create_chromatic_aberration(graph: &mut Graph, registry: &NodeRegistry, strength: f32) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image"])?;
    let x = RECIPE_ORIGIN_X;
    let shift = strength * 10.0;
    let mut b = GraphBuilder::new(graph, registry);

    let separate = b.create_node("CompositorNodeSeparateColor", [x, 0.0], "Separate RGB")?;
    b.connect(&source.name, "Image", &separate, "Image");

    let red = b.create_node("CompositorNodeTransform", [x + 200.0, 200.0], "Red Shift")?;
    b.set_input_default(&red, "X", -shift);
    b.connect(&separate, "Red", &red, "Image");

    let blue = b.create_node("CompositorNodeTransform", [x + 200.0, -200.0], "Blue Shift")?;
    b.set_input_default(&blue, "X", shift);
    b.connect(&separate, "Blue", &blue, "Image");

    let combine = b.create_node("CompositorNodeCombineColor", [x + 400.0, 0.0], "Combine RGB")?;
    b.connect(&red, "Image", &combine, "Red");
    b.connect(&separate, "Green", &combine, "Green");
    b.connect(&blue, "Image", &combine, "Blue");

    add_viewer(&mut b, &combine, "Aberration Preview", [x + 600.0, 0.0])?;

    let stats = b.finish();
    tracing::info!("Created chromatic aberration: {}", stats);
    Ok(RecipeSummary { stats, output: combine })
}

/// Lens distortion parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LensDistortionSettings {
    /// Barrel (negative) or pincushion (positive) distortion
    pub distortion: f32,
    /// Channel dispersion
    pub dispersion: f32,
}

/// Lens distortion node after the render
pub fn create_lens_distortion(
    graph: &mut Graph,
    registry: &NodeRegistry,
    settings: &LensDistortionSettings,
) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image"])?;
    let x = RECIPE_ORIGIN_X;
    let mut b = GraphBuilder::new(graph, registry);

    let lens = b.create_node("CompositorNodeLensdist", [x, 0.0], "Lens Distortion")?;
    b.set_input_default(&lens, "Distort", settings.distortion);
    b.set_input_default(&lens, "Dispersion", settings.dispersion);
    b.connect(&source.name, "Image", &lens, "Image");

    add_viewer(&mut b, &lens, "Distortion Preview", [x + 250.0, 0.0])?;

    let stats = b.finish();
    tracing::info!("Created lens distortion: {}", stats);
    Ok(RecipeSummary { stats, output: lens })
}
