// SPDX-License-Identifier: MIT OR Apache-2.0
//! Gradient edge detection, neon edge glow and cel outlines.

use super::{add_viewer, RecipeError, RecipeSummary, Source, RECIPE_ORIGIN_X};
use crate::color::{clamp, to_rgba, Rgb};
use crate::{variant_key, UnknownVariant};
use hypergrade_graph::{Graph, GraphBuilder, NodeRegistry, PropertyValue};
use std::str::FromStr;

/// Edge operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeMethod {
    /// Sobel kernels
    #[default]
    Sobel,
    /// Prewitt kernels
    Prewitt,
    /// Laplacian kernel
    Laplacian,
    /// Gaussian blur followed by Sobel
    Canny,
}

impl EdgeMethod {
    /// All methods
    pub const ALL: [EdgeMethod; 4] = [Self::Sobel, Self::Prewitt, Self::Laplacian, Self::Canny];

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sobel => "Sobel",
            Self::Prewitt => "Prewitt",
            Self::Laplacian => "Laplacian",
            Self::Canny => "Canny",
        }
    }

    /// `filter_type` of the convolution nodes
    fn filter_type(&self) -> &'static str {
        match self {
            Self::Sobel | Self::Canny => "SOBEL",
            Self::Prewitt => "PREWITT",
            Self::Laplacian => "LAPLACE",
        }
    }
}

impl FromStr for EdgeMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match variant_key(s).as_str() {
            "SOBEL" => Ok(Self::Sobel),
            "PREWITT" => Ok(Self::Prewitt),
            "LAPLACIAN" | "LAPLACE" => Ok(Self::Laplacian),
            "CANNY" => Ok(Self::Canny),
            _ => Err(UnknownVariant::new("edge method", s)),
        }
    }
}

/// Edge detection parameters
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSettings {
    /// Operator
    pub method: EdgeMethod,
    /// Gradient level where edges start
    pub threshold: f32,
    /// Detect edges in the normal pass instead of the image (not for Canny)
    pub use_normal_pass: bool,
}

impl Default for EdgeSettings {
    fn default() -> Self {
        Self {
            method: EdgeMethod::Sobel,
            threshold: 0.1,
            use_normal_pass: false,
        }
    }
}

/// Grayscale, two convolution filters summed, thresholded by a color ramp.
/// Returns the ramp node.
fn gradient_mask(
    b: &mut GraphBuilder<'_>,
    from: (&str, &str),
    [x, y]: [f32; 2],
    method: EdgeMethod,
    threshold: f32,
) -> Result<String, RecipeError> {
    let gray = b.create_node("CompositorNodeRGBToBW", [x, y], "To Grayscale")?;
    b.connect(from.0, from.1, &gray, "Image");

    let filter_x = b.create_node("CompositorNodeFilter", [x + 200.0, y + 100.0], &format!("{} X", method.label()))?;
    let filter_y = b.create_node("CompositorNodeFilter", [x + 200.0, y - 100.0], &format!("{} Y", method.label()))?;
    for filter in [&filter_x, &filter_y] {
        b.set_property(filter, "filter_type", PropertyValue::Enum(method.filter_type().into()));
        b.connect(&gray, "Val", filter, "Image");
    }

    let sum = b.create_node("CompositorNodeMath", [x + 400.0, y], "Combine Gradients")?;
    b.set_property(&sum, "operation", PropertyValue::Enum("ADD".into()));
    b.connect(&filter_x, "Image", &sum, 0);
    b.connect(&filter_y, "Image", &sum, 1);

    let ramp = b.create_node("CompositorNodeValToRGB", [x + 550.0, y], "Edge Threshold")?;
    let low = clamp(threshold, 0.0, 1.0);
    b.set_property(&ramp, "ramp_positions", PropertyValue::Vector(vec![low, clamp(low + 0.1, 0.0, 1.0)]));
    b.connect(&sum, "Value", &ramp, "Fac");
    Ok(ramp)
}

/// Build an edge mask with a preview viewer. The summary's output is the
/// threshold ramp.
pub fn detect_edges(graph: &mut Graph, registry: &NodeRegistry, settings: &EdgeSettings) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image"])?;
    let input_pass = if settings.use_normal_pass && source.has_pass(graph, "Normal") {
        "Normal"
    } else {
        "Image"
    };
    let x = RECIPE_ORIGIN_X;
    let mut b = GraphBuilder::new(graph, registry);

    let mask = if settings.method == EdgeMethod::Canny {
        let blur = b.create_node("CompositorNodeBlur", [x, 0.0], "Gaussian Blur")?;
        b.set_property(&blur, "size_x", 3);
        b.set_property(&blur, "size_y", 3);
        b.connect(&source.name, "Image", &blur, "Image");
        gradient_mask(&mut b, (blur.as_str(), "Image"), [x + 200.0, 0.0], settings.method, settings.threshold)?
    } else {
        gradient_mask(&mut b, (source.name.as_str(), input_pass), [x, 0.0], settings.method, settings.threshold)?
    };

    add_viewer(&mut b, &mask, "Edge Preview", [x + 600.0, 0.0])?;

    let stats = b.finish();
    tracing::info!("Applied {} edge detection: {}", settings.method.label(), stats);
    Ok(RecipeSummary { stats, output: mask })
}

/// Neon glow parameters
#[derive(Debug, Clone, PartialEq)]
pub struct NeonGlowSettings {
    /// Glow color
    pub color: Rgb,
    /// Glow multiplier
    pub intensity: f32,
    /// Blur radius in pixels
    pub blur_size: i32,
}

impl Default for NeonGlowSettings {
    fn default() -> Self {
        Self {
            color: [0.0, 1.0, 1.0],
            intensity: 2.0,
            blur_size: 20,
        }
    }
}

/// Blurred, tinted edges added over the render
pub fn create_neon_glow(graph: &mut Graph, registry: &NodeRegistry, settings: &NeonGlowSettings) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image"])?;
    let x = RECIPE_ORIGIN_X;
    let mut b = GraphBuilder::new(graph, registry);

    let edges = b.create_node("CompositorNodeFilter", [x, 0.0], "Edge Detect")?;
    b.set_property(&edges, "filter_type", PropertyValue::Enum("SOBEL".into()));
    b.connect(&source.name, "Image", &edges, "Image");

    let blur = b.create_node("CompositorNodeBlur", [x + 200.0, 0.0], "Glow Blur")?;
    b.set_property(&blur, "size_x", settings.blur_size);
    b.set_property(&blur, "size_y", settings.blur_size);
    b.connect(&edges, "Image", &blur, "Image");

    let color = b.create_node("CompositorNodeRGB", [x + 200.0, -200.0], "Neon Color")?;
    b.set_output_default(&color, 0, PropertyValue::Color(to_rgba(settings.color)));

    let colorize = b.create_node("CompositorNodeMixRGB", [x + 400.0, 0.0], "Colorize Glow")?;
    b.set_property(&colorize, "blend_type", PropertyValue::Enum("MULTIPLY".into()));
    b.connect(&blur, "Image", &colorize, "Fac");
    b.connect(&color, "RGBA", &colorize, 2);

    let boost = b.create_node("CompositorNodeMath", [x + 600.0, 0.0], "Intensity")?;
    b.set_property(&boost, "operation", PropertyValue::Enum("MULTIPLY".into()));
    b.set_input_default(&boost, 1, settings.intensity);
    b.connect(&colorize, "Image", &boost, 0);

    let final_mix = b.create_node("CompositorNodeMixRGB", [x + 800.0, 0.0], "Apply Glow")?;
    b.set_property(&final_mix, "blend_type", PropertyValue::Enum("ADD".into()));
    b.connect(&source.name, "Image", &final_mix, 1);
    b.connect(&boost, "Value", &final_mix, 2);

    add_viewer(&mut b, &final_mix, "Neon Preview", [x + 1000.0, 0.0])?;

    let stats = b.finish();
    tracing::info!("Created neon glow: {}", stats);
    Ok(RecipeSummary { stats, output: final_mix })
}

/// Outline parameters
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineSettings {
    /// Line color
    pub color: Rgb,
    /// Line thickness in pixels
    pub thickness: f32,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0],
            thickness: 2.0,
        }
    }
}

/// Dilated edges composited over the render in a flat color
pub fn create_outline(graph: &mut Graph, registry: &NodeRegistry, settings: &OutlineSettings) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image"])?;
    let x = RECIPE_ORIGIN_X;
    let mut b = GraphBuilder::new(graph, registry);

    let edges = b.create_node("CompositorNodeFilter", [x, 0.0], "Edge Detect")?;
    b.set_property(&edges, "filter_type", PropertyValue::Enum("SOBEL".into()));
    b.connect(&source.name, "Image", &edges, "Image");

    let thicken = b.create_node("CompositorNodeDilateErode", [x + 200.0, 0.0], "Thicken")?;
    b.set_property(&thicken, "distance", settings.thickness as i32);
    b.connect(&edges, "Image", &thicken, "Mask");

    let color = b.create_node("CompositorNodeRGB", [x + 200.0, -200.0], "Outline Color")?;
    b.set_output_default(&color, 0, PropertyValue::Color(to_rgba(settings.color)));

    let over = b.create_node("CompositorNodeAlphaOver", [x + 400.0, 0.0], "Composite Outline")?;
    b.connect(&source.name, "Image", &over, 1);
    b.connect(&color, "RGBA", &over, 2);
    b.connect(&thicken, "Mask", &over, "Fac");

    add_viewer(&mut b, &over, "Outline Preview", [x + 600.0, 0.0])?;

    let stats = b.finish();
    tracing::info!("Created outline effect: {}", stats);
    Ok(RecipeSummary { stats, output: over })
}
