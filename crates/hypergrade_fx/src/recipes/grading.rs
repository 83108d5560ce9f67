// SPDX-License-Identifier: MIT OR Apache-2.0
//! Color grading recipes: the full grade stack, color harmony, split toning
//! and look presets. Each routes its result to the preview viewer and the
//! Composite node.

use super::{preview, RecipeError, RecipeSummary, Source, RECIPE_ORIGIN_X};
use crate::color::{clamp, harmony_colors, to_rgba, HarmonyMode, Rgb};
use crate::{variant_key, UnknownVariant};
use hypergrade_graph::{Graph, GraphBuilder, NodeRegistry, PropertyValue};
use std::str::FromStr;

const STACK_SPACING: f32 = 250.0;

/// Stages of the grade stack, left to right
const GRADE_STAGES: [(&str, &str); 7] = [
    ("CompositorNodeExposure", "1. Exposure"),
    ("CompositorNodeMixRGB", "2. White Balance"),
    ("CompositorNodeBrightContrast", "3. Contrast"),
    ("CompositorNodeHueSat", "4. Saturation"),
    ("CompositorNodeColorCorrection", "5. Color Wheels"),
    ("CompositorNodeCurveRGB", "6. Curves"),
    ("CompositorNodeHueSat", "7. Final Adjust"),
];

/// Chain the seven grading stages after the render, all at neutral settings
pub fn create_grade_stack(graph: &mut Graph, registry: &NodeRegistry) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image"])?;
    let mut b = GraphBuilder::new(graph, registry);

    let mut previous = source.name.clone();
    for (i, (type_tag, label)) in GRADE_STAGES.iter().enumerate() {
        let x = RECIPE_ORIGIN_X + i as f32 * STACK_SPACING;
        let node = b.create_node(type_tag, [x, 0.0], label)?;
        if *type_tag == "CompositorNodeMixRGB" {
            // Neutral until a white balance color is dialed in
            b.set_property(&node, "blend_type", PropertyValue::Enum("ADD".into()));
            b.set_input_default(&node, "Fac", 0.0);
        }
        b.connect(&previous, "Image", &node, "Image");
        previous = node;
    }

    preview(&mut b, &previous)?;

    let stats = b.finish();
    tracing::info!("Created grade stack: {}", stats);
    Ok(RecipeSummary { stats, output: previous })
}

/// Color harmony parameters
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonySettings {
    /// Base color the harmony is derived from
    pub base: Rgb,
    /// Color wheel relationship
    pub mode: HarmonyMode,
    /// Mix factor of the graded image over the render
    pub strength: f32,
}

impl Default for HarmonySettings {
    fn default() -> Self {
        Self {
            base: [0.8, 0.4, 0.2],
            mode: HarmonyMode::Complementary,
            strength: 0.5,
        }
    }
}

/// Color balance graded toward a harmony of the base color, mixed over the
/// render. One curves node per harmony color is added as a starting point
/// for manual tweaks.
pub fn create_color_harmony(graph: &mut Graph, registry: &NodeRegistry, settings: &HarmonySettings) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image"])?;
    let colors = harmony_colors(settings.base, settings.mode);
    let x = RECIPE_ORIGIN_X;
    let mut b = GraphBuilder::new(graph, registry);

    for (i, _) in colors.iter().enumerate() {
        let offset = i as f32;
        b.create_node(
            "CompositorNodeCurveRGB",
            [x + offset * STACK_SPACING, -200.0 - offset * 200.0],
            &format!("Harmony Color {}", i + 1),
        )?;
    }

    let balance = b.create_node("CompositorNodeColorBalance", [x, 0.0], "Color Harmony Balance")?;
    let accent = colors.first().copied().unwrap_or([0.5, 0.5, 0.5]);
    b.set_property(&balance, "lift", PropertyValue::Color(to_rgba(settings.base)));
    b.set_property(&balance, "gamma", PropertyValue::Color(to_rgba(accent)));
    b.connect(&source.name, "Image", &balance, "Image");

    let mix = b.create_node("CompositorNodeMixRGB", [x + 500.0, 0.0], "Harmony Mix")?;
    b.set_property(&mix, "blend_type", PropertyValue::Enum("MIX".into()));
    b.set_input_default(&mix, "Fac", settings.strength);
    b.connect(&source.name, "Image", &mix, 1);
    b.connect(&balance, "Image", &mix, 2);

    preview(&mut b, &mix)?;

    let stats = b.finish();
    tracing::info!("Created {} color harmony: {}", settings.mode.label(), stats);
    Ok(RecipeSummary { stats, output: mix })
}

/// Split toning parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SplitToneSettings {
    /// Tint for the shadows
    pub shadow_color: Rgb,
    /// Tint for the highlights
    pub highlight_color: Rgb,
    /// Luminance where shadows turn into highlights
    pub balance: f32,
    /// Overlay factor
    pub strength: f32,
}

impl Default for SplitToneSettings {
    fn default() -> Self {
        Self {
            shadow_color: [0.2, 0.3, 0.5],
            highlight_color: [0.9, 0.7, 0.4],
            balance: 0.5,
            strength: 0.5,
        }
    }
}

/// Luminance-keyed blend of two tints overlaid on the render
pub fn create_split_tone(graph: &mut Graph, registry: &NodeRegistry, settings: &SplitToneSettings) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image"])?;
    let x = RECIPE_ORIGIN_X;
    let mut b = GraphBuilder::new(graph, registry);

    let luminance = b.create_node("CompositorNodeRGBToBW", [x, 200.0], "Luminance")?;
    b.connect(&source.name, "Image", &luminance, "Image");

    let ramp = b.create_node("CompositorNodeValToRGB", [x + 200.0, 200.0], "Split Control")?;
    let stops = vec![
        clamp(settings.balance - 0.2, 0.0, 1.0),
        clamp(settings.balance + 0.2, 0.0, 1.0),
    ];
    b.set_property(&ramp, "ramp_positions", PropertyValue::Vector(stops));
    b.connect(&luminance, "Val", &ramp, "Fac");

    let shadow = b.create_node("CompositorNodeRGB", [x, -100.0], "Shadow Tone")?;
    b.set_output_default(&shadow, 0, PropertyValue::Color(to_rgba(settings.shadow_color)));
    let highlight = b.create_node("CompositorNodeRGB", [x, -300.0], "Highlight Tone")?;
    b.set_output_default(&highlight, 0, PropertyValue::Color(to_rgba(settings.highlight_color)));

    let tone = b.create_node("CompositorNodeMixRGB", [x + 400.0, 0.0], "Tone Mix")?;
    b.set_property(&tone, "blend_type", PropertyValue::Enum("MIX".into()));
    b.connect(&ramp, "Image", &tone, "Fac");
    b.connect(&shadow, "RGBA", &tone, 1);
    b.connect(&highlight, "RGBA", &tone, 2);

    let overlay = b.create_node("CompositorNodeMixRGB", [x + 600.0, 0.0], "Apply Split Tone")?;
    b.set_property(&overlay, "blend_type", PropertyValue::Enum("OVERLAY".into()));
    b.set_input_default(&overlay, "Fac", settings.strength);
    b.connect(&source.name, "Image", &overlay, 1);
    b.connect(&tone, "Image", &overlay, 2);

    preview(&mut b, &overlay)?;

    let stats = b.finish();
    tracing::info!("Created split tone: {}", stats);
    Ok(RecipeSummary { stats, output: overlay })
}

/// One-click looks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookPreset {
    /// Warm lift and gain
    CinematicWarm,
    /// Cool lift and gain
    CinematicCool,
    /// Boosted saturation
    Vibrant,
    /// Muted saturation
    Desaturated,
    /// Warm faded shadows
    Vintage,
    /// High-contrast black and white
    Noir,
}

impl LookPreset {
    /// All presets
    pub const ALL: [LookPreset; 6] = [
        Self::CinematicWarm,
        Self::CinematicCool,
        Self::Vibrant,
        Self::Desaturated,
        Self::Vintage,
        Self::Noir,
    ];

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            Self::CinematicWarm => "Cinematic Warm",
            Self::CinematicCool => "Cinematic Cool",
            Self::Vibrant => "Vibrant",
            Self::Desaturated => "Desaturated",
            Self::Vintage => "Vintage",
            Self::Noir => "Noir",
        }
    }

    /// Lift, gamma and gain for the presets graded through color balance
    fn balance(&self) -> Option<[Rgb; 3]> {
        match self {
            Self::CinematicWarm => Some([[1.0, 0.95, 0.9], [1.0, 0.98, 0.95], [1.05, 1.0, 0.95]]),
            Self::CinematicCool => Some([[0.9, 0.95, 1.0], [0.95, 0.98, 1.0], [0.95, 1.0, 1.05]]),
            Self::Vintage => Some([[1.05, 1.0, 0.95], [1.0, 0.98, 0.95], [1.0, 1.0, 1.0]]),
            _ => None,
        }
    }
}

impl FromStr for LookPreset {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match variant_key(s).as_str() {
            "CINEMATIC_WARM" | "WARM" => Ok(Self::CinematicWarm),
            "CINEMATIC_COOL" | "COOL" => Ok(Self::CinematicCool),
            "VIBRANT" => Ok(Self::Vibrant),
            "DESATURATED" => Ok(Self::Desaturated),
            "VINTAGE" => Ok(Self::Vintage),
            "NOIR" => Ok(Self::Noir),
            _ => Err(UnknownVariant::new("look preset", s)),
        }
    }
}

const LOOK_BALANCE_LABEL: &str = "Look Preset";

/// Apply a look to the render. The color balance looks reuse an existing
/// "Look Preset" node so that switching presets does not stack them.
pub fn apply_look_preset(graph: &mut Graph, registry: &NodeRegistry, preset: LookPreset) -> Result<RecipeSummary, RecipeError> {
    let source = Source::require(graph, &["Image"])?;
    let existing = graph
        .find_by_label(LOOK_BALANCE_LABEL)
        .filter(|n| n.node_type == "CompositorNodeColorBalance")
        .map(|n| n.name.clone());
    let x = RECIPE_ORIGIN_X;
    let mut b = GraphBuilder::new(graph, registry);

    let output = match preset {
        LookPreset::Vibrant | LookPreset::Desaturated => {
            let (label, saturation) = if preset == LookPreset::Vibrant {
                ("Vibrant Sat", 1.3)
            } else {
                ("Desat", 0.6)
            };
            let hue_sat = b.create_node("CompositorNodeHueSat", [x, 0.0], label)?;
            b.set_input_default(&hue_sat, "Saturation", saturation);
            b.connect(&source.name, "Image", &hue_sat, "Image");
            hue_sat
        }
        LookPreset::Noir => {
            let mono = b.create_node("CompositorNodeHueSat", [x, -200.0], "B&W")?;
            b.set_input_default(&mono, "Saturation", 0.0);
            b.connect(&source.name, "Image", &mono, "Image");

            let contrast = b.create_node("CompositorNodeBrightContrast", [x + 200.0, -200.0], "High Contrast")?;
            b.set_input_default(&contrast, "Contrast", 50.0);
            b.connect(&mono, "Image", &contrast, "Image");
            contrast
        }
        _ => {
            let balance = match existing {
                Some(name) => name,
                None => b.create_node("CompositorNodeColorBalance", [x + 200.0, 0.0], LOOK_BALANCE_LABEL)?,
            };
            if let Some([lift, gamma, gain]) = preset.balance() {
                b.set_property(&balance, "lift", PropertyValue::Color(to_rgba(lift)));
                b.set_property(&balance, "gamma", PropertyValue::Color(to_rgba(gamma)));
                b.set_property(&balance, "gain", PropertyValue::Color(to_rgba(gain)));
            }
            b.connect(&source.name, "Image", &balance, "Image");
            balance
        }
    };

    preview(&mut b, &output)?;

    let stats = b.finish();
    tracing::info!("Applied look preset {}: {}", preset.label(), stats);
    Ok(RecipeSummary { stats, output })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::test_support::*;
    use hypergrade_graph::graphs::compositor::{COMPOSITE, VIEWER};
    use hypergrade_graph::{node_depth, SocketRef};

    #[test]
    fn test_grade_stack_order() {
        let registry = registry();
        let mut graph = render_graph(&registry);
        let summary = create_grade_stack(&mut graph, &registry).unwrap();

        // RL + seven stages + viewer + composite
        assert_eq!(graph.node_count(), 10);
        assert_eq!(summary.stats.links_made, 9);
        assert_eq!(graph.node(&summary.output).unwrap().label, "7. Final Adjust");
        assert_eq!(node_depth(&graph, &summary.output), 7);

        let white_balance = graph.find_by_label("2. White Balance").unwrap();
        assert_eq!(white_balance.inputs[0].default_value, Some(PropertyValue::Float(0.0)));
        assert!(graph.is_input_linked(&white_balance.name, "Image"));
        assert!(!graph.is_input_linked(&white_balance.name, "Image_001"));
    }

    #[test]
    fn test_grade_stack_reuses_composite() {
        let registry = registry();
        let mut graph = render_graph(&registry);
        GraphBuilder::new(&mut graph, &registry)
            .create_node(COMPOSITE, [900.0, 0.0], "")
            .unwrap();
        let summary = create_grade_stack(&mut graph, &registry).unwrap();

        let composites = graph.find_by_type(COMPOSITE);
        assert_eq!(composites.len(), 1);
        let link = graph.links_into(&composites[0].name, "Image").next().unwrap();
        assert_eq!(link.from_node, summary.output);
    }

    #[test]
    fn test_color_harmony() {
        let registry = registry();
        let mut graph = render_graph(&registry);
        let settings = HarmonySettings {
            mode: HarmonyMode::Triadic,
            ..HarmonySettings::default()
        };
        let summary = create_color_harmony(&mut graph, &registry, &settings).unwrap();

        assert!(graph.find_by_label("Harmony Color 2").is_some());
        assert!(graph.find_by_label("Harmony Color 3").is_none());

        let balance = graph.find_by_label("Color Harmony Balance").unwrap();
        assert_eq!(balance.property("lift"), Some(&PropertyValue::Color([0.8, 0.4, 0.2, 1.0])));
        let mix = graph.node(&summary.output).unwrap();
        assert_eq!(mix.inputs[0].default_value, Some(PropertyValue::Float(0.5)));
        assert_eq!(graph.find_by_type(VIEWER).len(), 1);
    }

    #[test]
    fn test_split_tone_ramp_is_clamped() {
        let registry = registry();
        let mut graph = render_graph(&registry);
        let settings = SplitToneSettings {
            balance: 0.9,
            ..SplitToneSettings::default()
        };
        let summary = create_split_tone(&mut graph, &registry, &settings).unwrap();
        assert!(summary.stats.is_complete());

        let ramp = graph.find_by_label("Split Control").unwrap();
        let Some(PropertyValue::Vector(stops)) = ramp.property("ramp_positions") else {
            panic!("ramp positions missing");
        };
        assert!((stops[0] - 0.7).abs() < 1e-6);
        assert_eq!(stops[1], 1.0);

        let overlay = graph.node(&summary.output).unwrap();
        assert_eq!(overlay.property("blend_type"), Some(&PropertyValue::Enum("OVERLAY".into())));
    }

    #[test]
    fn test_look_presets_share_balance_node() {
        let registry = registry();
        let mut graph = render_graph(&registry);
        let warm = apply_look_preset(&mut graph, &registry, LookPreset::CinematicWarm).unwrap();
        let cool = apply_look_preset(&mut graph, &registry, LookPreset::CinematicCool).unwrap();

        assert_eq!(warm.output, cool.output);
        assert_eq!(cool.stats.nodes_created, 0);
        let balance = graph.node(&cool.output).unwrap();
        assert_eq!(balance.property("gain"), Some(&PropertyValue::Color([0.95, 1.0, 1.05, 1.0])));
    }

    #[test]
    fn test_noir_look() {
        let registry = registry();
        let mut graph = render_graph(&registry);
        let summary = apply_look_preset(&mut graph, &registry, LookPreset::Noir).unwrap();

        let contrast = graph.node(&summary.output).unwrap();
        let value = contrast.input(&SocketRef::from("Contrast")).unwrap();
        assert_eq!(value.default_value, Some(PropertyValue::Float(50.0)));
        assert_eq!("noir".parse::<LookPreset>(), Ok(LookPreset::Noir));
    }
}
