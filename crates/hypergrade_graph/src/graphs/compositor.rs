// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compositor node catalog.
//!
//! Socket layouts and property defaults mirror the host compositor's nodes
//! closely enough for recipes and snapshots to resolve sockets by name.

use crate::graph::PRIMARY_INPUT_TYPE;
use crate::node::{NodeCategory, NodeRegistry, NodeType};
use crate::property::PropertyValue;
use crate::snapshot::{GROUP_INPUT_TYPE, GROUP_OUTPUT_TYPE};
use crate::socket::{Socket, SocketKind};

/// Composite output node type
pub const COMPOSITE: &str = "CompositorNodeComposite";
/// Viewer node type
pub const VIEWER: &str = "CompositorNodeViewer";
/// Node group instance type
pub const GROUP: &str = "CompositorNodeGroup";
/// Frame node type
pub const FRAME: &str = "NodeFrame";

fn color_in(name: &str) -> Socket {
    Socket::input(name, SocketKind::Color).with_default(PropertyValue::Color([1.0, 1.0, 1.0, 1.0]))
}

fn value_in(name: &str, default: f32) -> Socket {
    Socket::input(name, SocketKind::Value).with_default(default)
}

fn image_out() -> Socket {
    Socket::output("Image", SocketKind::Color)
}

fn enum_value(value: &str) -> PropertyValue {
    PropertyValue::Enum(value.to_string())
}

/// A node with one `Image` input and one `Image` output
fn image_filter(id: &str, name: &str, category: NodeCategory) -> NodeType {
    NodeType::new(id, name, category)
        .with_inputs(vec![color_in("Image")])
        .with_outputs(vec![image_out()])
}

/// Create the compositor node registry with all available node types
pub fn create_compositor_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    // ========================================================================
    // Input / Output
    // ========================================================================

    registry.register(
        NodeType::new(PRIMARY_INPUT_TYPE, "Render Layers", NodeCategory::Input)
            .with_description("Render passes of the active view layer")
            .with_outputs(vec![
                image_out(),
                Socket::output("Alpha", SocketKind::Value),
                Socket::output("Depth", SocketKind::Value),
                Socket::output("Normal", SocketKind::Vector),
                Socket::output("Vector", SocketKind::Vector),
                Socket::output("Shadow", SocketKind::Color),
                Socket::output("AO", SocketKind::Color),
                Socket::output("Mist", SocketKind::Value),
                Socket::output("Emit", SocketKind::Color),
                Socket::output("DiffCol", SocketKind::Color),
                Socket::output("GlossCol", SocketKind::Color),
            ])
            .with_property("layer", PropertyValue::String("ViewLayer".into()))
            .with_size(240.0, 320.0),
    );

    registry.register(
        NodeType::new("CompositorNodeRGB", "RGB", NodeCategory::Input)
            .with_description("Constant color")
            .with_outputs(vec![Socket::output("RGBA", SocketKind::Color)
                .with_default(PropertyValue::Color([0.5, 0.5, 0.5, 1.0]))]),
    );

    registry.register(
        NodeType::new(COMPOSITE, "Composite", NodeCategory::Output)
            .with_description("Final render output")
            .with_inputs(vec![color_in("Image"), value_in("Alpha", 1.0)])
            .with_property("use_alpha", true),
    );

    registry.register(
        NodeType::new(VIEWER, "Viewer", NodeCategory::Output)
            .with_description("Backdrop preview")
            .with_inputs(vec![color_in("Image"), value_in("Alpha", 1.0)])
            .with_property("use_alpha", true),
    );

    // ========================================================================
    // Color
    // ========================================================================

    registry.register(
        NodeType::new("CompositorNodeMixRGB", "Mix", NodeCategory::Color)
            .with_description("Blend two images")
            .with_inputs(vec![value_in("Fac", 1.0), color_in("Image"), color_in("Image")])
            .with_outputs(vec![image_out()])
            .with_property("blend_type", enum_value("MIX"))
            .with_property("use_alpha", false)
            .with_property("use_clamp", false),
    );

    registry.register(
        NodeType::new("CompositorNodeAlphaOver", "Alpha Over", NodeCategory::Color)
            .with_inputs(vec![value_in("Fac", 1.0), color_in("Image"), color_in("Image")])
            .with_outputs(vec![image_out()])
            .with_property("premul", 0.0),
    );

    registry.register(
        NodeType::new("CompositorNodeColorBalance", "Color Balance", NodeCategory::Color)
            .with_description("Lift/gamma/gain or offset/power/slope correction")
            .with_inputs(vec![value_in("Fac", 1.0), color_in("Image")])
            .with_outputs(vec![image_out()])
            .with_property("correction_method", enum_value("LIFT_GAMMA_GAIN"))
            .with_property("lift", PropertyValue::Color([1.0, 1.0, 1.0, 1.0]))
            .with_property("gamma", PropertyValue::Color([1.0, 1.0, 1.0, 1.0]))
            .with_property("gain", PropertyValue::Color([1.0, 1.0, 1.0, 1.0]))
            .with_size(400.0, 300.0),
    );

    registry.register(
        NodeType::new("CompositorNodeColorCorrection", "Color Correction", NodeCategory::Color)
            .with_inputs(vec![color_in("Image"), value_in("Mask", 1.0)])
            .with_outputs(vec![image_out()])
            .with_property("master_saturation", 1.0)
            .with_property("master_contrast", 1.0)
            .with_property("master_gamma", 1.0)
            .with_property("master_gain", 1.0)
            .with_property("master_lift", 0.0)
            .with_size(400.0, 400.0),
    );

    registry.register(
        NodeType::new("CompositorNodeHueSat", "Hue Saturation Value", NodeCategory::Color)
            .with_inputs(vec![
                color_in("Image"),
                value_in("Hue", 0.5),
                value_in("Saturation", 1.0),
                value_in("Value", 1.0),
                value_in("Fac", 1.0),
            ])
            .with_outputs(vec![image_out()]),
    );

    registry.register(
        NodeType::new("CompositorNodeBrightContrast", "Bright/Contrast", NodeCategory::Color)
            .with_inputs(vec![color_in("Image"), value_in("Bright", 0.0), value_in("Contrast", 0.0)])
            .with_outputs(vec![image_out()])
            .with_property("use_premultiply", true),
    );

    registry.register(
        NodeType::new("CompositorNodeExposure", "Exposure", NodeCategory::Color)
            .with_inputs(vec![color_in("Image"), value_in("Exposure", 0.0)])
            .with_outputs(vec![image_out()]),
    );

    registry.register(
        NodeType::new("CompositorNodeCurveRGB", "RGB Curves", NodeCategory::Color)
            .with_inputs(vec![
                value_in("Fac", 1.0),
                color_in("Image"),
                Socket::input("Black Level", SocketKind::Color).with_default(PropertyValue::Color([0.0, 0.0, 0.0, 1.0])),
                color_in("White Level"),
            ])
            .with_outputs(vec![image_out()])
            .with_size(240.0, 300.0),
    );

    registry.register(
        NodeType::new("CompositorNodeInvert", "Invert", NodeCategory::Color)
            .with_inputs(vec![value_in("Fac", 1.0), color_in("Color")])
            .with_outputs(vec![Socket::output("Color", SocketKind::Color)])
            .with_property("invert_rgb", true)
            .with_property("invert_alpha", false),
    );

    // ========================================================================
    // Converter
    // ========================================================================

    registry.register(
        NodeType::new("CompositorNodeMath", "Math", NodeCategory::Converter)
            .with_inputs(vec![value_in("Value", 0.5), value_in("Value", 0.5), value_in("Value", 0.5)])
            .with_outputs(vec![Socket::output("Value", SocketKind::Value)])
            .with_property("operation", enum_value("ADD"))
            .with_property("use_clamp", false),
    );

    registry.register(
        NodeType::new("CompositorNodeRGBToBW", "RGB to BW", NodeCategory::Converter)
            .with_inputs(vec![color_in("Image")])
            .with_outputs(vec![Socket::output("Val", SocketKind::Value)]),
    );

    registry.register(
        NodeType::new("CompositorNodeValToRGB", "Color Ramp", NodeCategory::Converter)
            .with_inputs(vec![value_in("Fac", 0.5)])
            .with_outputs(vec![image_out(), Socket::output("Alpha", SocketKind::Value)])
            .with_property("ramp_positions", PropertyValue::Vector(vec![0.0, 1.0]))
            .with_property("interpolation", enum_value("LINEAR"))
            .with_size(240.0, 200.0),
    );

    registry.register(
        NodeType::new("CompositorNodeSeparateColor", "Separate Color", NodeCategory::Converter)
            .with_inputs(vec![color_in("Image")])
            .with_outputs(vec![
                Socket::output("Red", SocketKind::Value),
                Socket::output("Green", SocketKind::Value),
                Socket::output("Blue", SocketKind::Value),
                Socket::output("Alpha", SocketKind::Value),
            ])
            .with_property("mode", enum_value("RGB")),
    );

    registry.register(
        NodeType::new("CompositorNodeCombineColor", "Combine Color", NodeCategory::Converter)
            .with_inputs(vec![
                value_in("Red", 0.0),
                value_in("Green", 0.0),
                value_in("Blue", 0.0),
                value_in("Alpha", 1.0),
            ])
            .with_outputs(vec![image_out()])
            .with_property("mode", enum_value("RGB")),
    );

    registry.register(
        NodeType::new("CompositorNodeMapRange", "Map Range", NodeCategory::Vector)
            .with_inputs(vec![
                value_in("Value", 1.0),
                value_in("From Min", 0.0),
                value_in("From Max", 1.0),
                value_in("To Min", 0.0),
                value_in("To Max", 1.0),
            ])
            .with_outputs(vec![Socket::output("Value", SocketKind::Value)])
            .with_property("use_clamp", false),
    );

    registry.register(
        NodeType::new("CompositorNodeNormalize", "Normalize", NodeCategory::Vector)
            .with_inputs(vec![value_in("Value", 1.0)])
            .with_outputs(vec![Socket::output("Value", SocketKind::Value)]),
    );

    // ========================================================================
    // Filter
    // ========================================================================

    registry.register(
        NodeType::new("CompositorNodeBlur", "Blur", NodeCategory::Filter)
            .with_inputs(vec![color_in("Image"), value_in("Size", 1.0)])
            .with_outputs(vec![image_out()])
            .with_property("filter_type", enum_value("GAUSS"))
            .with_property("size_x", 0)
            .with_property("size_y", 0)
            .with_property("use_relative", false),
    );

    registry.register(
        NodeType::new("CompositorNodeFilter", "Filter", NodeCategory::Filter)
            .with_description("Convolution filters (soften, sharpen, edge kernels)")
            .with_inputs(vec![value_in("Fac", 1.0), color_in("Image")])
            .with_outputs(vec![image_out()])
            .with_property("filter_type", enum_value("SOFTEN")),
    );

    registry.register(
        image_filter("CompositorNodeGlare", "Glare", NodeCategory::Filter)
            .with_property("glare_type", enum_value("STREAKS"))
            .with_property("quality", enum_value("MEDIUM"))
            .with_property("threshold", 1.0)
            .with_property("streaks", 4)
            .with_property("size", 8)
            .with_property("mix", 0.0),
    );

    registry.register(
        NodeType::new("CompositorNodeVecBlur", "Vector Blur", NodeCategory::Filter)
            .with_inputs(vec![
                color_in("Image"),
                value_in("Z", 0.0),
                Socket::input("Speed", SocketKind::Vector),
            ])
            .with_outputs(vec![image_out()])
            .with_property("factor", 0.25)
            .with_property("samples", 32),
    );

    registry.register(
        NodeType::new("CompositorNodeDilateErode", "Dilate/Erode", NodeCategory::Filter)
            .with_inputs(vec![value_in("Mask", 0.0)])
            .with_outputs(vec![Socket::output("Mask", SocketKind::Value)])
            .with_property("mode", enum_value("STEP"))
            .with_property("distance", 0),
    );

    // ========================================================================
    // Distort / Matte
    // ========================================================================

    registry.register(
        NodeType::new("CompositorNodeLensdist", "Lens Distortion", NodeCategory::Distort)
            .with_inputs(vec![color_in("Image"), value_in("Distort", 0.0), value_in("Dispersion", 0.0)])
            .with_outputs(vec![image_out()])
            .with_property("use_projector", false)
            .with_property("use_jitter", false)
            .with_property("use_fit", false),
    );

    registry.register(
        NodeType::new("CompositorNodeTransform", "Transform", NodeCategory::Distort)
            .with_inputs(vec![
                color_in("Image"),
                value_in("X", 0.0),
                value_in("Y", 0.0),
                value_in("Angle", 0.0),
                value_in("Scale", 1.0),
            ])
            .with_outputs(vec![image_out()])
            .with_property("filter_type", enum_value("BILINEAR")),
    );

    registry.register(
        NodeType::new("CompositorNodeDisplace", "Displace", NodeCategory::Distort)
            .with_inputs(vec![
                color_in("Image"),
                Socket::input("Vector", SocketKind::Vector),
                value_in("X Scale", 0.0),
                value_in("Y Scale", 0.0),
            ])
            .with_outputs(vec![image_out()]),
    );

    registry.register(
        NodeType::new("CompositorNodeTexture", "Texture", NodeCategory::Input)
            .with_inputs(vec![
                Socket::input("Offset", SocketKind::Vector),
                Socket::input("Scale", SocketKind::Vector),
            ])
            .with_outputs(vec![
                Socket::output("Value", SocketKind::Value),
                Socket::output("Color", SocketKind::Color),
            ])
            .with_property("texture", PropertyValue::String(String::new())),
    );

    registry.register(
        NodeType::new("CompositorNodeEllipseMask", "Ellipse Mask", NodeCategory::Matte)
            .with_inputs(vec![value_in("Mask", 0.0), value_in("Value", 1.0)])
            .with_outputs(vec![Socket::output("Mask", SocketKind::Value)])
            .with_property("x", 0.5)
            .with_property("y", 0.5)
            .with_property("width", 0.2)
            .with_property("height", 0.1)
            .with_property("mask_type", enum_value("ADD")),
    );

    // ========================================================================
    // Layout / Groups
    // ========================================================================

    registry.register(
        NodeType::new(FRAME, "Frame", NodeCategory::Layout)
            .with_property("shrink", true)
            .with_size(300.0, 200.0),
    );

    registry.register(
        NodeType::new(GROUP, "Group", NodeCategory::Group)
            .with_description("Instance of a node group; sockets mirror the group's ports")
            .with_property("node_tree", PropertyValue::String(String::new())),
    );

    registry.register(NodeType::new(GROUP_INPUT_TYPE, "Group Input", NodeCategory::Group));
    registry.register(NodeType::new(GROUP_OUTPUT_TYPE, "Group Output", NodeCategory::Group));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SERIALIZED_PROPERTIES;

    #[test]
    fn test_catalog_contents() {
        let registry = create_compositor_registry();
        assert!(registry.contains(PRIMARY_INPUT_TYPE));
        assert!(registry.contains(COMPOSITE));
        assert!(registry.contains(VIEWER));

        let mix = registry.get("CompositorNodeMixRGB").unwrap();
        let identifiers: Vec<_> = mix.inputs.iter().map(|s| s.identifier.as_str()).collect();
        assert_eq!(identifiers, vec!["Fac", "Image", "Image_001"]);

        let math = registry.get("CompositorNodeMath").unwrap();
        assert_eq!(math.inputs[2].identifier, "Value_002");
    }

    #[test]
    fn test_serialized_properties_are_declared_somewhere() {
        let registry = create_compositor_registry();
        for key in SERIALIZED_PROPERTIES {
            assert!(registry.types().any(|t| t.properties.contains_key(key)), "{key} is never declared");
        }
    }
}
