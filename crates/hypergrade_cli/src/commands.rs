// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subcommands and their handlers.

use crate::preferences::Preferences;
use anyhow::{anyhow, bail, Context as _, Result};
use clap::Subcommand;
use hypergrade_fx::color::{HarmonyMode, Rgb};
use hypergrade_fx::recipes::edges::{self, EdgeMethod, EdgeSettings, NeonGlowSettings, OutlineSettings};
use hypergrade_fx::recipes::fog::{self, FogPreset, VolumetricRaysSettings};
use hypergrade_fx::recipes::fx_layers::{self, HeatHazeSettings, LensDistortionSettings, ShockwaveSettings};
use hypergrade_fx::recipes::glow::{self, MotionGlowSettings};
use hypergrade_fx::recipes::grading::{self, HarmonySettings, LookPreset, SplitToneSettings};
use hypergrade_fx::recipes::{connect_to_composite, RecipeError, RecipeSummary};
use hypergrade_fx::{
    BlueprintCategory, EncodeJob, FfmpegEncoder, PresetKind, PresetLibrary, ProxyResolution, Quality, Scene,
    VideoCodec,
};
use hypergrade_graph::graphs::compositor::create_compositor_registry;
use hypergrade_graph::{depths, layout, ApplyMode, Graph, GraphBuilder, LayoutParams, NodeRegistry, Snapshot};
use std::path::{Path, PathBuf};

/// Parse `r,g,b` into a color
pub fn parse_rgb(s: &str) -> Result<Rgb, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [r, g, b] => Ok([*r, *g, *b]),
        _ => Err(format!("Expected three comma-separated components, got {}", parts.len())),
    }
}

/// Top-level subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a scene file
    New {
        /// Scene file to write
        scene: PathBuf,
        /// Scene name (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,
        /// Start with an empty graph instead of render layers -> composite
        #[arg(long)]
        empty: bool,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show a scene's graph, node groups, sequences and blueprints
    Info {
        /// Scene file
        scene: PathBuf,
    },

    /// Arrange nodes in columns by depth
    Layout {
        /// Scene file
        scene: PathBuf,
        /// X of the first column
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        start_x: f32,
        /// Y of the first row
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        start_y: f32,
        /// Distance between columns
        #[arg(long, default_value_t = 300.0)]
        spacing_x: f32,
        /// Distance between rows
        #[arg(long, default_value_t = 200.0)]
        spacing_y: f32,
    },

    /// Build a compositing recipe into the scene graph
    Fx {
        /// Scene file
        scene: PathBuf,
        /// Recipe to run
        #[command(subcommand)]
        recipe: Recipe,
    },

    /// Export or import graph snapshots
    Snapshot {
        /// Snapshot action
        #[command(subcommand)]
        action: SnapshotAction,
    },

    /// Manage node-group blueprints
    Blueprint {
        /// Blueprint action
        #[command(subcommand)]
        action: BlueprintAction,
    },

    /// Manage shot sequences
    Sequence {
        /// Sequence action
        #[command(subcommand)]
        action: SequenceAction,
    },

    /// List presets in the preset directory
    Presets,

    /// Encode an image sequence with ffmpeg
    Encode {
        /// Input pattern such as `frames/frame_%04d.png`
        input: String,
        /// Output video
        output: PathBuf,
        /// h264, h265, prores or dnxhd
        #[arg(long, default_value = "h264")]
        codec: VideoCodec,
        /// high, medium or low
        #[arg(long, default_value = "high")]
        quality: Quality,
        /// Frames per second
        #[arg(long, default_value_t = 24)]
        fps: u32,
        /// Number of the first frame
        #[arg(long, default_value_t = 1)]
        start: u32,
        /// Print the ffmpeg arguments without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Create a downscaled preview copy of a video
    Proxy {
        /// Input video
        input: PathBuf,
        /// Output video
        output: PathBuf,
        /// 360p, 480p, 720p or 1080p
        #[arg(long, default_value = "720p")]
        resolution: ProxyResolution,
        /// Print the ffmpeg arguments without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show or change preferences
    Prefs {
        /// Preferences action
        #[command(subcommand)]
        action: PrefsAction,
    },
}

/// Recipes runnable through `fx`
#[derive(Debug, Clone, Subcommand)]
pub enum Recipe {
    /// Depth-based post fog
    Fog {
        /// Light-mist, medium-fog, heavy-fog or volumetric-haze
        #[arg(long)]
        preset: Option<FogPreset>,
        /// Fog density
        #[arg(long)]
        density: Option<f32>,
        /// Distance where fog starts
        #[arg(long)]
        start: Option<f32>,
        /// Distance of full density
        #[arg(long)]
        end: Option<f32>,
        /// Fog color as r,g,b
        #[arg(long, value_parser = parse_rgb)]
        color: Option<Rgb>,
        /// Exponential falloff
        #[arg(long)]
        exponential: bool,
        /// Leave shadowed areas alone
        #[arg(long)]
        no_shadows: bool,
    },
    /// Streak glare light rays
    Rays {
        /// Mix factor
        #[arg(long, default_value_t = 0.3)]
        intensity: f32,
        /// Brightness threshold
        #[arg(long, default_value_t = 0.8)]
        threshold: f32,
        /// Number of streaks
        #[arg(long, default_value_t = 12)]
        streaks: i32,
    },
    /// Motion glow from the vector pass
    MotionGlow {
        /// Vector blur factor
        #[arg(long, default_value_t = 1.0)]
        intensity: f32,
        /// Glare threshold
        #[arg(long, default_value_t = 0.1)]
        threshold: f32,
        /// Glow tint as r,g,b
        #[arg(long, value_parser = parse_rgb)]
        color: Option<Rgb>,
    },
    /// Edge mask
    Edges {
        /// Sobel, prewitt, laplacian or canny
        #[arg(long, default_value = "sobel")]
        method: EdgeMethod,
        /// Edge threshold
        #[arg(long, default_value_t = 0.1)]
        threshold: f32,
        /// Detect edges in the normal pass
        #[arg(long)]
        normal: bool,
    },
    /// Neon edge glow
    Neon {
        /// Glow color as r,g,b
        #[arg(long, value_parser = parse_rgb)]
        color: Option<Rgb>,
        /// Glow multiplier
        #[arg(long, default_value_t = 2.0)]
        intensity: f32,
        /// Blur radius in pixels
        #[arg(long, default_value_t = 20)]
        blur: i32,
    },
    /// Cel outline
    Outline {
        /// Line color as r,g,b
        #[arg(long, value_parser = parse_rgb)]
        color: Option<Rgb>,
        /// Line thickness in pixels
        #[arg(long, default_value_t = 2.0)]
        thickness: f32,
    },
    /// Seven-stage grading chain
    GradeStack,
    /// Color harmony grade
    Harmony {
        /// Complementary, analogous, split-complementary or triadic
        #[arg(long, default_value = "complementary")]
        mode: HarmonyMode,
        /// Base color as r,g,b
        #[arg(long, value_parser = parse_rgb)]
        base: Option<Rgb>,
        /// Mix factor
        #[arg(long, default_value_t = 0.5)]
        strength: f32,
    },
    /// Split toning
    SplitTone {
        /// Shadow tint as r,g,b
        #[arg(long, value_parser = parse_rgb)]
        shadows: Option<Rgb>,
        /// Highlight tint as r,g,b
        #[arg(long, value_parser = parse_rgb)]
        highlights: Option<Rgb>,
        /// Shadow/highlight balance
        #[arg(long, default_value_t = 0.5)]
        balance: f32,
        /// Overlay factor
        #[arg(long, default_value_t = 0.5)]
        strength: f32,
    },
    /// One-click look
    Look {
        /// Cinematic-warm, cinematic-cool, vibrant, desaturated, vintage or noir
        preset: LookPreset,
    },
    /// Heat haze distortion
    HeatHaze {
        /// Displacement scale
        #[arg(long, default_value_t = 0.05)]
        strength: f32,
        /// Noise scale
        #[arg(long, default_value_t = 5.0)]
        scale: f32,
    },
    /// Shockwave distortion
    Shockwave {
        /// Horizontal center
        #[arg(long, default_value_t = 0.5)]
        center_x: f32,
        /// Vertical center
        #[arg(long, default_value_t = 0.5)]
        center_y: f32,
        /// Ring radius
        #[arg(long, default_value_t = 0.3)]
        radius: f32,
        /// Displacement scale
        #[arg(long, default_value_t = 0.5)]
        strength: f32,
    },
    /// Chromatic aberration
    Aberration {
        /// Channel shift
        #[arg(long, default_value_t = 0.01)]
        strength: f32,
    },
    /// Lens distortion
    Lens {
        /// Barrel (negative) or pincushion (positive)
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        distortion: f32,
        /// Channel dispersion
        #[arg(long, default_value_t = 0.0)]
        dispersion: f32,
    },
}

/// `snapshot` actions
#[derive(Debug, Subcommand)]
pub enum SnapshotAction {
    /// Write the graph, or some of its nodes, to a snapshot file
    Export {
        /// Scene file
        scene: PathBuf,
        /// Snapshot file to write
        output: PathBuf,
        /// Capture only these nodes
        #[arg(long, value_delimiter = ',')]
        nodes: Vec<String>,
    },
    /// Restore a snapshot file into the graph
    Import {
        /// Scene file
        scene: PathBuf,
        /// Snapshot file to read
        input: PathBuf,
        /// Add to the graph instead of replacing it
        #[arg(long)]
        merge: bool,
    },
}

/// `blueprint` actions
#[derive(Debug, Subcommand)]
pub enum BlueprintAction {
    /// List the scene's blueprints
    List {
        /// Scene file
        scene: PathBuf,
    },
    /// Save nodes as a new blueprint
    Save {
        /// Scene file
        scene: PathBuf,
        /// Blueprint name
        name: String,
        /// Nodes to include (defaults to the current selection)
        #[arg(long, value_delimiter = ',')]
        nodes: Vec<String>,
        /// Category
        #[arg(long, default_value = "color-grading")]
        category: BlueprintCategory,
        /// Description
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Instantiate a blueprint as a Group node
    Apply {
        /// Scene file
        scene: PathBuf,
        /// Blueprint name
        name: String,
    },
    /// Delete a blueprint
    Delete {
        /// Scene file
        scene: PathBuf,
        /// Blueprint name
        name: String,
    },
    /// Write a blueprint to the preset directory
    Export {
        /// Scene file
        scene: PathBuf,
        /// Blueprint name
        name: String,
    },
    /// Add a blueprint from the preset directory or a file
    Import {
        /// Scene file
        scene: PathBuf,
        /// Preset name or path
        preset: String,
    },
}

/// `sequence` actions
#[derive(Debug, Subcommand)]
pub enum SequenceAction {
    /// Capture the current graph as a new sequence
    Add {
        /// Scene file
        scene: PathBuf,
        /// Sequence name
        name: String,
        /// First frame (defaults to the scene's)
        #[arg(long)]
        start: Option<i32>,
        /// Last frame (defaults to the scene's)
        #[arg(long)]
        end: Option<i32>,
    },
    /// List sequences
    List {
        /// Scene file
        scene: PathBuf,
    },
    /// Restore a sequence's graph and frame range
    Apply {
        /// Scene file
        scene: PathBuf,
        /// Sequence name
        name: String,
    },
    /// Remove a sequence
    Remove {
        /// Scene file
        scene: PathBuf,
        /// Sequence name
        name: String,
    },
    /// Write a sequence to the preset directory
    Export {
        /// Scene file
        scene: PathBuf,
        /// Sequence name
        name: String,
    },
    /// Add a sequence from the preset directory or a file
    Import {
        /// Scene file
        scene: PathBuf,
        /// Preset name or path
        preset: String,
    },
    /// Print the batch render plan
    Plan {
        /// Scene file
        scene: PathBuf,
        /// Render output base path
        #[arg(long, default_value = "//render/")]
        output: String,
    },
}

/// `prefs` actions
#[derive(Debug, Subcommand)]
pub enum PrefsAction {
    /// Print the effective preferences
    Show,
    /// Change one preference and save
    Set {
        /// Preference name
        key: String,
        /// New value
        value: String,
    },
}

/// Everything a handler needs besides its arguments
pub struct Context {
    /// Loaded preferences
    pub prefs: Preferences,
    /// Where the preferences are saved
    pub prefs_path: PathBuf,
    /// Compositor node catalog
    pub registry: NodeRegistry,
}

impl Context {
    /// Create a context with the compositor catalog
    pub fn new(prefs: Preferences, prefs_path: PathBuf) -> Self {
        Self {
            prefs,
            prefs_path,
            registry: create_compositor_registry(),
        }
    }

    fn presets(&self) -> PresetLibrary {
        PresetLibrary::new(self.prefs.preset_dir())
    }

    fn encoder(&self) -> FfmpegEncoder {
        FfmpegEncoder::new(&self.prefs.ffmpeg_path)
    }
}

fn load_scene(path: &Path) -> Result<Scene> {
    Scene::load(path).with_context(|| format!("Failed to load scene {}", path.display()))
}

fn save_scene(scene: &Scene, path: &Path) -> Result<()> {
    scene.save(path).with_context(|| format!("Failed to save scene {}", path.display()))
}

/// Run one command
pub fn run(command: Command, ctx: &mut Context) -> Result<()> {
    match command {
        Command::New {
            scene,
            name,
            empty,
            force,
        } => new_scene(ctx, &scene, name, empty, force),
        Command::Info { scene } => info(&scene),
        Command::Layout {
            scene,
            start_x,
            start_y,
            spacing_x,
            spacing_y,
        } => {
            let mut doc = load_scene(&scene)?;
            layout(&mut doc.graph, &LayoutParams::new(start_x, start_y, spacing_x, spacing_y));
            save_scene(&doc, &scene)?;
            println!("Arranged {} nodes", doc.graph.node_count());
            Ok(())
        }
        Command::Fx { scene, recipe } => fx(ctx, &scene, &recipe),
        Command::Snapshot { action } => snapshot(ctx, action),
        Command::Blueprint { action } => blueprint(ctx, action),
        Command::Sequence { action } => sequence(ctx, action),
        Command::Presets => presets(ctx),
        Command::Encode {
            input,
            output,
            codec,
            quality,
            fps,
            start,
            dry_run,
        } => {
            let job = EncodeJob {
                codec,
                quality,
                framerate: fps,
                start_number: start,
                ..EncodeJob::new(input, output)
            };
            if dry_run {
                println!("{} {}", ctx.prefs.ffmpeg_path, FfmpegEncoder::encode_args(&job).join(" "));
                return Ok(());
            }
            if !ctx.encoder().encode(&job)? {
                bail!("Encoding {} failed", job.output.display());
            }
            println!("Encoded {}", job.output.display());
            Ok(())
        }
        Command::Proxy {
            input,
            output,
            resolution,
            dry_run,
        } => {
            if dry_run {
                let args = FfmpegEncoder::proxy_args(&input, &output, resolution);
                println!("{} {}", ctx.prefs.ffmpeg_path, args.join(" "));
                return Ok(());
            }
            if !ctx.encoder().create_proxy(&input, &output, resolution)? {
                bail!("Creating proxy {} failed", output.display());
            }
            println!("Created proxy {}", output.display());
            Ok(())
        }
        Command::Prefs { action } => prefs(ctx, action),
    }
}

fn new_scene(ctx: &Context, path: &Path, name: Option<String>, empty: bool, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let name = name
        .or_else(|| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .unwrap_or_else(|| "Scene".to_string());
    let scene = if empty {
        Scene::new(name)
    } else {
        Scene::new_default(name, &ctx.registry)
    };
    save_scene(&scene, path)?;
    println!("Created scene {} at {}", scene.name, path.display());
    Ok(())
}

fn print_graph(graph: &Graph) {
    let depth = depths(graph);
    println!("Graph {}: {} nodes, {} links", graph.name, graph.node_count(), graph.link_count());
    for node in graph.nodes() {
        let label = if node.label.is_empty() {
            String::new()
        } else {
            format!(" \"{}\"", node.label)
        };
        println!(
            "  [{}] {}{} ({}) at ({:.0}, {:.0})",
            depth.get(&node.name).copied().unwrap_or_default(),
            node.name,
            label,
            node.node_type,
            node.location[0],
            node.location[1],
        );
    }
    for link in graph.links() {
        println!("  {}:{} -> {}:{}", link.from_node, link.from_socket, link.to_node, link.to_socket);
    }
}

fn info(path: &Path) -> Result<()> {
    let scene = load_scene(path)?;
    println!("Scene {} (frames {}-{})", scene.name, scene.frame_start, scene.frame_end);
    print_graph(&scene.graph);

    if !scene.node_groups.is_empty() {
        println!("Node groups:");
        for (name, group) in &scene.node_groups {
            println!("  {} ({} nodes)", name, group.node_count());
        }
    }

    println!("Sequences: {}", scene.sequences.len());
    for (i, seq) in scene.sequences.iter().enumerate() {
        let marker = if i == scene.sequences.active_index() { '*' } else { ' ' };
        let state = if seq.enabled { "" } else { " [disabled]" };
        println!("  {marker} {} ({}-{}){}", seq.name, seq.frame_start, seq.frame_end, state);
    }

    println!("Blueprints: {}", scene.blueprints.len());
    for blueprint in scene.blueprints.iter() {
        println!("  {} [{}]", blueprint.name, blueprint.category);
    }
    Ok(())
}

/// Run a recipe against a graph
pub fn run_recipe(graph: &mut Graph, registry: &NodeRegistry, recipe: &Recipe) -> Result<RecipeSummary, RecipeError> {
    match recipe {
        Recipe::Fog {
            preset,
            density,
            start,
            end,
            color,
            exponential,
            no_shadows,
        } => {
            let mut settings = preset.as_ref().map(FogPreset::settings).unwrap_or_default();
            if let Some(density) = density {
                settings.density = *density;
            }
            if let Some(start) = start {
                settings.start = *start;
            }
            if let Some(end) = end {
                settings.end = *end;
            }
            if let Some(color) = color {
                settings.color = *color;
            }
            settings.exponential = *exponential;
            settings.affect_shadows = !*no_shadows;
            fog::apply_post_fog(graph, registry, &settings)
        }
        Recipe::Rays {
            intensity,
            threshold,
            streaks,
        } => {
            let settings = VolumetricRaysSettings {
                intensity: *intensity,
                threshold: *threshold,
                streaks: *streaks,
            };
            fog::create_volumetric_rays(graph, registry, &settings)
        }
        Recipe::MotionGlow {
            intensity,
            threshold,
            color,
        } => {
            let defaults = MotionGlowSettings::default();
            let settings = MotionGlowSettings {
                intensity: *intensity,
                threshold: *threshold,
                color: color.unwrap_or(defaults.color),
            };
            glow::create_motion_glow(graph, registry, &settings)
        }
        Recipe::Edges {
            method,
            threshold,
            normal,
        } => {
            let settings = EdgeSettings {
                method: *method,
                threshold: *threshold,
                use_normal_pass: *normal,
            };
            edges::detect_edges(graph, registry, &settings)
        }
        Recipe::Neon { color, intensity, blur } => {
            let defaults = NeonGlowSettings::default();
            let settings = NeonGlowSettings {
                color: color.unwrap_or(defaults.color),
                intensity: *intensity,
                blur_size: *blur,
            };
            edges::create_neon_glow(graph, registry, &settings)
        }
        Recipe::Outline { color, thickness } => {
            let defaults = OutlineSettings::default();
            let settings = OutlineSettings {
                color: color.unwrap_or(defaults.color),
                thickness: *thickness,
            };
            edges::create_outline(graph, registry, &settings)
        }
        Recipe::GradeStack => grading::create_grade_stack(graph, registry),
        Recipe::Harmony { mode, base, strength } => {
            let defaults = HarmonySettings::default();
            let settings = HarmonySettings {
                base: base.unwrap_or(defaults.base),
                mode: *mode,
                strength: *strength,
            };
            grading::create_color_harmony(graph, registry, &settings)
        }
        Recipe::SplitTone {
            shadows,
            highlights,
            balance,
            strength,
        } => {
            let defaults = SplitToneSettings::default();
            let settings = SplitToneSettings {
                shadow_color: shadows.unwrap_or(defaults.shadow_color),
                highlight_color: highlights.unwrap_or(defaults.highlight_color),
                balance: *balance,
                strength: *strength,
            };
            grading::create_split_tone(graph, registry, &settings)
        }
        Recipe::Look { preset } => grading::apply_look_preset(graph, registry, *preset),
        Recipe::HeatHaze { strength, scale } => {
            let settings = HeatHazeSettings {
                strength: *strength,
                scale: *scale,
            };
            fx_layers::create_heat_haze(graph, registry, &settings)
        }
        Recipe::Shockwave {
            center_x,
            center_y,
            radius,
            strength,
        } => {
            let settings = ShockwaveSettings {
                center_x: *center_x,
                center_y: *center_y,
                radius: *radius,
                strength: *strength,
            };
            fx_layers::create_shockwave(graph, registry, &settings)
        }
        Recipe::Aberration { strength } => fx_layers::create_chromatic_aberration(graph, registry, *strength),
        Recipe::Lens { distortion, dispersion } => {
            let settings = LensDistortionSettings {
                distortion: *distortion,
                dispersion: *dispersion,
            };
            fx_layers::create_lens_distortion(graph, registry, &settings)
        }
    }
}

fn fx(ctx: &Context, path: &Path, recipe: &Recipe) -> Result<()> {
    let mut scene = load_scene(path)?;
    let summary = run_recipe(&mut scene.graph, &ctx.registry, recipe)?;

    if ctx.prefs.auto_connect_passes {
        let mut builder = GraphBuilder::new(&mut scene.graph, &ctx.registry);
        connect_to_composite(&mut builder, &summary.output, "Image")?;
    }

    save_scene(&scene, path)?;
    println!("Built {}", summary);
    Ok(())
}

fn snapshot(ctx: &Context, action: SnapshotAction) -> Result<()> {
    match action {
        SnapshotAction::Export { scene, output, nodes } => {
            let doc = load_scene(&scene)?;
            let snapshot = if nodes.is_empty() {
                Snapshot::capture(&doc.graph)
            } else {
                if let Some(missing) = nodes.iter().find(|n| !doc.graph.contains_node(n)) {
                    bail!("No node named {missing}");
                }
                Snapshot::capture_nodes(&doc.graph, nodes.iter().map(String::as_str))
            };
            snapshot
                .save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Wrote {} nodes and {} links to {}",
                snapshot.nodes.len(),
                snapshot.links.len(),
                output.display()
            );
            Ok(())
        }
        SnapshotAction::Import { scene, input, merge } => {
            let mut doc = load_scene(&scene)?;
            let snapshot = Snapshot::load(&input).with_context(|| format!("Failed to read {}", input.display()))?;
            let mode = if merge { ApplyMode::Merge } else { ApplyMode::Replace };
            let report = snapshot.apply(&mut doc.graph, &ctx.registry, mode);
            for issue in &report.issues {
                println!("  skipped: {issue}");
            }
            save_scene(&doc, &scene)?;
            println!("Import {report}");
            Ok(())
        }
    }
}

fn blueprint_index(scene: &Scene, name: &str) -> Result<usize> {
    scene
        .blueprints
        .index_by_name(name)
        .ok_or_else(|| anyhow!("No blueprint named {name}"))
}

fn blueprint(ctx: &Context, action: BlueprintAction) -> Result<()> {
    match action {
        BlueprintAction::List { scene } => {
            let doc = load_scene(&scene)?;
            for category in BlueprintCategory::ALL {
                let entries: Vec<_> = doc.blueprints.in_category(category).collect();
                if entries.is_empty() {
                    continue;
                }
                println!("{category}:");
                for entry in entries {
                    let origin = if entry.builtin { " (built-in)" } else { "" };
                    println!("  {}{} - {}", entry.name, origin, entry.description);
                }
            }
            Ok(())
        }
        BlueprintAction::Save {
            scene,
            name,
            nodes,
            category,
            description,
        } => {
            let mut doc = load_scene(&scene)?;
            if !nodes.is_empty() {
                doc.graph.deselect_all();
                for node in &nodes {
                    if !doc.graph.set_selected(node, true) {
                        bail!("No node named {node}");
                    }
                }
            }
            doc.save_blueprint_from_selection(&name, category, &description)?;
            save_scene(&doc, &scene)?;
            println!("Saved blueprint {name}");
            Ok(())
        }
        BlueprintAction::Apply { scene, name } => {
            let mut doc = load_scene(&scene)?;
            let index = blueprint_index(&doc, &name)?;
            let applied = doc.apply_blueprint(index, &ctx.registry)?;
            save_scene(&doc, &scene)?;
            println!("Added {} using group {} ({})", applied.node, applied.group_name, applied.report);
            Ok(())
        }
        BlueprintAction::Delete { scene, name } => {
            let mut doc = load_scene(&scene)?;
            let index = blueprint_index(&doc, &name)?;
            doc.blueprints.delete(index)?;
            save_scene(&doc, &scene)?;
            println!("Deleted blueprint {name}");
            Ok(())
        }
        BlueprintAction::Export { scene, name } => {
            let doc = load_scene(&scene)?;
            let index = blueprint_index(&doc, &name)?;
            let path = ctx.presets().save_blueprint(&doc.blueprints.export_preset(index)?)?;
            println!("Exported {name} to {}", path.display());
            Ok(())
        }
        BlueprintAction::Import { scene, preset } => {
            let mut doc = load_scene(&scene)?;
            let loaded = ctx.presets().load_blueprint(&preset)?;
            let name = loaded.name.clone();
            doc.blueprints.import_preset(loaded);
            save_scene(&doc, &scene)?;
            println!("Imported blueprint {name}");
            Ok(())
        }
    }
}

fn sequence_index(scene: &Scene, name: &str) -> Result<usize> {
    scene
        .sequences
        .index_by_name(name)
        .ok_or_else(|| anyhow!("No sequence named {name}"))
}

fn sequence(ctx: &Context, action: SequenceAction) -> Result<()> {
    match action {
        SequenceAction::Add { scene, name, start, end } => {
            let mut doc = load_scene(&scene)?;
            let start = start.unwrap_or(doc.frame_start);
            let end = end.unwrap_or(doc.frame_end);
            doc.sequences.add(name.clone(), &doc.graph, start, end);
            save_scene(&doc, &scene)?;
            println!("Added sequence {name} ({start}-{end})");
            Ok(())
        }
        SequenceAction::List { scene } => {
            let doc = load_scene(&scene)?;
            for (i, seq) in doc.sequences.iter().enumerate() {
                let marker = if i == doc.sequences.active_index() { '*' } else { ' ' };
                let nodes = seq.comp_setup.as_ref().map_or(0, |s| s.nodes.len());
                let state = if seq.enabled { "enabled" } else { "disabled" };
                println!(
                    "{marker} {} frames {}-{} ({} frames), {nodes} nodes, {state}",
                    seq.name,
                    seq.frame_start,
                    seq.frame_end,
                    seq.frame_count(),
                );
            }
            Ok(())
        }
        SequenceAction::Apply { scene, name } => {
            let mut doc = load_scene(&scene)?;
            let index = sequence_index(&doc, &name)?;
            let report = doc.apply_sequence(index, &ctx.registry)?;
            doc.sequences.set_active(index)?;
            save_scene(&doc, &scene)?;
            println!("Applied {name}: {report}");
            Ok(())
        }
        SequenceAction::Remove { scene, name } => {
            let mut doc = load_scene(&scene)?;
            let index = sequence_index(&doc, &name)?;
            doc.sequences.remove(index)?;
            save_scene(&doc, &scene)?;
            println!("Removed sequence {name}");
            Ok(())
        }
        SequenceAction::Export { scene, name } => {
            let doc = load_scene(&scene)?;
            let index = sequence_index(&doc, &name)?;
            let path = ctx.presets().save_sequence(&doc.sequences.export_preset(index)?)?;
            println!("Exported {name} to {}", path.display());
            Ok(())
        }
        SequenceAction::Import { scene, preset } => {
            let mut doc = load_scene(&scene)?;
            let loaded = ctx.presets().load_sequence(&preset)?;
            let name = loaded.name.clone();
            doc.sequences.import_preset(loaded);
            save_scene(&doc, &scene)?;
            println!("Imported sequence {name}");
            Ok(())
        }
        SequenceAction::Plan { scene, output } => {
            let doc = load_scene(&scene)?;
            let plan = doc.sequences.render_plan(&output);
            if plan.is_empty() {
                println!("No enabled sequences");
            }
            for job in plan {
                println!("{}: frames {}-{} -> {}", job.name, job.frame_start, job.frame_end, job.output_prefix);
            }
            Ok(())
        }
    }
}

fn presets(ctx: &Context) -> Result<()> {
    let library = ctx.presets();
    println!("Preset directory: {}", library.root().display());
    for (title, kind) in [("Blueprints", PresetKind::Blueprint), ("Sequences", PresetKind::Sequence)] {
        let names = library.names(kind)?;
        println!("{title}: {}", names.len());
        for name in names {
            println!("  {name}");
        }
    }
    Ok(())
}

fn prefs(ctx: &mut Context, action: PrefsAction) -> Result<()> {
    match action {
        PrefsAction::Show => {
            let prefs = &ctx.prefs;
            println!("File: {}", ctx.prefs_path.display());
            println!("preset_directory = {} ({})", prefs.preset_directory, prefs.preset_dir().display());
            println!("ffmpeg_path = {}", prefs.ffmpeg_path);
            println!("live_preview = {}", prefs.live_preview);
            println!("auto_connect_passes = {}", prefs.auto_connect_passes);
            println!("color_space = {}", prefs.color_space);
            Ok(())
        }
        PrefsAction::Set { key, value } => {
            ctx.prefs.set(&key, &value).map_err(|e| anyhow!(e))?;
            ctx.prefs
                .save(&ctx.prefs_path)
                .with_context(|| format!("Failed to save preferences {}", ctx.prefs_path.display()))?;
            println!("{key} = {value}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypergrade_graph::graphs::compositor::COMPOSITE;

    fn context(dir: &Path) -> Context {
        let prefs = Preferences {
            preset_directory: dir.join("presets").display().to_string(),
            ..Preferences::default()
        };
        Context::new(prefs, dir.join("prefs.ron"))
    }

    fn new_scene_file(ctx: &mut Context, dir: &Path) -> PathBuf {
        let path = dir.join("shot.json");
        run(
            Command::New {
                scene: path.clone(),
                name: None,
                empty: false,
                force: false,
            },
            ctx,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_rgb("0.1, 0.2,0.3"), Ok([0.1, 0.2, 0.3]));
        assert!(parse_rgb("1,2").is_err());
        assert!(parse_rgb("a,b,c").is_err());
    }

    #[test]
    fn test_new_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        let path = new_scene_file(&mut ctx, dir.path());
        assert_eq!(Scene::load(&path).unwrap().name, "shot");

        let again = Command::New {
            scene: path,
            name: None,
            empty: true,
            force: false,
        };
        assert!(run(again, &mut ctx).is_err());
    }

    #[test]
    fn test_fx_routes_result_to_composite() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        let path = new_scene_file(&mut ctx, dir.path());

        let recipe = Recipe::Rays {
            intensity: 0.3,
            threshold: 0.8,
            streaks: 12,
        };
        run(Command::Fx { scene: path.clone(), recipe }, &mut ctx).unwrap();

        let scene = Scene::load(&path).unwrap();
        let mix = scene.graph.find_by_label("Mix Rays").unwrap();
        let composite = scene.graph.find_by_type(COMPOSITE)[0];
        let link = scene.graph.links_into(&composite.name, "Image").next().unwrap();
        assert_eq!(link.from_node, mix.name);
    }

    #[test]
    fn test_fx_reports_missing_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        let path = dir.path().join("empty.json");
        run(
            Command::New {
                scene: path.clone(),
                name: None,
                empty: true,
                force: false,
            },
            &mut ctx,
        )
        .unwrap();

        let err = run(Command::Fx { scene: path, recipe: Recipe::GradeStack }, &mut ctx).unwrap_err();
        assert!(err.to_string().contains("No input node found"));
    }

    #[test]
    fn test_blueprint_export_and_import() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        let path = new_scene_file(&mut ctx, dir.path());

        let export = BlueprintAction::Export {
            scene: path.clone(),
            name: "Grunge Look".into(),
        };
        run(Command::Blueprint { action: export }, &mut ctx).unwrap();
        assert_eq!(ctx.presets().list(PresetKind::Blueprint).unwrap().len(), 1);

        let delete = BlueprintAction::Delete {
            scene: path.clone(),
            name: "Grunge Look".into(),
        };
        run(Command::Blueprint { action: delete }, &mut ctx).unwrap();
        let import = BlueprintAction::Import {
            scene: path.clone(),
            preset: "Grunge Look".into(),
        };
        run(Command::Blueprint { action: import }, &mut ctx).unwrap();

        let scene = Scene::load(&path).unwrap();
        assert_eq!(scene.blueprints.len(), 3);
        assert!(scene.blueprints.index_by_name("Grunge Look").is_some());
    }

    #[test]
    fn test_sequence_add_and_apply() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        let path = new_scene_file(&mut ctx, dir.path());

        let add = SequenceAction::Add {
            scene: path.clone(),
            name: "Intro".into(),
            start: Some(1),
            end: Some(40),
        };
        run(Command::Sequence { action: add }, &mut ctx).unwrap();
        run(
            Command::Fx {
                scene: path.clone(),
                recipe: Recipe::GradeStack,
            },
            &mut ctx,
        )
        .unwrap();

        let apply = SequenceAction::Apply {
            scene: path.clone(),
            name: "Intro".into(),
        };
        run(Command::Sequence { action: apply }, &mut ctx).unwrap();

        let scene = Scene::load(&path).unwrap();
        assert_eq!(scene.graph.node_count(), 2);
        assert_eq!(scene.frame_end, 40);
    }

    #[test]
    fn test_prefs_set_saves_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        let set = PrefsAction::Set {
            key: "ffmpeg_path".into(),
            value: "/opt/ffmpeg/bin/ffmpeg".into(),
        };
        run(Command::Prefs { action: set }, &mut ctx).unwrap();

        let saved = Preferences::load(&dir.path().join("prefs.ron")).unwrap();
        assert_eq!(saved.ffmpeg_path, "/opt/ffmpeg/bin/ffmpeg");
    }
}
