// SPDX-License-Identifier: MIT OR Apache-2.0
//! `hypergrade`: command-line front end for HyperGradeFX scenes.

mod commands;
mod preferences;

use anyhow::{Context as _, Result};
use clap::Parser;
use commands::{Command, Context};
use preferences::{Preferences, DEFAULT_PREFS_FILE};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "hypergrade", version, about = "Build and manage compositor node setups")]
struct Cli {
    /// Preferences file
    #[arg(long, global = true, env = "HYPERGRADE_PREFS", default_value = DEFAULT_PREFS_FILE)]
    prefs: PathBuf,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for target in ["hypergrade", "hypergrade_graph", "hypergrade_fx"] {
        env_filter = env_filter.add_directive(format!("{target}={level}").parse()?);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let prefs = Preferences::load_or_default(&cli.prefs)
        .with_context(|| format!("Failed to load preferences {}", cli.prefs.display()))?;
    tracing::debug!("Preset directory: {}", prefs.preset_dir().display());

    let mut ctx = Context::new(prefs, cli.prefs);
    commands::run(cli.command, &mut ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Recipe, SequenceAction};
    use clap::CommandFactory;
    use hypergrade_fx::recipes::edges::EdgeMethod;
    use hypergrade_fx::VideoCodec;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fx_edges() {
        let cli = Cli::try_parse_from(["hypergrade", "fx", "shot.json", "edges", "--method", "canny", "--normal"]).unwrap();
        match cli.command {
            Command::Fx {
                recipe: Recipe::Edges { method, normal, .. },
                ..
            } => {
                assert_eq!(method, EdgeMethod::Canny);
                assert!(normal);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_encode_defaults() {
        let cli = Cli::try_parse_from(["hypergrade", "-v", "encode", "frames/f_%04d.png", "out.mp4", "--codec", "prores"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Encode { codec, fps, start, .. } => {
                assert_eq!(codec, VideoCodec::ProRes);
                assert_eq!((fps, start), (24, 1));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_prefs_after_subcommand() {
        let cli = Cli::try_parse_from(["hypergrade", "sequence", "plan", "shot.json", "--prefs", "custom.ron"]).unwrap();
        assert_eq!(cli.prefs, PathBuf::from("custom.ron"));
        assert!(matches!(cli.command, Command::Sequence { action: SequenceAction::Plan { .. } }));
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(Cli::try_parse_from(["hypergrade", "fx", "s.json", "look", "sepia"]).is_err());
        assert!(Cli::try_parse_from(["hypergrade", "fx", "s.json", "neon", "--color", "1,0"]).is_err());
        assert!(Cli::try_parse_from(["hypergrade", "proxy", "a.mov", "b.mp4", "--resolution", "4k"]).is_err());
    }
}
