//! Snowglobe CLI - headless driver for the SDF scene engine

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec3;
use snowglobe_core::{FAR_DISTANCE, Scene};
use snowglobe_engine::{Engine, EngineConfig, ExportOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snowglobe")]
#[command(about = "Signed distance field scene evaluation", long_about = None)]
#[command(version)]
struct Cli {
    /// Start from an empty scene instead of the demo
    #[arg(long, global = true)]
    empty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample the scene into a dense distance grid
    Grid {
        /// Output file (.bin for raw f32, .json for JSON)
        #[arg(short, long, default_value = "grid.bin")]
        output: PathBuf,

        /// Voxels along each axis
        #[arg(short, long, default_value = "100")]
        resolution: u32,
    },

    /// Write the per-node bounding boxes
    Objects {
        /// Output file; prints JSON to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate the signed distance at a point
    Probe {
        #[arg(allow_negative_numbers = true)]
        x: f32,
        #[arg(allow_negative_numbers = true)]
        y: f32,
        #[arg(allow_negative_numbers = true)]
        z: f32,
    },

    /// Print the scene tree
    Tree,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let scene = if cli.empty { Scene::new() } else { Scene::demo() };
    tracing::debug!("Loaded scene with {} nodes", scene.node_count());

    match cli.command {
        Commands::Grid { output, resolution } => {
            run_grid(scene, output, resolution)?;
        }
        Commands::Objects { output } => {
            run_objects(scene, output)?;
        }
        Commands::Probe { x, y, z } => {
            run_probe(scene, Vec3::new(x, y, z))?;
        }
        Commands::Tree => {
            print_tree(&scene);
        }
    }

    Ok(())
}

fn run_grid(scene: Scene, output: PathBuf, resolution: u32) -> Result<()> {
    let config = EngineConfig::default().with_resolution(resolution);
    let mut engine = Engine::with_scene(config, scene);
    engine.refresh()?;

    let result = engine.export_grid(&ExportOptions::new(output))?;
    println!("{result}");
    Ok(())
}

fn run_objects(scene: Scene, output: Option<PathBuf>) -> Result<()> {
    // Objects don't depend on the grid; skip sampling
    let objects = scene.objects().context("Failed to flatten scene")?;

    match output {
        Some(path) => {
            let options = ExportOptions::new(path);
            let result = snowglobe_engine::export_objects(&objects, &options)?;
            println!("{result}");
        }
        None => {
            println!("{}", serde_json::to_string_pretty(&objects)?);
        }
    }
    Ok(())
}

fn run_probe(scene: Scene, p: Vec3) -> Result<()> {
    let flat = scene.flatten().context("Failed to flatten scene")?;
    let d = flat.distance(p);

    if d >= FAR_DISTANCE {
        println!("{p}: empty");
    } else {
        let side = if d < 0.0 { "inside" } else { "outside" };
        println!("{p}: {d:.6} ({side})");
    }
    Ok(())
}

fn print_tree(scene: &Scene) {
    for (depth, handle) in scene.walk() {
        let Some(node) = scene.node(handle) else {
            continue;
        };
        let params = node.params();
        println!(
            "{:indent$}{} [{}{}] at {}",
            "",
            node,
            params.kernel(),
            describe_modifiers(params),
            params.position,
            indent = depth * 2
        );
    }
}

fn describe_modifiers(params: &snowglobe_core::NodeParams) -> String {
    use snowglobe_core::{DeformationOp, RepetitionOp};

    let mut out = String::new();
    if params.repetition != RepetitionOp::None {
        out += &format!(", {} repetition", params.repetition);
    }
    if params.deformation != DeformationOp::None {
        out += &format!(", {}", params.deformation);
    }
    if params.symmetry.iter().any(|&s| s) {
        out.push_str(", mirrored");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use snowglobe_engine::ExportFormat;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_probe_with_negatives() {
        let cli = Cli::try_parse_from(["snowglobe", "--empty", "probe", "-0.5", "0", "0.25"]);
        let Ok(cli) = cli else {
            panic!("probe should parse");
        };
        assert!(cli.empty);
        assert!(matches!(cli.command, Commands::Probe { x, .. } if x == -0.5));
    }

    #[test]
    fn test_grid_defaults() {
        let Ok(cli) = Cli::try_parse_from(["snowglobe", "grid"]) else {
            panic!("grid should parse");
        };
        match cli.command {
            Commands::Grid { output, resolution } => {
                assert_eq!(output, PathBuf::from("grid.bin"));
                assert_eq!(resolution, 100);
                assert_eq!(
                    ExportOptions::new(output).effective_format(),
                    ExportFormat::Raw
                );
            }
            _ => panic!("expected grid"),
        }
    }

    #[test]
    fn test_modifier_description() {
        let mut params = snowglobe_core::NodeParams::default();
        assert_eq!(describe_modifiers(&params), "");
        params.deformation = snowglobe_core::DeformationOp::Twist;
        params.symmetry[1] = true;
        assert_eq!(describe_modifiers(&params), ", Twist, mirrored");
    }
}
