//! Core Blueprints - Entry Point
//!
//! Loads a blueprint document and prints either a short summary of the
//! resolved core or the whole model as JSON.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use core_blueprints::reactor::CoreLoadingDefinition;
use core_blueprints::{load_file, LoaderConfig, Result};

/// Load a reactor core blueprint and resolve every block
#[derive(Parser, Debug)]
#[command(name = "core-blueprints")]
#[command(about = "Load reactor core blueprints and resolve in-block references")]
struct Args {
    /// Blueprint document (TOML)
    input: PathBuf,

    /// Loader configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose {
        "core_blueprints=debug"
    } else {
        "core_blueprints=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => LoaderConfig::load(path)?,
        None => LoaderConfig::default(),
    };

    let model = load_file(&args.input, &config)?;

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&model)?),
        Format::Text => print_summary(&model),
    }

    Ok(())
}

fn print_summary(model: &CoreLoadingDefinition) {
    let geometry = model.geometry();
    println!("Core Blueprints");
    println!("===============");
    println!(
        "Geometry: {} ({}), symmetry factor {}",
        geometry.geom.label(),
        geometry.symmetry,
        geometry.symmetry.symmetry_factor()
    );
    println!();

    println!("Assemblies:");
    let counts = model.placement_counts();
    for assembly in model.assemblies() {
        println!(
            "  {:<4} {:<24} {:>3} blocks  {:>8.2} cm  placed {}x",
            assembly.specifier(),
            assembly.name(),
            assembly.len(),
            assembly.total_height(),
            counts.get(assembly.specifier()).copied().unwrap_or(0)
        );
        for (block, (bottom, top)) in assembly.blocks().iter().zip(assembly.axial_bounds()) {
            println!(
                "         {:>8.2} - {:<8.2} {:<16} xs {}",
                bottom,
                top,
                block.template,
                block.xs_type.as_deref().unwrap_or("-")
            );
        }
    }
    println!();

    println!(
        "Placements: {} locations, {} blocks",
        model.placements().len(),
        model.placed_block_count()
    );
    for placement in model.placements() {
        println!("  {} -> {}", placement.location, placement.specifier);
    }
}
