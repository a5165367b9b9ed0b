//! CLI argument definitions and dispatch.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::output::{generate, write_output, DIAGRAM_PATH};

/// Top-level CLI parser for `entity-codegen`.
#[derive(Debug, Parser)]
#[command(
    name = "entity-codegen",
    version,
    about = "Generate Doctrine entity classes and a PlantUML diagram from an entity schema"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Regenerate entity classes, enums, scaffolds and the diagram.
    Generate {
        /// Schema file, YAML or JSON (by extension).
        #[arg(long, short)]
        config: PathBuf,
        /// Application root holding `src/`.
        #[arg(long, default_value = ".")]
        app_root: PathBuf,
        /// Directory receiving `generated/entities.txt`; defaults to the schema's directory.
        #[arg(long)]
        entities_root: Option<PathBuf>,
        /// List what would be written without touching the disk.
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn execute(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Generate {
            config,
            app_root,
            entities_root,
            dry_run,
        } => {
            let entities_root = entities_root
                .clone()
                .unwrap_or_else(|| schema_dir(config));
            run_generate(config, app_root, &entities_root, *dry_run)
        }
    }
}

fn run_generate(config_path: &Path, app_root: &Path, entities_root: &Path, dry_run: bool) -> Result<()> {
    let config = GeneratorConfig::from_path(config_path)?;
    info!(config = %config_path.display(), "loaded configuration");

    let output = generate(&config)?;

    if dry_run {
        for file in &output.files {
            println!("{:>18}    {}", format!("{:?}", file.mode), app_root.join(&file.path).display());
        }
        println!("{:>18}    {}", "Regenerate", entities_root.join(DIAGRAM_PATH).display());
        return Ok(());
    }

    let report = write_output(&output, app_root, entities_root)?;
    for path in &report.written {
        println!("  {:>10}    {}", "writing", path.display());
    }
    for path in &report.skipped {
        println!("  {:>10}    {}", "keeping", path.display());
    }

    Ok(())
}

fn schema_dir(config: &Path) -> PathBuf {
    config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
