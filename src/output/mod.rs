use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::ast::EntityKind;
use crate::codegen::naming::{class_path, namespace_dir};
use crate::codegen::{render_class, ClassBuilder, EntityClass};
use crate::config::GeneratorConfig;
use crate::diagram::generate_plantuml;
use crate::error::{GeneratorError, Result};
use crate::parser::parse_entities;
use crate::resolver::resolve_relations;

/// Location of the diagram text, relative to the entities root
pub const DIAGRAM_PATH: &str = "generated/entities.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Rewritten on every run
    Regenerate,
    /// Hand-maintained after the first run, never overwritten
    CreateIfMissing,
}

/// One generated PHP file, path relative to the application root
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: String,
    pub mode: WriteMode,
}

/// Everything a generation run produces, still in memory
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutput {
    pub files: Vec<OutputFile>,
    /// Directory wiped before the regenerated files are written
    pub generated_dir: PathBuf,
    pub diagram: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl GenerationOutput {
    pub fn regenerated(&self) -> impl Iterator<Item = &OutputFile> {
        self.files.iter().filter(|f| f.mode == WriteMode::Regenerate)
    }

    pub fn scaffolds(&self) -> impl Iterator<Item = &OutputFile> {
        self.files.iter().filter(|f| f.mode == WriteMode::CreateIfMissing)
    }
}

/// Run the whole pipeline without touching the disk.
///
/// Entities are processed in declaration order, which keeps the owning side
/// of bidirectional associations stable between runs.
pub fn generate(config: &GeneratorConfig) -> Result<GenerationOutput> {
    let mut schema = parse_entities(&config.entities)?;
    info!(entities = schema.entities.len(), "parsed entity schema");

    resolve_relations(&mut schema)?;

    let app = config.app_namespace();
    let mut builder = ClassBuilder::new(config);
    let mut files = Vec::new();

    for entity in schema.entities.values() {
        let class = builder.build(entity)?;
        files.push(output_file(&app, &class, WriteMode::Regenerate));

        if entity.kind == EntityKind::Entity {
            let final_class = builder.build_final_entity(entity)?;
            files.push(output_file(&app, &final_class, WriteMode::CreateIfMissing));

            let repository = builder.build_repository(entity)?;
            files.push(output_file(&app, &repository, WriteMode::CreateIfMissing));
        }
    }

    let diagram = generate_plantuml(&schema)?;

    info!(files = files.len(), "generated classes");

    Ok(GenerationOutput {
        files,
        generated_dir: namespace_dir(&app, &config.base_namespace()),
        diagram,
    })
}

fn output_file(app_namespace: &str, class: &EntityClass, mode: WriteMode) -> OutputFile {
    OutputFile {
        path: class_path(app_namespace, &class.namespace, &class.name),
        contents: render_class(class),
        mode,
    }
}

/// Flush a generation run to disk.
///
/// The generated directory is removed first; if a later write fails the tree
/// is left half regenerated.
pub fn write_output(
    output: &GenerationOutput,
    app_root: &Path,
    entities_root: &Path,
) -> Result<WriteReport> {
    let mut report = WriteReport::default();

    let generated_dir = app_root.join(&output.generated_dir);
    if generated_dir.exists() {
        fs::remove_dir_all(&generated_dir).map_err(|e| GeneratorError::io(&generated_dir, e))?;
        debug!(path = %generated_dir.display(), "removed generated directory");
    }

    for file in &output.files {
        let path = app_root.join(&file.path);

        if file.mode == WriteMode::CreateIfMissing && path.exists() {
            debug!(path = %path.display(), "keeping existing file");
            report.skipped.push(path);
            continue;
        }

        write_file(&path, &file.contents)?;
        report.written.push(path);
    }

    let diagram_path = entities_root.join(DIAGRAM_PATH);
    write_file(&diagram_path, &output.diagram)?;
    report.written.push(diagram_path);

    info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        "wrote generated files"
    );

    Ok(report)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| GeneratorError::io(parent, e))?;
    }

    fs::write(path, contents).map_err(|e| GeneratorError::io(path, e))?;
    debug!(path = %path.display(), "wrote file");
    Ok(())
}
