//! Filepath: src/core/generate.rs
//! Library-wide generation: walk every folder under a root, classify its
//! textures, synthesize one graph per resolved material and attach catalog
//! identifiers and folder tags.
//!
//! Classification is pure and runs on rayon; catalog assignment and material
//! naming touch shared state and run in folder order afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use owo_colors::OwoColorize;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::cli::{AppContext, GenerateArgs};
use crate::core::catalog::{CatalogError, CatalogLedger};
use crate::core::channel::ImageFile;
use crate::core::classify::{MaterialPlan, classify, resolve};
use crate::core::graph::NodeGraph;
use crate::core::naming::{MaterialNamespace, NameFormat};
use crate::core::synth::synthesize;
use crate::infra::config::{Config, Settings, load_config};
use crate::infra::walk::FolderWalker;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError
{
    /// Root missing or not a directory; nothing is processed
    #[error("invalid root folder: {0}")]
    InvalidRoot(PathBuf),
}

/// Caller policy for one run.
#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions
{
    pub catalog: bool,
    pub tags: bool,
    pub include_empty: bool,
}

impl Default for GenerateOptions
{
    fn default() -> Self
    {
        Self { catalog: true, tags: true, include_empty: false }
    }
}

/// One folder after classification, before any shared state is touched.
#[derive(Debug, Clone)]
pub struct FolderClassification
{
    pub folder: PathBuf,
    pub files: Vec<ImageFile>,
    pub plans: Vec<MaterialPlan>,
}

/// One generated material, as handed to a host adapter.
#[derive(Debug, Clone, Serialize)]
pub struct MaterialRecord
{
    pub name: String,
    /// Folder relative to the root, `/`-separated
    pub folder: String,
    pub catalog_id: Option<String>,
    pub tags: Vec<String>,
    /// Marked as a library asset
    pub asset: bool,
    /// Kept alive even with no users
    pub fake_user: bool,
    pub graph: NodeGraph,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport
{
    pub root: PathBuf,
    pub materials: Vec<MaterialRecord>,
    /// Folders that produced no material
    pub skipped: Vec<String>,
}

/// Canonicalize `root`, failing with `InvalidRoot` unless it is a directory.
pub fn validate_root(root: &Path) -> Result<PathBuf, GenerateError>
{
    if !root.is_dir()
    {
        return Err(GenerateError::InvalidRoot(root.to_path_buf()));
    }
    dunce::canonicalize(root).map_err(|_| GenerateError::InvalidRoot(root.to_path_buf()))
}

/// Classify the images directly inside `folder`.
pub fn classify_folder(
    root: &Path,
    folder: &Path,
    walker: &FolderWalker,
    settings: &Settings,
) -> FolderClassification
{
    let files: Vec<ImageFile> = walker
        .list_images(root, folder, &settings.extensions)
        .iter()
        .map(|p| ImageFile::from_disk(p, root))
        .collect();

    let assignment = classify(&files, &settings.channels);
    debug!(folder = %folder.display(), files = files.len(), channels = assignment.len(), "classified");

    let plans = resolve(
        assignment,
        settings.resolution_priority,
        settings.alternate_albedo,
        &settings.extensions,
    );
    FolderClassification { folder: folder.to_path_buf(), files, plans }
}

/// Formatted ancestry segments of `folder`, de-duplicated, in order.
pub fn folder_tags(
    root: &Path,
    folder: &Path,
    format: &NameFormat,
) -> Vec<String>
{
    let Some(parent) = folder
        .strip_prefix(root)
        .ok()
        .and_then(Path::parent)
    else
    {
        return Vec::new();
    };
    parent
        .iter()
        .map(|seg| format.apply(&seg.to_string_lossy()))
        .filter(|t| !t.is_empty())
        .unique()
        .collect()
}

fn relative_display(
    root: &Path,
    folder: &Path,
) -> String
{
    folder
        .strip_prefix(root)
        .unwrap_or(folder)
        .iter()
        .map(|s| s.to_string_lossy())
        .join("/")
}

/// Look up the catalog id, degrading `NoLedgerContext` to `None`.
fn catalog_id_for(
    ledger: &CatalogLedger,
    root: &Path,
    folder: &Path,
) -> Result<Option<String>>
{
    match ledger.get_or_create(folder, root)
    {
        Ok(id) => Ok(id),
        Err(CatalogError::NoLedgerContext(reason)) =>
        {
            warn!(folder = %folder.display(), %reason, "catalog skipped");
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("catalog entry for {}", folder.display())),
    }
}

/// Run the whole pipeline over `root`.
///
/// `ledger` is `None` when catalog assignment is disabled. `namespace`
/// carries material names already taken in the host.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn generate(
    root: &Path,
    walker: &FolderWalker,
    settings: &Settings,
    ledger: Option<&CatalogLedger>,
    options: GenerateOptions,
    namespace: &mut MaterialNamespace,
    progress: &ProgressBar,
) -> Result<GenerateReport>
{
    let root = validate_root(root)?;
    let folders = walker.walk_folders(&root);
    info!(folders = folders.len(), "scanning library");

    // Order is preserved by collect
    let classified: Vec<FolderClassification> = folders
        .par_iter()
        .map(|folder| classify_folder(&root, folder, walker, settings))
        .collect();

    progress.set_length(classified.len() as u64);

    let mut materials = Vec::new();
    let mut skipped = Vec::new();
    for fc in classified
    {
        progress.inc(1);
        let rel = relative_display(&root, &fc.folder);
        progress.set_message(rel.clone());

        let plans = if fc.plans.is_empty() && options.include_empty
        {
            vec![MaterialPlan::default()]
        }
        else
        {
            fc.plans
        };
        if plans.is_empty()
        {
            debug!(folder = %rel, files = fc.files.len(), "no channel matched");
            skipped.push(rel);
            continue;
        }

        let tags = if options.tags
        {
            folder_tags(&root, &fc.folder, &settings.name_format)
        }
        else
        {
            Vec::new()
        };

        let catalog_id = match (options.catalog, ledger)
        {
            (true, Some(ledger)) => catalog_id_for(ledger, &root, &fc.folder)?,
            _ => None,
        };

        let folder_name = fc
            .folder
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let base = settings
            .name_format
            .apply(&folder_name);

        for plan in plans
        {
            let wanted = match &plan.suffix
            {
                Some(suffix) => format!("{base} {suffix}"),
                None => base.clone(),
            };
            let name = namespace.claim(&wanted);
            let graph = synthesize(&name, &plan, &settings.synth)
                .with_context(|| format!("building graph for {name}"))?;

            info!(material = %name, catalog_id = ?catalog_id, "material created");
            materials.push(MaterialRecord {
                name,
                folder: rel.clone(),
                catalog_id: catalog_id.clone(),
                tags: tags.clone(),
                asset: true,
                fake_user: true,
                graph,
            });
        }
    }

    progress.finish_and_clear();
    Ok(GenerateReport { root, materials, skipped })
}

/// Expand `~`/`$VAR` in a user-supplied path.
pub fn expand_path(p: &Path) -> PathBuf
{
    let raw = p.to_string_lossy();
    match shellexpand::full(&raw)
    {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => p.to_path_buf(),
    }
}

/// Merge config and CLI flags.
fn apply_overrides(
    config: &mut Config,
    args: &GenerateArgs,
)
{
    config
        .ignore_patterns
        .extend(args.ignore.iter().cloned());
    if let Some(lib) = &args.library
    {
        config.catalog.library_dir = Some(lib.clone());
    }
    if args.no_catalog
    {
        config.catalog.enabled = false;
    }
    if args.no_tags
    {
        config.generate.tags = false;
    }
    if args.include_empty
    {
        config.generate.include_empty = true;
    }
    if let Some(p) = args.resolution
    {
        config.classify.resolution_priority = p;
    }
    if let Some(p) = args.alternate
    {
        config.classify.alternate_albedo = p;
    }
    if let Some(p) = args.surface_detail
    {
        config.synth.surface_detail = p;
    }
}

/// Build a walker from the walk section of the config.
pub fn walker_from(config: &Config) -> Result<FolderWalker>
{
    Ok(FolderWalker::new(&config.ignore_patterns)?
        .with_include_hidden(config.walk.show_hidden)
        .with_follow_symlinks(config.walk.follow_symlinks)
        .with_gitignore(config.walk.respect_gitignore)
        .with_max_depth(config.walk.max_depth))
}

/// Load configuration, falling back to defaults with a warning.
pub fn load_config_or_default() -> Config
{
    load_config().unwrap_or_else(|e| {
        warn!("using default configuration: {e:#}");
        Config::default()
    })
}

pub fn run(
    args: GenerateArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let mut config = load_config_or_default();
    apply_overrides(&mut config, &args);

    let root = expand_path(&args.root);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.generate.output_file));
    let library = config
        .catalog
        .library_dir
        .as_deref()
        .map(expand_path);

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would scan:".yellow());
            println!("  Root: {}", root.display());
            println!("  Output: {}", output.display());
            println!("  Library: {:?}", library);
            println!("  Ignore patterns: {:?}", config.ignore_patterns);
        }
        return Ok(());
    }

    let settings = config.settings();
    let walker = walker_from(&config)?;
    let ledger = config
        .catalog
        .enabled
        .then(|| {
            CatalogLedger::new(
                library.clone(),
                config
                    .catalog
                    .file_name
                    .clone(),
                settings
                    .name_format
                    .clone(),
            )
        });
    let options = GenerateOptions {
        catalog: config.catalog.enabled,
        tags: config.generate.tags,
        include_empty: config.generate.include_empty,
    };

    let progress = if ctx.quiet
    {
        ProgressBar::hidden()
    }
    else
    {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("progress template")?
                .progress_chars("#>-"),
        );
        pb
    };

    let mut namespace = MaterialNamespace::new();
    let report = generate(
        &root,
        &walker,
        &settings,
        ledger.as_ref(),
        options,
        &mut namespace,
        &progress,
    )?;

    let json = serde_json::to_string_pretty(&report).context("serialize material manifest")?;
    fs::write(&output, json).with_context(|| format!("write {}", output.display()))?;

    if !ctx.quiet
    {
        for m in &report.materials
        {
            let id = m
                .catalog_id
                .as_deref()
                .map(|id| format!(", catalog ID: {id}"))
                .unwrap_or_default();
            if ctx.no_color
            {
                println!("Created new material: {}{}", m.name, id);
            }
            else
            {
                println!("Created new material: {}{}", m.name.green(), id);
            }
        }
        println!(
            "{} materials, {} folders skipped -> {}",
            report.materials.len(),
            report.skipped.len(),
            output.display()
        );
    }
    Ok(())
}
