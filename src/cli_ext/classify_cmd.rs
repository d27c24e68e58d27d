//! `matcat classify <FOLDER>`: show which texture feeds which channel
//! without building anything.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing::instrument;

use crate::cli::{AppContext, ClassifyArgs};
use crate::core::classify::MaterialPlan;
use crate::core::generate::{classify_folder, expand_path, load_config_or_default, validate_root, walker_from};

#[derive(Debug, Serialize)]
struct ClassifyReport
{
    folder: PathBuf,
    plans: Vec<MaterialPlan>,
    /// Images that reached no channel
    unmatched: Vec<String>,
}

#[derive(Tabled)]
struct ChannelRow
{
    material: String,
    channel: String,
    role: String,
    file: String,
    bytes: u64,
}

fn rows(plans: &[MaterialPlan]) -> Vec<ChannelRow>
{
    let mut out = Vec::new();
    for plan in plans
    {
        let material = plan
            .suffix
            .clone()
            .unwrap_or_else(|| "-".to_string());
        for (channel, pick) in &plan.channels
        {
            out.push(ChannelRow {
                material: material.clone(),
                channel: channel.label().to_string(),
                role: "primary".to_string(),
                file: pick.primary.file_name(),
                bytes: pick.primary.size_bytes,
            });
            for (i, alt) in pick
                .alternates
                .iter()
                .enumerate()
            {
                out.push(ChannelRow {
                    material: material.clone(),
                    channel: channel.label().to_string(),
                    role: format!("alt-{}", i + 1),
                    file: alt.file_name(),
                    bytes: alt.size_bytes,
                });
            }
        }
    }
    out
}

#[instrument(skip_all, fields(folder = %args.folder.display()))]
pub fn run(
    args: ClassifyArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let mut config = load_config_or_default();
    if let Some(p) = args.resolution
    {
        config.classify.resolution_priority = p;
    }
    if let Some(p) = args.alternate
    {
        config.classify.alternate_albedo = p;
    }

    let folder = validate_root(&expand_path(&args.folder))?;
    let settings = config.settings();
    let walker = walker_from(&config)?;

    let fc = classify_folder(&folder, &folder, &walker, &settings);
    let used: HashSet<&Path> = fc
        .plans
        .iter()
        .flat_map(|p| p.channels.values())
        .flat_map(|pick| std::iter::once(&pick.primary).chain(pick.alternates.iter()))
        .map(|f| f.path.as_path())
        .collect();
    let unmatched: Vec<String> = fc
        .files
        .iter()
        .filter(|f| !used.contains(f.path.as_path()))
        .map(|f| f.file_name())
        .collect();

    if args.json
    {
        let report = ClassifyReport { folder, plans: fc.plans, unmatched };
        let json = serde_json::to_string_pretty(&report).context("serialize classification")?;
        println!("{json}");
        return Ok(());
    }

    if ctx.quiet
    {
        return Ok(());
    }

    if fc.plans.is_empty()
    {
        println!("No channel matched in {}", folder.display());
    }
    else
    {
        println!("{}", Table::new(rows(&fc.plans)));
    }

    for name in &unmatched
    {
        if ctx.no_color
        {
            println!("unmatched: {name}");
        }
        else
        {
            println!("{} {}", "unmatched:".yellow(), name);
        }
    }
    Ok(())
}
