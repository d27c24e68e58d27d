//! Channel classification and disambiguation.
//!
//! `classify` maps files onto channels by keyword; `resolve` orders each
//! channel's candidates by the configured priority and decides which file
//! (or files, for Albedo alternates) each material actually uses.

use std::collections::{BTreeMap, BTreeSet};

use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::channel::{Channel, ChannelDef, ImageFile};
use crate::core::tokenize::{reduce, tokenize};

/// Raw classifier output. Channels without matches are absent.
pub type ChannelAssignment = BTreeMap<Channel, Vec<ImageFile>>;

/// Tie-break order applied to a channel's candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionPriority
{
    /// Order of the configured extension list
    #[default]
    FileType,
    /// Enumeration order, untouched
    FileName,
    /// Smallest byte size first
    SmallerRes,
    /// Largest byte size first
    BiggerRes,
}

/// What to do when several Albedo textures survive sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AlternatePolicy
{
    /// Keep all on one material, extras as disabled nodes
    #[default]
    NewNode,
    /// One material per candidate, suffixed `Alt-<n>`
    NewMaterial,
    /// Keep the first candidate only
    First,
    /// Keep the last candidate only
    Last,
}

/// The file a channel uses, plus Albedo alternates under `NewNode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelPick
{
    pub primary: ImageFile,
    pub alternates: Vec<ImageFile>,
}

impl ChannelPick
{
    pub fn single(file: ImageFile) -> Self
    {
        Self { primary: file, alternates: Vec::new() }
    }
}

/// Everything needed to synthesize one material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaterialPlan
{
    /// Name suffix, set when one folder fans out into several materials
    pub suffix: Option<String>,
    pub channels: BTreeMap<Channel, ChannelPick>,
}

/// Union of every channel's keywords.
pub fn keyword_union(channels: &[ChannelDef]) -> BTreeSet<String>
{
    channels
        .iter()
        .flat_map(|c| {
            c.keywords
                .iter()
                .cloned()
        })
        .collect()
}

/// Assign files to channels by keyword.
///
/// Input order is the folder's enumeration order and is preserved inside
/// every channel list. A file may land in several channels.
pub fn classify(
    files: &[ImageFile],
    channels: &[ChannelDef],
) -> ChannelAssignment
{
    let candidates: IndexMap<&ImageFile, Vec<String>> = files
        .iter()
        .map(|f| (f, tokenize(&f.file_name())))
        .collect();

    let survivors = reduce(candidates, &keyword_union(channels));
    trace!(survivors = survivors.len(), total = files.len(), "affix reduction done");

    let mut out = ChannelAssignment::new();
    for (file, tokens) in &survivors
    {
        for def in channels
        {
            if def.matches_any(tokens)
            {
                out.entry(def.channel)
                    .or_default()
                    .push((*file).clone());
            }
        }
    }
    out
}

/// Stable-sort one channel's candidates by the tie-break policy.
///
/// `SmallerRes`/`BiggerRes` compare byte size, not pixel dimensions.
/// Under `FileType`, extensions missing from `extensions` sort last.
pub fn sort_candidates(
    files: &mut [ImageFile],
    priority: ResolutionPriority,
    extensions: &[String],
)
{
    match priority
    {
        ResolutionPriority::FileName =>
        {}
        ResolutionPriority::FileType =>
        {
            files.sort_by_cached_key(|f| {
                let ext = f.extension();
                extensions
                    .iter()
                    .position(|e| e.eq_ignore_ascii_case(&ext))
                    .unwrap_or(usize::MAX)
            });
        }
        ResolutionPriority::SmallerRes => files.sort_by_key(|f| f.size_bytes),
        ResolutionPriority::BiggerRes =>
        {
            files.sort_by_key(|f| std::cmp::Reverse(f.size_bytes))
        }
    }
}

/// Turn a raw assignment into one or more material plans.
///
/// An empty assignment yields no plans.
pub fn resolve(
    mut assignment: ChannelAssignment,
    priority: ResolutionPriority,
    alternates: AlternatePolicy,
    extensions: &[String],
) -> Vec<MaterialPlan>
{
    if assignment.is_empty()
    {
        return Vec::new();
    }

    for files in assignment.values_mut()
    {
        sort_candidates(files, priority, extensions);
    }

    let mut base = MaterialPlan::default();
    let mut albedo: Vec<ImageFile> = Vec::new();

    for (channel, files) in assignment
    {
        if channel == Channel::Albedo
        {
            albedo = files;
            continue;
        }
        if files.len() > 1
        {
            debug!(%channel, unused = files.len() - 1, "extra candidates ignored");
        }
        if let Some(first) = files
            .into_iter()
            .next()
        {
            base.channels
                .insert(channel, ChannelPick::single(first));
        }
    }

    if albedo.len() <= 1
    {
        if let Some(only) = albedo.pop()
        {
            base.channels
                .insert(Channel::Albedo, ChannelPick::single(only));
        }
        return vec![base];
    }

    debug!(candidates = albedo.len(), policy = ?alternates, "resolving albedo alternates");
    match alternates
    {
        AlternatePolicy::First =>
        {
            let first = albedo.swap_remove(0);
            base.channels
                .insert(Channel::Albedo, ChannelPick::single(first));
            vec![base]
        }
        AlternatePolicy::Last =>
        {
            if let Some(last) = albedo.pop()
            {
                base.channels
                    .insert(Channel::Albedo, ChannelPick::single(last));
            }
            vec![base]
        }
        AlternatePolicy::NewNode =>
        {
            let primary = albedo.remove(0);
            base.channels.insert(
                Channel::Albedo,
                ChannelPick { primary, alternates: albedo },
            );
            vec![base]
        }
        AlternatePolicy::NewMaterial => albedo
            .into_iter()
            .enumerate()
            .map(|(i, file)| {
                let mut plan = base.clone();
                plan.suffix = Some(format!("Alt-{}", i + 1));
                plan.channels
                    .insert(Channel::Albedo, ChannelPick::single(file));
                plan
            })
            .collect(),
    }
}
