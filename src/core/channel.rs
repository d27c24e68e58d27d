//! Shading channels and the file value type the classifier works on.
//!
//! Channels are a closed set; keyword sets are user data and live in
//! [`ChannelDef`]. An [`ImageFile`] carries everything classification
//! needs about one file (identity, display name, byte size) so nothing
//! downstream has to touch the filesystem again.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A semantic shading input a texture can feed.
///
/// Declaration order is the canonical order used for deterministic maps
/// and for the layout table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel
{
    Transmission,
    Albedo,
    Metallic,
    Specular,
    Roughness,
    Opacity,
    Bump,
    Normal,
    Displacement,
    Emission,
    AmbientOcclusion,
}

impl Channel
{
    pub const ALL: [Channel; 11] = [
        Channel::Transmission,
        Channel::Albedo,
        Channel::Metallic,
        Channel::Specular,
        Channel::Roughness,
        Channel::Opacity,
        Channel::Bump,
        Channel::Normal,
        Channel::Displacement,
        Channel::Emission,
        Channel::AmbientOcclusion,
    ];

    /// Stable lowercase identifier (`"albedo"`, `"ambient_occlusion"`).
    pub fn id(self) -> &'static str
    {
        match self
        {
            Channel::Transmission => "transmission",
            Channel::Albedo => "albedo",
            Channel::Metallic => "metallic",
            Channel::Specular => "specular",
            Channel::Roughness => "roughness",
            Channel::Opacity => "opacity",
            Channel::Bump => "bump",
            Channel::Normal => "normal",
            Channel::Displacement => "displacement",
            Channel::Emission => "emission",
            Channel::AmbientOcclusion => "ambient_occlusion",
        }
    }

    /// Human-facing label, also used for node labels.
    pub fn label(self) -> &'static str
    {
        match self
        {
            Channel::AmbientOcclusion => "Ambient Occlusion",
            Channel::Transmission => "Transmission",
            Channel::Albedo => "Albedo",
            Channel::Metallic => "Metallic",
            Channel::Specular => "Specular",
            Channel::Roughness => "Roughness",
            Channel::Opacity => "Opacity",
            Channel::Bump => "Bump",
            Channel::Normal => "Normal",
            Channel::Displacement => "Displacement",
            Channel::Emission => "Emission",
        }
    }

    /// Color data is sampled with the color gamma, everything else is linear data.
    pub fn is_color(self) -> bool
    {
        matches!(
            self,
            Channel::Albedo | Channel::Emission | Channel::Transmission | Channel::Specular
        )
    }
}

impl fmt::Display for Channel
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.write_str(self.label())
    }
}

/// A channel plus the lowercase keywords that identify it in filenames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDef
{
    pub channel: Channel,
    pub keywords: BTreeSet<String>,
}

impl ChannelDef
{
    /// Build from a whitespace-separated keyword string. An empty string
    /// yields an empty set, which simply never matches.
    pub fn from_keyword_str(
        channel: Channel,
        keywords: &str,
    ) -> Self
    {
        Self {
            channel,
            keywords: keywords
                .split_whitespace()
                .map(str::to_lowercase)
                .collect(),
        }
    }

    pub fn matches_any(
        &self,
        tokens: &[String],
    ) -> bool
    {
        tokens
            .iter()
            .any(|t| self.keywords.contains(t))
    }
}

/// One candidate texture file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageFile
{
    /// Full path; unique within a classification batch
    pub path: PathBuf,
    /// Path relative to the scanned root, for reports
    pub relative: PathBuf,
    /// Byte size, the documented stand-in for resolution
    pub size_bytes: u64,
}

impl ImageFile
{
    /// Build from disk, reading the byte size. A file whose metadata cannot
    /// be read sorts as size 0.
    pub fn from_disk(
        path: &Path,
        root: &Path,
    ) -> Self
    {
        let size_bytes = fs::metadata(path)
            .map(|m| m.len())
            .unwrap_or(0);
        Self {
            path: path.to_path_buf(),
            relative: path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_path_buf(),
            size_bytes,
        }
    }

    /// Final path component, lossily decoded.
    pub fn file_name(&self) -> String
    {
        self.path
            .file_name()
            .map(|n| {
                n.to_string_lossy()
                    .into_owned()
            })
            .unwrap_or_default()
    }

    /// Lowercased extension without the dot, empty when absent.
    pub fn extension(&self) -> String
    {
        self.path
            .extension()
            .map(|e| {
                e.to_string_lossy()
                    .to_lowercase()
            })
            .unwrap_or_default()
    }
}
