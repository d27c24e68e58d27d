use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::catalog::DEFAULT_LEDGER_FILE;
use crate::core::channel::{Channel, ChannelDef};
use crate::core::classify::{AlternatePolicy, ResolutionPriority};
use crate::core::naming::NameFormat;
use crate::core::synth::SynthSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Extra glob patterns to skip while walking the library
    pub ignore_patterns: Vec<String>,

    /// Walking behavior
    pub walk: WalkConfig,

    /// Catalog ledger settings
    pub catalog: CatalogConfig,

    /// Generation behavior
    pub generate: GenerateConfig,

    /// Texture naming conventions, one whitespace-separated list per channel
    pub keywords: KeywordConfig,

    /// Classification tie-breaks
    pub classify: ClassifyConfig,

    /// Graph synthesis parameters
    pub synth: SynthSettings,

    /// Display-name formatting
    pub name_format: NameFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig
{
    pub max_depth: Option<usize>,
    pub show_hidden: bool,
    pub follow_symlinks: bool,
    pub respect_gitignore: bool,
}

impl Default for WalkConfig
{
    fn default() -> Self
    {
        Self {
            max_depth: None,
            show_hidden: false,
            follow_symlinks: false,
            respect_gitignore: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig
{
    /// Assign catalog identifiers at all
    pub enabled: bool,
    /// Directory holding the ledger file; unset means no ledger context
    pub library_dir: Option<PathBuf>,
    pub file_name: String,
}

impl Default for CatalogConfig
{
    fn default() -> Self
    {
        Self {
            enabled: true,
            library_dir: None,
            file_name: DEFAULT_LEDGER_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig
{
    /// Tag materials with their folder ancestry
    pub tags: bool,
    /// Emit a bare material for folders with no recognized textures
    pub include_empty: bool,
    pub output_file: String,
}

impl Default for GenerateConfig
{
    fn default() -> Self
    {
        Self {
            tags: true,
            include_empty: false,
            output_file: "materials.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig
{
    pub transmission: String,
    pub albedo: String,
    pub metallic: String,
    pub specular: String,
    pub roughness: String,
    pub opacity: String,
    pub bump: String,
    pub normal: String,
    pub displacement: String,
    pub emission: String,
    pub ambient_occlusion: String,
}

impl Default for KeywordConfig
{
    fn default() -> Self
    {
        Self {
            transmission: "transmission transparency transmissive".to_string(),
            albedo: "albedo diffuse diff base col color colour basecolor".to_string(),
            metallic: "metallic metalness metal mtl".to_string(),
            specular: "specular specularity spec spc".to_string(),
            roughness: "roughness rough rgh".to_string(),
            opacity: "opacity alpha mask".to_string(),
            bump: "bump bmp".to_string(),
            normal: "normal nor nrm nrml norm".to_string(),
            displacement: "displacement displace disp dsp height".to_string(),
            emission: "emission emissive emit".to_string(),
            ambient_occlusion: "ao ambient occlusion".to_string(),
        }
    }
}

impl KeywordConfig
{
    pub fn keywords_for(
        &self,
        channel: Channel,
    ) -> &str
    {
        match channel
        {
            Channel::Transmission => &self.transmission,
            Channel::Albedo => &self.albedo,
            Channel::Metallic => &self.metallic,
            Channel::Specular => &self.specular,
            Channel::Roughness => &self.roughness,
            Channel::Opacity => &self.opacity,
            Channel::Bump => &self.bump,
            Channel::Normal => &self.normal,
            Channel::Displacement => &self.displacement,
            Channel::Emission => &self.emission,
            Channel::AmbientOcclusion => &self.ambient_occlusion,
        }
    }

    /// One definition per channel, in channel order.
    pub fn channel_defs(&self) -> Vec<ChannelDef>
    {
        Channel::ALL
            .iter()
            .map(|&c| ChannelDef::from_keyword_str(c, self.keywords_for(c)))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig
{
    /// Recognized extensions; also the `file-type` priority order
    pub extensions: Vec<String>,
    pub resolution_priority: ResolutionPriority,
    pub alternate_albedo: AlternatePolicy,
}

impl Default for ClassifyConfig
{
    fn default() -> Self
    {
        Self {
            extensions: ["png", "jpg", "jpeg", "tif", "tiff", "exr", "tga", "bmp", "webp", "hdr"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            resolution_priority: ResolutionPriority::default(),
            alternate_albedo: AlternatePolicy::default(),
        }
    }
}

/// Immutable settings bundle handed to classification and synthesis.
#[derive(Debug, Clone)]
pub struct Settings
{
    pub channels: Vec<ChannelDef>,
    pub extensions: Vec<String>,
    pub resolution_priority: ResolutionPriority,
    pub alternate_albedo: AlternatePolicy,
    pub synth: SynthSettings,
    pub name_format: NameFormat,
}

impl Default for Settings
{
    fn default() -> Self
    {
        Config::default().settings()
    }
}

impl Config
{
    /// Freeze the classification/synthesis half of the config.
    pub fn settings(&self) -> Settings
    {
        Settings {
            channels: self
                .keywords
                .channel_defs(),
            extensions: self
                .classify
                .extensions
                .iter()
                .map(|e| {
                    e.trim_start_matches('.')
                        .to_lowercase()
                })
                .collect(),
            resolution_priority: self
                .classify
                .resolution_priority,
            alternate_albedo: self
                .classify
                .alternate_albedo,
            synth: self.synth.clone(),
            name_format: self
                .name_format
                .clone(),
        }
    }
}

pub fn load_config() -> Result<Config>
{
    let mut builder = config::Config::builder();

    // Load from config files in priority order
    let config_paths = ["matcat.toml", "matcat.yaml", "matcat.json", ".matcat.toml"];

    for path in &config_paths
    {
        if Path::new(path).exists()
        {
            builder = builder.add_source(config::File::from(Path::new(path)));
            break;
        }
    }

    // Environment overrides, e.g. MATCAT__CATALOG__LIBRARY_DIR
    builder = builder.add_source(
        config::Environment::with_prefix("MATCAT")
            .prefix_separator("__")
            .separator("__"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("matcat.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("Would create config file at {}", config_path.display());
        }
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn default_settings_cover_every_channel()
    {
        let s = Settings::default();
        assert_eq!(s.channels.len(), Channel::ALL.len());
        let albedo = s
            .channels
            .iter()
            .find(|d| d.channel == Channel::Albedo)
            .unwrap();
        assert!(albedo.keywords.contains("diffuse"));
        assert_eq!(s.extensions[0], "png");
    }

    #[test]
    fn default_config_round_trips_through_toml()
    {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.keywords.normal, KeywordConfig::default().normal);
        assert_eq!(back.classify.resolution_priority, ResolutionPriority::FileType);
    }

    #[test]
    fn partial_toml_keeps_defaults()
    {
        let cfg: Config = toml::from_str(
            "[classify]\nalternate_albedo = \"new-material\"\n[keywords]\nbump = \"\"\n",
        )
        .unwrap();
        assert_eq!(cfg.classify.alternate_albedo, AlternatePolicy::NewMaterial);
        assert_eq!(cfg.classify.extensions.len(), 10);
        let bump = cfg
            .settings()
            .channels
            .into_iter()
            .find(|d| d.channel == Channel::Bump)
            .unwrap();
        assert!(bump.keywords.is_empty());
    }

    #[test]
    fn extensions_are_normalized()
    {
        let mut cfg = Config::default();
        cfg.classify.extensions = vec![".PNG".into(), "Jpg".into()];
        assert_eq!(cfg.settings().extensions, vec!["png", "jpg"]);
    }
}
