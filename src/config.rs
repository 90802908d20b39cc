//! Configuration module.
//!
//! Handles loading, validating, and merging `picsqueeze.toml`. Configuration
//! is layered: stock defaults are overridden by the config file, which is
//! overridden by command-line flags.
//!
//! ```text
//! stock defaults  →  picsqueeze.toml  →  CLI flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! preset = "instagram"     # instagram | story | twitter | facebook | linkedin | custom
//! quality = 85             # JPEG quality (60-100)
//! # width = 1080           # Overrides the preset's width
//! # height = 1080          # Overrides the preset's height
//!
//! [compression]
//! max_size_mb = 10.0       # Per-image output size cap
//! max_iterations = 10      # Shrink passes before giving up on the cap
//!
//! [processing]
//! # item_timeout_secs = 60 # Per-image time limit (omit for none)
//! ```
//!
//! ## Target Box
//!
//! A preset supplies a width and a height. An explicit `width` or `height`
//! replaces the matching preset value and leaves the other one alone, so
//! `preset = "instagram"` with `width = 400` targets 400×1080. With
//! `preset = "custom"`, a missing dimension is derived from each source's
//! aspect ratio; with neither set, images keep their size.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{MAX_QUALITY, MIN_QUALITY, Quality, ResizeParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file picked up from the working directory when present.
pub const CONFIG_FILE: &str = "picsqueeze.toml";

/// Largest accepted `width` or `height`, in pixels.
pub const MAX_DIMENSION: u32 = 10_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Named target boxes for common social platforms.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Instagram,
    Story,
    Twitter,
    Facebook,
    Linkedin,
    Custom,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::Instagram,
        Preset::Story,
        Preset::Twitter,
        Preset::Facebook,
        Preset::Linkedin,
        Preset::Custom,
    ];

    /// `(width, height)` of the target box; `None` for custom.
    pub fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            Preset::Instagram => Some((1080, 1080)),
            Preset::Story => Some((1080, 1920)),
            Preset::Twitter => Some((1200, 675)),
            Preset::Facebook => Some((1200, 630)),
            Preset::Linkedin => Some((1200, 627)),
            Preset::Custom => None,
        }
    }

    /// Identifier used in config files and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Preset::Instagram => "instagram",
            Preset::Story => "story",
            Preset::Twitter => "twitter",
            Preset::Facebook => "facebook",
            Preset::Linkedin => "linkedin",
            Preset::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Preset::Instagram => "Instagram Post",
            Preset::Story => "Instagram Story",
            Preset::Twitter => "Twitter Post",
            Preset::Facebook => "Facebook Post",
            Preset::Linkedin => "LinkedIn Post",
            Preset::Custom => "Custom Size",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Preset::Instagram => "Square format for Instagram feed",
            Preset::Story => "Vertical format for Instagram stories",
            Preset::Twitter => "Landscape format for Twitter/X posts",
            Preset::Facebook => "Landscape format for Facebook posts",
            Preset::Linkedin => "Professional format for LinkedIn posts",
            Preset::Custom => "Set your own dimensions",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Application configuration loaded from `picsqueeze.toml`.
///
/// All fields have defaults; a config file only needs the values it wants
/// to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub preset: Preset,
    /// JPEG quality, 60-100.
    pub quality: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub compression: CompressionConfig,
    pub processing: ProcessingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            preset: Preset::default(),
            quality: Quality::default().value(),
            width: None,
            height: None,
            compression: CompressionConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.quality) {
            return Err(ConfigError::Validation(format!(
                "quality must be {MIN_QUALITY}-{MAX_QUALITY}, got {}",
                self.quality
            )));
        }
        for (key, value) in [("width", self.width), ("height", self.height)] {
            if let Some(v) = value.filter(|&v| v > MAX_DIMENSION) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be at most {MAX_DIMENSION}, got {v}"
                )));
            }
        }
        let mb = self.compression.max_size_mb;
        if !mb.is_finite() || mb <= 0.0 {
            return Err(ConfigError::Validation(
                "compression.max_size_mb must be a positive number".into(),
            ));
        }
        if self.processing.item_timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "processing.item_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Preset as the user would see it: explicit dimensions make it custom.
    pub fn effective_preset(&self) -> Preset {
        if self.width.is_some() || self.height.is_some() {
            Preset::Custom
        } else {
            self.preset
        }
    }

    /// Target box after applying explicit dimensions over the preset's.
    pub fn target(&self) -> (Option<u32>, Option<u32>) {
        let (preset_w, preset_h) = self
            .preset
            .dimensions()
            .map_or((None, None), |(w, h)| (Some(w), Some(h)));
        (self.width.or(preset_w), self.height.or(preset_h))
    }

    /// Snapshot the values a batch run needs.
    pub fn settings(&self) -> ProcessingSettings {
        let (target_width, target_height) = self.target();
        ProcessingSettings {
            resize: ResizeParams {
                target_width,
                target_height,
                quality: Quality::new(self.quality),
                max_size_bytes: self.compression.max_size_bytes(),
                max_iterations: self.compression.max_iterations,
            },
            item_timeout: self.processing.item_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Stage B size limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// Output size cap per image, in megabytes (1 MB = 1024 × 1024 bytes).
    pub max_size_mb: f64,
    /// Shrink passes before accepting an over-cap result.
    pub max_iterations: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_size_mb: 10.0,
            max_iterations: crate::imaging::DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl CompressionConfig {
    pub fn max_size_bytes(&self) -> u64 {
        (self.max_size_mb * 1024.0 * 1024.0).round() as u64
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Per-image time limit in seconds. When absent, items never time out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_timeout_secs: Option<u64>,
}

/// Immutable per-run settings handed to the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProcessingSettings {
    pub resize: ResizeParams,
    pub item_timeout: Option<Duration>,
}

/// Values given on the command line. `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub preset: Option<Preset>,
    pub quality: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub max_size_mb: Option<f64>,
    pub item_timeout_secs: Option<u64>,
}

impl Overrides {
    /// Sparse TOML table holding only the values that were given.
    pub fn to_toml(&self) -> toml::Value {
        let mut root = toml::map::Map::new();
        if let Some(preset) = self.preset {
            root.insert("preset".into(), toml::Value::String(preset.id().into()));
        }
        if let Some(quality) = self.quality {
            root.insert("quality".into(), toml::Value::Integer(quality.into()));
        }
        if let Some(width) = self.width {
            root.insert("width".into(), toml::Value::Integer(width.into()));
        }
        if let Some(height) = self.height {
            root.insert("height".into(), toml::Value::Integer(height.into()));
        }
        if let Some(mb) = self.max_size_mb {
            let mut compression = toml::map::Map::new();
            compression.insert("max_size_mb".into(), toml::Value::Float(mb));
            root.insert("compression".into(), toml::Value::Table(compression));
        }
        if let Some(secs) = self.item_timeout_secs {
            let mut processing = toml::map::Map::new();
            processing.insert(
                "item_timeout_secs".into(),
                toml::Value::Integer(i64::try_from(secs).unwrap_or(i64::MAX)),
            );
            root.insert("processing".into(), toml::Value::Table(processing));
        }
        toml::Value::Table(root)
    }
}

/// Stock defaults as a TOML value, the bottom layer of every merge.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Deep-merge `overlay` into `base`. Tables merge key by key; anything else
/// in `overlay` replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as raw TOML. Returns `None` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge `overlay` onto `base`, deserialize, and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Build the effective config: stock defaults, then `file` (which must exist
/// when given), then `overrides`.
pub fn load_config(file: Option<&Path>, overrides: &Overrides) -> Result<AppConfig, ConfigError> {
    let mut base = stock_defaults_value()?;
    if let Some(path) = file {
        let raw = load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.into()))?;
        base = merge_toml(base, raw);
    }
    resolve_config(base, Some(overrides.to_toml()))
}

/// Returns a fully-commented stock `picsqueeze.toml` with all keys and
/// explanations.
pub fn stock_config_toml() -> &'static str {
    r##"# picsqueeze configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# picsqueeze reads ./picsqueeze.toml when it exists, or the file passed
# with --config. Command-line flags override anything set here.
# Unknown keys will cause an error.

# Target box preset:
#   instagram  1080 x 1080
#   story      1080 x 1920
#   twitter    1200 x 675
#   facebook   1200 x 630
#   linkedin   1200 x 627
#   custom     no box; set width and/or height below
preset = "instagram"

# JPEG quality (60 = smallest files, 100 = best).
quality = 85

# Explicit dimensions replace the preset's. With preset = "custom", a
# missing dimension is derived from each image's aspect ratio. At most 10000.
# width = 1080
# height = 1080

# ---------------------------------------------------------------------------
# Size cap
# ---------------------------------------------------------------------------
[compression]
# Maximum output size per image, in megabytes.
max_size_mb = 10.0

# Shrink passes (5% smaller, 5% lower quality each) before accepting an
# image that is still over the cap.
max_iterations = 10

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Per-image time limit in seconds. An image that runs over is marked failed
# and the batch moves on. Omit for no limit.
# item_timeout_secs = 60
"##
}
