//! Configuration type definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Gesture segmentation timing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GestureConfig {
    /// Milliseconds without touchpad input after which a gesture is considered
    /// finished (valid range: 50 - 5000)
    #[serde(default = "default_idle_threshold_ms")]
    pub idle_threshold_ms: u64,

    /// Milliseconds the application loop sleeps when no gesture is open
    /// (valid range: 10 - 60000)
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            idle_threshold_ms: default_idle_threshold_ms(),
            idle_poll_ms: default_idle_poll_ms(),
        }
    }
}

/// Template matching parameters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClassifierConfig {
    /// Number of points every drawn symbol is resampled to (valid range: 16 - 256)
    #[serde(default = "default_resample_points")]
    pub resample_points: usize,

    /// Largest mean point distance (in unit bounding-box space) that still
    /// counts as a match (valid range: 0.01 - 1.0)
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f64,

    /// Two templates closer to each other than this are treated as a tie and
    /// the gesture is left unrecognised
    #[serde(default = "default_tie_tolerance")]
    pub tie_tolerance: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            resample_points: default_resample_points(),
            acceptance_threshold: default_acceptance_threshold(),
            tie_tolerance: default_tie_tolerance(),
        }
    }
}

/// Where the trained symbol store lives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StoreStorageMode {
    /// `$XDG_DATA_HOME/glyphpad`
    Auto,
    /// Next to `config.toml`
    Config,
    /// `store.custom_directory`
    Custom,
}

/// Compression of the symbol store file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StoreCompression {
    Auto,
    On,
    Off,
}

/// Symbol store persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreConfig {
    #[serde(default = "default_storage_mode")]
    pub storage: StoreStorageMode,

    /// Directory used when `storage = "custom"`; `~/` is expanded
    #[serde(default)]
    pub custom_directory: Option<String>,

    #[serde(default = "default_compression")]
    pub compress: StoreCompression,

    /// Payload size in KiB above which `compress = "auto"` writes gzip
    #[serde(default = "default_auto_compress_threshold_kb")]
    pub auto_compress_threshold_kb: u64,

    /// Keep the previous store as `symbols.json.bak` when saving
    #[serde(default = "default_keep_backup")]
    pub keep_backup: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage: default_storage_mode(),
            custom_directory: None,
            compress: default_compression(),
            auto_compress_threshold_kb: default_auto_compress_threshold_kb(),
            keep_backup: default_keep_backup(),
        }
    }
}

/// Touchpad device selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DeviceConfig {
    /// Explicit evdev node, e.g. `/dev/input/event7`. When unset the first
    /// device whose name contains "touchpad" is used.
    #[serde(default)]
    pub path: Option<String>,

    /// Grab the device exclusively so the pointer does not move while drawing
    #[serde(default)]
    pub grab: bool,
}

/// Shell command bound to a builtin symbol.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BuiltinCommand {
    pub command: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

/// Bindings for the hardcoded symbol set used by `run 32` / `run 64`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BuiltinConfig {
    /// Symbol name (circle, square, triangle, line-right, line-down, check,
    /// zigzag) to command
    #[serde(default)]
    pub commands: BTreeMap<String, BuiltinCommand>,
}

fn default_idle_threshold_ms() -> u64 {
    300
}

fn default_idle_poll_ms() -> u64 {
    1000
}

fn default_resample_points() -> usize {
    64
}

fn default_acceptance_threshold() -> f64 {
    0.15
}

fn default_tie_tolerance() -> f64 {
    1e-6
}

fn default_storage_mode() -> StoreStorageMode {
    StoreStorageMode::Auto
}

fn default_compression() -> StoreCompression {
    StoreCompression::Auto
}

fn default_auto_compress_threshold_kb() -> u64 {
    256
}

fn default_keep_backup() -> bool {
    true
}
