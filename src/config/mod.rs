//! Configuration file support for glyphpad.
//!
//! Settings are read from `~/.config/glyphpad/config.toml`. They cover gesture
//! timing, template matching, where trained symbols are stored, which touchpad
//! to read and which commands the builtin symbols run.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod types;

pub use types::{
    BuiltinCommand, BuiltinConfig, ClassifierConfig, DeviceConfig, GestureConfig,
    StoreCompression, StoreConfig, StoreStorageMode,
};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration deserialized from `config.toml`.
///
/// # Example TOML
/// ```toml
/// [gesture]
/// idle_threshold_ms = 300
///
/// [classifier]
/// resample_points = 64
/// acceptance_threshold = 0.15
///
/// [store]
/// storage = "auto"
/// compress = "auto"
///
/// [builtin.commands.circle]
/// command = "notify-send"
/// arguments = ["circle drawn"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub gesture: GestureConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub builtin: BuiltinConfig,
}

impl Config {
    /// Clamps out-of-range values, logging a warning for each adjustment.
    ///
    /// Validated ranges:
    /// - `gesture.idle_threshold_ms`: 50 - 5000
    /// - `gesture.idle_poll_ms`: 10 - 60000
    /// - `classifier.resample_points`: 16 - 256
    /// - `classifier.acceptance_threshold`: 0.01 - 1.0
    /// - `classifier.tie_tolerance`: 0.0 - 0.01
    fn validate_and_clamp(&mut self) {
        if !(50..=5000).contains(&self.gesture.idle_threshold_ms) {
            warn!(
                "Invalid idle_threshold_ms {}, clamping to 50-5000 range",
                self.gesture.idle_threshold_ms
            );
            self.gesture.idle_threshold_ms = self.gesture.idle_threshold_ms.clamp(50, 5000);
        }

        if !(10..=60_000).contains(&self.gesture.idle_poll_ms) {
            warn!(
                "Invalid idle_poll_ms {}, clamping to 10-60000 range",
                self.gesture.idle_poll_ms
            );
            self.gesture.idle_poll_ms = self.gesture.idle_poll_ms.clamp(10, 60_000);
        }

        if !(16..=256).contains(&self.classifier.resample_points) {
            warn!(
                "Invalid resample_points {}, clamping to 16-256 range",
                self.classifier.resample_points
            );
            self.classifier.resample_points = self.classifier.resample_points.clamp(16, 256);
        }

        // NaN fails `contains` and would survive `clamp`, so reset it explicitly.
        if !(0.01..=1.0).contains(&self.classifier.acceptance_threshold) {
            warn!(
                "Invalid acceptance_threshold {:.3}, clamping to 0.01-1.0 range",
                self.classifier.acceptance_threshold
            );
            self.classifier.acceptance_threshold = if self.classifier.acceptance_threshold.is_nan()
            {
                ClassifierConfig::default().acceptance_threshold
            } else {
                self.classifier.acceptance_threshold.clamp(0.01, 1.0)
            };
        }

        if !(0.0..=0.01).contains(&self.classifier.tie_tolerance) {
            warn!(
                "Invalid tie_tolerance {:e}, clamping to 0.0-0.01 range",
                self.classifier.tie_tolerance
            );
            self.classifier.tie_tolerance = if self.classifier.tie_tolerance.is_nan() {
                ClassifierConfig::default().tie_tolerance
            } else {
                self.classifier.tie_tolerance.clamp(0.0, 0.01)
            };
        }

        for (symbol, binding) in &self.builtin.commands {
            if binding.command.trim().is_empty() {
                warn!("Builtin symbol '{}' has an empty command", symbol);
            }
        }
    }

    /// Returns the directory holding `config.toml`.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not find config directory")?
            .join("glyphpad"))
    }

    /// Returns the path to the configuration file.
    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from file, or returns defaults if not found.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory path cannot be determined
    /// - The file exists but cannot be read
    /// - The file exists but contains invalid TOML syntax
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Loads configuration from an explicit path with the same fallback rules
    /// as [`Config::load`].
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// JSON schema describing `config.toml`, used by `dump_config_schema`.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_millis(self.gesture.idle_threshold_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.gesture.idle_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config::load_from(&temp.path().join("config.toml")).unwrap();
        assert_eq!(config.gesture.idle_threshold_ms, 300);
        assert_eq!(config.classifier.resample_points, 64);
        assert_eq!(config.store.storage, StoreStorageMode::Auto);
        assert!(config.builtin.commands.is_empty());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[gesture]
idle_threshold_ms = 5
idle_poll_ms = 1000000

[classifier]
resample_points = 4
acceptance_threshold = 3.5
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.gesture.idle_threshold_ms, 50);
        assert_eq!(config.gesture.idle_poll_ms, 60_000);
        assert_eq!(config.classifier.resample_points, 16);
        assert_eq!(config.classifier.acceptance_threshold, 1.0);
    }

    #[test]
    fn builtin_commands_parse_from_nested_tables() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[store]
storage = "custom"
custom_directory = "~/glyphs"
compress = "off"

[builtin.commands.circle]
command = "touch"
arguments = ["/tmp/circle"]
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.store.storage, StoreStorageMode::Custom);
        assert_eq!(config.store.compress, StoreCompression::Off);
        let circle = &config.builtin.commands["circle"];
        assert_eq!(circle.command, "touch");
        assert_eq!(circle.arguments, vec!["/tmp/circle".to_string()]);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[gesture\nidle_threshold_ms = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
