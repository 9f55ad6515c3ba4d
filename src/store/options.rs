use crate::config::{StoreCompression, StoreConfig, StoreStorageMode};
use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};

pub const DEFAULT_AUTO_COMPRESS_THRESHOLD_BYTES: u64 = 256 * 1024; // 256 KiB

const STORE_FILE_STEM: &str = "symbols";

/// Compression preference for the store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    /// Always write plain JSON.
    Off,
    /// Always write gzip-compressed JSON.
    On,
    /// Write gzip when payload exceeds the configured threshold.
    Auto,
}

/// Runtime options derived from configuration for the symbol store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub base_dir: PathBuf,
    pub compression: CompressionMode,
    pub auto_compress_threshold_bytes: u64,
    pub keep_backup: bool,
}

impl StoreOptions {
    /// Creates an options struct with defaults rooted at `base_dir`. Intended mainly for tests.
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            compression: CompressionMode::Auto,
            auto_compress_threshold_bytes: DEFAULT_AUTO_COMPRESS_THRESHOLD_BYTES,
            keep_backup: true,
        }
    }

    pub fn store_file_path(&self) -> PathBuf {
        self.base_dir.join(format!("{STORE_FILE_STEM}.json"))
    }

    pub fn backup_file_path(&self) -> PathBuf {
        self.base_dir.join(format!("{STORE_FILE_STEM}.json.bak"))
    }

    pub fn lock_file_path(&self) -> PathBuf {
        self.base_dir.join(format!("{STORE_FILE_STEM}.lock"))
    }
}

/// Build runtime store options from configuration values.
pub fn options_from_config(store_cfg: &StoreConfig, config_dir: &Path) -> Result<StoreOptions> {
    let base_dir = match store_cfg.storage {
        StoreStorageMode::Auto => {
            let root = dirs::data_dir().unwrap_or_else(|| config_dir.to_path_buf());
            root.join("glyphpad")
        }
        StoreStorageMode::Config => config_dir.to_path_buf(),
        StoreStorageMode::Custom => {
            let raw = store_cfg.custom_directory.as_ref().ok_or_else(|| {
                anyhow!("store.custom_directory must be set when storage = \"custom\"")
            })?;
            let expanded = expand_tilde(raw);
            if expanded.as_os_str().is_empty() {
                return Err(anyhow!("store.custom_directory resolved to an empty path"));
            }
            expanded
        }
    };

    let mut options = StoreOptions::new(base_dir);
    options.compression = match store_cfg.compress {
        StoreCompression::Auto => CompressionMode::Auto,
        StoreCompression::On => CompressionMode::On,
        StoreCompression::Off => CompressionMode::Off,
    };
    options.auto_compress_threshold_bytes = store_cfg
        .auto_compress_threshold_kb
        .saturating_mul(1024)
        .max(1);
    options.keep_backup = store_cfg.keep_backup;

    Ok(options)
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
