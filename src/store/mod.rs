//! Persistent store of user-trained symbols.
//!
//! Each symbol keeps its training samples, the template derived from them,
//! the command it triggers and whether it is active. The store is written as
//! JSON (optionally gzip-compressed) with file locking and backup rotation.

mod file;
mod options;

pub use file::{CURRENT_VERSION, load_store, save_store};
pub use options::{
    CompressionMode, DEFAULT_AUTO_COMPRESS_THRESHOLD_BYTES, StoreOptions, options_from_config,
};

use crate::classifier::SymbolTemplate;
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Signals recorded during one labeled draw.
pub type TrainingSample = Vec<Signal>;

/// Command run when a symbol is recognised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandBinding {
    pub command: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

impl CommandBinding {
    pub fn new(command: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            command: command.into(),
            arguments,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.command.trim().is_empty()
    }

    /// Command line as typed by the user, for listings and log lines.
    pub fn display(&self) -> String {
        if self.arguments.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.arguments.join(" "))
        }
    }
}

/// Everything persisted about one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSymbol {
    pub name: String,
    pub training_size: usize,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(flatten)]
    pub binding: CommandBinding,
    #[serde(default)]
    pub template: Option<SymbolTemplate>,
    #[serde(default)]
    pub samples: Vec<TrainingSample>,
}

fn default_active() -> bool {
    true
}

/// All user-trained symbols in training order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolStore {
    pub symbols: Vec<StoredSymbol>,
}

impl SymbolStore {
    pub fn get(&self, name: &str) -> Option<&StoredSymbol> {
        self.symbols.iter().find(|symbol| symbol.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut StoredSymbol> {
        self.symbols.iter_mut().find(|symbol| symbol.name == name)
    }

    /// Replaces the symbol with the same name in place, or appends it.
    pub fn upsert(&mut self, symbol: StoredSymbol) {
        match self.get_mut(&symbol.name) {
            Some(existing) => *existing = symbol,
            None => self.symbols.push(symbol),
        }
    }

    /// Removes the named symbol; returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.symbols.len();
        self.symbols.retain(|symbol| symbol.name != name);
        self.symbols.len() != before
    }

    pub fn names(&self) -> Vec<String> {
        self.symbols.iter().map(|symbol| symbol.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Errors raised while reading the symbol store.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read symbol store {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decompress symbol store {}: {source}", .path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("symbol store {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("symbol store {} has unsupported version {found} (expected {expected})", .path.display())]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("symbol store {} lists symbol '{name}' more than once", .path.display())]
    DuplicateSymbol { path: PathBuf, name: String },
}

/// Errors raised while writing the symbol store.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to write symbol store {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialise symbol store: {0}")]
    Serialize(#[from] serde_json::Error),
}
