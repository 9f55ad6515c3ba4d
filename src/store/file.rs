use super::options::{CompressionMode, StoreOptions};
use super::{LoadError, SaveError, StoredSymbol, SymbolStore};
use chrono::Utc;
use flate2::{Compression, bufread::GzDecoder, write::GzEncoder};
use fs2::FileExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    last_modified: String,
    #[serde(default)]
    symbols: Vec<StoredSymbol>,
}

/// Load the symbol store. A missing store yields an empty one.
pub fn load_store(options: &StoreOptions) -> Result<SymbolStore, LoadError> {
    let store_path = options.store_file_path();
    if !store_path.exists() {
        debug!(
            "No symbol store present at {}, starting empty",
            store_path.display()
        );
        return Ok(SymbolStore::default());
    }

    let lock_path = options.lock_file_path();
    let lock_file = open_lock_file(&lock_path).map_err(|source| LoadError::Io {
        path: lock_path.clone(),
        source,
    })?;
    FileExt::lock_shared(&lock_file).map_err(|source| LoadError::Io {
        path: lock_path.clone(),
        source,
    })?;

    let result = load_store_inner(&store_path);

    FileExt::unlock(&lock_file).unwrap_or_else(|err| {
        warn!(
            "failed to unlock symbol store {}: {}",
            lock_path.display(),
            err
        )
    });

    let store = result?;
    info!(
        "Loaded {} symbol(s) from {}",
        store.symbols.len(),
        store_path.display()
    );
    Ok(store)
}

fn load_store_inner(store_path: &Path) -> Result<SymbolStore, LoadError> {
    let io_err = |source| LoadError::Io {
        path: store_path.to_path_buf(),
        source,
    };

    let mut file_bytes = Vec::new();
    File::open(store_path)
        .and_then(|mut file| file.read_to_end(&mut file_bytes))
        .map_err(io_err)?;

    let payload = if is_gzip(&file_bytes) {
        let mut decoder = GzDecoder::new(&file_bytes[..]);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|source| LoadError::Decompress {
                path: store_path.to_path_buf(),
                source,
            })?;
        out
    } else {
        file_bytes
    };

    // An empty file is what an interrupted first save leaves behind.
    if payload.iter().all(u8::is_ascii_whitespace) {
        debug!("Symbol store {} is empty", store_path.display());
        return Ok(SymbolStore::default());
    }

    let store_file: StoreFile =
        serde_json::from_slice(&payload).map_err(|source| LoadError::Corrupt {
            path: store_path.to_path_buf(),
            source,
        })?;

    if store_file.version != CURRENT_VERSION {
        return Err(LoadError::UnsupportedVersion {
            path: store_path.to_path_buf(),
            found: store_file.version,
            expected: CURRENT_VERSION,
        });
    }

    let mut seen = HashSet::new();
    for symbol in &store_file.symbols {
        if !seen.insert(symbol.name.as_str()) {
            return Err(LoadError::DuplicateSymbol {
                path: store_path.to_path_buf(),
                name: symbol.name.clone(),
            });
        }
    }

    debug!(
        "Symbol store {} last modified {}",
        store_path.display(),
        store_file.last_modified
    );

    Ok(SymbolStore {
        symbols: store_file.symbols,
    })
}

/// Persist the store, rotating the previous file into a backup.
pub fn save_store(store: &SymbolStore, options: &StoreOptions) -> Result<(), SaveError> {
    fs::create_dir_all(&options.base_dir).map_err(|source| SaveError::Io {
        path: options.base_dir.clone(),
        source,
    })?;

    let lock_path = options.lock_file_path();
    let lock_file = open_lock_file(&lock_path).map_err(|source| SaveError::Io {
        path: lock_path.clone(),
        source,
    })?;
    FileExt::lock_exclusive(&lock_file).map_err(|source| SaveError::Io {
        path: lock_path.clone(),
        source,
    })?;

    let result = save_store_inner(store, options);

    FileExt::unlock(&lock_file).unwrap_or_else(|err| {
        warn!(
            "failed to unlock symbol store {}: {}",
            lock_path.display(),
            err
        )
    });

    result
}

fn save_store_inner(store: &SymbolStore, options: &StoreOptions) -> Result<(), SaveError> {
    let store_path = options.store_file_path();
    let backup_path = options.backup_file_path();

    let file_payload = StoreFile {
        version: CURRENT_VERSION,
        last_modified: Utc::now().to_rfc3339(),
        symbols: store.symbols.clone(),
    };

    let mut bytes = serde_json::to_vec_pretty(&file_payload)?;

    let should_compress = match options.compression {
        CompressionMode::Off => false,
        CompressionMode::On => true,
        CompressionMode::Auto => (bytes.len() as u64) >= options.auto_compress_threshold_bytes,
    };

    if should_compress {
        bytes = compress_bytes(&bytes).map_err(|source| SaveError::Io {
            path: store_path.clone(),
            source,
        })?;
    }

    let tmp_path = temp_path(&store_path);
    write_synced(&tmp_path, &bytes).map_err(|source| SaveError::Io {
        path: tmp_path.clone(),
        source,
    })?;

    if store_path.exists() {
        if options.keep_backup {
            if backup_path.exists() {
                fs::remove_file(&backup_path).ok();
            }
            fs::rename(&store_path, &backup_path).map_err(|source| SaveError::Io {
                path: backup_path.clone(),
                source,
            })?;
        } else {
            fs::remove_file(&store_path).ok();
        }
    }

    fs::rename(&tmp_path, &store_path).map_err(|source| SaveError::Io {
        path: store_path.clone(),
        source,
    })?;

    info!(
        "Symbol store saved to {} ({} symbols, {} bytes, compression={})",
        store_path.display(),
        store.symbols.len(),
        bytes.len(),
        should_compress
    );

    Ok(())
}

fn open_lock_file(lock_path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    tmp_file.write_all(bytes)?;
    tmp_file.sync_all()
}

fn compress_bytes(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() > 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

fn temp_path(target: &Path) -> PathBuf {
    let mut candidate = target.with_extension("json.tmp");
    let mut counter = 0u32;
    while candidate.exists() {
        counter += 1;
        candidate = target.with_extension(format!("json.tmp{}", counter));
    }
    candidate
}
