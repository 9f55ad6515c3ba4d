//! Hardcoded symbol set used by `run 32` and `run 64`.

use super::Bitness;
use super::template::SymbolTemplate;
use crate::store::{CommandBinding, StoredSymbol};
use log::debug;
use std::f64::consts::TAU;

/// Names of the builtin symbols, in matching order.
pub const BUILTIN_SYMBOLS: [&str; 7] = [
    "circle",
    "square",
    "triangle",
    "line-right",
    "line-down",
    "check",
    "zigzag",
];

/// Touchpad y grows downwards, so "down" means increasing y.
fn outline(name: &str) -> Vec<[f64; 2]> {
    match name {
        "circle" => (0..=64)
            .map(|i| {
                let t = TAU * i as f64 / 64.0;
                [t.cos(), t.sin()]
            })
            .collect(),
        "square" => vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]],
        "triangle" => vec![[0.5, 0.0], [1.0, 1.0], [0.0, 1.0], [0.5, 0.0]],
        "line-right" => vec![[0.0, 0.0], [1.0, 0.0]],
        "line-down" => vec![[0.0, 0.0], [0.0, 1.0]],
        "check" => vec![[0.0, 0.5], [0.35, 1.0], [1.0, 0.0]],
        "zigzag" => vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
        _ => Vec::new(),
    }
}

/// Builds the hardcoded symbols. Templates are resolution independent, so
/// both bitness variants share the same outlines.
pub fn builtin_symbols(bitness: Bitness, resample_points: usize) -> Vec<StoredSymbol> {
    debug!(
        "Building {} builtin symbols for {:?}",
        BUILTIN_SYMBOLS.len(),
        bitness
    );
    BUILTIN_SYMBOLS
        .iter()
        .filter_map(|name| {
            let template = SymbolTemplate::from_path(&outline(name), resample_points)?;
            Some(StoredSymbol {
                name: (*name).to_string(),
                training_size: 0,
                active: true,
                binding: CommandBinding::default(),
                template: Some(template),
                samples: Vec::new(),
            })
        })
        .collect()
}
