//! Symbol learning and recognition.
//!
//! Training collects a fixed number of labeled draws for one symbol and,
//! once complete, derives the symbol's template as the normalised mean of
//! those draws. Recognition normalises an unlabeled draw the same way and
//! picks the closest template, provided it is close enough and not tied with
//! another symbol.

mod builtin;
mod template;

pub use builtin::{BUILTIN_SYMBOLS, builtin_symbols};
pub use template::SymbolTemplate;

use crate::config::ClassifierConfig;
use crate::signal::Signal;
use crate::store::{
    self, CommandBinding, LoadError, SaveError, StoreOptions, StoredSymbol, SymbolStore,
    TrainingSample,
};
use log::{debug, info, warn};
use std::collections::HashMap;
use thiserror::Error;

/// Smallest number of draws accepted for a training session.
pub const MIN_TRAINING_SIZE: usize = 5;

/// Word size selecting one of the hardcoded symbol sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitness {
    B32,
    B64,
}

/// Where the classifier gets its symbols from.
#[derive(Debug, Clone)]
pub enum ClassifierMode {
    /// Hardcoded symbols; nothing is persisted.
    Builtin(Bitness),
    /// User-trained symbols from the store at the given location.
    User(StoreOptions),
}

/// Matching parameters.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierSettings {
    pub resample_points: usize,
    pub acceptance_threshold: f64,
    pub tie_tolerance: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self::from(&ClassifierConfig::default())
    }
}

impl From<&ClassifierConfig> for ClassifierSettings {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            resample_points: config.resample_points.max(2),
            acceptance_threshold: config.acceptance_threshold,
            tie_tolerance: config.tie_tolerance,
        }
    }
}

/// A symbol scheduled for (re)training with its recorded draw count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingTarget {
    pub symbol: String,
    pub training_size: usize,
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error("no training session is in progress")]
    NotTraining,

    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),
}

#[derive(Debug)]
struct TrainingSession {
    symbol: String,
    training_size: usize,
    samples: Vec<TrainingSample>,
    staged_binding: Option<CommandBinding>,
}

impl TrainingSession {
    fn remaining(&self) -> usize {
        self.training_size.saturating_sub(self.samples.len())
    }
}

pub struct Classifier {
    settings: ClassifierSettings,
    symbols: SymbolStore,
    store_options: Option<StoreOptions>,
    training: Option<TrainingSession>,
}

impl Classifier {
    /// Loads the symbol set selected by `mode`.
    ///
    /// # Errors
    /// Returns [`LoadError`] when a user store exists but cannot be read or
    /// parsed. A missing store is not an error and yields no symbols.
    pub fn initialize(mode: ClassifierMode, settings: ClassifierSettings) -> Result<Self, LoadError> {
        let (symbols, store_options) = match mode {
            ClassifierMode::Builtin(bitness) => {
                let symbols = builtin_symbols(bitness, settings.resample_points);
                (SymbolStore { symbols }, None)
            }
            ClassifierMode::User(options) => (store::load_store(&options)?, Some(options)),
        };

        let mut classifier = Self {
            settings,
            symbols,
            store_options,
            training: None,
        };
        classifier.refresh_stale_templates();
        info!(
            "Classifier ready with {} symbol(s) ({} active)",
            classifier.symbols.symbols.len(),
            classifier.symbols.symbols.iter().filter(|s| s.active).count()
        );
        Ok(classifier)
    }

    /// Templates stored with a different resample count cannot be compared
    /// against fresh draws; rebuild them in memory from their samples.
    fn refresh_stale_templates(&mut self) {
        let n = self.settings.resample_points;
        for symbol in &mut self.symbols.symbols {
            let fresh = symbol.template.as_ref().is_some_and(|t| t.len() == n);
            if fresh {
                continue;
            }
            match derive_template(&symbol.samples, n) {
                Some(template) => {
                    debug!("Rebuilt template for '{}' at {} points", symbol.name, n);
                    symbol.template = Some(template);
                }
                None => warn!(
                    "Symbol '{}' has no usable template or samples; it will not be recognised",
                    symbol.name
                ),
            }
        }
    }

    /// Starts (or restarts) a training session for `symbol_name`, dropping any
    /// draws collected by an unfinished session.
    pub fn reset_training_set(&mut self, training_size: usize, symbol_name: &str) {
        if let Some(previous) = &self.training {
            if !previous.samples.is_empty() {
                debug!(
                    "Discarding {} unfinished sample(s) for '{}'",
                    previous.samples.len(),
                    previous.symbol
                );
            }
        }
        self.training = Some(TrainingSession {
            symbol: symbol_name.to_string(),
            training_size,
            samples: Vec::new(),
            staged_binding: None,
        });
        info!(
            "Training '{}' with {} draw(s)",
            symbol_name, training_size
        );
    }

    /// Sets the command the symbol in training will be bound to on completion.
    /// Without a staged binding the symbol keeps its existing one.
    pub fn stage_binding(&mut self, binding: CommandBinding) -> Result<(), ClassifierError> {
        let session = self.training.as_mut().ok_or(ClassifierError::NotTraining)?;
        session.staged_binding = Some(binding);
        Ok(())
    }

    /// Records one draw for the symbol in training and returns how many draws
    /// are still needed.
    ///
    /// When the last draw arrives the template is derived from the whole
    /// session and the symbol is persisted; until then the stored symbol is
    /// left untouched. Draws that cannot be normalised are not counted.
    pub fn add_to_training_set(&mut self, signal_list: &[Signal]) -> Result<usize, ClassifierError> {
        let n = self.settings.resample_points;
        let session = self.training.as_mut().ok_or(ClassifierError::NotTraining)?;

        if SymbolTemplate::from_signals(signal_list, n).is_none() {
            warn!(
                "Ignoring draw for '{}': it needs at least two distinct points",
                session.symbol
            );
            return Ok(session.remaining());
        }

        session.samples.push(signal_list.to_vec());
        let remaining = session.remaining();
        debug!(
            "Recorded draw {}/{} for '{}'",
            session.samples.len(),
            session.training_size,
            session.symbol
        );
        if remaining > 0 {
            return Ok(remaining);
        }

        self.complete_training()?;
        Ok(0)
    }

    fn complete_training(&mut self) -> Result<(), ClassifierError> {
        let session = self.training.take().ok_or(ClassifierError::NotTraining)?;
        let template = derive_template(&session.samples, self.settings.resample_points);

        let existing = self.symbols.get(&session.symbol);
        let binding = session
            .staged_binding
            .or_else(|| existing.map(|s| s.binding.clone()))
            .unwrap_or_default();
        let active = existing.is_none_or(|s| s.active);

        let mut updated = self.symbols.clone();
        updated.upsert(StoredSymbol {
            name: session.symbol.clone(),
            training_size: session.training_size,
            active,
            binding,
            template,
            samples: session.samples,
        });

        if let Some(options) = &self.store_options {
            store::save_store(&updated, options)?;
        }
        self.symbols = updated;
        info!("Finished training '{}'", session.symbol);
        Ok(())
    }

    /// Returns the active symbol closest to the draw, or `None` when nothing
    /// is within the acceptance threshold or the two best symbols tie.
    pub fn classify(&self, signal_list: &[Signal]) -> Option<String> {
        let candidate = SymbolTemplate::from_signals(signal_list, self.settings.resample_points)?;

        let mut best: Option<(&str, f64)> = None;
        let mut runner_up = f64::INFINITY;
        for symbol in self.symbols.symbols.iter().filter(|s| s.active) {
            let Some(distance) = symbol
                .template
                .as_ref()
                .and_then(|template| template.distance(&candidate))
            else {
                continue;
            };
            debug!("Distance to '{}': {:.4}", symbol.name, distance);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {
                    runner_up = runner_up.min(distance);
                }
                _ => {
                    if let Some((_, previous)) = best {
                        runner_up = runner_up.min(previous);
                    }
                    best = Some((symbol.name.as_str(), distance));
                }
            }
        }

        let (name, distance) = best?;
        if distance >= self.settings.acceptance_threshold {
            debug!(
                "Closest symbol '{}' at {:.4} is beyond threshold {:.4}",
                name, distance, self.settings.acceptance_threshold
            );
            return None;
        }
        if runner_up - distance <= self.settings.tie_tolerance {
            debug!("Ambiguous draw: '{}' ties with another symbol", name);
            return None;
        }
        Some(name.to_string())
    }

    /// Selects symbols for retraining, in store order, keeping each one's
    /// recorded training size.
    ///
    /// With `repeat` the targets are returned for interactive redraw sessions.
    /// Without it the templates of the targets are rebuilt offline from their
    /// recorded samples and persisted.
    pub fn learn(
        &mut self,
        repeat: bool,
        symbol_name: Option<&str>,
    ) -> Result<Vec<TrainingTarget>, ClassifierError> {
        let targets: Vec<TrainingTarget> = match symbol_name {
            Some(name) => {
                let symbol = self
                    .symbols
                    .get(name)
                    .ok_or_else(|| ClassifierError::UnknownSymbol(name.to_string()))?;
                vec![TrainingTarget {
                    symbol: symbol.name.clone(),
                    training_size: symbol.training_size,
                }]
            }
            None => self
                .symbols
                .symbols
                .iter()
                .map(|symbol| TrainingTarget {
                    symbol: symbol.name.clone(),
                    training_size: symbol.training_size,
                })
                .collect(),
        };

        if repeat {
            return Ok(targets);
        }

        let n = self.settings.resample_points;
        let mut updated = self.symbols.clone();
        for target in &targets {
            if let Some(symbol) = updated.get_mut(&target.symbol) {
                match derive_template(&symbol.samples, n) {
                    Some(template) => symbol.template = Some(template),
                    None => warn!(
                        "Symbol '{}' has no usable samples; keeping its current template",
                        symbol.name
                    ),
                }
            }
        }
        if let Some(options) = &self.store_options {
            store::save_store(&updated, options)?;
        }
        self.symbols = updated;
        info!("Rebuilt {} template(s) from recorded samples", targets.len());
        Ok(targets)
    }

    /// Command bindings of all symbols with a non-empty command.
    pub fn bindings(&self) -> HashMap<String, CommandBinding> {
        self.symbols
            .symbols
            .iter()
            .filter(|symbol| !symbol.binding.is_empty())
            .map(|symbol| (symbol.name.clone(), symbol.binding.clone()))
            .collect()
    }

    pub fn symbol_names(&self) -> Vec<String> {
        self.symbols.names()
    }

    pub fn template(&self, symbol_name: &str) -> Option<&SymbolTemplate> {
        self.symbols.get(symbol_name)?.template.as_ref()
    }

    /// Symbol currently being trained, if any.
    pub fn training_symbol(&self) -> Option<&str> {
        self.training.as_ref().map(|session| session.symbol.as_str())
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }
}

/// Mean of the normalised samples. Falls back to the medoid sample when the
/// mean collapses (e.g. the same loop drawn in opposite directions).
fn derive_template(samples: &[TrainingSample], n: usize) -> Option<SymbolTemplate> {
    let templates: Vec<SymbolTemplate> = samples
        .iter()
        .filter_map(|sample| SymbolTemplate::from_signals(sample, n))
        .collect();
    if templates.is_empty() {
        return None;
    }
    SymbolTemplate::average(&templates).or_else(|| medoid(&templates))
}

fn medoid(templates: &[SymbolTemplate]) -> Option<SymbolTemplate> {
    templates
        .iter()
        .map(|candidate| {
            let spread: f64 = templates
                .iter()
                .filter_map(|other| candidate.distance(other))
                .sum();
            (candidate, spread)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(template, _)| template.clone())
}
