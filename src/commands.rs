//! Subcommand handlers.

use crate::app::{LoopExit, LoopMode, Session};
use crate::classifier::{
    Bitness, Classifier, ClassifierMode, ClassifierSettings, MIN_TRAINING_SIZE,
};
use crate::cli::{Command, RunMode, SymbolSelection};
use crate::config::Config;
use crate::executor::ShellExecutor;
use crate::store::{self, CommandBinding, StoreOptions, SymbolStore};
use anyhow::{Context, Result};
use log::{info, warn};
use std::collections::HashMap;
use thiserror::Error;

/// Argument problems detected before any thread is started.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("the training size should be at least 5 (got {0})")]
    TrainingSizeTooSmall(usize),

    #[error("the symbol name must not be empty")]
    EmptySymbolName,

    #[error("the command must not be empty")]
    EmptyCommand,

    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),
}

pub fn dispatch(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Add {
            training_size,
            symbol,
            command,
            arguments,
        } => add(config, training_size, &symbol, CommandBinding::new(command, arguments)),
        Command::Repeat { symbol, offline } => repeat(config, symbol.as_deref(), offline),
        Command::Run { mode } => run(config, mode),
        Command::List => {
            print!("{}", render_listing(&store::load_store(&store_options(config)?)?));
            Ok(())
        }
        Command::Delete(selection) => {
            let removed = update_store(config, |store| delete_symbols(store, &selection))?;
            println!("Deleted {} symbol(s).", removed.len());
            Ok(())
        }
        Command::Modify {
            symbol,
            command,
            arguments,
        } => {
            let binding = CommandBinding::new(command, arguments);
            let shown = binding.display();
            update_store(config, |store| modify_symbol(store, &symbol, binding))?;
            println!("'{symbol}' now runs: {shown}");
            Ok(())
        }
        Command::Activate(selection) => {
            let changed = update_store(config, |store| set_active(store, &selection, true))?;
            println!("Activated {} symbol(s).", changed.len());
            Ok(())
        }
        Command::Deactivate(selection) => {
            let changed = update_store(config, |store| set_active(store, &selection, false))?;
            println!("Deactivated {} symbol(s).", changed.len());
            Ok(())
        }
    }
}

fn store_options(config: &Config) -> Result<StoreOptions> {
    store::options_from_config(&config.store, &Config::config_dir()?)
}

fn user_classifier(config: &Config) -> Result<Classifier> {
    let options = store_options(config)?;
    Classifier::initialize(
        ClassifierMode::User(options),
        ClassifierSettings::from(&config.classifier),
    )
    .context("Failed to load trained symbols")
}

pub fn validate_add(
    training_size: usize,
    symbol: &str,
    binding: &CommandBinding,
) -> Result<(), ValidationError> {
    if training_size < MIN_TRAINING_SIZE {
        return Err(ValidationError::TrainingSizeTooSmall(training_size));
    }
    if symbol.trim().is_empty() {
        return Err(ValidationError::EmptySymbolName);
    }
    if binding.is_empty() {
        return Err(ValidationError::EmptyCommand);
    }
    Ok(())
}

fn add(config: &Config, training_size: usize, symbol: &str, binding: CommandBinding) -> Result<()> {
    validate_add(training_size, symbol, &binding)?;

    let mut classifier = user_classifier(config)?;
    if classifier.template(symbol).is_some() {
        info!("'{}' already exists; it will be retrained", symbol);
    }
    classifier.reset_training_set(training_size, symbol);
    classifier.stage_binding(binding)?;

    let session = Session::start(config)?;
    println!("Draw '{symbol}' {training_size} times on your touchpad.");
    let (_, exit) = session.run(
        classifier,
        LoopMode::Training,
        Box::new(ShellExecutor::new(HashMap::new())),
    )?;
    if exit == LoopExit::Closed {
        println!("Training of '{symbol}' cancelled; nothing was saved.");
    }
    Ok(())
}

fn repeat(config: &Config, symbol: Option<&str>, offline: bool) -> Result<()> {
    let mut classifier = user_classifier(config)?;

    if offline {
        let targets = classifier.learn(false, symbol)?;
        println!("Rebuilt {} template(s).", targets.len());
        return Ok(());
    }

    let targets = classifier.learn(true, symbol)?;
    if targets.is_empty() {
        println!("No symbols to retrain.");
        return Ok(());
    }

    let session = Session::start(config)?;
    for target in targets {
        classifier.reset_training_set(target.training_size, &target.symbol);
        println!(
            "Draw '{}' {} times on your touchpad.",
            target.symbol, target.training_size
        );
        let (returned, exit) = session.run(
            classifier,
            LoopMode::Training,
            Box::new(ShellExecutor::new(HashMap::new())),
        )?;
        classifier = returned;
        if exit == LoopExit::Closed {
            println!("Retraining cancelled at '{}'.", target.symbol);
            break;
        }
    }
    Ok(())
}

/// Bindings for the hardcoded symbols come from `[builtin.commands]`.
fn builtin_bindings(config: &Config) -> HashMap<String, CommandBinding> {
    config
        .builtin
        .commands
        .iter()
        .map(|(symbol, builtin)| {
            (
                symbol.clone(),
                CommandBinding::new(builtin.command.clone(), builtin.arguments.clone()),
            )
        })
        .collect()
}

fn run(config: &Config, mode: RunMode) -> Result<()> {
    let settings = ClassifierSettings::from(&config.classifier);
    let (classifier, bindings) = match mode {
        RunMode::Builtin32 | RunMode::Builtin64 => {
            let bitness = if mode == RunMode::Builtin32 {
                Bitness::B32
            } else {
                Bitness::B64
            };
            let classifier = Classifier::initialize(ClassifierMode::Builtin(bitness), settings)
                .context("Failed to load builtin symbols")?;
            (classifier, builtin_bindings(config))
        }
        RunMode::User => {
            let classifier = user_classifier(config)?;
            let bindings = classifier.bindings();
            (classifier, bindings)
        }
    };

    if classifier.symbol_names().is_empty() {
        warn!("No symbols to recognise; train one with `glyphpad add`");
    }
    for symbol in classifier.symbol_names() {
        if !bindings.contains_key(&symbol) {
            warn!("Symbol '{}' has no command bound", symbol);
        }
    }

    let session = Session::start(config)?;
    println!("Listening for symbols. Press Ctrl+C to stop.");
    session.run(
        classifier,
        LoopMode::Classification,
        Box::new(ShellExecutor::new(bindings)),
    )?;
    Ok(())
}

/// Loads the store, applies `change` and saves the result.
fn update_store<T>(
    config: &Config,
    change: impl FnOnce(&mut SymbolStore) -> Result<T, ValidationError>,
) -> Result<T> {
    let options = store_options(config)?;
    let mut symbols = store::load_store(&options)?;
    let outcome = change(&mut symbols)?;
    store::save_store(&symbols, &options)?;
    Ok(outcome)
}

fn selected_names(
    symbols: &SymbolStore,
    selection: &SymbolSelection,
) -> Result<Vec<String>, ValidationError> {
    if selection.all {
        return Ok(symbols.names());
    }
    for name in &selection.select {
        if symbols.get(name).is_none() {
            return Err(ValidationError::UnknownSymbol(name.clone()));
        }
    }
    Ok(selection.select.clone())
}

pub fn delete_symbols(
    symbols: &mut SymbolStore,
    selection: &SymbolSelection,
) -> Result<Vec<String>, ValidationError> {
    let names = selected_names(symbols, selection)?;
    for name in &names {
        symbols.remove(name);
    }
    Ok(names)
}

pub fn modify_symbol(
    symbols: &mut SymbolStore,
    symbol: &str,
    binding: CommandBinding,
) -> Result<(), ValidationError> {
    if binding.is_empty() {
        return Err(ValidationError::EmptyCommand);
    }
    let stored = symbols
        .get_mut(symbol)
        .ok_or_else(|| ValidationError::UnknownSymbol(symbol.to_string()))?;
    stored.binding = binding;
    Ok(())
}

pub fn set_active(
    symbols: &mut SymbolStore,
    selection: &SymbolSelection,
    active: bool,
) -> Result<Vec<String>, ValidationError> {
    let names = selected_names(symbols, selection)?;
    for name in &names {
        if let Some(stored) = symbols.get_mut(name) {
            stored.active = active;
        }
    }
    Ok(names)
}

pub fn render_listing(symbols: &SymbolStore) -> String {
    if symbols.is_empty() {
        return "No symbols stored.\n".to_string();
    }

    let width = symbols
        .symbols
        .iter()
        .map(|symbol| symbol.name.len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for symbol in &symbols.symbols {
        let status = if symbol.active { "active" } else { "inactive" };
        let command = if symbol.binding.is_empty() {
            "<no command>".to_string()
        } else {
            symbol.binding.display()
        };
        out.push_str(&format!(
            "{:<width$}  {:<8}  {:>2} draws  {}\n",
            symbol.name,
            status,
            symbol.samples.len(),
            command,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoredSymbol;

    fn stored(name: &str, command: &str) -> StoredSymbol {
        StoredSymbol {
            name: name.to_string(),
            training_size: 5,
            active: true,
            binding: CommandBinding::new(command, vec![]),
            template: None,
            samples: vec![],
        }
    }

    fn sample_store() -> SymbolStore {
        SymbolStore {
            symbols: vec![stored("circle", "firefox"), stored("square", "")],
        }
    }

    fn select(names: &[&str]) -> SymbolSelection {
        SymbolSelection {
            all: false,
            select: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    fn all() -> SymbolSelection {
        SymbolSelection {
            all: true,
            select: vec![],
        }
    }

    #[test]
    fn training_size_below_minimum_is_rejected() {
        let binding = CommandBinding::new("touch", vec!["/tmp/x".into()]);
        let err = validate_add(3, "circle", &binding).unwrap_err();
        assert_eq!(err, ValidationError::TrainingSizeTooSmall(3));
        assert!(err.to_string().contains("at least 5"));
        assert!(validate_add(5, "circle", &binding).is_ok());
    }

    #[test]
    fn empty_name_or_command_is_rejected() {
        let binding = CommandBinding::new("touch", vec![]);
        assert_eq!(
            validate_add(5, " ", &binding),
            Err(ValidationError::EmptySymbolName)
        );
        assert_eq!(
            validate_add(5, "circle", &CommandBinding::new("", vec![])),
            Err(ValidationError::EmptyCommand)
        );
    }

    #[test]
    fn delete_selected_and_all() {
        let mut symbols = sample_store();
        assert_eq!(
            delete_symbols(&mut symbols, &select(&["square"])).unwrap(),
            vec!["square"]
        );
        assert_eq!(symbols.names(), vec!["circle"]);

        delete_symbols(&mut symbols, &all()).unwrap();
        assert!(symbols.is_empty());
    }

    #[test]
    fn unknown_selection_changes_nothing() {
        let mut symbols = sample_store();
        let err = delete_symbols(&mut symbols, &select(&["circle", "nope"])).unwrap_err();
        assert_eq!(err, ValidationError::UnknownSymbol("nope".into()));
        assert_eq!(symbols, sample_store());
    }

    #[test]
    fn modify_rebinds_known_symbol() {
        let mut symbols = sample_store();
        modify_symbol(
            &mut symbols,
            "square",
            CommandBinding::new("notify-send", vec!["hi".into()]),
        )
        .unwrap();
        assert_eq!(symbols.get("square").unwrap().binding.display(), "notify-send hi");

        assert!(matches!(
            modify_symbol(&mut symbols, "nope", CommandBinding::new("x", vec![])),
            Err(ValidationError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn deactivate_then_activate() {
        let mut symbols = sample_store();
        set_active(&mut symbols, &select(&["circle"]), false).unwrap();
        assert!(!symbols.get("circle").unwrap().active);
        assert!(symbols.get("square").unwrap().active);

        set_active(&mut symbols, &all(), true).unwrap();
        assert!(symbols.symbols.iter().all(|s| s.active));
    }

    #[test]
    fn listing_shows_status_and_command() {
        let mut symbols = sample_store();
        symbols.get_mut("square").unwrap().active = false;
        let listing = render_listing(&symbols);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("circle") && lines[0].contains("firefox"));
        assert!(lines[1].contains("inactive") && lines[1].contains("<no command>"));

        assert_eq!(render_listing(&SymbolStore::default()), "No symbols stored.\n");
    }

    #[test]
    fn builtin_bindings_come_from_config() {
        let mut config = Config::default();
        config.builtin.commands.insert(
            "circle".into(),
            crate::config::BuiltinCommand {
                command: "firefox".into(),
                arguments: vec!["--new-window".into()],
            },
        );
        let bindings = builtin_bindings(&config);
        assert_eq!(bindings["circle"].display(), "firefox --new-window");
    }
}
