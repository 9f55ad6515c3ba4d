//! Touchpad symbol recognition.
//!
//! A listener thread turns touchpad reports into [`signal::Signal`]s, the
//! application loop groups them into gestures and the classifier either
//! learns them or matches them against trained symbols, whose bound
//! commands are then run by the executor.

pub mod app;
pub mod classifier;
pub mod cli;
pub mod collection;
pub mod commands;
pub mod config;
pub mod executor;
pub mod listener;
pub mod signal;
pub mod store;

#[cfg(test)]
mod test_shapes;

pub use config::Config;
