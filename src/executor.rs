//! Runs the command bound to a recognised symbol.

use crate::store::CommandBinding;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::process::{Command, Stdio};
use std::thread;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("no command is bound to symbol '{0}'")]
    Unbound(String),

    #[error("failed to launch '{command}' for symbol '{symbol}': {source}")]
    Spawn {
        symbol: String,
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Receives recognised symbols from the application loop.
pub trait Executor: Send {
    /// Starts the action for `symbol` without waiting for it to finish.
    fn execute(&mut self, symbol: &str) -> Result<(), ExecError>;
}

/// Spawns bound commands as child processes.
pub struct ShellExecutor {
    bindings: HashMap<String, CommandBinding>,
}

impl ShellExecutor {
    pub fn new(bindings: HashMap<String, CommandBinding>) -> Self {
        Self { bindings }
    }

    pub fn binding(&self, symbol: &str) -> Option<&CommandBinding> {
        self.bindings.get(symbol)
    }
}

impl Executor for ShellExecutor {
    fn execute(&mut self, symbol: &str) -> Result<(), ExecError> {
        let binding = self
            .bindings
            .get(symbol)
            .filter(|binding| !binding.is_empty())
            .ok_or_else(|| ExecError::Unbound(symbol.to_string()))?;

        let mut command = Command::new(&binding.command);
        command
            .args(&binding.arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        let mut child = command.spawn().map_err(|source| ExecError::Spawn {
            symbol: symbol.to_string(),
            command: binding.command.clone(),
            source,
        })?;

        info!(
            "Running '{}' for symbol '{}' (pid: {})",
            binding.display(),
            symbol,
            child.id()
        );

        // Reap the child off the loop thread so a slow command never delays
        // gesture processing.
        let label = binding.display();
        thread::spawn(move || match child.wait() {
            Ok(status) if status.success() => debug!("'{}' finished", label),
            Ok(status) => warn!("'{}' exited with {}", label, status),
            Err(err) => warn!("Failed to wait for '{}': {}", label, err),
        });

        Ok(())
    }
}
