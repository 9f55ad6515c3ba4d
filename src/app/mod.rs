//! The application loop: the single consumer of touchpad signals.
//!
//! Each iteration sleeps until either a new signal arrives or the open
//! gesture has been idle long enough, flushes a finished gesture to the
//! classifier and then processes at most one queued signal.

mod queue;
mod session;

pub use queue::SignalQueue;
pub use session::Session;

use crate::classifier::{Classifier, ClassifierError};
use crate::collection::SignalCollection;
use crate::config::Config;
use crate::executor::Executor;
use crate::signal::{self, Signal};
use log::{debug, info, warn};
use std::time::Duration;

/// What finished gestures are used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Gestures become samples for the symbol in training.
    Training,
    /// Gestures are classified and recognised symbols executed.
    Classification,
}

/// Why [`ApplicationLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The queue was closed; any gesture in progress was dropped.
    Closed,
    /// The training session collected all of its draws.
    TrainingComplete,
}

/// Idle timing of the loop.
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    pub idle_threshold: Duration,
    pub idle_poll: Duration,
}

impl From<&Config> for LoopSettings {
    fn from(config: &Config) -> Self {
        Self {
            idle_threshold: config.idle_threshold(),
            idle_poll: config.idle_poll(),
        }
    }
}

pub struct ApplicationLoop {
    queue: SignalQueue,
    collection: SignalCollection,
    classifier: Classifier,
    executor: Box<dyn Executor>,
    mode: LoopMode,
}

impl ApplicationLoop {
    pub fn new(
        queue: SignalQueue,
        classifier: Classifier,
        executor: Box<dyn Executor>,
        mode: LoopMode,
        settings: LoopSettings,
    ) -> Self {
        Self {
            queue,
            collection: SignalCollection::new(settings.idle_threshold, settings.idle_poll),
            classifier,
            executor,
            mode,
        }
    }

    /// Runs until the queue is closed and drained or, in training mode, until
    /// the session is complete.
    ///
    /// # Errors
    /// Training errors (no session started, store write failure) end the
    /// loop. Classification and execution failures never do.
    pub fn run(&mut self) -> Result<LoopExit, ClassifierError> {
        match self.mode {
            LoopMode::Training => debug!(
                "Application loop started in training mode for '{}'",
                self.classifier.training_symbol().unwrap_or("<none>")
            ),
            LoopMode::Classification => debug!("Application loop started"),
        }

        loop {
            let timeout = self.collection.get_time_when_old_enough(signal::now());
            self.queue.wait(timeout);

            if !self.collection.is_recent_enough(signal::now()) && self.flush()? {
                return Ok(LoopExit::TrainingComplete);
            }

            let signal = match self.queue.pop() {
                Some(signal) => signal,
                None if self.queue.is_closed() => {
                    if !self.collection.is_empty() {
                        debug!(
                            "Dropping unfinished gesture of {} signal(s) on shutdown",
                            self.collection.len()
                        );
                    }
                    return Ok(LoopExit::Closed);
                }
                None => continue,
            };

            if signal.is_stop() {
                if self.flush()? {
                    return Ok(LoopExit::TrainingComplete);
                }
            } else {
                self.collection.add_and_maintain(signal);
            }
        }
    }

    /// Hands the buffered gesture to the classifier and resets the buffer.
    /// Returns true once a training session is complete.
    fn flush(&mut self) -> Result<bool, ClassifierError> {
        let signals = self.collection.as_list();
        self.collection.reset();
        self.send_points_to_classifier(&signals)
    }

    fn send_points_to_classifier(&mut self, signals: &[Signal]) -> Result<bool, ClassifierError> {
        let points = signals.iter().filter(|s| s.is_point()).count();
        if points == 0 {
            return Ok(false);
        }
        debug!(
            "Gesture finished: {} signal(s), {} point(s)",
            signals.len(),
            points
        );

        match self.mode {
            LoopMode::Training => {
                let remaining = self.classifier.add_to_training_set(signals)?;
                if remaining == 0 {
                    println!("Symbol learned.");
                    return Ok(true);
                }
                println!("Draw it {remaining} more time(s).");
                Ok(false)
            }
            LoopMode::Classification => {
                match self.classifier.classify(signals) {
                    Some(symbol) => {
                        info!("Recognised '{}'", symbol);
                        if let Err(err) = self.executor.execute(&symbol) {
                            warn!("{}", err);
                        }
                    }
                    None => info!("Gesture not similar to any symbol"),
                }
                Ok(false)
            }
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn into_classifier(self) -> Classifier {
        self.classifier
    }
}

#[cfg(test)]
mod tests;
