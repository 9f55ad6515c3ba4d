use super::{ApplicationLoop, LoopExit, LoopMode, LoopSettings, SignalQueue};
use crate::classifier::Classifier;
use crate::config::Config;
use crate::executor::Executor;
use crate::listener::{self, Listener};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use std::thread;

/// A connected touchpad plus termination handling, shared by consecutive
/// loop runs (e.g. training several symbols in a row).
pub struct Session {
    queue: SignalQueue,
    settings: LoopSettings,
    signals: Handle,
}

impl Session {
    /// Opens the touchpad, starts the listener thread and routes SIGINT and
    /// SIGTERM to a queue close so the loop exits cleanly.
    pub fn start(config: &Config) -> Result<Self> {
        let source =
            listener::connect_touchpad(&config.device).context("Failed to open touchpad")?;
        let queue = SignalQueue::new();

        let mut signals =
            Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handler")?;
        let handle = signals.handle();
        let closer = queue.clone();
        thread::Builder::new()
            .name("glyphpad-signals".into())
            .spawn(move || {
                for sig in signals.forever() {
                    info!(
                        "Received {} - shutting down",
                        if sig == SIGTERM { "SIGTERM" } else { "SIGINT" }
                    );
                    closer.close();
                }
            })
            .context("Failed to spawn signal handler thread")?;

        // The listener blocks in read(2); it is left detached and ends with
        // the process.
        Listener::spawn(source, queue.clone()).context("Failed to spawn listener thread")?;

        Ok(Self {
            queue,
            settings: LoopSettings::from(config),
            signals: handle,
        })
    }

    /// Runs one application loop over the shared queue and hands the
    /// classifier back for the next run.
    pub fn run(
        &self,
        classifier: Classifier,
        mode: LoopMode,
        executor: Box<dyn Executor>,
    ) -> Result<(Classifier, LoopExit)> {
        if mode == LoopMode::Training {
            let dropped = self.queue.clear();
            if dropped > 0 {
                debug!("Discarded {} signal(s) queued before training", dropped);
            }
        }

        let mut app = ApplicationLoop::new(
            self.queue.clone(),
            classifier,
            executor,
            mode,
            self.settings,
        );
        let exit = app.run()?;
        if exit == LoopExit::Closed && mode == LoopMode::Training {
            warn!("Training interrupted before all draws were collected");
        }
        Ok((app.into_classifier(), exit))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.queue.close();
        self.signals.close();
    }
}
