//! Producer side of the pipeline: turns hardware reports into signals.

#[cfg(target_os = "linux")]
mod evdev;

#[cfg(target_os = "linux")]
pub use evdev::EvdevSource;

use crate::app::SignalQueue;
use crate::config::DeviceConfig;
use crate::signal::{self, RawEvent, Signal};
use log::{debug, error, info};
use std::io;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no touchpad found under /dev/input; set device.path in config.toml")]
    NoDevice,

    #[error(
        "permission denied opening {}; run as root or add your user to the 'input' group",
        .path.display()
    )]
    PermissionDenied { path: PathBuf },

    #[error("touchpad I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reading touchpads is only supported on Linux")]
    Unsupported,
}

/// A device producing absolute touchpad reports.
pub trait HardwareSource: Send {
    /// Blocks until the next report. `Ok(None)` means the device is gone.
    fn next_event(&mut self) -> Result<Option<RawEvent>, SourceError>;

    fn describe(&self) -> String;
}

/// Opens the configured touchpad, or the first one found.
#[cfg(target_os = "linux")]
pub fn connect_touchpad(device: &DeviceConfig) -> Result<Box<dyn HardwareSource>, SourceError> {
    Ok(Box::new(EvdevSource::connect(device)?))
}

#[cfg(not(target_os = "linux"))]
pub fn connect_touchpad(_device: &DeviceConfig) -> Result<Box<dyn HardwareSource>, SourceError> {
    Err(SourceError::Unsupported)
}

/// Listener thread feeding a [`SignalQueue`].
pub struct Listener;

impl Listener {
    /// Spawns the producer thread. When the source ends or fails a final
    /// stop signal is queued so the open gesture is flushed, then the queue
    /// is closed.
    pub fn spawn(
        mut source: Box<dyn HardwareSource>,
        queue: SignalQueue,
    ) -> io::Result<JoinHandle<Result<(), SourceError>>> {
        thread::Builder::new()
            .name("glyphpad-listener".into())
            .spawn(move || {
                info!("Listening on {}", source.describe());
                let result = pump(source.as_mut(), &queue);
                queue.push(Signal::stop(signal::now()));
                queue.close();
                if let Err(err) = &result {
                    error!("Listener stopped: {}", err);
                }
                result
            })
    }
}

fn pump(source: &mut dyn HardwareSource, queue: &SignalQueue) -> Result<(), SourceError> {
    while !queue.is_closed() {
        match source.next_event()? {
            Some(raw) => {
                if let Some(signal) = Signal::from_raw(&raw) {
                    queue.push(signal);
                }
            }
            None => {
                debug!("{} reached end of stream", source.describe());
                break;
            }
        }
    }
    Ok(())
}
