//! Linux evdev touchpad reader.

use super::{HardwareSource, SourceError};
use crate::config::DeviceConfig;
use crate::signal::{self, RawEvent};
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{self, ErrorKind, Read};
use std::mem;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

const EV_SYN: u16 = 0x00;
const EV_KEY: u16 = 0x01;
const EV_ABS: u16 = 0x03;
const SYN_REPORT: u16 = 0x00;
const ABS_X: u16 = 0x00;
const ABS_Y: u16 = 0x01;
const ABS_PRESSURE: u16 = 0x18;
const BTN_TOUCH: u16 = 0x14a;

const INPUT_DIR: &str = "/dev/input";
const NAME_LEN: usize = 256;

const fn ioc(dir: u64, nr: u64, size: u64) -> u64 {
    (dir << 30) | (size << 16) | ((b'E' as u64) << 8) | nr
}

const EVIOCGNAME: u64 = ioc(2, 0x06, NAME_LEN as u64);
const EVIOCGRAB: u64 = ioc(1, 0x90, mem::size_of::<libc::c_int>() as u64);

/// Accumulates absolute axis updates between two `SYN_REPORT`s.
#[derive(Debug)]
struct Frame {
    x: i32,
    y: i32,
    pressure: Option<i32>,
    touching: bool,
    was_touching: bool,
}

impl Frame {
    fn new() -> Self {
        Self {
            x: -1,
            y: -1,
            pressure: None,
            touching: false,
            was_touching: false,
        }
    }

    fn apply(&mut self, kind: u16, code: u16, value: i32) {
        match (kind, code) {
            (EV_ABS, ABS_X) => self.x = value,
            (EV_ABS, ABS_Y) => self.y = value,
            (EV_ABS, ABS_PRESSURE) => self.pressure = Some(value),
            (EV_KEY, BTN_TOUCH) => self.touching = value != 0,
            _ => {}
        }
    }

    /// Closes the frame. A lift yields one report with zero pressure; frames
    /// without contact yield nothing.
    fn report(&mut self, timestamp: f64) -> Option<RawEvent> {
        let lifted = self.was_touching && !self.touching;
        let active = self.touching;
        self.was_touching = self.touching;

        if lifted {
            self.pressure = None;
            return Some(RawEvent {
                x: self.x,
                y: self.y,
                pressure: 0,
                timestamp,
            });
        }
        if !active {
            return None;
        }
        Some(RawEvent {
            x: self.x,
            y: self.y,
            // Pads without a pressure axis only report BTN_TOUCH.
            pressure: self.pressure.unwrap_or(1).max(1),
            timestamp,
        })
    }
}

/// An opened `/dev/input/event*` node.
pub struct EvdevSource {
    file: File,
    path: PathBuf,
    name: String,
    grabbed: bool,
    frame: Frame,
}

impl EvdevSource {
    /// Opens `device.path` if set, otherwise the first device whose name
    /// mentions a touchpad.
    pub fn connect(device: &DeviceConfig) -> Result<Self, SourceError> {
        let mut source = match &device.path {
            Some(path) => Self::open(Path::new(path))?,
            None => Self::discover()?,
        };
        if device.grab {
            source.grab();
        }
        Ok(source)
    }

    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|source| open_error(path, source))?;
        let name = device_name(&file).unwrap_or_else(|| "unknown device".to_string());
        Ok(Self {
            file,
            path: path.to_path_buf(),
            name,
            grabbed: false,
            frame: Frame::new(),
        })
    }

    fn discover() -> Result<Self, SourceError> {
        let entries = fs::read_dir(INPUT_DIR).map_err(|source| SourceError::Io {
            path: PathBuf::from(INPUT_DIR),
            source,
        })?;

        let mut nodes: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("event"))
            })
            .collect();
        nodes.sort();

        let mut denied = None;
        for node in nodes {
            match Self::open(&node) {
                Ok(source) if source.name.to_lowercase().contains("touchpad") => {
                    info!("Found touchpad '{}' at {}", source.name, node.display());
                    return Ok(source);
                }
                Ok(source) => debug!("Skipping {} ({})", node.display(), source.name),
                Err(SourceError::PermissionDenied { path }) => {
                    denied.get_or_insert(path);
                }
                Err(err) => debug!("Skipping {}: {}", node.display(), err),
            }
        }

        match denied {
            Some(path) => Err(SourceError::PermissionDenied { path }),
            None => Err(SourceError::NoDevice),
        }
    }

    /// Takes exclusive access so the pointer does not move while drawing.
    fn grab(&mut self) {
        // SAFETY: EVIOCGRAB takes an int by value on a valid evdev fd.
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), EVIOCGRAB as _, 1 as libc::c_int) };
        if rc == 0 {
            self.grabbed = true;
            debug!("Grabbed {}", self.path.display());
        } else {
            warn!(
                "Failed to grab {}: {}",
                self.path.display(),
                io::Error::last_os_error()
            );
        }
    }

    fn read_event(&mut self) -> io::Result<libc::input_event> {
        let mut buf = [0u8; mem::size_of::<libc::input_event>()];
        self.file.read_exact(&mut buf)?;
        // SAFETY: the buffer holds exactly one kernel input_event, which is
        // plain old data.
        Ok(unsafe { std::ptr::read_unaligned(buf.as_ptr().cast::<libc::input_event>()) })
    }
}

impl HardwareSource for EvdevSource {
    fn next_event(&mut self) -> Result<Option<RawEvent>, SourceError> {
        loop {
            let event = match self.read_event() {
                Ok(event) => event,
                Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(None),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(SourceError::Io {
                        path: self.path.clone(),
                        source,
                    });
                }
            };

            if event.type_ == EV_SYN && event.code == SYN_REPORT {
                // Stamped on arrival so ages compare against the same clock.
                if let Some(raw) = self.frame.report(signal::now()) {
                    return Ok(Some(raw));
                }
            } else {
                self.frame.apply(event.type_, event.code, event.value);
            }
        }
    }

    fn describe(&self) -> String {
        format!("'{}' ({})", self.name, self.path.display())
    }
}

impl Drop for EvdevSource {
    fn drop(&mut self) {
        if self.grabbed {
            // SAFETY: releasing a grab taken on the same fd.
            unsafe {
                libc::ioctl(self.file.as_raw_fd(), EVIOCGRAB as _, 0 as libc::c_int);
            }
        }
    }
}

fn open_error(path: &Path, source: io::Error) -> SourceError {
    if source.kind() == ErrorKind::PermissionDenied {
        SourceError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        SourceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn device_name(file: &File) -> Option<String> {
    let mut buf = [0u8; NAME_LEN];
    // SAFETY: EVIOCGNAME writes at most NAME_LEN bytes into `buf`.
    let rc = unsafe { libc::ioctl(file.as_raw_fd(), EVIOCGNAME as _, buf.as_mut_ptr()) };
    if rc < 0 {
        return None;
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Some(String::from_utf8_lossy(&buf[..end]).into_owned())
}
