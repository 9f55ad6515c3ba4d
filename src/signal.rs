//! Touchpad event records passed from the listener to the application loop.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// What a [`Signal`] means to the gesture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    /// Finger is on the pad at (x, y).
    Point,
    /// Finger left the pad; separates strokes inside one gesture.
    RaisingFinger,
    /// Forces the open gesture to be flushed immediately.
    Stop,
}

/// A single immutable touchpad event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub x: f64,
    pub y: f64,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub kind: SignalKind,
}

/// Absolute touchpad state as reported by a hardware source for one report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEvent {
    pub x: i32,
    pub y: i32,
    pub pressure: i32,
    pub timestamp: f64,
}

impl Signal {
    pub fn point(x: f64, y: f64, timestamp: f64) -> Self {
        Self {
            x,
            y,
            timestamp,
            kind: SignalKind::Point,
        }
    }

    pub fn raising_finger(timestamp: f64) -> Self {
        Self {
            x: -1.0,
            y: -1.0,
            timestamp,
            kind: SignalKind::RaisingFinger,
        }
    }

    pub fn stop(timestamp: f64) -> Self {
        Self {
            x: -1.0,
            y: -1.0,
            timestamp,
            kind: SignalKind::Stop,
        }
    }

    /// Converts a hardware report into a signal.
    ///
    /// Zero pressure means the finger was lifted. Reports that still lack a
    /// coordinate (the device has not sent ABS_X/ABS_Y yet) carry no usable
    /// position and yield `None`.
    pub fn from_raw(raw: &RawEvent) -> Option<Self> {
        if raw.pressure == 0 {
            return Some(Self::raising_finger(raw.timestamp));
        }
        if raw.x < 0 || raw.y < 0 {
            return None;
        }
        Some(Self::point(raw.x as f64, raw.y as f64, raw.timestamp))
    }

    pub fn is_point(&self) -> bool {
        self.kind == SignalKind::Point
    }

    pub fn is_raising_finger(&self) -> bool {
        self.kind == SignalKind::RaisingFinger
    }

    pub fn is_stop(&self) -> bool {
        self.kind == SignalKind::Stop
    }
}

/// Current wall-clock time in the same units as [`Signal::timestamp`].
pub fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}
