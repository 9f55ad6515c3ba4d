//! Shape normalisation and distance for symbol templates.
//!
//! A drawn symbol is reduced to a fixed number of points spaced evenly along
//! its path, shifted so the centroid sits at the origin and scaled uniformly
//! so the larger side of its bounding box is 1. Uniform scaling keeps thin
//! shapes (lines) distinguishable from round ones.

use crate::signal::Signal;
use serde::{Deserialize, Serialize};

/// Minimum path extent (in touchpad units) for a draw to be normalisable.
const MIN_EXTENT: f64 = 1e-9;

/// Normalised, fixed-length point sequence representing a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolTemplate {
    pub points: Vec<[f64; 2]>,
}

impl SymbolTemplate {
    /// Normalises the point signals of a draw. Returns `None` for draws with
    /// fewer than two distinct points.
    pub fn from_signals(signals: &[Signal], resample_points: usize) -> Option<Self> {
        let path: Vec<[f64; 2]> = signals
            .iter()
            .filter(|signal| signal.is_point())
            .map(|signal| [signal.x, signal.y])
            .collect();
        Self::from_path(&path, resample_points)
    }

    pub fn from_path(path: &[[f64; 2]], resample_points: usize) -> Option<Self> {
        let resampled = resample(path, resample_points.max(2))?;
        normalize(resampled).map(|points| Self { points })
    }

    /// Point-wise mean of templates sharing one length, renormalised.
    pub fn average(templates: &[SymbolTemplate]) -> Option<Self> {
        let first = templates.first()?;
        let len = first.points.len();
        if templates.iter().any(|t| t.points.len() != len) {
            return None;
        }

        let count = templates.len() as f64;
        let mut mean = vec![[0.0, 0.0]; len];
        for template in templates {
            for (acc, point) in mean.iter_mut().zip(&template.points) {
                acc[0] += point[0] / count;
                acc[1] += point[1] / count;
            }
        }
        normalize(mean).map(|points| Self { points })
    }

    /// Mean Euclidean distance between corresponding points, or `None` when
    /// the templates were built with different resample counts.
    pub fn distance(&self, other: &SymbolTemplate) -> Option<f64> {
        if self.points.len() != other.points.len() || self.points.is_empty() {
            return None;
        }
        let total: f64 = self
            .points
            .iter()
            .zip(&other.points)
            .map(|(a, b)| ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt())
            .sum();
        Some(total / self.points.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn path_length(path: &[[f64; 2]]) -> f64 {
    path.windows(2).map(|w| segment_length(w[0], w[1])).sum()
}

fn segment_length(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt()
}

/// Resamples `path` to `n` points evenly spaced along its length.
fn resample(path: &[[f64; 2]], n: usize) -> Option<Vec<[f64; 2]>> {
    if path.len() < 2 {
        return None;
    }
    let total = path_length(path);
    if total <= MIN_EXTENT {
        return None;
    }

    let interval = total / (n - 1) as f64;
    let mut out = Vec::with_capacity(n);
    out.push(path[0]);

    let mut carried = 0.0;
    let mut prev = path[0];
    let mut i = 1;
    while i < path.len() && out.len() < n {
        let current = path[i];
        let seg = segment_length(prev, current);
        if seg > 0.0 && carried + seg >= interval {
            let t = (interval - carried) / seg;
            let point = [
                prev[0] + t * (current[0] - prev[0]),
                prev[1] + t * (current[1] - prev[1]),
            ];
            out.push(point);
            // Continue from the inserted point on the same segment.
            prev = point;
            carried = 0.0;
        } else {
            carried += seg;
            prev = current;
            i += 1;
        }
    }

    // Rounding can leave the final point unplaced.
    let last = path[path.len() - 1];
    while out.len() < n {
        out.push(last);
    }
    Some(out)
}

/// Centroid to origin, larger bounding-box side to 1.
fn normalize(mut points: Vec<[f64; 2]>) -> Option<Vec<[f64; 2]>> {
    if points.is_empty() {
        return None;
    }

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in &points {
        min_x = min_x.min(p[0]);
        max_x = max_x.max(p[0]);
        min_y = min_y.min(p[1]);
        max_y = max_y.max(p[1]);
    }
    let extent = (max_x - min_x).max(max_y - min_y);
    if !extent.is_finite() || extent <= MIN_EXTENT {
        return None;
    }

    let count = points.len() as f64;
    let cx = points.iter().map(|p| p[0]).sum::<f64>() / count;
    let cy = points.iter().map(|p| p[1]).sum::<f64>() / count;

    for p in &mut points {
        p[0] = (p[0] - cx) / extent;
        p[1] = (p[1] - cy) / extent;
    }
    Some(points)
}
