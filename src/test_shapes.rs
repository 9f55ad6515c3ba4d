//! Synthetic touchpad draws shared by unit tests.

use crate::signal::Signal;
use std::f64::consts::TAU;

/// A slightly wobbly circle; `seed` shifts the wobble so draws differ a bit.
pub fn circle(seed: usize, t0: f64) -> Vec<Signal> {
    (0..=40)
        .map(|i| {
            let angle = TAU * i as f64 / 40.0;
            let radius = 100.0 + 2.0 * (7.0 * angle + seed as f64).sin();
            Signal::point(
                500.0 + radius * angle.cos(),
                500.0 + radius * angle.sin(),
                t0 + i as f64 * 0.01,
            )
        })
        .collect()
}

/// 20 points tracing a square clockwise from its top-left corner.
pub fn square(seed: usize, t0: f64) -> Vec<Signal> {
    let corners = [[0.0, 0.0], [200.0, 0.0], [200.0, 200.0], [0.0, 200.0]];
    let wobble = seed as f64 * 0.7;
    (0..20)
        .map(|i| {
            let side = i / 5;
            let frac = (i % 5) as f64 / 5.0;
            let from = corners[side];
            let to = corners[(side + 1) % 4];
            Signal::point(
                100.0 + from[0] + frac * (to[0] - from[0]) + wobble,
                100.0 + from[1] + frac * (to[1] - from[1]) - wobble,
                t0 + i as f64 * 0.01,
            )
        })
        .collect()
}

/// A horizontal stroke.
pub fn line(t0: f64) -> Vec<Signal> {
    (0..30)
        .map(|i| Signal::point(100.0 + i as f64 * 20.0, 300.0, t0 + i as f64 * 0.01))
        .collect()
}
