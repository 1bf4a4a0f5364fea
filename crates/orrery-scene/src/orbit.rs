use serde::{Deserialize, Serialize};

use crate::SunSighting;

/// Animation state carried from frame to frame.
///
/// The rotation angle is shared: every orbiting planet drawn in a frame
/// advances the same angle by its own speed, so planets move in lockstep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrbitState {
    /// Degrees in `[0, 360)`.
    pub angle: f32,
    /// Whether the planets were last seen in radius order around the sun.
    pub consistent: bool,
    pub sun: SunSighting,
}

impl OrbitState {
    /// Advance the shared angle by `speed` (no-op for stationary planets).
    pub fn advance(&mut self, speed: f32) -> f32 {
        self.angle = advance_angle(self.angle, speed);
        self.angle
    }
}

/// `angle + speed` wrapped into `[0, 360)`; unchanged when `speed == 0`.
pub fn advance_angle(angle: f32, speed: f32) -> f32 {
    if speed == 0.0 {
        return angle;
    }
    let wrapped = (angle + speed).rem_euclid(360.0);
    // f32 rounding sends tiny negative sums to exactly 360.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
