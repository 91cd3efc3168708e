/*
 * Vector Math Module
 *
 * Stateless helpers shared by the steering rules: magnitude limiting and
 * setting, heading and position averaging, and distances measured on a
 * wrap-around (toroidal) rectangle.
 */

use glam::Vec2;

use crate::error::{FlockError, Result};

/// Vectors shorter than this are treated as having no direction.
pub const EPSILON: f32 = 1e-3;

/// Width and height of the rectangular simulation area.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Domain {
    pub width: f32,
    pub height: f32,
}

impl Domain {
    pub fn new(width: f32, height: f32) -> Result<Self> {
        let domain = Self { width, height };
        domain.validate()?;
        Ok(domain)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(FlockError::InvalidConfig(format!(
                "domain width must be positive, got {}",
                self.width
            )));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(FlockError::InvalidConfig(format!(
                "domain height must be positive, got {}",
                self.height
            )));
        }
        Ok(())
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 800.0,
        }
    }
}

/// Scale `v` down to `max_magnitude` if it is longer; shorter vectors pass through.
pub fn limit_magnitude(v: Vec2, max_magnitude: f32) -> Vec2 {
    let norm = v.length();
    if norm < EPSILON || norm <= max_magnitude {
        return v;
    }
    v * (max_magnitude / norm)
}

/// Rescale `v` to exactly `magnitude`, keeping its direction.
pub fn set_magnitude(v: Vec2, magnitude: f32) -> Vec2 {
    let norm = v.length();
    if norm < EPSILON {
        return v;
    }
    v * (magnitude / norm)
}

/// Unit vector pointing the way the inputs point on balance.
///
/// This is the direction of the summed vectors, not their mean speed. When the
/// inputs cancel out (or there are none) the heading has no direction and
/// [`FlockError::UndefinedHeading`] is returned.
pub fn average_heading(vectors: &[Vec2]) -> Result<Vec2> {
    let sum = vectors.iter().fold(Vec2::ZERO, |acc, v| acc + *v);
    let norm = sum.length();
    if norm < EPSILON {
        return Err(FlockError::UndefinedHeading);
    }
    Ok(sum / norm)
}

/// Elementwise arithmetic mean.
pub fn average_position(vectors: &[Vec2]) -> Result<Vec2> {
    if vectors.is_empty() {
        return Err(FlockError::EmptyInput);
    }
    let sum = vectors.iter().fold(Vec2::ZERO, |acc, v| acc + *v);
    Ok(sum / vectors.len() as f32)
}

// Shortest signed offset along one axis of length `extent`.
fn wrap_axis(delta: f32, extent: f32) -> f32 {
    let half = extent * 0.5;
    if delta > half {
        delta - extent
    } else if delta < -half {
        delta + extent
    } else {
        delta
    }
}

/// Shortest displacement from `from` to `to` when opposite edges are adjacent.
///
/// Both points are expected inside the domain; each component satisfies
/// `|d| <= extent / 2`.
pub fn toroidal_delta(from: Vec2, to: Vec2, domain: Domain) -> Vec2 {
    let d = to - from;
    Vec2::new(
        wrap_axis(d.x, domain.width),
        wrap_axis(d.y, domain.height),
    )
}

/// Distance between two points on a wrap-around rectangle.
///
/// Per axis the shorter of the direct and the wrapping path is used.
pub fn toroidal_distance(p1: Vec2, p2: Vec2, width: f32, height: f32) -> f32 {
    let dx = (p1.x - p2.x).abs();
    let dy = (p1.y - p2.y).abs();
    let dx = dx.min(width - dx);
    let dy = dy.min(height - dy);
    (dx * dx + dy * dy).sqrt()
}
