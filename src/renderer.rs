/*
 * Renderer Module
 *
 * The flocking core never draws. This module exposes what a drawing
 * collaborator needs to place each boid: its position and the angle it faces,
 * plus the geometry of the oriented triangle conventionally used for a boid.
 */

use glam::Vec2;

use crate::boid::Boid;

// Angle between the nose and each rear corner of the boid triangle
const REAR_CORNER_ANGLE: f32 = 2.3;

/// Read-only placement of one boid for a renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderHint {
    pub position: Vec2,
    /// `atan2(velocity.y, velocity.x)` in radians.
    pub heading: f32,
}

impl RenderHint {
    /// Corners of a triangle of the given size pointing along the heading.
    ///
    /// The nose is `size` ahead of the position; the two rear corners sit at
    /// half that distance, rotated 2.3 radians either side of the heading.
    pub fn triangle(&self, size: f32) -> [Vec2; 3] {
        let corner = |angle: f32, length: f32| {
            self.position + Vec2::new(angle.cos(), angle.sin()) * length
        };

        [
            corner(self.heading, size),
            corner(self.heading + REAR_CORNER_ANGLE, size / 2.0),
            corner(self.heading - REAR_CORNER_ANGLE, size / 2.0),
        ]
    }
}

// Collect render hints for the whole flock
pub fn render_hints(boids: &[Boid]) -> Vec<RenderHint> {
    boids.iter().map(Boid::render_hint).collect()
}
