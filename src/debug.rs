/*
 * Debug Information Module
 *
 * This module defines the TickReport struct that summarises one tick for
 * logging and diagnostics.
 *
 * Includes metrics for:
 * - Tick counter and wall-clock duration of the tick
 * - Neighbor links perceived across the flock
 * - Boids using the doubled separation cap
 * - Mean speed and polarization (how aligned the flock is)
 */

use glam::Vec2;
use std::time::Duration;

use crate::boid::Boid;
use crate::physics::TickStats;
use crate::vector_math::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    pub tick: u64,
    pub elapsed: Duration,
    pub boids: usize,
    pub neighbor_links: usize,
    pub strong_separations: usize,
    pub mean_speed: f32,
    /// Length of the mean unit heading: 1.0 when every boid flies the same way,
    /// near 0.0 when headings are scattered.
    pub polarization: f32,
}

impl TickReport {
    pub fn measure(tick: u64, elapsed: Duration, boids: &[Boid], stats: TickStats) -> Self {
        let (mean_speed, polarization) = flock_motion(boids);
        Self {
            tick,
            elapsed,
            boids: boids.len(),
            neighbor_links: stats.neighbor_links,
            strong_separations: stats.strong_separations,
            mean_speed,
            polarization,
        }
    }

    pub fn mean_neighbors(&self) -> f32 {
        if self.boids == 0 {
            0.0
        } else {
            self.neighbor_links as f32 / self.boids as f32
        }
    }
}

// Mean speed and polarization of a flock
pub fn flock_motion(boids: &[Boid]) -> (f32, f32) {
    if boids.is_empty() {
        return (0.0, 0.0);
    }

    let n = boids.len() as f32;
    let mut speed_sum = 0.0;
    let mut heading_sum = Vec2::ZERO;
    for boid in boids {
        let speed = boid.velocity.length();
        speed_sum += speed;
        if speed >= EPSILON {
            heading_sum += boid.velocity / speed;
        }
    }

    (speed_sum / n, heading_sum.length() / n)
}
