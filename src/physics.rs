/*
 * Physics Module
 *
 * This module runs one tick of the flock: every boid's steering forces are
 * computed, blended with the caller's weights, integrated and passed through
 * the edge policy.
 *
 * Two orderings are supported:
 * - Two-phase (default): all forces are computed against the unchanged flock
 *   from the previous tick, then applied. The result does not depend on the
 *   order of the boids. The compute phase can run on the rayon pool since it
 *   only reads the flock.
 * - In-place: each boid is updated right after its own scan, so boids later
 *   in the list see positions and velocities already moved this tick.
 */

use rand::Rng;
use rayon::prelude::*;

use crate::boid::{Boid, SteeringForces};
use crate::error::Result;
use crate::params::{SimulationParams, SteeringWeights, TickMode};

/// Counters gathered while stepping the flock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickStats {
    /// Sum over all boids of the number of neighbors each one perceived.
    pub neighbor_links: usize,
    /// Boids whose separation used the doubled force cap.
    pub strong_separations: usize,
}

impl TickStats {
    fn record(&mut self, forces: &SteeringForces) {
        self.neighbor_links += forces.neighbor_count;
        if forces.strong_separation {
            self.strong_separations += 1;
        }
    }
}

// Create a fresh flock scattered uniformly over the domain
pub fn spawn_boids<R: Rng + ?Sized>(params: &SimulationParams, rng: &mut R) -> Result<Vec<Boid>> {
    (0..params.num_boids)
        .map(|_| Boid::new(params.domain, &params.behavior, rng))
        .collect()
}

/// Forces on every boid, all read from the same unchanged flock.
pub fn compute_forces(boids: &[Boid], parallel: bool) -> Vec<SteeringForces> {
    if !parallel {
        return boids.iter().map(|boid| boid.steering_forces(boids)).collect();
    }

    // Chunk the work so each thread scans a contiguous run of boids
    let chunk_size = std::cmp::max(boids.len() / rayon::current_num_threads(), 1);
    boids
        .par_chunks(chunk_size)
        .flat_map_iter(|chunk| chunk.iter().map(|boid| boid.steering_forces(boids)))
        .collect()
}

// Advance the flock by one tick
pub fn update_boids<R: Rng + ?Sized>(
    boids: &mut [Boid],
    weights: &SteeringWeights,
    mode: TickMode,
    parallel: bool,
    rng: &mut R,
) -> TickStats {
    match mode {
        TickMode::TwoPhase => update_two_phase(boids, weights, parallel, rng),
        TickMode::InPlace => update_in_place(boids, weights, rng),
    }
}

fn update_two_phase<R: Rng + ?Sized>(
    boids: &mut [Boid],
    weights: &SteeringWeights,
    parallel: bool,
    rng: &mut R,
) -> TickStats {
    // First phase: every boid reads the previous tick
    let forces = compute_forces(boids, parallel);

    // Second phase: apply, in order, so the jitter draws are reproducible
    let mut stats = TickStats::default();
    for (boid, forces) in boids.iter_mut().zip(&forces) {
        stats.record(forces);
        boid.step(forces, weights, rng);
    }
    stats
}

fn update_in_place<R: Rng + ?Sized>(
    boids: &mut [Boid],
    weights: &SteeringWeights,
    rng: &mut R,
) -> TickStats {
    let mut stats = TickStats::default();
    for i in 0..boids.len() {
        let flock: &[Boid] = boids;
        let forces = flock[i].steering_forces(flock);
        stats.record(&forces);
        boids[i].step(&forces, weights, rng);
    }
    stats
}
