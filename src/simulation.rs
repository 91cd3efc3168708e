/*
 * Simulation Module
 *
 * A simulation session owns the flock, the parameters and the random number
 * generator. Callers drive it one tick at a time with the steering weights
 * they want (for instance read from sliders), restart it with reset(), and
 * read render hints back out after each tick.
 */

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, trace};

use crate::boid::Boid;
use crate::debug::TickReport;
use crate::error::{FlockError, Result};
use crate::params::{ParamChanges, SimulationParams, SteeringWeights};
use crate::physics;
use crate::renderer::{render_hints, RenderHint};

pub struct Simulation {
    boids: Vec<Boid>,
    params: SimulationParams,
    rng: StdRng,
    tick: u64,
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl Simulation {
    /// Start a session with a freshly spawned flock.
    pub fn new(params: SimulationParams) -> Result<Self> {
        params.validate()?;
        let mut rng = seeded_rng(params.seed);
        let boids = physics::spawn_boids(&params, &mut rng)?;
        debug!(
            boids = boids.len(),
            width = params.domain.width,
            height = params.domain.height,
            "simulation created"
        );

        Ok(Self {
            boids,
            params,
            rng,
            tick: 0,
        })
    }

    /// Start a session from boids placed by the caller.
    ///
    /// Every boid must share the session's domain and behavior, so that a
    /// reset spawns boids following the same rules. `num_boids` is taken from
    /// the flock so that a later reset recreates the same number of boids.
    pub fn with_boids(mut params: SimulationParams, boids: Vec<Boid>) -> Result<Self> {
        params.validate()?;
        let mut seen = HashSet::with_capacity(boids.len());
        for boid in &boids {
            if boid.domain() != params.domain {
                return Err(FlockError::InvalidConfig(format!(
                    "boid domain {:?} does not match simulation domain {:?}",
                    boid.domain(),
                    params.domain
                )));
            }
            if boid.behavior() != &params.behavior {
                return Err(FlockError::InvalidConfig(format!(
                    "boid {} behavior {:?} does not match simulation behavior {:?}",
                    boid.id(),
                    boid.behavior(),
                    params.behavior
                )));
            }
            // A copy of a boid would be skipped as itself by its original
            if !seen.insert(boid.id()) {
                return Err(FlockError::InvalidConfig(format!(
                    "boid {} appears more than once in the flock",
                    boid.id()
                )));
            }
        }
        params.num_boids = boids.len();
        let rng = seeded_rng(params.seed);

        Ok(Self {
            boids,
            params,
            rng,
            tick: 0,
        })
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn render_hints(&self) -> Vec<RenderHint> {
        render_hints(&self.boids)
    }

    /// Advance one tick with the given weights.
    pub fn tick(&mut self, weights: SteeringWeights) -> Result<TickReport> {
        weights.validate()?;
        let started = Instant::now();

        let stats = physics::update_boids(
            &mut self.boids,
            &weights,
            self.params.tick_mode,
            self.params.parallel,
            &mut self.rng,
        );
        self.tick += 1;

        let report = TickReport::measure(self.tick, started.elapsed(), &self.boids, stats);
        trace!(
            tick = report.tick,
            neighbor_links = report.neighbor_links,
            mean_speed = report.mean_speed,
            "tick complete"
        );
        Ok(report)
    }

    /// Advance one tick with the weights stored in the parameters.
    pub fn step(&mut self) -> Result<TickReport> {
        let weights = self.params.weights;
        self.tick(weights)
    }

    /// Replace the flock with a new random one of the same size.
    pub fn reset(&mut self) -> Result<()> {
        self.boids = physics::spawn_boids(&self.params, &mut self.rng)?;
        self.tick = 0;
        debug!(boids = self.boids.len(), "flock reset");
        Ok(())
    }

    /// Swap in new parameters, restarting the flock only when needed.
    ///
    /// Weight, tick mode and parallelism changes take effect on the next tick;
    /// population, domain, behavior or seed changes rebuild the flock.
    pub fn update_params(&mut self, params: SimulationParams) -> Result<ParamChanges> {
        params.validate()?;
        let changes = params.detect_changes(&self.params);
        if !changes.any_changed {
            return Ok(changes);
        }

        let reseed = params.seed != self.params.seed;
        self.params = params;
        if reseed {
            self.rng = seeded_rng(self.params.seed);
        }
        if changes.restart_required {
            self.reset()?;
        }
        if changes.weights_changed {
            let weights = self.params.weights;
            debug!(
                alignment = weights.alignment,
                cohesion = weights.cohesion,
                separation = weights.separation,
                "steering weights updated"
            );
        }
        debug!(restart = changes.restart_required, "parameters updated");
        Ok(changes)
    }
}
