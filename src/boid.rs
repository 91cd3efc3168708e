/*
 * Boid Module
 *
 * This module defines the Boid struct and its behavior.
 * Each boid follows three main rules:
 * 1. Separation: Avoid crowding neighbors
 * 2. Alignment: Steer towards the average heading of neighbors
 * 3. Cohesion: Steer towards the average position of neighbors
 *
 * All three rules are computed from one scan over the flock. Neighbors are
 * the boids within the perception radius, measured across the domain edges
 * when the wrap policy is toroidal.
 */

use glam::Vec2;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::error::{FlockError, Result};
use crate::params::{BehaviorConfig, SteeringWeights, WrapPolicy};
use crate::renderer::RenderHint;
use crate::vector_math::{
    average_heading, average_position, limit_magnitude, set_magnitude, toroidal_delta,
    toroidal_distance, Domain,
};

// Keeps the inverse-distance weighting finite for coincident boids
const SEPARATION_BIAS: f32 = 1e-2;

// Source of boid identities; clones keep the identity of their original
static NEXT_BOID_ID: AtomicU64 = AtomicU64::new(0);

/// The three steering contributions acting on one boid for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SteeringForces {
    pub alignment: Vec2,
    pub cohesion: Vec2,
    pub separation: Vec2,
    pub neighbor_count: usize,
    /// Separation was capped at twice the usual force because a neighbor was too close.
    pub strong_separation: bool,
}

impl SteeringForces {
    pub fn blend(&self, weights: &SteeringWeights) -> Vec2 {
        self.alignment * weights.alignment
            + self.cohesion * weights.cohesion
            + self.separation * weights.separation
    }
}

#[derive(Debug, Clone)]
pub struct Boid {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    id: u64,
    domain: Domain,
    behavior: BehaviorConfig,
    jitter: Option<Normal<f32>>,
}

impl Boid {
    /// Create a boid at a uniformly random position with a random velocity in `[-1, 1]²`.
    pub fn new<R: Rng + ?Sized>(
        domain: Domain,
        behavior: &BehaviorConfig,
        rng: &mut R,
    ) -> Result<Self> {
        domain.validate()?;
        let position = Vec2::new(
            rng.gen_range(0.0..domain.width),
            rng.gen_range(0.0..domain.height),
        );
        let velocity = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
        Self::with_state(position, velocity, domain, behavior)
    }

    /// Create a boid with a known position and velocity.
    ///
    /// Under the toroidal policy the position must lie inside the domain,
    /// since wrapped distances are only meaningful there.
    pub fn with_state(
        position: Vec2,
        velocity: Vec2,
        domain: Domain,
        behavior: &BehaviorConfig,
    ) -> Result<Self> {
        domain.validate()?;
        behavior.validate()?;

        if !position.is_finite() {
            return Err(FlockError::InvalidConfig(format!(
                "boid position must be finite, got {position}"
            )));
        }
        if !velocity.is_finite() {
            return Err(FlockError::InvalidConfig(format!(
                "boid velocity must be finite, got {velocity}"
            )));
        }
        if behavior.wrap_policy.wraps_distances()
            && !((0.0..=domain.width).contains(&position.x)
                && (0.0..=domain.height).contains(&position.y))
        {
            return Err(FlockError::InvalidConfig(format!(
                "boid position {position} lies outside the {}x{} domain",
                domain.width, domain.height
            )));
        }

        let jitter = if behavior.jitter_stddev > 0.0 {
            let normal = Normal::new(0.0, behavior.jitter_stddev)
                .map_err(|err| FlockError::InvalidConfig(format!("jitter_stddev: {err}")))?;
            Some(normal)
        } else {
            None
        };

        Ok(Self {
            position,
            velocity,
            acceleration: Vec2::ZERO,
            id: NEXT_BOID_ID.fetch_add(1, Ordering::Relaxed),
            domain,
            behavior: behavior.clone(),
            jitter,
        })
    }

    /// Identity shared by this boid and any copy of it.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn behavior(&self) -> &BehaviorConfig {
        &self.behavior
    }

    pub fn wrap_policy(&self) -> WrapPolicy {
        self.behavior.wrap_policy
    }

    /// Facing direction in radians, derived from the velocity.
    pub fn heading(&self) -> f32 {
        self.velocity.y.atan2(self.velocity.x)
    }

    pub fn render_hint(&self) -> RenderHint {
        RenderHint {
            position: self.position,
            heading: self.heading(),
        }
    }

    // Distance used for neighbor inclusion
    fn distance_to(&self, point: Vec2) -> f32 {
        if self.behavior.wrap_policy.wraps_distances() {
            toroidal_distance(self.position, point, self.domain.width, self.domain.height)
        } else {
            self.position.distance(point)
        }
    }

    // Displacement from this boid to `point`, taking the short way round when wrapping
    fn offset_to(&self, point: Vec2) -> Vec2 {
        if self.behavior.wrap_policy.wraps_distances() {
            toroidal_delta(self.position, point, self.domain)
        } else {
            point - self.position
        }
    }

    /// Compute alignment, cohesion and separation against `flock`.
    ///
    /// `flock` may contain this boid, or a copy of it taken as a snapshot; it
    /// is recognised by id and skipped.
    /// Every force is zero when no other boid lies within the perception radius.
    pub fn steering_forces(&self, flock: &[Boid]) -> SteeringForces {
        let max_force = self.behavior.max_force;
        let mut velocities = Vec::new();
        let mut positions = Vec::new();
        let mut separations = Vec::new();
        let mut min_distance = f32::INFINITY;

        for other in flock {
            if other.id == self.id {
                continue;
            }

            let distance = self.distance_to(other.position);
            if distance >= self.behavior.perception_radius {
                continue;
            }

            // Wrap-aware offset rather than the raw position difference, so a
            // neighbor across the edge is attracted to and repelled from the short way
            let offset = self.offset_to(other.position);

            velocities.push(other.velocity);
            positions.push(self.position + offset);
            separations.push(set_magnitude(-offset, 1.0) / (distance + SEPARATION_BIAS));

            min_distance = min_distance.min(distance);
        }

        if velocities.is_empty() {
            return SteeringForces::default();
        }

        let alignment = match average_heading(&velocities) {
            Ok(heading) => limit_magnitude(heading - self.velocity, max_force),
            Err(err) => {
                trace!(%err, neighbors = velocities.len(), "alignment falls back to zero");
                Vec2::ZERO
            }
        };

        let cohesion = match average_position(&positions) {
            Ok(centroid) => limit_magnitude(centroid - self.position - self.velocity, max_force),
            Err(_) => Vec2::ZERO,
        };

        let strong_separation = self
            .behavior
            .strong_separation_cutoff()
            .is_some_and(|threshold| min_distance < threshold);
        let separation_cap = if strong_separation {
            max_force * 2.0
        } else {
            max_force
        };
        let separation = match average_position(&separations) {
            Ok(mean) => limit_magnitude(mean - self.velocity, separation_cap),
            Err(_) => Vec2::ZERO,
        };

        SteeringForces {
            alignment,
            cohesion,
            separation,
            neighbor_count: velocities.len(),
            strong_separation,
        }
    }

    // Accumulate the weighted forces into the acceleration
    pub fn apply_steering(&mut self, forces: &SteeringForces, weights: &SteeringWeights) {
        self.acceleration += forces.blend(weights);
    }

    /// Advance velocity and position by one tick.
    ///
    /// The acceleration is consumed: afterwards it holds zero, or a fresh
    /// Gaussian sample when jitter is enabled.
    pub fn integrate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.velocity += self.acceleration;

        if self.behavior.speed_cap {
            self.velocity = limit_magnitude(self.velocity, self.behavior.max_speed);
        }

        self.position += self.velocity;

        self.acceleration = match &self.jitter {
            Some(normal) => Vec2::new(normal.sample(rng), normal.sample(rng)),
            None => Vec2::ZERO,
        };
    }

    /// Apply the edge policy to the position.
    ///
    /// Under the toroidal policy a coordinate past the upper bound becomes 0
    /// and one below 0 becomes the upper bound.
    pub fn wrap(&mut self) {
        let Domain { width, height } = self.domain;
        match self.behavior.wrap_policy {
            WrapPolicy::Toroidal => {
                if self.position.x > width {
                    self.position.x = 0.0;
                } else if self.position.x < 0.0 {
                    self.position.x = width;
                }

                if self.position.y > height {
                    self.position.y = 0.0;
                } else if self.position.y < 0.0 {
                    self.position.y = height;
                }
            }
            WrapPolicy::Clamped => {
                self.position.x = self.position.x.clamp(0.0, width);
                self.position.y = self.position.y.clamp(0.0, height);
            }
            WrapPolicy::None => {}
        }
    }

    // Full per-tick update once the forces are known
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        forces: &SteeringForces,
        weights: &SteeringWeights,
        rng: &mut R,
    ) {
        self.apply_steering(forces, weights);
        self.integrate(rng);
        self.wrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TOLERANCE: f32 = 1e-4;

    fn quiet_behavior() -> BehaviorConfig {
        BehaviorConfig {
            jitter_stddev: 0.0,
            ..BehaviorConfig::default()
        }
    }

    fn boid_at(x: f32, y: f32, vx: f32, vy: f32, domain: Domain) -> Boid {
        Boid::with_state(Vec2::new(x, y), Vec2::new(vx, vy), domain, &quiet_behavior()).unwrap()
    }

    #[test]
    fn random_boids_start_inside_the_domain() {
        let mut rng = StdRng::seed_from_u64(7);
        let domain = Domain::new(300.0, 200.0).unwrap();
        for _ in 0..200 {
            let boid = Boid::new(domain, &BehaviorConfig::default(), &mut rng).unwrap();
            assert!((0.0..300.0).contains(&boid.position.x));
            assert!((0.0..200.0).contains(&boid.position.y));
            assert!(boid.velocity.x.abs() <= 1.0 && boid.velocity.y.abs() <= 1.0);
            assert_eq!(boid.acceleration, Vec2::ZERO);
        }
    }

    #[test]
    fn invalid_behavior_is_rejected_at_construction() {
        let domain = Domain::default();
        let behavior = BehaviorConfig {
            perception_radius: -5.0,
            ..BehaviorConfig::default()
        };
        let result = Boid::with_state(Vec2::ZERO, Vec2::ZERO, domain, &behavior);
        assert!(matches!(result, Err(FlockError::InvalidConfig(_))));

        let bad_domain = Domain { width: 0.0, height: 10.0 };
        let result = Boid::with_state(Vec2::ZERO, Vec2::ZERO, bad_domain, &quiet_behavior());
        assert!(result.is_err());
    }

    #[test]
    fn toroidal_boids_must_start_inside_the_domain() {
        let domain = Domain::new(100.0, 100.0).unwrap();
        let outside = Boid::with_state(Vec2::new(250.0, 0.0), Vec2::ZERO, domain, &quiet_behavior());
        assert!(matches!(outside, Err(FlockError::InvalidConfig(_))));
        let below = Boid::with_state(Vec2::new(10.0, -0.1), Vec2::ZERO, domain, &quiet_behavior());
        assert!(below.is_err());

        // The closed bounds are allowed
        assert!(Boid::with_state(Vec2::new(100.0, 100.0), Vec2::ZERO, domain, &quiet_behavior()).is_ok());
    }

    #[test]
    fn non_finite_state_is_rejected() {
        let domain = Domain::new(100.0, 100.0).unwrap();
        let nan_position =
            Boid::with_state(Vec2::new(f32::NAN, 10.0), Vec2::ZERO, domain, &quiet_behavior());
        assert!(matches!(nan_position, Err(FlockError::InvalidConfig(_))));

        let infinite_velocity = Boid::with_state(
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, f32::INFINITY),
            domain,
            &quiet_behavior(),
        );
        assert!(matches!(infinite_velocity, Err(FlockError::InvalidConfig(_))));

        // Unbounded boids may start anywhere finite
        let free = BehaviorConfig {
            wrap_policy: WrapPolicy::None,
            ..quiet_behavior()
        };
        assert!(Boid::with_state(Vec2::new(250.0, -40.0), Vec2::ZERO, domain, &free).is_ok());
        assert!(Boid::with_state(Vec2::new(f32::NAN, 0.0), Vec2::ZERO, domain, &free).is_err());
    }

    #[test]
    fn lone_boid_feels_no_forces() {
        let domain = Domain::new(100.0, 100.0).unwrap();
        let flock = vec![boid_at(50.0, 50.0, 1.0, 0.5, domain)];
        let forces = flock[0].steering_forces(&flock);
        assert_eq!(forces, SteeringForces::default());
    }

    #[test]
    fn boid_skips_its_own_copy_in_a_snapshot() {
        let domain = Domain::new(100.0, 100.0).unwrap();
        let flock = vec![boid_at(50.0, 50.0, 1.0, 0.5, domain)];
        let snapshot = flock.clone();
        let forces = flock[0].steering_forces(&snapshot);
        assert_eq!(forces, SteeringForces::default());

        // Distinct boids in the same state are still neighbors
        let pair = vec![
            boid_at(50.0, 50.0, 1.0, 0.5, domain),
            boid_at(50.0, 50.0, 1.0, 0.5, domain),
        ];
        assert_ne!(pair[0].id(), pair[1].id());
        let snapshot = pair.clone();
        assert_eq!(pair[0].steering_forces(&snapshot).neighbor_count, 1);
    }

    #[test]
    fn opposing_neighbors_give_zero_alignment() {
        let domain = Domain::new(100.0, 100.0).unwrap();
        let flock = vec![
            boid_at(50.0, 50.0, 0.0, 0.0, domain),
            boid_at(55.0, 50.0, 1.0, 0.0, domain),
            boid_at(50.0, 55.0, -1.0, 0.0, domain),
        ];
        let forces = flock[0].steering_forces(&flock);

        assert_eq!(forces.neighbor_count, 2);
        // Velocities cancel, so there is no heading to align with
        assert_eq!(forces.alignment, Vec2::ZERO);
        assert!(forces.alignment.is_finite());

        // The other two rules still act
        assert!(forces.cohesion.is_finite() && forces.cohesion.length() > 0.0);
        assert!(forces.cohesion.x > 0.0 && forces.cohesion.y > 0.0);
        assert!(forces.separation.is_finite() && forces.separation.length() > 0.0);
        assert!(forces.separation.x < 0.0 && forces.separation.y < 0.0);
    }

    #[test]
    fn distant_boids_are_not_neighbors() {
        let domain = Domain::new(500.0, 500.0).unwrap();
        let flock = vec![
            boid_at(10.0, 10.0, 1.0, 0.0, domain),
            boid_at(10.0 + 50.001, 10.0, 0.0, 1.0, domain),
        ];
        let forces = flock[0].steering_forces(&flock);
        assert_eq!(forces.neighbor_count, 0);
        assert_eq!(forces.alignment, Vec2::ZERO);
        assert_eq!(forces.cohesion, Vec2::ZERO);
        assert_eq!(forces.separation, Vec2::ZERO);
    }

    #[test]
    fn boids_just_inside_the_radius_interact() {
        let domain = Domain::new(500.0, 500.0).unwrap();
        let flock = vec![
            boid_at(10.0, 10.0, 1.0, 0.0, domain),
            boid_at(10.0 + 49.999, 10.0, 0.0, 1.0, domain),
        ];
        let forces = flock[0].steering_forces(&flock);
        assert_eq!(forces.neighbor_count, 1);
        assert!(forces.alignment.length() > 0.0);
        assert!(forces.cohesion.length() > 0.0);
        assert!(forces.separation.length() > 0.0);
    }

    #[test]
    fn two_boid_scenario() {
        let domain = Domain::new(100.0, 100.0).unwrap();
        let flock = vec![
            boid_at(0.0, 0.0, 1.0, 0.0, domain),
            boid_at(10.0, 0.0, 1.0, 0.0, domain),
        ];
        let forces = flock[0].steering_forces(&flock);

        // Headings already agree
        assert!(forces.alignment.length() < TOLERANCE);

        // Centroid (10, 0) minus position minus velocity is (9, 0), capped at max_force
        assert!((forces.cohesion - Vec2::new(0.5, 0.0)).length() < TOLERANCE);

        // Pushes away from (10, 0); the neighbor is inside 25 units so the cap doubles
        assert!(forces.strong_separation);
        assert!(forces.separation.x < 0.0);
        assert!(forces.separation.y.abs() < TOLERANCE);
        assert!((forces.separation.length() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn crowding_doubles_the_separation_cap() {
        let domain = Domain::new(400.0, 400.0).unwrap();
        let crowded = vec![
            boid_at(200.0, 200.0, 3.0, 0.0, domain),
            boid_at(196.0, 200.0, 0.0, 0.0, domain),
            boid_at(197.0, 203.0, 0.0, 0.0, domain),
            boid_at(197.0, 197.0, 0.0, 0.0, domain),
        ];
        let forces = crowded[0].steering_forces(&crowded);
        assert_eq!(forces.neighbor_count, 3);
        assert!(forces.strong_separation);
        let max_force = crowded[0].behavior().max_force;
        assert!((forces.separation.length() - 2.0 * max_force).abs() < TOLERANCE);

        let relaxed = BehaviorConfig {
            strong_separation: false,
            ..quiet_behavior()
        };
        let mut without = crowded.clone();
        without[0] =
            Boid::with_state(Vec2::new(200.0, 200.0), Vec2::new(3.0, 0.0), domain, &relaxed)
                .unwrap();
        let forces = without[0].steering_forces(&without);
        assert!(!forces.strong_separation);
        assert!((forces.separation.length() - max_force).abs() < TOLERANCE);
    }

    #[test]
    fn neighbors_are_found_across_the_edge() {
        let domain = Domain::new(100.0, 100.0).unwrap();
        let flock = vec![
            boid_at(99.0, 50.0, 0.0, 0.0, domain),
            boid_at(1.0, 50.0, 0.0, 0.0, domain),
        ];
        let forces = flock[0].steering_forces(&flock);
        assert_eq!(forces.neighbor_count, 1);
        // The neighbor sits just past the right edge, so cohesion pulls right
        assert!(forces.cohesion.x > 0.0);
        // and separation pushes left
        assert!(forces.separation.x < 0.0);
    }

    #[test]
    fn clamped_policy_measures_straight_distances() {
        let domain = Domain::new(100.0, 100.0).unwrap();
        let behavior = BehaviorConfig {
            wrap_policy: WrapPolicy::Clamped,
            ..quiet_behavior()
        };
        let flock = vec![
            Boid::with_state(Vec2::new(99.0, 50.0), Vec2::ZERO, domain, &behavior).unwrap(),
            Boid::with_state(Vec2::new(1.0, 50.0), Vec2::ZERO, domain, &behavior).unwrap(),
        ];
        assert_eq!(flock[0].steering_forces(&flock).neighbor_count, 0);
    }

    #[test]
    fn integrate_caps_speed_and_clears_acceleration() {
        let mut rng = StdRng::seed_from_u64(1);
        let domain = Domain::new(1000.0, 1000.0).unwrap();
        let mut boid = boid_at(500.0, 500.0, 4.0, 0.0, domain);
        boid.acceleration = Vec2::new(10.0, 10.0);
        boid.integrate(&mut rng);

        assert!(boid.velocity.length() <= boid.behavior().max_speed + TOLERANCE);
        assert_eq!(boid.acceleration, Vec2::ZERO);
        assert!((boid.position - Vec2::new(500.0, 500.0) - boid.velocity).length() < TOLERANCE);
    }

    #[test]
    fn uncapped_boids_keep_their_speed() {
        let mut rng = StdRng::seed_from_u64(1);
        let domain = Domain::new(1000.0, 1000.0).unwrap();
        let behavior = BehaviorConfig {
            speed_cap: false,
            ..quiet_behavior()
        };
        let mut boid =
            Boid::with_state(Vec2::new(10.0, 10.0), Vec2::new(20.0, 0.0), domain, &behavior)
                .unwrap();
        boid.integrate(&mut rng);
        assert_eq!(boid.velocity, Vec2::new(20.0, 0.0));
    }

    #[test]
    fn jitter_seeds_the_next_acceleration() {
        let mut rng = StdRng::seed_from_u64(3);
        let domain = Domain::default();
        let behavior = BehaviorConfig {
            jitter_stddev: 0.1,
            ..BehaviorConfig::default()
        };
        let mut boid =
            Boid::with_state(Vec2::new(10.0, 10.0), Vec2::new(1.0, 0.0), domain, &behavior)
                .unwrap();
        boid.integrate(&mut rng);
        assert_ne!(boid.acceleration, Vec2::ZERO);
        assert!(boid.acceleration.length() < 1.0);
    }

    #[test]
    fn apply_steering_accumulates() {
        let domain = Domain::default();
        let mut boid = boid_at(10.0, 10.0, 0.0, 0.0, domain);
        boid.acceleration = Vec2::new(1.0, 0.0);
        let forces = SteeringForces {
            alignment: Vec2::new(1.0, 0.0),
            cohesion: Vec2::new(0.0, 1.0),
            separation: Vec2::new(-1.0, 0.0),
            ..SteeringForces::default()
        };
        boid.apply_steering(&forces, &SteeringWeights::new(2.0, 3.0, 0.5));
        assert!((boid.acceleration - Vec2::new(2.5, 3.0)).length() < TOLERANCE);
    }

    #[test]
    fn wrap_teleports_to_the_opposite_edge() {
        let domain = Domain::new(100.0, 80.0).unwrap();
        let mut boid = boid_at(100.0, 40.0, 0.0, 0.0, domain);
        boid.position.x = 101.0;
        boid.wrap();
        assert_eq!(boid.position.x, 0.0);
        assert_eq!(boid.position.y, 40.0);

        let mut boid = boid_at(30.0, 0.0, 0.0, 0.0, domain);
        boid.position.y = -0.5;
        boid.wrap();
        assert_eq!(boid.position.y, 80.0);
    }

    #[test]
    fn wrap_after_integration_lands_exactly_on_zero() {
        let mut rng = StdRng::seed_from_u64(5);
        let domain = Domain::new(100.0, 100.0).unwrap();
        let mut boid = boid_at(99.0, 50.0, 2.0, 0.0, domain);
        boid.integrate(&mut rng);
        assert_eq!(boid.position.x, 101.0);
        boid.wrap();
        assert_eq!(boid.position.x, 0.0);
    }

    #[test]
    fn clamped_and_unbounded_policies() {
        let domain = Domain::new(100.0, 100.0).unwrap();
        let clamped = BehaviorConfig {
            wrap_policy: WrapPolicy::Clamped,
            ..quiet_behavior()
        };
        let mut boid = Boid::with_state(Vec2::new(105.0, -3.0), Vec2::ZERO, domain, &clamped).unwrap();
        boid.wrap();
        assert_eq!(boid.position, Vec2::new(100.0, 0.0));

        let free = BehaviorConfig {
            wrap_policy: WrapPolicy::None,
            ..quiet_behavior()
        };
        let mut boid = Boid::with_state(Vec2::new(105.0, -3.0), Vec2::ZERO, domain, &free).unwrap();
        boid.wrap();
        assert_eq!(boid.position, Vec2::new(105.0, -3.0));
    }

    #[test]
    fn heading_follows_velocity() {
        let domain = Domain::default();
        let boid = boid_at(10.0, 10.0, 0.0, 2.0, domain);
        let hint = boid.render_hint();
        assert!((hint.heading - std::f32::consts::FRAC_PI_2).abs() < TOLERANCE);
        assert_eq!(hint.position, Vec2::new(10.0, 10.0));
    }
}
