/*
 * Simulation Parameters Module
 *
 * This module defines the configuration for the flock: the behavior shared by
 * every boid (speed cap, jitter, strong separation, edge policy), the steering
 * weights supplied each tick, and the session-level settings. Parameters can
 * be loaded from TOML, are validated before use, and support change detection
 * so a session knows when a new set of parameters requires a restart.
 */

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

use crate::error::{FlockError, Result};
use crate::vector_math::Domain;

// What happens to a boid that crosses the domain edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WrapPolicy {
    /// Teleport to the opposite edge; neighbor distances wrap as well.
    #[default]
    Toroidal,
    /// Pin the position to the domain bounds.
    Clamped,
    /// Leave the position alone.
    None,
}

impl WrapPolicy {
    /// Whether distances between boids are measured across the edges.
    pub fn wraps_distances(self) -> bool {
        matches!(self, WrapPolicy::Toroidal)
    }
}

// Order in which a tick reads and writes boid state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TickMode {
    /// Every boid reads the previous tick's flock; updates are applied afterwards.
    #[default]
    TwoPhase,
    /// Boids are updated one by one and later boids see earlier updates.
    /// Results depend on the order of the flock.
    InPlace,
}

/// Per-boid behavior. Selects between the speed-capped, jittered,
/// strong-separation and wrapping variants of the steering model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub max_speed: f32,
    pub max_force: f32,
    pub perception_radius: f32,
    pub speed_cap: bool,
    /// Standard deviation of the Gaussian noise seeded into the next tick's
    /// acceleration. Zero disables jitter.
    pub jitter_stddev: f32,
    /// Allow separation to use twice `max_force` when a neighbor is very close.
    pub strong_separation: bool,
    /// Distance below which strong separation kicks in.
    pub strong_separation_threshold: f32,
    pub wrap_policy: WrapPolicy,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            max_speed: 5.0,
            max_force: 0.5,
            perception_radius: 50.0,
            speed_cap: true,
            jitter_stddev: 0.1,
            strong_separation: true,
            strong_separation_threshold: 25.0,
            wrap_policy: WrapPolicy::Toroidal,
        }
    }
}

fn non_negative(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FlockError::InvalidConfig(format!(
            "{name} must be a finite non-negative number, got {value}"
        )))
    }
}

impl BehaviorConfig {
    pub fn validate(&self) -> Result<()> {
        non_negative("max_speed", self.max_speed)?;
        non_negative("max_force", self.max_force)?;
        non_negative("perception_radius", self.perception_radius)?;
        non_negative("jitter_stddev", self.jitter_stddev)?;
        if let Some(threshold) = self.strong_separation_cutoff() {
            if !(threshold.is_finite() && threshold > 0.0) {
                return Err(FlockError::InvalidConfig(format!(
                    "strong_separation_threshold must be positive, got {threshold}"
                )));
            }
        }
        Ok(())
    }

    /// The strong separation distance, or `None` when it is switched off.
    pub fn strong_separation_cutoff(&self) -> Option<f32> {
        self.strong_separation.then_some(self.strong_separation_threshold)
    }
}

/// Multipliers applied to the three steering forces before they are summed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringWeights {
    pub alignment: f32,
    pub cohesion: f32,
    pub separation: f32,
}

impl Default for SteeringWeights {
    fn default() -> Self {
        Self {
            alignment: 0.28,
            cohesion: 0.02,
            separation: 0.02,
        }
    }
}

impl SteeringWeights {
    pub fn new(alignment: f32, cohesion: f32, separation: f32) -> Self {
        Self {
            alignment,
            cohesion,
            separation,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("alignment", self.alignment),
            ("cohesion", self.cohesion),
            ("separation", self.separation),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(FlockError::InvalidWeights(format!(
                    "{name} weight must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    // Slider ranges a control surface should offer for each weight
    pub fn get_alignment_range() -> RangeInclusive<f32> {
        0.0..=5.0
    }

    pub fn get_cohesion_range() -> RangeInclusive<f32> {
        0.0..=0.5
    }

    pub fn get_separation_range() -> RangeInclusive<f32> {
        0.0..=0.5
    }
}

// Parameters for a whole simulation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub num_boids: usize,
    pub domain: Domain,
    pub behavior: BehaviorConfig,
    pub weights: SteeringWeights,
    pub tick_mode: TickMode,
    /// Compute the two-phase force pass on the rayon pool.
    pub parallel: bool,
    /// Seed for reproducible runs; entropy is used when absent.
    pub seed: Option<u64>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            num_boids: 150,
            domain: Domain::default(),
            behavior: BehaviorConfig::default(),
            weights: SteeringWeights::default(),
            tick_mode: TickMode::TwoPhase,
            parallel: false,
            seed: None,
        }
    }
}

/// What differs between two parameter sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamChanges {
    /// Population, domain or behavior changed; the flock must be rebuilt.
    pub restart_required: bool,
    pub weights_changed: bool,
    pub any_changed: bool,
}

impl SimulationParams {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let params: Self = toml::from_str(source)?;
        params.validate()?;
        Ok(params)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        self.domain.validate()?;
        self.behavior.validate()?;
        self.weights.validate()
    }

    // Compare against the parameters currently in effect
    pub fn detect_changes(&self, previous: &SimulationParams) -> ParamChanges {
        let restart_required = self.num_boids != previous.num_boids
            || self.domain != previous.domain
            || self.behavior != previous.behavior
            || self.seed != previous.seed;
        let weights_changed = self.weights != previous.weights;
        let any_changed = restart_required
            || weights_changed
            || self.tick_mode != previous.tick_mode
            || self.parallel != previous.parallel;

        ParamChanges {
            restart_required,
            weights_changed,
            any_changed,
        }
    }

    pub fn get_num_boids_range() -> RangeInclusive<usize> {
        1..=5000
    }
}
