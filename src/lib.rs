/*
 * Boid Flocking Simulation - Module Definitions
 *
 * This file defines the module structure for the flocking core.
 * Rendering, windows and GUI controls live outside this crate; they drive a
 * Simulation and read RenderHints back.
 */

// Re-export key components for easier access
pub use boid::{Boid, SteeringForces};
pub use debug::TickReport;
pub use error::{FlockError, Result};
pub use params::{BehaviorConfig, ParamChanges, SimulationParams, SteeringWeights, TickMode, WrapPolicy};
pub use renderer::RenderHint;
pub use simulation::Simulation;
pub use vector_math::Domain;

// Define modules
pub mod boid;
pub mod debug;
pub mod error;
pub mod params;
pub mod physics;
pub mod renderer;
pub mod simulation;
pub mod vector_math;
