/*
 * Error Module
 *
 * Error types for the flocking core. Numeric degeneracies that the steering
 * code recovers from (zero-length vectors, empty neighbor sets) never surface
 * here; only conditions a caller must act on do.
 */

use thiserror::Error;

/// Errors produced while configuring or stepping a flock.
#[derive(Debug, Error)]
pub enum FlockError {
    /// A construction parameter was out of range. Values are never clamped.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Steering weights supplied to a tick were negative or not finite.
    #[error("invalid steering weights: {0}")]
    InvalidWeights(String),

    /// The summed heading of a vector set was (near) zero, so it has no direction.
    #[error("average heading is undefined: vectors cancel out")]
    UndefinedHeading,

    /// An average was requested over an empty set of vectors.
    #[error("cannot average an empty set of vectors")]
    EmptyInput,

    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlockError>;
