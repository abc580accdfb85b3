use thiserror::Error;

/// Configuration rejected before a session starts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Window size must be at least 1, got {0}")]
    InvalidWindowSize(usize),

    #[error("Invalid filter threshold {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Noise suppression factor must be within [0, 1], got {0}")]
    InvalidSuppressionFactor(f64),

    #[error("Invalid signal radius {name}: {value}")]
    InvalidRadius { name: &'static str, value: f64 },

    #[error("Junction centre must be finite, got ({x}, {y})")]
    InvalidJunction { x: f64, y: f64 },

    #[error("Placement attempts must be at least 1")]
    NoPlacementAttempts,

    #[error("Vehicle id must not be empty")]
    EmptyVehicleId,

    #[error("Failed to read config: {0}")]
    Io(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Failure reported by the external positioning consumer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacementError {
    #[error("Vehicle {0} is not present in the simulation")]
    UnknownVehicle(String),

    #[error("Target ({x:.2}, {y:.2}) rejected: {reason}")]
    Rejected { x: f64, y: f64, reason: String },
}
