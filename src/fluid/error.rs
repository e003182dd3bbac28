//! Configuration errors.
//!
//! The step pipeline never fails: numeric anomalies propagate as NaN/Inf and are
//! reported through [`StepDiagnostics`](super::diagnostics::StepDiagnostics).
//! Only parameters and scenarios are checked up front.

/// Error returned when simulation parameters or a scenario are unusable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FluidError {
    #[error("smoothing radius must be in (0, 2], got {0}")]
    InvalidSmoothingRadius(f32),
    #[error("rest density must be positive, got {0}")]
    InvalidRestDensity(f32),
    #[error("{name} is out of range: {value}")]
    InvalidCoefficient { name: &'static str, value: f32 },
    #[error("particle mass must be positive, got {0}")]
    InvalidParticleMass(f32),
    #[error("lattice spacing must be positive, got {0}")]
    InvalidSpacing(f32),
    #[error("padding ({x}, {y}) leaves no room inside the domain")]
    InvalidPadding { x: f32, y: f32 },
}
