//! 2D Smoothed Particle Hydrodynamics simulation module for Bevy.
//!
//! Fluid is represented by particles carrying mass, position, velocity,
//! density and pressure. Every step recomputes density, pressure and force from
//! kernel-weighted neighbors, integrates, and reflects particles off the walls
//! of the square domain `[-1, 1]²`.
//!
//! # Architecture
//!
//! The simulation is structured in the following components:
//!
//! - [`params`]: Simulation parameters (smoothing radius, stiffness, etc.)
//! - [`particle`]: Particle data and scenario layout
//! - [`spatial`]: Bucket grid owning the particles, for neighbor search
//! - [`kernels`]: SPH smoothing kernels
//! - [`solver`]: Density, pressure, force, integration and collision stages
//! - [`boundary`]: Domain walls
//! - [`diagnostics`]: Per-step numerical health
//! - [`simulation`]: The simulation resource driving the stages
//! - [`plugin`]: Bevy plugin for easy integration
//!
//! # Example
//!
//! ```rust,no_run
//! use sph2d::fluid::prelude::*;
//!
//! let params = SphParams::default();
//! let mut simulation = FluidSimulation::with_seed(1);
//! simulation.reset(&ScenarioParams::dam(), &params).unwrap();
//!
//! for _ in 0..100 {
//!     simulation.step(0.005, &params);
//! }
//! println!("{} particles", simulation.particle_count());
//! ```

pub mod boundary;
pub mod diagnostics;
pub mod error;
pub mod kernels;
pub mod params;
pub mod particle;
pub mod plugin;
pub mod simulation;
pub mod solver;
pub mod spatial;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::boundary::*;
    pub use super::diagnostics::*;
    pub use super::error::*;
    pub use super::kernels::*;
    pub use super::params::*;
    pub use super::particle::*;
    pub use super::plugin::*;
    pub use super::simulation::*;
    pub use super::solver::*;
    pub use super::spatial::*;
}
