//! sph2d - 2D SPH fluid simulation for Bevy
//!
//! This library provides a Smoothed Particle Hydrodynamics (SPH) simulation of a
//! fluid confined to a square, with a uniform bucket grid for neighbor search.
//! It only simulates: drawing, windows and input belong to the host app, which
//! reads particle state from the [`FluidSimulation`](fluid::simulation::FluidSimulation)
//! resource.
//!
//! # Features
//!
//! - **SPH Pipeline**: density, pressure, force, integration and wall collision per step
//! - **Bucket Grid**: 3×3 cell neighbor queries instead of all-pairs search
//! - **Scenarios**: jittered lattice with a choice of initial velocity
//! - **Diagnostics**: NaN, coincident particle and out-of-domain reporting
//! - **Easy Integration**: Simple Bevy plugin interface
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use sph2d::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(MinimalPlugins)
//!         .add_plugins(FluidPlugin::default().with_scenario(ScenarioParams::dam()))
//!         .add_systems(Update, report)
//!         .run();
//! }
//!
//! fn report(simulation: Res<FluidSimulation>) {
//!     let error = simulation.diagnostics().average_density_error;
//!     println!("{} particles, density error {error}", simulation.particle_count());
//! }
//! ```

pub mod fluid;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::fluid::prelude::*;
}
