//! Fluid simulation core logic.
//!
//! [`FluidSimulation`] owns the particles (through its spatial grid) and drives
//! the SPH pipeline one timestep at a time. Renderers and UI only read from it.

use bevy::log::{debug, info, warn};
use bevy::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

use super::boundary::DomainBoundary;
use super::diagnostics::StepDiagnostics;
use super::error::FluidError;
use super::params::SphParams;
use super::particle::{Particle, ScenarioParams};
use super::solver::SphSolver;
use super::spatial::{SpatialGrid, DOMAIN_SIZE};

/// Main fluid simulation resource.
#[derive(Resource)]
pub struct FluidSimulation {
    /// Spatial grid owning every particle.
    grid: SpatialGrid,
    solver: SphSolver,
    boundary: DomainBoundary,
    /// Source of lattice jitter, random velocities and wall insets.
    rng: StdRng,
    frame: u64,
    elapsed: f32,
    diagnostics: StepDiagnostics,
}

impl Default for FluidSimulation {
    fn default() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl FluidSimulation {
    /// Creates an empty simulation with deterministic randomness.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let params = SphParams::default();
        Self {
            grid: SpatialGrid::new(DOMAIN_SIZE, params.cell_size()),
            solver: SphSolver::new(params.smoothing_radius),
            boundary: DomainBoundary::from_params(&params),
            rng,
            frame: 0,
            elapsed: 0.0,
            diagnostics: StepDiagnostics::default(),
        }
    }

    /// Returns the number of particles.
    pub fn particle_count(&self) -> usize {
        self.grid.len()
    }

    /// Every particle, in a stable order.
    pub fn particles(&self) -> &[Particle] {
        self.grid.all()
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        self.grid.all_mut()
    }

    /// Every `n`th particle, e.g. to draw radius indicators.
    pub fn sample_every(&self, n: usize) -> impl Iterator<Item = &Particle> {
        self.grid.all().iter().step_by(n.max(1))
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Diagnostics of the last step.
    pub fn diagnostics(&self) -> &StepDiagnostics {
        &self.diagnostics
    }

    /// Steps taken since the last reset.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulated time since the last reset.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Replace every particle with a fresh scenario.
    ///
    /// The grid and kernels are rebuilt for the current smoothing radius.
    pub fn reset(&mut self, scenario: &ScenarioParams, params: &SphParams) -> Result<(), FluidError> {
        params.validate()?;
        scenario.validate()?;

        if self.grid.cell_size() != params.cell_size() {
            self.grid = SpatialGrid::new(DOMAIN_SIZE, params.cell_size());
        }
        self.solver.set_smoothing_radius(params.smoothing_radius);
        self.boundary = DomainBoundary::from_params(params);

        self.grid.populate(scenario, &mut self.rng);
        let clamped = self.grid.take_clamped_insertions();
        if clamped > 0 {
            debug!("{clamped} particles spawned outside the domain");
        }

        self.frame = 0;
        self.elapsed = 0.0;
        self.diagnostics = StepDiagnostics::default();

        info!(
            "Reset fluid: {} particles, spacing {}, velocity {:?}",
            self.grid.len(),
            scenario.spacing,
            scenario.initial_velocity
        );
        Ok(())
    }

    /// Runs one simulation step.
    ///
    /// The smoothing radius stays the one the grid was built for at the last
    /// reset; a new `params.smoothing_radius` takes effect at the next reset.
    pub fn step(&mut self, dt: f32, params: &SphParams) {
        if self.grid.is_empty() {
            return;
        }

        // A radius wider than a cell would let the 3×3 scan miss neighbors
        let params = &SphParams {
            smoothing_radius: self.grid.cell_size(),
            ..params.clone()
        };
        self.solver.set_smoothing_radius(params.smoothing_radius);
        let mass = params.particle_mass();

        // 1. Re-file particles that moved since the last step
        if params.rebuild_index {
            self.grid.rebuild();
        }
        let clamped_insertions = self.grid.take_clamped_insertions();

        // 2. Density
        self.solver.compute_densities(&mut self.grid, mass);

        // 3. Pressure
        SphSolver::compute_pressures(&mut self.grid, params.rest_density, params.stiffness);

        // 4. Forces
        let coincident_pairs = self.solver.compute_forces(&mut self.grid, params);

        // 5. Integration
        SphSolver::integrate(&mut self.grid, dt, mass, params.damping);

        // 6. Boundary collision
        SphSolver::collide(&mut self.grid, &self.boundary, &mut self.rng);

        self.frame += 1;
        self.elapsed += dt;

        self.diagnostics = StepDiagnostics {
            coincident_pairs,
            clamped_insertions,
            ..StepDiagnostics::from_particles(self.grid.all(), params.rest_density)
        };
        if !self.diagnostics.is_healthy() {
            warn!(
                "Step {}: {} non-finite particles, {} coincident pairs, {} clamped insertions",
                self.frame,
                self.diagnostics.non_finite_particles,
                self.diagnostics.coincident_pairs,
                self.diagnostics.clamped_insertions
            );
        }
    }
}
