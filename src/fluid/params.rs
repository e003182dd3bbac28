//! Fluid simulation parameters.
//!
//! These parameters control the behavior of the SPH simulation. They are a Bevy
//! resource, so an external panel can edit them before requesting a reset.

use bevy::prelude::*;

use super::error::FluidError;

/// Parameters controlling the SPH simulation behavior.
///
/// Units are normalized: the domain is the square `[-1, 1]²` and the rest
/// density is 1.
#[derive(Resource, Clone, Debug, Reflect)]
#[reflect(Resource)]
pub struct SphParams {
    /// Smoothing kernel radius (h).
    /// Also used as the cell size of the spatial index.
    pub smoothing_radius: f32,

    /// Rest density (rho0) of the fluid.
    pub rest_density: f32,

    /// Stiffness converting a density excess into pressure.
    pub stiffness: f32,

    /// Viscosity coefficient (nu).
    pub viscosity: f32,

    /// Gravity acceleration vector.
    pub gravity: Vec2,

    /// Linear velocity damping applied at integration.
    /// Numerical dissipation, not physical viscosity.
    pub damping: f32,

    /// Velocity factor kept (and inverted) on a wall hit.
    pub boundary_restitution: f32,

    /// Maximum random offset used to push a colliding particle back inside.
    pub boundary_epsilon: f32,

    /// Explicit per-particle mass. `None` derives it as `rho0 * h²`.
    pub particle_mass: Option<f32>,

    /// Timestep for simulation.
    /// Use None to use frame delta time.
    pub fixed_timestep: Option<f32>,

    /// Upper bound on a frame delta time.
    pub max_timestep: f32,

    /// Re-bucket every particle from its current position before each step.
    ///
    /// Disabling it keeps the buckets filled at reset time. That mode is
    /// unstable: once a particle drifts more than one cell from its bucket, a
    /// query from its position no longer finds it, its density drops to zero and
    /// its force, velocity and position turn NaN. Diagnostics report such
    /// particles as non-finite.
    pub rebuild_index: bool,
}

impl Default for SphParams {
    fn default() -> Self {
        Self {
            smoothing_radius: 0.06,
            rest_density: 1.0,
            stiffness: 8.0,
            viscosity: 0.02,
            gravity: Vec2::new(0.0, -9.81),
            damping: 0.005,
            boundary_restitution: 0.5,
            boundary_epsilon: 1e-3,
            particle_mass: None,
            fixed_timestep: Some(0.005),
            max_timestep: 1.0 / 30.0,
            rebuild_index: true,
        }
    }
}

impl SphParams {
    /// Set the smoothing radius. The derived particle mass follows it.
    pub fn with_smoothing_radius(mut self, h: f32) -> Self {
        self.smoothing_radius = h;
        self
    }

    pub fn with_rest_density(mut self, rest_density: f32) -> Self {
        self.rest_density = rest_density;
        self
    }

    pub fn with_stiffness(mut self, stiffness: f32) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn with_viscosity(mut self, viscosity: f32) -> Self {
        self.viscosity = viscosity;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Override the derived particle mass.
    pub fn with_particle_mass(mut self, mass: f32) -> Self {
        self.particle_mass = Some(mass);
        self
    }

    pub fn with_fixed_timestep(mut self, dt: Option<f32>) -> Self {
        self.fixed_timestep = dt;
        self
    }

    /// Never rebuild the spatial index between resets.
    ///
    /// See [`Self::rebuild_index`] for how this breaks down as particles move.
    pub fn with_stale_index(mut self) -> Self {
        self.rebuild_index = false;
        self
    }

    /// Cell size of the spatial index: one interaction radius.
    pub fn cell_size(&self) -> f32 {
        self.smoothing_radius
    }

    /// Mass of a single particle.
    pub fn particle_mass(&self) -> f32 {
        self.particle_mass.unwrap_or_else(|| {
            let h = self.smoothing_radius;
            self.rest_density * h * h
        })
    }

    /// Check that the parameters describe a runnable simulation.
    pub fn validate(&self) -> Result<(), FluidError> {
        let h = self.smoothing_radius;
        if !h.is_finite() || h <= 0.0 || h > 2.0 {
            return Err(FluidError::InvalidSmoothingRadius(h));
        }
        if !self.rest_density.is_finite() || self.rest_density <= 0.0 {
            return Err(FluidError::InvalidRestDensity(self.rest_density));
        }
        for (name, value) in [("stiffness", self.stiffness), ("viscosity", self.viscosity)] {
            if !value.is_finite() || value < 0.0 {
                return Err(FluidError::InvalidCoefficient { name, value });
            }
        }
        if !(0.0..1.0).contains(&self.damping) {
            return Err(FluidError::InvalidCoefficient {
                name: "damping",
                value: self.damping,
            });
        }
        if let Some(mass) = self.particle_mass {
            if !mass.is_finite() || mass <= 0.0 {
                return Err(FluidError::InvalidParticleMass(mass));
            }
        }
        Ok(())
    }
}
