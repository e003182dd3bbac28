//! SPH update stages.
//!
//! A step runs `density → pressure → force → integrate → collide`. Every stage
//! finishes for all particles before the next one starts, because pressure and
//! force of a particle read the fully updated values of its neighbors.

use bevy::prelude::*;
use rand::Rng;

use super::boundary::DomainBoundary;
use super::kernels::SphKernels;
use super::params::SphParams;
use super::particle::ParticleId;
use super::spatial::SpatialGrid;

/// CPU SPH solver operating on the particles owned by a [`SpatialGrid`].
#[derive(Clone, Debug)]
pub struct SphSolver {
    kernels: SphKernels,
    /// Reused neighbor buffer.
    neighbors: Vec<ParticleId>,
}

impl SphSolver {
    pub fn new(smoothing_radius: f32) -> Self {
        Self {
            kernels: SphKernels::new(smoothing_radius),
            neighbors: Vec::with_capacity(64),
        }
    }

    pub fn kernels(&self) -> &SphKernels {
        &self.kernels
    }

    /// Rebuild the kernels if the smoothing radius changed.
    pub fn set_smoothing_radius(&mut self, h: f32) {
        if self.kernels.radius() != h {
            self.kernels = SphKernels::new(h);
        }
    }

    /// Density of every particle from its neighbors, itself included.
    pub fn compute_densities(&mut self, grid: &mut SpatialGrid, mass: f32) {
        let h = self.kernels.radius();

        for i in 0..grid.len() {
            let id = ParticleId(i);
            let pos_i = grid.get(id).position;
            grid.query_point_into(pos_i, h, &mut self.neighbors);

            let mut density = 0.0;
            for &j in &self.neighbors {
                let r = pos_i.distance(grid.get(j).position);
                density += mass * self.kernels.density(r);
            }
            grid.get_mut(id).density = density;
        }
    }

    /// Linear equation of state. Pressure goes negative below rest density.
    pub fn compute_pressures(grid: &mut SpatialGrid, rest_density: f32, stiffness: f32) {
        for particle in grid.all_mut() {
            particle.pressure = stiffness * (particle.density - rest_density);
        }
    }

    /// Gravity, pressure and viscosity forces.
    ///
    /// Forces are written in place: the stage only reads neighbor positions,
    /// velocities, densities and pressures, none of which it changes.
    ///
    /// Returns the number of distinct neighbor pairs found at zero distance;
    /// their pressure term is NaN.
    pub fn compute_forces(&mut self, grid: &mut SpatialGrid, params: &SphParams) -> usize {
        let h = self.kernels.radius();
        let m = params.particle_mass();
        let nu = params.viscosity;
        let gravity_force = m * params.gravity;
        let mut coincident_pairs = 0;

        for i in 0..grid.len() {
            let id = ParticleId(i);
            let pi = *grid.get(id);
            grid.query_point_into(pi.position, h, &mut self.neighbors);

            let mut pressure_force = Vec2::ZERO;
            let mut viscosity_force = Vec2::ZERO;

            for &j in &self.neighbors {
                if j == id {
                    continue;
                }
                let pj = grid.get(j);
                let r_ij = pi.position - pj.position;
                let r = r_ij.length();
                if r > h {
                    continue;
                }
                if r == 0.0 && i < j.index() {
                    coincident_pairs += 1;
                }

                pressure_force += m * (pi.pressure + pj.pressure) / (2.0 * pj.density)
                    * self.kernels.pressure_gradient(r_ij);
                viscosity_force +=
                    m * (pj.velocity - pi.velocity) / pj.density * self.kernels.viscosity_laplacian(r);
            }

            grid.get_mut(id).force =
                -m / pi.density * pressure_force + m * nu * viscosity_force + gravity_force;
        }

        coincident_pairs
    }

    /// Semi-implicit Euler with linear damping.
    pub fn integrate(grid: &mut SpatialGrid, dt: f32, mass: f32, damping: f32) {
        for particle in grid.all_mut() {
            particle.velocity = (1.0 - damping) * particle.velocity + dt * particle.force / mass;
            particle.position += dt * particle.velocity;
        }
    }

    /// Reflect particles that left the domain. Returns the number of particles hit.
    pub fn collide(grid: &mut SpatialGrid, boundary: &DomainBoundary, rng: &mut impl Rng) -> usize {
        let mut hits = 0;
        for particle in grid.all_mut() {
            if boundary.apply_collision(&mut particle.position, &mut particle.velocity, rng) {
                hits += 1;
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluid::particle::{Particle, ScenarioParams};
    use crate::fluid::spatial::DOMAIN_SIZE;

    fn weightless() -> SphParams {
        SphParams::default().with_gravity(Vec2::ZERO)
    }

    #[test]
    fn test_isolated_density_is_self_contribution() {
        let params = SphParams::default();
        let h = params.smoothing_radius;
        let mass = params.particle_mass();
        let mut grid = SpatialGrid::new(DOMAIN_SIZE, h);
        let lone = grid.add(Particle::new(Vec2::new(0.2, 0.3)));
        grid.add(Particle::new(Vec2::new(0.2 + 1.5 * h, 0.3)));

        let mut solver = SphSolver::new(h);
        solver.compute_densities(&mut grid, mass);

        assert_eq!(grid.get(lone).density, mass * solver.kernels().density(0.0));
    }

    #[test]
    fn test_lattice_density_near_rest() {
        // Mass of one lattice cell, corrected for the poly6 area integral
        // (315 / 256h) of the 3D-normalized kernel.
        let h = 0.06;
        let spacing = 0.5;
        let s = spacing * h;
        let mass = s * s * h * 256.0 / 315.0;
        let params = SphParams::default().with_particle_mass(mass);

        let mut grid = SpatialGrid::new(DOMAIN_SIZE, h);
        let scenario = ScenarioParams::default()
            .with_spacing(spacing)
            .with_padding(Vec2::ZERO);
        for position in scenario.lattice_positions(h) {
            grid.add(Particle::new(position));
        }

        let mut solver = SphSolver::new(h);
        solver.compute_densities(&mut grid, params.particle_mass());

        let interior: Vec<f32> = grid
            .all()
            .iter()
            .filter(|p| p.position.abs().max_element() < 1.0 - 2.0 * h)
            .map(|p| p.density)
            .collect();
        assert!(!interior.is_empty());

        let mean = interior.iter().sum::<f32>() / interior.len() as f32;
        assert!((mean - params.rest_density).abs() < 0.05, "mean density {mean}");
    }

    #[test]
    fn test_pressure_can_go_negative() {
        let mut grid = SpatialGrid::new(DOMAIN_SIZE, 0.06);
        let a = grid.add(Particle {
            density: 0.5,
            ..default()
        });
        let b = grid.add(Particle {
            density: 3.0,
            ..default()
        });

        SphSolver::compute_pressures(&mut grid, 1.0, 8.0);

        assert_eq!(grid.get(a).pressure, -4.0);
        assert_eq!(grid.get(b).pressure, 16.0);
    }

    #[test]
    fn test_single_particle_feels_only_gravity() {
        let params = SphParams::default();
        let mut grid = SpatialGrid::new(DOMAIN_SIZE, params.smoothing_radius);
        let id = grid.add(Particle::new(Vec2::ZERO).with_velocity(Vec2::new(1.0, 0.0)));

        let mut solver = SphSolver::new(params.smoothing_radius);
        solver.compute_densities(&mut grid, params.particle_mass());
        SphSolver::compute_pressures(&mut grid, params.rest_density, params.stiffness);
        let coincident = solver.compute_forces(&mut grid, &params);

        assert_eq!(coincident, 0);
        assert_eq!(grid.get(id).force, params.particle_mass() * params.gravity);
    }

    #[test]
    fn test_pair_conserves_momentum() {
        let params = weightless();
        let h = params.smoothing_radius;
        let m = params.particle_mass();
        let mut grid = SpatialGrid::new(DOMAIN_SIZE, h);
        grid.add(Particle::new(Vec2::new(0.0, 0.0)).with_velocity(Vec2::new(0.3, 0.1)));
        grid.add(Particle::new(Vec2::new(0.5 * h, 0.1 * h)).with_velocity(Vec2::new(-0.3, -0.1)));

        let mut solver = SphSolver::new(h);
        solver.compute_densities(&mut grid, m);
        SphSolver::compute_pressures(&mut grid, params.rest_density, params.stiffness);
        solver.compute_forces(&mut grid, &params);

        let forces: Vec<Vec2> = grid.all().iter().map(|p| p.force).collect();
        assert!(forces[0].length() > 0.0);
        assert!((forces[0] + forces[1]).length() <= 1e-6 * forces[0].length());

        SphSolver::integrate(&mut grid, 0.005, m, params.damping);
        let momentum: Vec2 = grid.all().iter().map(|p| p.momentum(m)).sum();
        assert!(momentum.length() < 1e-7, "momentum drift {momentum:?}");
    }

    #[test]
    fn test_forces_ignore_previous_forces() {
        let params = weightless();
        let h = params.smoothing_radius;
        let m = params.particle_mass();
        let mut solver = SphSolver::new(h);
        let run = |solver: &mut SphSolver, stale: Vec2| {
            let mut grid = SpatialGrid::new(DOMAIN_SIZE, h);
            for (i, x) in [0.0, 0.4, 0.8].into_iter().enumerate() {
                let mut particle = Particle::new(Vec2::new(x * h, 0.2 * h * i as f32))
                    .with_velocity(Vec2::new(0.1 * i as f32, 0.0));
                particle.force = stale;
                grid.add(particle);
            }
            solver.compute_densities(&mut grid, m);
            SphSolver::compute_pressures(&mut grid, params.rest_density, params.stiffness);
            solver.compute_forces(&mut grid, &params);
            grid.all().iter().map(|p| p.force).collect::<Vec<_>>()
        };

        let clean = run(&mut solver, Vec2::ZERO);
        let dirty = run(&mut solver, Vec2::new(1e6, -1e6));

        assert!(clean.iter().any(|f| f.length() > 0.0));
        assert_eq!(clean, dirty);
    }

    #[test]
    fn test_pressure_pushes_apart() {
        let params = weightless();
        let h = params.smoothing_radius;
        let m = params.particle_mass();
        let mut grid = SpatialGrid::new(DOMAIN_SIZE, h);
        let left = grid.add(Particle::new(Vec2::new(0.0, 0.0)));
        let right = grid.add(Particle::new(Vec2::new(0.3 * h, 0.0)));

        let mut solver = SphSolver::new(h);
        solver.compute_densities(&mut grid, m);
        SphSolver::compute_pressures(&mut grid, params.rest_density, params.stiffness);
        solver.compute_forces(&mut grid, &params);

        // Both densities sit far above rest density, so pressure is repulsive
        assert!(grid.get(left).pressure > 0.0);
        assert!(grid.get(left).force.x < 0.0);
        assert!(grid.get(right).force.x > 0.0);
    }

    #[test]
    fn test_viscosity_damps_relative_motion() {
        let params = weightless().with_stiffness(0.0);
        let h = params.smoothing_radius;
        let m = params.particle_mass();
        let mut grid = SpatialGrid::new(DOMAIN_SIZE, h);
        let slow = grid.add(Particle::new(Vec2::new(0.0, 0.0)));
        let fast = grid.add(Particle::new(Vec2::new(0.0, 0.5 * h)).with_velocity(Vec2::X));

        let mut solver = SphSolver::new(h);
        solver.compute_densities(&mut grid, m);
        SphSolver::compute_pressures(&mut grid, params.rest_density, params.stiffness);
        solver.compute_forces(&mut grid, &params);

        assert!(grid.get(slow).force.x > 0.0);
        assert!(grid.get(fast).force.x < 0.0);
    }

    #[test]
    fn test_coincident_particles_are_reported() {
        let params = weightless();
        let h = params.smoothing_radius;
        let mut grid = SpatialGrid::new(DOMAIN_SIZE, h);
        grid.add(Particle::new(Vec2::new(0.1, 0.1)));
        grid.add(Particle::new(Vec2::new(0.1, 0.1)));

        let mut solver = SphSolver::new(h);
        solver.compute_densities(&mut grid, params.particle_mass());
        SphSolver::compute_pressures(&mut grid, params.rest_density, params.stiffness);
        let coincident = solver.compute_forces(&mut grid, &params);

        assert_eq!(coincident, 1);
        assert!(grid.all().iter().all(|p| !p.force.is_finite()));
    }

    #[test]
    fn test_integrate_semi_implicit() {
        let mut grid = SpatialGrid::new(DOMAIN_SIZE, 0.06);
        let id = grid.add(Particle {
            velocity: Vec2::new(1.0, 0.0),
            force: Vec2::new(0.0, -2.0),
            ..default()
        });

        SphSolver::integrate(&mut grid, 0.1, 2.0, 0.0);

        let p = grid.get(id);
        assert_eq!(p.velocity, Vec2::new(1.0, -0.1));
        // Position uses the updated velocity
        assert!((p.position - Vec2::new(0.1, -0.01)).length() < 1e-7);
    }
}
