//! Uniform bucket grid for neighbor search.
//!
//! The grid covers the square domain `[-1, 1]²` with `grid_size × grid_size`
//! cells of at least one smoothing radius each, so every particle within `h` of
//! a query point lies in the query cell or one of its 8 neighbors.
//!
//! Particles are stored in an arena owned by the grid. Cells and neighbor
//! queries hold [`ParticleId`] handles into that arena, so a mutation through a
//! handle is visible to every other view of the same particle.

use bevy::log::debug;
use bevy::prelude::*;
use rand::Rng;

use super::particle::{Particle, ParticleId, ScenarioParams};

/// Side length of the simulated square.
pub const DOMAIN_SIZE: f32 = 2.0;

/// Lower-left corner of the simulated square.
pub const DOMAIN_MIN: Vec2 = Vec2::splat(-1.0);

/// Largest number of cells per axis. Smaller radii get wider cells.
pub const MAX_GRID_SIZE: u32 = 1024;

/// Bucket grid owning every particle of a simulation.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    /// Nominal cell size (the smoothing radius).
    cell_size: f32,
    /// Number of cells in each dimension.
    grid_size: u32,
    /// Row-major cells of particle handles.
    cells: Vec<Vec<ParticleId>>,
    /// Particle arena. Its order is the flat iteration order.
    particles: Vec<Particle>,
    /// Insertions whose position lay outside the domain since the last take.
    clamped_insertions: usize,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(DOMAIN_SIZE, 0.06)
    }
}

impl SpatialGrid {
    /// Allocate an empty grid covering `domain_size` with cells of `cell_size`.
    ///
    /// The cell count is rounded down and capped at [`MAX_GRID_SIZE`], so the
    /// real cells are never smaller than requested.
    pub fn new(domain_size: f32, cell_size: f32) -> Self {
        let grid_size = ((domain_size / cell_size) as u32).clamp(1, MAX_GRID_SIZE);
        debug!(
            "spatial grid: {grid_size}x{grid_size} cells for cell size {cell_size}"
        );

        Self {
            cell_size,
            grid_size,
            cells: vec![Vec::new(); grid_size as usize * grid_size as usize],
            particles: Vec::new(),
            clamped_insertions: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Remove every particle from the cells and the arena.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.particles.clear();
        self.clamped_insertions = 0;
    }

    /// Check if a position lies inside the simulated square.
    pub fn contains(&self, position: Vec2) -> bool {
        let max = DOMAIN_MIN + Vec2::splat(DOMAIN_SIZE);
        position.cmpge(DOMAIN_MIN).all() && position.cmple(max).all()
    }

    /// Cell holding a position, clamped to the grid.
    pub fn cell_of(&self, position: Vec2) -> UVec2 {
        let normalized = (position - DOMAIN_MIN) / DOMAIN_SIZE;
        let last = self.grid_size as i32 - 1;
        // `as` saturates and maps NaN to 0, so the clamp covers every input.
        let x = ((normalized.x * self.grid_size as f32).floor() as i32).clamp(0, last);
        let y = ((normalized.y * self.grid_size as f32).floor() as i32).clamp(0, last);
        UVec2::new(x as u32, y as u32)
    }

    #[inline]
    fn cell_index(&self, cell: UVec2) -> usize {
        cell.y as usize * self.grid_size as usize + cell.x as usize
    }

    /// Handles filed in a cell.
    pub fn cell(&self, cell: UVec2) -> &[ParticleId] {
        &self.cells[self.cell_index(cell)]
    }

    /// File a particle in the cell of its position and take ownership of it.
    pub fn add(&mut self, particle: Particle) -> ParticleId {
        let id = ParticleId(self.particles.len());
        self.particles.push(particle);
        self.file(id);
        id
    }

    fn file(&mut self, id: ParticleId) {
        let position = self.particles[id.index()].position;
        if !self.contains(position) {
            self.clamped_insertions += 1;
        }
        let index = self.cell_index(self.cell_of(position));
        self.cells[index].push(id);
    }

    /// Re-file every particle from its current position.
    pub fn rebuild(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        for index in 0..self.particles.len() {
            self.file(ParticleId(index));
        }
    }

    /// Number of out-of-domain insertions since the last call.
    pub fn take_clamped_insertions(&mut self) -> usize {
        std::mem::take(&mut self.clamped_insertions)
    }

    pub fn get(&self, id: ParticleId) -> &Particle {
        &self.particles[id.index()]
    }

    pub fn get_mut(&mut self, id: ParticleId) -> &mut Particle {
        &mut self.particles[id.index()]
    }

    /// Every particle, in insertion order.
    pub fn all(&self) -> &[Particle] {
        &self.particles
    }

    pub fn all_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Handles of every particle, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ParticleId> {
        (0..self.particles.len()).map(ParticleId)
    }

    /// Particles within `radius` of a stored particle, itself included.
    pub fn query_neighbors(&self, id: ParticleId, radius: f32) -> Vec<ParticleId> {
        self.query_point(self.get(id).position, radius)
    }

    /// Particles within `radius` of a position.
    pub fn query_point(&self, position: Vec2, radius: f32) -> Vec<ParticleId> {
        let mut neighbors = Vec::with_capacity(32);
        self.query_point_into(position, radius, &mut neighbors);
        neighbors
    }

    /// Same as [`Self::query_point`], reusing the caller's buffer.
    ///
    /// Only the 3×3 block of cells around the position is scanned, so radii
    /// larger than a cell miss particles.
    pub fn query_point_into(&self, position: Vec2, radius: f32, out: &mut Vec<ParticleId>) {
        out.clear();
        let center = self.cell_of(position).as_ivec2();

        for dy in -1..=1 {
            for dx in -1..=1 {
                let cell = center + IVec2::new(dx, dy);
                if cell.x < 0
                    || cell.y < 0
                    || cell.x >= self.grid_size as i32
                    || cell.y >= self.grid_size as i32
                {
                    continue;
                }

                for &j in &self.cells[self.cell_index(cell.as_uvec2())] {
                    if self.particles[j.index()].position.distance(position) <= radius {
                        out.push(j);
                    }
                }
            }
        }
    }

    /// Clear the grid and lay out a scenario on a jittered lattice.
    ///
    /// Lattice spacing is `scenario.spacing` smoothing radii; each point moves
    /// by up to `h/8` on both axes to break lattice symmetry.
    pub fn populate(&mut self, scenario: &ScenarioParams, rng: &mut impl Rng) {
        self.clear();

        let h = self.cell_size;
        let jitter = h / 8.0;
        for position in scenario.lattice_positions(h) {
            let offset = Vec2::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            ) * jitter;
            let velocity = scenario.initial_velocity.sample(rng);
            self.add(Particle::new(position + offset).with_velocity(velocity));
        }
    }
}
