//! Fluid particle data and scenario initialization.
//!
//! Particles live in the arena of a [`SpatialGrid`](super::spatial::SpatialGrid)
//! and are addressed by [`ParticleId`] handles. A [`ScenarioParams`] describes how
//! a fresh population is laid out on reset.

use bevy::prelude::*;
use rand::Rng;

use super::error::FluidError;

/// A single SPH particle.
///
/// `density`, `pressure` and `force` are derived every step and carry no
/// meaning across steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub force: Vec2,
    pub density: f32,
    pub pressure: f32,
}

impl Particle {
    /// Create a particle at rest at a given position.
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            ..default()
        }
    }

    /// Create a particle with initial velocity.
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Particle momentum for a given mass.
    pub fn momentum(&self, mass: f32) -> Vec2 {
        self.velocity * mass
    }

    /// True when every component of the particle state is finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.force.is_finite()
            && self.density.is_finite()
            && self.pressure.is_finite()
    }
}

/// Stable handle to a particle stored in the spatial index arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Reflect)]
pub struct ParticleId(pub usize);

impl ParticleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Initial velocity given to every particle of a scenario.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum InitialVelocity {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
    /// Independent uniform sample in `[-1, 1]²` per particle.
    Random,
}

impl InitialVelocity {
    /// Velocity for one particle.
    pub fn sample(self, rng: &mut impl Rng) -> Vec2 {
        match self {
            InitialVelocity::None => Vec2::ZERO,
            InitialVelocity::Up => Vec2::Y,
            InitialVelocity::Down => Vec2::NEG_Y,
            InitialVelocity::Left => Vec2::NEG_X,
            InitialVelocity::Right => Vec2::X,
            InitialVelocity::Random => Vec2::new(
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
            ),
        }
    }
}

/// Declarative description of an initial particle population.
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct ScenarioParams {
    /// Lattice spacing, relative to the smoothing radius.
    pub spacing: f32,

    /// Distance kept free from the walls.
    /// `x` pads the left/right walls, `y` the bottom/top walls.
    pub padding: Vec2,

    pub initial_velocity: InitialVelocity,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            spacing: 1.2,
            padding: Vec2::splat(0.2),
            initial_velocity: InitialVelocity::None,
        }
    }
}

impl ScenarioParams {
    /// Fluid block at rest.
    pub fn dam() -> Self {
        Self::default()
    }

    /// Fluid block with random initial velocities.
    pub fn random() -> Self {
        Self {
            initial_velocity: InitialVelocity::Random,
            ..Self::default()
        }
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_padding(mut self, padding: Vec2) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_velocity(mut self, initial_velocity: InitialVelocity) -> Self {
        self.initial_velocity = initial_velocity;
        self
    }

    pub fn validate(&self) -> Result<(), FluidError> {
        if !self.spacing.is_finite() || self.spacing <= 0.0 {
            return Err(FluidError::InvalidSpacing(self.spacing));
        }
        let usable = |p: f32| (0.0..1.0).contains(&p);
        if !usable(self.padding.x) || !usable(self.padding.y) {
            return Err(FluidError::InvalidPadding {
                x: self.padding.x,
                y: self.padding.y,
            });
        }
        Ok(())
    }

    /// Number of lattice points per axis for a given smoothing radius.
    ///
    /// Points run from `-1 + padding` to `1 - padding` inclusive.
    pub fn lattice_dims(&self, h: f32) -> UVec2 {
        let step = self.spacing * h;
        let count = |padding: f32| {
            let extent = 2.0 - 2.0 * padding;
            // Tolerate the last point landing a rounding error past the far edge.
            (extent / step + 1e-4).floor() as u32 + 1
        };
        UVec2::new(count(self.padding.x), count(self.padding.y))
    }

    /// Unjittered lattice positions for a given smoothing radius.
    pub fn lattice_positions(&self, h: f32) -> Vec<Vec2> {
        let step = self.spacing * h;
        let dims = self.lattice_dims(h);
        let origin = Vec2::splat(-1.0) + self.padding;

        let mut positions = Vec::with_capacity((dims.x * dims.y) as usize);
        for i in 0..dims.x {
            for j in 0..dims.y {
                positions.push(origin + Vec2::new(i as f32, j as f32) * step);
            }
        }
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_axis_velocities() {
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(InitialVelocity::None.sample(&mut rng), Vec2::ZERO);
        assert_eq!(InitialVelocity::Up.sample(&mut rng), Vec2::new(0.0, 1.0));
        assert_eq!(InitialVelocity::Down.sample(&mut rng), Vec2::new(0.0, -1.0));
        assert_eq!(InitialVelocity::Left.sample(&mut rng), Vec2::new(-1.0, 0.0));
        assert_eq!(InitialVelocity::Right.sample(&mut rng), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_random_velocity_in_unit_square() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let v = InitialVelocity::Random.sample(&mut rng);
            assert!(v.x.abs() <= 1.0 && v.y.abs() <= 1.0);
        }
    }

    #[test]
    fn test_lattice_stays_inside_padding() {
        let scenario = ScenarioParams::default();
        let positions = scenario.lattice_positions(0.06);

        assert!(!positions.is_empty());
        for p in &positions {
            assert!(p.x >= -0.8 - 1e-5 && p.x <= 0.8 + 1e-5);
            assert!(p.y >= -0.8 - 1e-5 && p.y <= 0.8 + 1e-5);
        }

        let dims = scenario.lattice_dims(0.06);
        assert_eq!(positions.len(), (dims.x * dims.y) as usize);
    }

    #[test]
    fn test_scenario_validation() {
        assert!(ScenarioParams::default().validate().is_ok());
        assert!(matches!(
            ScenarioParams::default().with_spacing(0.0).validate(),
            Err(FluidError::InvalidSpacing(_))
        ));
        assert!(matches!(
            ScenarioParams::default()
                .with_padding(Vec2::new(1.0, 0.2))
                .validate(),
            Err(FluidError::InvalidPadding { .. })
        ));
    }
}
