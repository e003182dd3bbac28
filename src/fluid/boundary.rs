//! Boundary handling for the square simulation domain.
//!
//! Walls are axis-aligned. Each axis is resolved independently, so a particle
//! leaving through a corner is reflected on both axes in the same pass.

use bevy::prelude::*;
use rand::Rng;

use super::params::SphParams;
use super::spatial::{DOMAIN_MIN, DOMAIN_SIZE};

/// Box-shaped container (AABB) keeping particles inside.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct DomainBoundary {
    /// Minimum corner of the box.
    pub min: Vec2,
    /// Maximum corner of the box.
    pub max: Vec2,
    /// Fraction of the normal velocity kept after a wall hit.
    pub restitution: f32,
    /// Maximum random inset of a particle pushed back inside.
    pub epsilon: f32,
}

impl Default for DomainBoundary {
    fn default() -> Self {
        Self {
            min: DOMAIN_MIN,
            max: DOMAIN_MIN + Vec2::splat(DOMAIN_SIZE),
            restitution: 0.5,
            epsilon: 1e-3,
        }
    }
}

impl DomainBoundary {
    /// Boundary of the simulated square with restitution taken from `params`.
    pub fn from_params(params: &SphParams) -> Self {
        Self {
            restitution: params.boundary_restitution,
            epsilon: params.boundary_epsilon,
            ..default()
        }
    }

    /// Check if a point is inside the boundary.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Push a particle that crossed a wall back inside and reflect its velocity.
    ///
    /// Returns true when any wall was hit. The random inset keeps particles from
    /// resting exactly on a wall and colliding identically every step.
    pub fn apply_collision(
        &self,
        position: &mut Vec2,
        velocity: &mut Vec2,
        rng: &mut impl Rng,
    ) -> bool {
        let mut hit = false;

        // Y axis
        if position.y < self.min.y {
            position.y = self.min.y + self.epsilon * rng.random::<f32>();
            velocity.y *= -self.restitution;
            hit = true;
        }
        if position.y > self.max.y {
            position.y = self.max.y - self.epsilon * rng.random::<f32>();
            velocity.y *= -self.restitution;
            hit = true;
        }

        // X axis
        if position.x < self.min.x {
            position.x = self.min.x + self.epsilon * rng.random::<f32>();
            velocity.x *= -self.restitution;
            hit = true;
        }
        if position.x > self.max.x {
            position.x = self.max.x - self.epsilon * rng.random::<f32>();
            velocity.x *= -self.restitution;
            hit = true;
        }

        hit
    }
}
