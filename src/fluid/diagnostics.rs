//! Per-step numerical diagnostics.
//!
//! The pipeline lets NaN/Inf and negative densities flow through unchanged;
//! these counters make those events visible without altering the result.

use bevy::prelude::*;

use super::particle::Particle;

/// Summary of the last simulation step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect)]
pub struct StepDiagnostics {
    /// Particles with a NaN or infinite component after the step.
    pub non_finite_particles: usize,
    /// Distinct neighbor pairs found at zero distance in the force stage.
    pub coincident_pairs: usize,
    /// Particles filed into an edge cell because they were outside the domain.
    pub clamped_insertions: usize,
    pub min_density: f32,
    pub max_density: f32,
    pub mean_density: f32,
    /// Mean of `|rho - rho0| / rho0`.
    pub average_density_error: f32,
}

impl StepDiagnostics {
    /// Density statistics and finiteness of a particle population.
    pub fn from_particles(particles: &[Particle], rest_density: f32) -> Self {
        if particles.is_empty() {
            return Self::default();
        }

        let mut min_density = f32::INFINITY;
        let mut max_density = f32::NEG_INFINITY;
        let mut sum = 0.0;
        let mut error_sum = 0.0;
        let mut non_finite_particles = 0;

        for p in particles {
            min_density = min_density.min(p.density);
            max_density = max_density.max(p.density);
            sum += p.density;
            error_sum += (p.density - rest_density).abs() / rest_density;
            if !p.is_finite() {
                non_finite_particles += 1;
            }
        }

        let n = particles.len() as f32;
        Self {
            non_finite_particles,
            min_density,
            max_density,
            mean_density: sum / n,
            average_density_error: error_sum / n,
            ..default()
        }
    }

    /// True when the step produced nothing worth warning about.
    pub fn is_healthy(&self) -> bool {
        self.non_finite_particles == 0 && self.coincident_pairs == 0 && self.clamped_insertions == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_statistics() {
        let particles: Vec<Particle> = [0.5, 1.0, 1.5]
            .into_iter()
            .map(|density| Particle {
                density,
                ..default()
            })
            .collect();

        let diagnostics = StepDiagnostics::from_particles(&particles, 1.0);

        assert_eq!(diagnostics.min_density, 0.5);
        assert_eq!(diagnostics.max_density, 1.5);
        assert!((diagnostics.mean_density - 1.0).abs() < 1e-6);
        assert!((diagnostics.average_density_error - 1.0 / 3.0).abs() < 1e-6);
        assert!(diagnostics.is_healthy());
    }

    #[test]
    fn test_counts_non_finite() {
        let particles = [
            Particle::new(Vec2::ZERO),
            Particle::new(Vec2::new(f32::NAN, 0.0)),
        ];

        let diagnostics = StepDiagnostics::from_particles(&particles, 1.0);
        assert_eq!(diagnostics.non_finite_particles, 1);
        assert!(!diagnostics.is_healthy());
    }

    #[test]
    fn test_empty_population() {
        assert_eq!(StepDiagnostics::from_particles(&[], 1.0), StepDiagnostics::default());
    }
}
