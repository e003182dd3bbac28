//! SPH smoothing kernels.
//!
//! All three kernels vanish at the smoothing radius `h`:
//!
//! - Poly6, for density: `W(r) = 315 / (64πh⁹) · (h² − r²)³`
//! - Spiky gradient, for pressure: `∇W(r) = −45 / (πh⁶) · (h − |r|)² · r / |r|`
//! - Viscosity Laplacian: `∇²W(r) = 45 / (πh⁶) · (h − |r|)`
//!
//! The coefficients keep their 3D normalization in this 2D model.

use std::f32::consts::PI;

use bevy::prelude::*;

/// Kernel functions for one smoothing radius, with precomputed coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphKernels {
    h: f32,
    h_sq: f32,
    poly6_coeff: f32,
    spiky_grad_coeff: f32,
    viscosity_laplacian_coeff: f32,
}

impl SphKernels {
    pub fn new(h: f32) -> Self {
        let h3 = h * h * h;
        let h6 = h3 * h3;
        let h9 = h6 * h3;

        Self {
            h,
            h_sq: h * h,
            poly6_coeff: 315.0 / (64.0 * PI * h9),
            spiky_grad_coeff: -45.0 / (PI * h6),
            viscosity_laplacian_coeff: 45.0 / (PI * h6),
        }
    }

    /// Smoothing radius the kernels were built for.
    #[inline]
    pub fn radius(&self) -> f32 {
        self.h
    }

    /// Poly6 kernel for density estimation.
    ///
    /// Only defined for `r <= h`; callers filter neighbors by distance first.
    #[inline]
    pub fn density(&self, r: f32) -> f32 {
        debug_assert!(
            r <= self.h,
            "poly6 evaluated outside its support: r = {r}, h = {}",
            self.h
        );
        let diff = self.h_sq - r * r;
        self.poly6_coeff * diff * diff * diff
    }

    /// Gradient of the spiky kernel, `r_ij = p_i - p_j`.
    ///
    /// Singular at `r_ij = 0`: coincident particles yield NaN.
    #[inline]
    pub fn pressure_gradient(&self, r_ij: Vec2) -> Vec2 {
        let r = r_ij.length();
        let diff = self.h - r;
        self.spiky_grad_coeff * diff * diff * r_ij / r
    }

    /// Laplacian of the viscosity kernel.
    #[inline]
    pub fn viscosity_laplacian(&self, r: f32) -> f32 {
        self.viscosity_laplacian_coeff * (self.h - r)
    }
}
