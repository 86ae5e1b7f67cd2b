//! Cortical growth model
//!
//! Growth-tensor construction per element from elapsed time, the local
//! distance-to-surface field and the gray/white matter blend. The four
//! tensor variants model different growth hypotheses; a configuration
//! picks one per run. Scalar variants are expressed as multiples of the
//! identity so one `Matrix3` per element flows through the volume and
//! force kernels regardless of variant.

use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Logistic slope of the gray/white transition across the cortical
/// boundary. The smooth blend (instead of a hard cutoff at `d2s == H`) is
/// required for numerical stability of the outer solver.
const BLEND_SLOPE: f64 = 10.0;

/// Cortical thickening rate per unit of normalized time.
const THICKNESS_GROWTH_RATE: f64 = 0.01;

/// Growth-tensor variant, selected once per simulation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthModel {
    /// Isotropic `1 + rate·t` everywhere
    Homogeneous,
    /// Isotropic `rate` with no time dependence
    HomogeneousDirect,
    /// Isotropic `1 + rate·t·gm`, modulated by the gray-matter fraction
    RelativeHomogeneous,
    /// `I + (I - N⊗N)·gm·at`: growth confined to the plane tangent to the
    /// local surface normal
    Tangential,
}

/// Accumulated relative growth at time `t`.
pub fn growth_rate(relative_rate: f64, t: f64) -> f64 {
    relative_rate * t
}

/// Thickness of the growing cortical layer at time `t`.
pub fn cortex_thickness(base_thickness: f64, t: f64) -> f64 {
    base_thickness + THICKNESS_GROWTH_RATE * t
}

/// Gray-matter fraction and blended shear modulus for one tetrahedron.
///
/// The gray fraction is a logistic in the tet-averaged distance to the
/// surface relative to the cortical thickness, weighted by the tet-averaged
/// growth mask; the shear modulus interpolates between white and gray
/// matter accordingly.
///
/// # Arguments
/// * `d2s` - Per-node distances to the surface
/// * `thickness` - Current cortical thickness `H`
/// * `tet` - The element's four node indices
/// * `mu_white` / `mu_gray` - Matter shear moduli
/// * `mask` - Per-node growth mask
///
/// # Returns
/// `(gm, mu)`: gray fraction in `[0, 1]` and blended shear modulus
pub fn shear_modulus(
    d2s: &[f64],
    thickness: f64,
    tet: &[usize; 4],
    mu_white: f64,
    mu_gray: f64,
    mask: &[f64],
) -> (f64, f64) {
    let d_avg = 0.25 * (d2s[tet[0]] + d2s[tet[1]] + d2s[tet[2]] + d2s[tet[3]]);
    let mask_avg = 0.25 * (mask[tet[0]] + mask[tet[1]] + mask[tet[2]] + mask[tet[3]]);

    let gm = 1.0 / (1.0 + (BLEND_SLOPE * (d_avg / thickness - 1.0)).exp()) * mask_avg;
    let wm = 1.0 - gm;
    let mu = mu_white * wm + mu_gray * gm;

    (gm, mu)
}

/// Homogeneous growth tensor `(1 + rate·t)·I`.
pub fn growth_tensor_homogeneous(relative_rate: f64, t: f64) -> Matrix3<f64> {
    Matrix3::identity() * (1.0 + relative_rate * t)
}

/// Direct homogeneous growth tensor `rate·I`.
pub fn growth_tensor_homogeneous_direct(relative_rate: f64) -> Matrix3<f64> {
    Matrix3::identity() * relative_rate
}

/// Cortical-layer homogeneous growth tensor `(1 + rate·t·gm)·I`.
pub fn growth_tensor_relative(gm: f64, relative_rate: f64, t: f64) -> Matrix3<f64> {
    Matrix3::identity() * (1.0 + relative_rate * t * gm)
}

/// Tangential growth tensor `I + (I - N⊗N)·gm·at`.
///
/// `I - N⊗N` projects onto the plane orthogonal to the local element
/// normal, so tissue expands parallel to the cortical surface while the
/// radial direction keeps unit stretch.
pub fn growth_tensor_tangential(normal: &Vector3<f64>, gm: f64, at: f64) -> Matrix3<f64> {
    let projector = Matrix3::identity() - normal * normal.transpose();
    Matrix3::identity() + projector * gm * at
}

/// Per-element growth state for one step.
#[derive(Debug, Clone, Copy)]
pub struct ElementGrowth {
    /// Gray-matter fraction
    pub gm: f64,
    /// Blended shear modulus
    pub mu: f64,
    /// Growth tensor
    pub tensor: Matrix3<f64>,
}

/// Material parameters consumed by the per-step growth update.
#[derive(Debug, Clone, Copy)]
pub struct GrowthParams {
    pub relative_rate: f64,
    pub base_thickness: f64,
    pub mu_white: f64,
    pub mu_gray: f64,
    pub model: GrowthModel,
}

/// Compute the growth state of every element at time `t` (parallelized).
///
/// This is the once-per-step entry point: it evaluates the cortical
/// thickness and accumulated growth once, then maps over elements to
/// produce the gray fraction, blended modulus and growth tensor each.
///
/// # Arguments
/// * `params` - Growth and material parameters
/// * `tets` - Tetrahedron connectivity
/// * `d2s` - Per-node distance-to-surface field
/// * `mask` - Per-node growth mask
/// * `element_normals` - Per-element surface normals (used by the
///   tangential variant)
/// * `t` - Elapsed normalized time
pub fn compute_element_growth(
    params: &GrowthParams,
    tets: &[[usize; 4]],
    d2s: &[f64],
    mask: &[f64],
    element_normals: &[Vector3<f64>],
    t: f64,
) -> Vec<ElementGrowth> {
    let thickness = cortex_thickness(params.base_thickness, t);
    let at = growth_rate(params.relative_rate, t);

    tets.par_iter()
        .enumerate()
        .map(|(i, tet)| {
            let (gm, mu) = shear_modulus(
                d2s,
                thickness,
                tet,
                params.mu_white,
                params.mu_gray,
                mask,
            );

            let tensor = match params.model {
                GrowthModel::Homogeneous => growth_tensor_homogeneous(params.relative_rate, t),
                GrowthModel::HomogeneousDirect => {
                    growth_tensor_homogeneous_direct(params.relative_rate)
                }
                GrowthModel::RelativeHomogeneous => {
                    growth_tensor_relative(gm, params.relative_rate, t)
                }
                GrowthModel::Tangential => {
                    growth_tensor_tangential(&element_normals[i], gm, at)
                }
            };

            ElementGrowth { gm, mu, tensor }
        })
        .collect()
}
