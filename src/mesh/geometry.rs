//! Element geometry, volumes and normals
//!
//! Per-element configuration tensors for the reference (rest) and deformed
//! (current) states, element/nodal volume accumulation, surface and
//! element normals, and the fixed anatomical growth mask.
//!
//! Batched loops run in parallel over elements; accumulation onto shared
//! nodal arrays happens in a serial pass afterwards in element order, so
//! floating-point results do not depend on the thread count.

use nalgebra::{Matrix3, Point3, Vector3};
use rayon::prelude::*;

use crate::error::{Result, SimError};
use crate::linalg::tensor::{cross3, det3, det_batch, mat_mul_batch};
use crate::mesh::topology::SurfaceNodeMap;

/// Anisotropic scale of the non-growing ellipsoid, x component.
///
/// Together with [`MASK_CENTER_X`], [`MASK_CENTER_Z`], [`MASK_RADIUS`] and
/// [`MASK_FALLOFF`] this encodes the anatomical reference frame of the
/// growth model. These are model constants, not tunable geometry.
const MASK_SCALE_X: f64 = 0.714;
const MASK_CENTER_X: f64 = -0.1;
const MASK_CENTER_Z: f64 = 0.05;
const MASK_RADIUS: f64 = 0.6;
const MASK_FALLOFF: f64 = 10.0;

/// Coefficients of the fitted longitudinal length of the real brain over
/// normalized gestational time.
const LENGTH_FIT: [f64; 3] = [-0.98153, 3.4214, 1.9936];

/// Edge matrix of one tetrahedron in column form: columns are the edge
/// vectors `v1-v0`, `v2-v0`, `v3-v0`.
#[inline]
fn edge_matrix(positions: &[Point3<f64>], tet: &[usize; 4]) -> Matrix3<f64> {
    let p0 = positions[tet[0]];
    Matrix3::from_columns(&[
        positions[tet[1]] - p0,
        positions[tet[2]] - p0,
        positions[tet[3]] - p0,
    ])
}

/// Reference configuration tensors `A0`, one per tetrahedron.
///
/// Computed once from the rest positions and immutable afterwards.
pub fn reference_config(rest: &[Point3<f64>], tets: &[[usize; 4]]) -> Vec<Matrix3<f64>> {
    tets.par_iter().map(|tet| edge_matrix(rest, tet)).collect()
}

/// Deformed configuration tensors `At`, one per tetrahedron.
///
/// Must be recomputed whenever the current positions change.
pub fn deformed_config(current: &[Point3<f64>], tets: &[[usize; 4]]) -> Vec<Matrix3<f64>> {
    tets.par_iter()
        .map(|tet| edge_matrix(current, tet))
        .collect()
}

/// Signed volume of each tetrahedron, `det(A)/6` of the column-form edge
/// matrix. Negative values flag inverted elements; they are propagated,
/// not rejected, so the outer loop can run its stability checks.
pub fn element_volumes(positions: &[Point3<f64>], tets: &[[usize; 4]]) -> Vec<f64> {
    tets.par_iter()
        .map(|tet| det3(&edge_matrix(positions, tet)) / 6.0)
        .collect()
}

/// Total mesh volume and per-node volumes for the given positions.
///
/// Each tetrahedron contributes a quarter of its signed volume to each of
/// its four vertices; the total is the sum of the nodal volumes.
///
/// # Returns
/// `(total_volume, nodal_volumes)`
pub fn mesh_volume(positions: &[Point3<f64>], tets: &[[usize; 4]], nn: usize) -> (f64, Vec<f64>) {
    let vol = element_volumes(positions, tets);

    let mut nodal = vec![0.0; nn];
    for (tet, v) in tets.iter().zip(vol.iter()) {
        let share = v / 4.0;
        for &node in tet {
            nodal[node] += share;
        }
    }

    let total = nodal.iter().sum();
    (total, nodal)
}

/// Reference and deformed nodal volumes under growth.
///
/// The reference volume of an element is measured in its grown
/// configuration `G·A0`; the deformed volume comes from the current edge
/// matrix. Both are distributed to the vertices by quarter shares.
///
/// # Arguments
/// * `growth` - Per-element growth tensors `G`
/// * `a0` - Reference configuration tensors
/// * `tets` - Tetrahedron connectivity
/// * `current` - Deformed node positions
/// * `nn` - Number of nodes
///
/// # Returns
/// `(rest_nodal, deformed_nodal)` volumes
pub fn nodal_volume(
    growth: &[Matrix3<f64>],
    a0: &[Matrix3<f64>],
    tets: &[[usize; 4]],
    current: &[Point3<f64>],
    nn: usize,
) -> (Vec<f64>, Vec<f64>) {
    let grown = mat_mul_batch(growth, a0);
    let vol0: Vec<f64> = det_batch(&grown).into_iter().map(|d| d / 6.0).collect();
    let vol = element_volumes(current, tets);

    let mut rest_nodal = vec![0.0; nn];
    let mut deformed_nodal = vec![0.0; nn];
    for (i, tet) in tets.iter().enumerate() {
        for &node in tet {
            rest_nodal[node] += vol0[i] / 4.0;
            deformed_nodal[node] += vol[i] / 4.0;
        }
    }

    (rest_nodal, deformed_nodal)
}

/// Unit normals at surface nodes from the rest geometry.
///
/// Each face's raw cross-product normal (implicitly area-weighted) is
/// accumulated onto its three vertices' surface slots, then every
/// accumulated normal is unit-normalized. A normal that accumulates to
/// exactly zero is reported as degenerate geometry.
pub fn surface_normals(
    rest: &[Point3<f64>],
    faces: &[[usize; 3]],
    map: &SurfaceNodeMap,
) -> Result<Vec<Vector3<f64>>> {
    let face_normals: Vec<Vector3<f64>> = faces
        .par_iter()
        .map(|face| {
            let a = rest[face[0]];
            cross3(&(rest[face[1]] - a), &(rest[face[2]] - a))
        })
        .collect();

    let mut normals = vec![Vector3::zeros(); map.count];
    for (face, n) in faces.iter().zip(face_normals.iter()) {
        for &node in face {
            normals[map.to_surface[node]] += *n;
        }
    }

    for (i, n) in normals.iter_mut().enumerate() {
        let len = n.norm();
        if len == 0.0 {
            return Err(SimError::DegenerateGeometry(format!(
                "zero accumulated normal at surface node {}",
                i
            )));
        }
        *n /= len;
    }

    Ok(normals)
}

/// Unit normal of each tetrahedron, taken as the normalized sum of its
/// four vertices' nearest-surface-node normals.
///
/// # Arguments
/// * `surface_normals` - Unit normals at surface nodes
/// * `nearest_surface` - Full-node index → surface index of the nearest
///   surface node
/// * `tets` - Tetrahedron connectivity
pub fn tetra_normals(
    surface_normals: &[Vector3<f64>],
    nearest_surface: &[usize],
    tets: &[[usize; 4]],
) -> Result<Vec<Vector3<f64>>> {
    let sums: Vec<Vector3<f64>> = tets
        .par_iter()
        .map(|tet| {
            surface_normals[nearest_surface[tet[0]]]
                + surface_normals[nearest_surface[tet[1]]]
                + surface_normals[nearest_surface[tet[2]]]
                + surface_normals[nearest_surface[tet[3]]]
        })
        .collect();

    sums.into_iter()
        .enumerate()
        .map(|(i, n)| {
            let len = n.norm();
            if len == 0.0 {
                return Err(SimError::DegenerateGeometry(format!(
                    "zero summed normal at element {}",
                    i
                )));
            }
            Ok(n / len)
        })
        .collect()
}

/// Per-node growth mask in `[0, 1]` marking the non-growing region.
///
/// Nodes inside the fixed anatomical ellipsoid (radius [`MASK_RADIUS`]
/// around the offset center, x squeezed by [`MASK_SCALE_X`]) are linearly
/// attenuated toward zero as they approach the center; nodes outside grow
/// fully.
pub fn mark_growth(rest: &[Point3<f64>]) -> Vec<f64> {
    rest.par_iter()
        .map(|p| {
            let q = Vector3::new(
                (p.x - MASK_CENTER_X) * MASK_SCALE_X,
                p.y,
                p.z - MASK_CENTER_Z,
            );
            let rqp = q.norm();
            if rqp < MASK_RADIUS {
                (1.0 - MASK_FALLOFF * (MASK_RADIUS - rqp)).max(0.0)
            } else {
                1.0
            }
        })
        .collect()
}

/// Longitudinal length of the real brain at normalized time `t`, from the
/// quadratic fit to measured data.
pub fn longit_length(t: f64) -> f64 {
    LENGTH_FIT[0] * t * t + LENGTH_FIT[1] * t + LENGTH_FIT[2]
}

/// Zoom factor mapping the model's current longitudinal extent to the
/// real length `l`.
///
/// # Arguments
/// * `current` - Deformed node positions
/// * `surface_to_full` - Surface index → full node index map
/// * `l` - Target longitudinal length, from [`longit_length`]
pub fn para_zoom(current: &[Point3<f64>], surface_to_full: &[usize], l: f64) -> f64 {
    let mut xmin = f64::INFINITY;
    let mut xmax = f64::NEG_INFINITY;

    for &node in surface_to_full {
        let x = current[node].x;
        xmin = xmin.min(x);
        xmax = xmax.max(x);
    }

    l / (xmax - xmin)
}

/// Mid-sagittal plane repulsion.
///
/// Surface nodes that started on one side of the plane `y = mid_y` and
/// have crossed to the other side receive a restoring force pushing them
/// back, preventing the two hemispheres from interpenetrating.
///
/// # Arguments
/// * `current` / `rest` - Deformed and rest node positions
/// * `forces` - Per-node force accumulator, mutated in place
/// * `surface_to_full` - Surface index → full node index map
/// * `mid_y` - Plane position
/// * `spacing` - Average mesh spacing
/// * `thickness` - Contact offset distance
/// * `stiffness` - Bulk modulus scale of the repulsion
#[allow(clippy::too_many_arguments)]
pub fn mid_plane(
    current: &[Point3<f64>],
    rest: &[Point3<f64>],
    forces: &mut [Vector3<f64>],
    surface_to_full: &[usize],
    mid_y: f64,
    spacing: f64,
    thickness: f64,
    stiffness: f64,
) {
    for &pt in surface_to_full {
        if rest[pt].y < mid_y - 0.5 * spacing && current[pt].y > mid_y {
            forces[pt].y -= (mid_y - current[pt].y) / thickness * spacing * spacing * stiffness;
        }
        if rest[pt].y > mid_y + 0.5 * spacing && current[pt].y < mid_y {
            forces[pt].y -= (mid_y - current[pt].y) / thickness * spacing * spacing * stiffness;
        }
    }
}
