//! Distance-to-surface field
//!
//! Every node is assigned its nearest surface node and the distance to it.
//! The field drives the gray/white matter blend, and since the material
//! distribution is fixed in the reference geometry it is computed once per
//! mesh, not per step.

use nalgebra::Point3;
use rayon::prelude::*;

/// Brute-force nearest surface node for every mesh node.
///
/// O(nn·nsn) over the rest geometry; the minimizer is found on squared
/// distances and the Euclidean distance is returned. Nodes are independent
/// so the search parallelizes over them.
///
/// # Arguments
/// * `rest` - Undeformed node positions
/// * `surface_to_full` - Surface index → full node index map
///
/// # Returns
/// `(nearest_surface, distances)`: per node, the surface index of its
/// nearest surface node and the distance to it.
pub fn dist2surf(rest: &[Point3<f64>], surface_to_full: &[usize]) -> (Vec<usize>, Vec<f64>) {
    let results: Vec<(usize, f64)> = rest
        .par_iter()
        .map(|p| {
            let mut d2min = f64::INFINITY;
            let mut nearest = 0;
            for (si, &node) in surface_to_full.iter().enumerate() {
                let diff = rest[node] - p;
                let d2 = diff.dot(&diff);
                if d2 < d2min {
                    d2min = d2;
                    nearest = si;
                }
            }
            (nearest, d2min.sqrt())
        })
        .collect();

    let mut nearest_surface = Vec::with_capacity(rest.len());
    let mut distances = Vec::with_capacity(rest.len());
    for (si, d) in results {
        nearest_surface.push(si);
        distances.push(d);
    }

    (nearest_surface, distances)
}
