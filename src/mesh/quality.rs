//! Mesh health assessment
//!
//! Signed element volumes double as the stability signal of the
//! simulation: a negative volume means an inverted tetrahedron, a tiny
//! positive one an element about to collapse. This module summarizes them
//! so the outer loop can decide whether to shrink the step or abort.

use rayon::prelude::*;

use nalgebra::Point3;

use crate::mesh::geometry::element_volumes;

/// Volume statistics over all elements of a mesh state.
#[derive(Debug, Clone)]
pub struct MeshQuality {
    /// Smallest signed element volume
    pub min_volume: f64,
    /// Mean signed element volume
    pub avg_volume: f64,
    /// Largest signed element volume
    pub max_volume: f64,
    /// Elements with negative volume (inverted)
    pub num_inverted: usize,
    /// Total element count
    pub total_elements: usize,
}

impl MeshQuality {
    /// True when no element has inverted.
    pub fn is_acceptable(&self) -> bool {
        self.num_inverted == 0 && self.min_volume > 0.0
    }

    /// Human-readable quality report
    pub fn report(&self) -> String {
        format!(
            "Mesh quality: min_vol={:.3e}, avg_vol={:.3e}, inverted={}/{}",
            self.min_volume, self.avg_volume, self.num_inverted, self.total_elements
        )
    }
}

/// Assess element volumes for the given positions.
pub fn assess_mesh_quality(positions: &[Point3<f64>], tets: &[[usize; 4]]) -> MeshQuality {
    let volumes = element_volumes(positions, tets);
    let total_elements = volumes.len();

    let num_inverted = volumes.par_iter().filter(|&&v| v < 0.0).count();
    let mut min_volume = f64::INFINITY;
    let mut max_volume = f64::NEG_INFINITY;
    let mut sum = 0.0;

    for &v in &volumes {
        min_volume = min_volume.min(v);
        max_volume = max_volume.max(v);
        sum += v;
    }

    let quality = MeshQuality {
        min_volume,
        avg_volume: sum / total_elements as f64,
        max_volume,
        num_inverted,
        total_elements,
    };

    if quality.num_inverted > 0 {
        log::warn!("{}", quality.report());
    }

    quality
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_flags_inverted_elements() {
        let nodes = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        // One well-oriented element, one inverted copy.
        let tets = vec![[0, 1, 2, 3], [0, 2, 1, 3]];
        let q = assess_mesh_quality(&nodes, &tets);

        assert_eq!(q.total_elements, 2);
        assert_eq!(q.num_inverted, 1);
        assert!(!q.is_acceptable());
        assert!(q.min_volume < 0.0 && q.max_volume > 0.0);
    }

    #[test]
    fn test_quality_acceptable_mesh() {
        let nodes = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let q = assess_mesh_quality(&nodes, &[[0, 1, 2, 3]]);
        assert!(q.is_acceptable());
    }
}
