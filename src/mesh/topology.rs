//! Mesh topology derivation
//!
//! Turns the raw numeric records of a mesh file into typed topology: node
//! coordinates, tetrahedron connectivity, surface triangles, and the
//! bidirectional surface-node index map. The record layout is the Netgen
//! neutral convention: `[nn]`, nn coordinate rows, `[ne]`, ne tetrahedron
//! rows (1-based, extra leading column ignored), `[nf]`, nf face rows.

use nalgebra::Point3;

use crate::error::{Result, SimError};

/// Bidirectional index translation between the full node set and the
/// subset of nodes lying on the mesh boundary.
#[derive(Debug, Clone)]
pub struct SurfaceNodeMap {
    /// Number of surface nodes
    pub count: usize,
    /// Surface index → full node index
    pub to_full: Vec<usize>,
    /// Full node index → surface index; only meaningful for surface nodes
    pub to_surface: Vec<usize>,
}

impl SurfaceNodeMap {
    pub fn is_surface_node(&self, node: usize) -> bool {
        self.to_surface[node] < self.count && self.to_full[self.to_surface[node]] == node
    }
}

/// Read the node block: count, then one `(y, x, z)`-ordered coordinate row
/// per node, reinterpreted as `(x, y, z)`.
///
/// The first two coordinate columns are swapped on load; the upstream mesh
/// generator emits them in `(y, x, z)` order.
///
/// # Returns
/// `(rest_positions, positions, nn)` where the deformed positions start as
/// a copy of the rest positions.
pub fn vertices(records: &[Vec<f64>]) -> Result<(Vec<Point3<f64>>, Vec<Point3<f64>>, usize)> {
    let nn = record_count(records, 0, "node")?;
    if records.len() < nn + 1 {
        return Err(SimError::Format(format!(
            "expected {} coordinate rows, found {}",
            nn,
            records.len().saturating_sub(1)
        )));
    }

    let mut rest = Vec::with_capacity(nn);
    for i in 0..nn {
        let row = &records[i + 1];
        if row.len() < 3 {
            return Err(SimError::Format(format!(
                "coordinate row {} has {} columns, expected 3",
                i,
                row.len()
            )));
        }
        rest.push(Point3::new(row[1], row[0], row[2]));
    }

    let current = rest.clone();
    Ok((rest, current, nn))
}

/// Read the tetrahedron block at offset `nn + 1`.
///
/// Indices are 1-based in the file and the vertex order is permuted
/// `(1,2,3,4) -> (1,2,4,3)` so every element follows the right-handed
/// orientation convention (positive edge-matrix determinant for
/// well-formed elements).
///
/// # Returns
/// `(tets, ne)` with zero-based, bounds-checked node indices.
pub fn tetra_indices(records: &[Vec<f64>], nn: usize) -> Result<(Vec<[usize; 4]>, usize)> {
    let ne = record_count(records, nn + 1, "element")?;
    if records.len() < nn + ne + 2 {
        return Err(SimError::Format(format!(
            "expected {} tetrahedron rows, found {}",
            ne,
            records.len().saturating_sub(nn + 2)
        )));
    }

    let mut tets = Vec::with_capacity(ne);
    for i in 0..ne {
        let row = &records[i + nn + 2];
        if row.len() < 5 {
            return Err(SimError::Format(format!(
                "tetrahedron row {} has {} columns, expected 5",
                i,
                row.len()
            )));
        }
        // Columns: [domain, v1, v2, v3, v4]; handedness switch on the
        // last two vertices.
        let tet = [
            node_index(row[1], nn, i)?,
            node_index(row[2], nn, i)?,
            node_index(row[4], nn, i)?,
            node_index(row[3], nn, i)?,
        ];
        tets.push(tet);
    }

    Ok((tets, ne))
}

/// Read the surface triangle block at offset `nn + ne + 2`.
///
/// # Returns
/// `(faces, nf)` with zero-based, bounds-checked node indices.
pub fn triangle_indices(
    records: &[Vec<f64>],
    nn: usize,
    ne: usize,
) -> Result<(Vec<[usize; 3]>, usize)> {
    let nf = record_count(records, nn + ne + 2, "face")?;
    if records.len() < nn + ne + nf + 3 {
        return Err(SimError::Format(format!(
            "expected {} face rows, found {}",
            nf,
            records.len().saturating_sub(nn + ne + 3)
        )));
    }

    let mut faces = Vec::with_capacity(nf);
    for i in 0..nf {
        let row = &records[i + nn + ne + 3];
        if row.len() < 4 {
            return Err(SimError::Format(format!(
                "face row {} has {} columns, expected 4",
                i,
                row.len()
            )));
        }
        let face = [
            node_index(row[1], nn, i)?,
            node_index(row[2], nn, i)?,
            node_index(row[3], nn, i)?,
        ];
        faces.push(face);
    }

    Ok((faces, nf))
}

/// Build the surface-node index map.
///
/// A single pass marks every node referenced by any face, then surface
/// indices are assigned densely in ascending full-node order, so
/// `to_full[to_surface[i]] == i` for every surface node `i`.
pub fn surface_node_map(faces: &[[usize; 3]], nn: usize) -> SurfaceNodeMap {
    let mut on_surface = vec![false; nn];
    for face in faces {
        for &node in face {
            on_surface[node] = true;
        }
    }

    let count = on_surface.iter().filter(|&&s| s).count();
    let mut to_full = Vec::with_capacity(count);
    let mut to_surface = vec![0; nn];

    for (node, &s) in on_surface.iter().enumerate() {
        if s {
            to_surface[node] = to_full.len();
            to_full.push(node);
        }
    }

    SurfaceNodeMap {
        count,
        to_full,
        to_surface,
    }
}

/// Complete tetrahedral mesh: geometry, connectivity and surface map.
///
/// All arrays are owned here and handed to the kernels by reference; the
/// kernels never retain state between calls. `positions` is the only field
/// the outer integrator mutates.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Undeformed node coordinates, immutable after load
    pub rest_positions: Vec<Point3<f64>>,
    /// Deformed node coordinates, advanced by the outer integrator
    pub positions: Vec<Point3<f64>>,
    /// Tetrahedron connectivity, right-handed vertex order
    pub tets: Vec<[usize; 4]>,
    /// Boundary triangles
    pub faces: Vec<[usize; 3]>,
    /// Surface-node index map
    pub surface: SurfaceNodeMap,
}

impl Mesh {
    /// Derive the full topology from raw mesh records.
    pub fn from_records(records: &[Vec<f64>]) -> Result<Self> {
        let (rest_positions, positions, nn) = vertices(records)?;
        let (tets, ne) = tetra_indices(records, nn)?;
        let (faces, nf) = triangle_indices(records, nn, ne)?;
        let surface = surface_node_map(&faces, nn);

        log::info!(
            "Mesh: {} nodes, {} tetrahedra, {} surface faces, {} surface nodes",
            nn,
            ne,
            nf,
            surface.count
        );

        Ok(Self {
            rest_positions,
            positions,
            tets,
            faces,
            surface,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.rest_positions.len()
    }

    pub fn num_elements(&self) -> usize {
        self.tets.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }
}

fn record_count(records: &[Vec<f64>], offset: usize, what: &str) -> Result<usize> {
    let row = records.get(offset).ok_or_else(|| {
        SimError::Format(format!("missing {} count record at row {}", what, offset))
    })?;
    let value = *row.first().ok_or_else(|| {
        SimError::Format(format!("empty {} count record at row {}", what, offset))
    })?;
    if value < 0.0 {
        return Err(SimError::Format(format!(
            "negative {} count at row {}",
            what, offset
        )));
    }
    Ok(value as usize)
}

fn node_index(value: f64, nn: usize, row: usize) -> Result<usize> {
    let one_based = value as i64;
    if one_based < 1 || one_based as usize > nn {
        return Err(SimError::Format(format!(
            "node index {} out of range 1..={} in connectivity row {}",
            one_based, nn, row
        )));
    }
    Ok(one_based as usize - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Single unit tetrahedron in the file's (y, x, z) coordinate order.
    fn unit_tet_records() -> Vec<Vec<f64>> {
        vec![
            vec![4.0],
            vec![0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![1.0],
            vec![1.0, 1.0, 2.0, 4.0, 3.0],
            vec![4.0],
            vec![1.0, 1.0, 3.0, 2.0],
            vec![1.0, 1.0, 2.0, 4.0],
            vec![1.0, 2.0, 3.0, 4.0],
            vec![1.0, 1.0, 4.0, 3.0],
        ]
    }

    #[test]
    fn test_vertices_swaps_xy() {
        let records = unit_tet_records();
        let (rest, current, nn) = vertices(&records).unwrap();
        assert_eq!(nn, 4);
        assert_eq!(rest.len(), 4);
        // Row (0, 1, 0) in file order is the point (1, 0, 0).
        assert_relative_eq!(rest[1].x, 1.0, epsilon = 1e-15);
        assert_relative_eq!(rest[1].y, 0.0, epsilon = 1e-15);
        assert_eq!(rest, current);
    }

    #[test]
    fn test_vertices_short_records() {
        let records = vec![vec![4.0], vec![0.0, 0.0, 0.0]];
        let err = vertices(&records).unwrap_err();
        assert!(matches!(err, SimError::Format(_)));
    }

    #[test]
    fn test_tetra_indices_handedness_permutation() {
        let records = unit_tet_records();
        let (_, _, nn) = vertices(&records).unwrap();
        let (tets, ne) = tetra_indices(&records, nn).unwrap();
        assert_eq!(ne, 1);
        // File row (1, 2, 4, 3) reads columns 1,2,4,3 -> vertices 1,2,3,4
        // -> zero-based (0, 1, 2, 3).
        assert_eq!(tets[0], [0, 1, 2, 3]);
    }

    #[test]
    fn test_tetra_indices_out_of_range() {
        let mut records = unit_tet_records();
        records[6] = vec![1.0, 1.0, 2.0, 9.0, 3.0];
        let err = tetra_indices(&records, 4).unwrap_err();
        assert!(matches!(err, SimError::Format(_)));
    }

    #[test]
    fn test_surface_node_map_bijective() {
        let faces = vec![[0, 2, 4], [2, 4, 5]];
        let map = surface_node_map(&faces, 6);

        assert_eq!(map.count, 4);
        assert_eq!(map.to_full, vec![0, 2, 4, 5]);
        for (si, &node) in map.to_full.iter().enumerate() {
            assert_eq!(map.to_surface[node], si);
        }
        assert!(map.is_surface_node(2));
        assert!(!map.is_surface_node(1));
    }

    #[test]
    fn test_mesh_from_records() {
        let records = unit_tet_records();
        let mesh = Mesh::from_records(&records).unwrap();
        assert_eq!(mesh.num_nodes(), 4);
        assert_eq!(mesh.num_elements(), 1);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.surface.count, 4);
    }
}
