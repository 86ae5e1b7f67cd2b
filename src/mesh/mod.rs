pub mod geometry;
pub mod io;
pub mod quality;
pub mod topology;

pub use io::import_mesh;
pub use quality::{assess_mesh_quality, MeshQuality};
pub use topology::{Mesh, SurfaceNodeMap};
