pub mod config;
pub mod contact;
pub mod error;
pub mod growth;
pub mod linalg;
pub mod mesh;

pub use config::SimulationConfig;
pub use contact::closest_point_triangle;
pub use error::{Result, SimError};
pub use growth::{
    compute_element_growth, cortex_thickness, dist2surf, growth_rate, shear_modulus,
    ElementGrowth, GrowthModel, GrowthParams,
};
pub use linalg::{eigen_decomposition, eigenvalues_sym3};
pub use mesh::{assess_mesh_quality, import_mesh, Mesh, MeshQuality, SurfaceNodeMap};
