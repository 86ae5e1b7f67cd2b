pub mod eigen;
pub mod tensor;

pub use eigen::{eigen_decomposition, eigenvalues_sym3};
