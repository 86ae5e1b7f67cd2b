use thiserror::Error;

/// Errors surfaced by the mesh loading and numeric kernels.
///
/// Invalid geometric configurations that the outer loop monitors for
/// stability (inverted tetrahedra, non-unit normals) are signaled through
/// the sign or magnitude of returned values, not through this enum.
#[derive(Debug, Error)]
pub enum SimError {
    /// Malformed or truncated mesh records. Fatal, aborts the load.
    #[error("mesh format error: {0}")]
    Format(String),

    /// Geometry that cannot produce a meaningful result, e.g. a surface
    /// node whose accumulated normal is exactly zero. Reported, never
    /// auto-corrected; the caller decides whether to abort or continue.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The QL iteration failed to drive a sub-diagonal entry below
    /// tolerance within the sweep cap.
    #[error("eigensolver did not converge for eigenvalue {index} after {sweeps} QL sweeps")]
    Convergence { index: usize, sweeps: usize },
}

pub type Result<T> = std::result::Result<T, SimError>;
