pub mod distance;
pub mod model;

pub use distance::dist2surf;
pub use model::{
    compute_element_growth, cortex_thickness, growth_rate, shear_modulus, ElementGrowth,
    GrowthModel, GrowthParams,
};
