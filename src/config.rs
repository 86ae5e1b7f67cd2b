//! Configuration management for cortical-folding simulations
//!
//! Reads TOML configuration files and provides structured parameters for
//! the mesh, the growth model, the tissue material blend and the contact
//! handling of a simulation run.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::growth::GrowthModel;

/// Main simulation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub mesh: MeshConfig,
    pub growth: GrowthConfig,
    pub material: MaterialConfig,
    pub contact: ContactConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MeshConfig {
    /// Path to the mesh file (Netgen neutral text layout)
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GrowthConfig {
    /// Relative tangential growth rate per unit time
    pub relative_rate: f64,
    /// Cortical layer thickness at t = 0
    pub cortex_thickness: f64,
    /// Growth-tensor variant
    pub model: GrowthModel,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MaterialConfig {
    /// Gray matter shear modulus
    pub mu_gray: f64,
    /// White matter shear modulus
    pub mu_white: f64,
    /// Bulk modulus
    pub bulk_modulus: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContactConfig {
    /// Average mesh spacing, sets the contact search radius
    pub mesh_spacing: f64,
    /// Repulsion offset distance
    pub thickness: f64,
    /// Mid-sagittal plane position on the y axis
    #[serde(default)]
    pub midplane_y: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub output_dir: String,
    /// Steps between exports
    #[serde(default = "default_output_interval")]
    pub interval: usize,
}

fn default_output_interval() -> usize {
    100
}

impl SimulationConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: SimulationConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        Ok(config)
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("═══════════════════════════════════════════════════════════════");
        println!("  Simulation Configuration");
        println!("═══════════════════════════════════════════════════════════════");
        println!("Mesh: {}", self.mesh.path);
        println!("\nGrowth:");
        println!("  Model: {:?}", self.growth.model);
        println!("  Relative rate: {:.4}", self.growth.relative_rate);
        println!("  Cortex thickness: {:.4}", self.growth.cortex_thickness);
        println!("\nMaterial:");
        println!("  μ gray: {:.3}, μ white: {:.3}", self.material.mu_gray, self.material.mu_white);
        println!("  Bulk modulus: {:.3}", self.material.bulk_modulus);
        println!("\nContact:");
        println!("  Spacing: {:.4}, thickness: {:.4}, midplane y: {:.4}",
            self.contact.mesh_spacing, self.contact.thickness, self.contact.midplane_y);
        println!("═══════════════════════════════════════════════════════════════\n");
    }
}
