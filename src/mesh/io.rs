//! Mesh file import
//!
//! The mesh arrives as a plain text file of whitespace-separated numeric
//! rows (Netgen neutral layout): a node count, the coordinate rows, an
//! element count, the tetrahedron rows, a face count, the surface triangle
//! rows. This module only tokenizes; the layout itself is interpreted by
//! [`crate::mesh::topology`].

use std::fs;
use std::path::Path;

use crate::error::{Result, SimError};

/// Read a mesh file into a list of numeric records.
///
/// Each non-empty line becomes one record of parsed floats. Index columns
/// are parsed as floats too and converted when the topology is derived,
/// matching the uniform numeric treatment of the file.
///
/// # Arguments
/// * `path` - Path to the mesh text file
///
/// # Returns
/// One `Vec<f64>` per non-empty line, or [`SimError::Format`] on I/O or
/// parse failure.
pub fn import_mesh<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f64>>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|e| SimError::Format(format!("failed to read mesh file {}: {}", path.display(), e)))?;

    let records = parse_records(&contents)?;

    log::info!("Loaded {} mesh records from {}", records.len(), path.display());

    Ok(records)
}

/// Tokenize mesh text into numeric records, skipping empty lines.
pub fn parse_records(contents: &str) -> Result<Vec<Vec<f64>>> {
    let mut records = Vec::new();

    for (line_no, line) in contents.lines().enumerate() {
        let mut row = Vec::new();
        for token in line.split_whitespace() {
            let value = token.parse::<f64>().map_err(|_| {
                SimError::Format(format!(
                    "non-numeric token '{}' on line {}",
                    token,
                    line_no + 1
                ))
            })?;
            row.push(value);
        }
        if !row.is_empty() {
            records.push(row);
        }
    }

    Ok(records)
}
