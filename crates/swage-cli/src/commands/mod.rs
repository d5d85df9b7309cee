//! Command implementations.

pub mod co2;
pub mod estimate;
pub mod supplier;

use std::path::Path;

use swage::SupplierProfile;

/// Load a supplier profile from a JSON file.
pub fn load_supplier(path: &Path) -> Result<SupplierProfile, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
