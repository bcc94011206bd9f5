//! Registry and dataset files

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::types::{Dataset, ProjectRegistry};

/// Writes `value` as JSON indented by four spaces, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> crate::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            crate::HarvestError::FileWrite(format!("{}: {}", parent.display(), e))
        })?;
    }

    let mut content = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut content, formatter);
    value.serialize(&mut serializer)?;

    std::fs::write(path, content)
        .map_err(|e| crate::HarvestError::FileWrite(format!("{}: {}", path.display(), e)))?;

    info!("Saved {}", path.display());
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> crate::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| crate::HarvestError::FileRead(format!("{}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&content)?)
}

pub fn load_registry(path: &Path) -> crate::Result<ProjectRegistry> {
    read_json(path)
}

pub fn save_registry(path: &Path, registry: &ProjectRegistry) -> crate::Result<()> {
    write_json(path, registry)
}

pub fn save_dataset(path: &Path, dataset: &Dataset) -> crate::Result<()> {
    write_json(path, dataset)
}
