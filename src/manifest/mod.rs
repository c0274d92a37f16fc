//! Manifest publishing
//!
//! Each billing window directory carries a `manifest.json` naming the drop
//! that is current for that window. Publishing overwrites the previous
//! manifest; older drops stay on disk but are no longer referenced.

use crate::drop::{billing_dir, DropId};
use crate::error::{Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Manifest format version
pub const MANIFEST_VERSION: &str = "1.0.0";

/// Manifest file name inside a billing window directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Contents of `manifest.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub current_drop_id: DropId,
}

impl Manifest {
    /// Manifest pointing at `drop_id`
    pub fn new(drop_id: DropId) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            current_drop_id: drop_id,
        }
    }

    /// Read a manifest from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the manifest to `path`
    ///
    /// Writes a temp file first and renames it over the target.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_vec(self)?;

        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, &contents)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename {}", path.display()))?;

        Ok(())
    }
}

/// Write a manifest for every billing window touched by `drop_paths`
///
/// Returns the manifest paths written, one per distinct billing window.
pub fn publish_manifests<'a, I>(drop_paths: I, drop_id: &DropId) -> Result<Vec<PathBuf>>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    let billing_dirs: BTreeSet<&Path> = drop_paths
        .into_iter()
        .map(|p| billing_dir(p))
        .collect::<Result<_>>()?;

    let manifest = Manifest::new(drop_id.clone());
    let mut written = Vec::with_capacity(billing_dirs.len());

    for dir in billing_dirs {
        let path = dir.join(MANIFEST_FILE);
        manifest.save(&path)?;
        info!("Wrote manifest {} -> {}", path.display(), drop_id);
        written.push(path);
    }

    Ok(written)
}
