//! Drop layout module
//!
//! A drop is the output of one build, laid out on disk as
//! `<output_root>/<billing_data_id>/<drop_id>/<data files>` with the
//! billing window's `manifest.json` next to the drop directories.

use crate::error::{Error, Result, ResultExt};
use crate::window::BillingDataId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Timestamp format for drop ids, e.g. `20230130225601UTC`
pub const DROP_ID_FORMAT: &str = "%Y%m%d%H%M%S%Z";

/// Identifier shared by every file written during one build
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DropId(String);

impl DropId {
    /// Drop id for the current instant
    pub fn generate() -> Self {
        Self::at(Utc::now())
    }

    /// Drop id for a given instant
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self(instant.format(DROP_ID_FORMAT).to_string())
    }

    /// Wrap an existing id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve (and create) the drop directory for the month containing `date`
///
/// Safe to call repeatedly; existing directories are left alone.
pub fn resolve_drop_path(date: NaiveDate, output_root: &Path, drop_id: &DropId) -> Result<PathBuf> {
    let bdid = BillingDataId::for_date(date)?;
    let drop_path = output_root.join(bdid.as_str()).join(drop_id.as_str());

    if !drop_path.exists() {
        debug!("Creating directory {}", drop_path.display());
    }
    std::fs::create_dir_all(&drop_path)
        .with_context(|| format!("Failed to create directory {}", drop_path.display()))?;

    Ok(drop_path)
}

/// Billing window directory holding a drop (where its manifest lives)
pub fn billing_dir(drop_path: &Path) -> Result<&Path> {
    drop_path
        .parent()
        .ok_or_else(|| Error::output(format!("Drop path {} has no parent", drop_path.display())))
}

/// Split a drop path into its `(billing_data_id, drop_id)` names
pub fn drop_path_parts(drop_path: &Path) -> Result<(String, String)> {
    let name = |p: &Path| {
        p.file_name()
            .and_then(|n| n.to_str())
            .map(ToString::to_string)
            .ok_or_else(|| Error::output(format!("Malformed drop path {}", drop_path.display())))
    };

    let drop_id = name(drop_path)?;
    let bdid = name(billing_dir(drop_path)?)?;
    Ok((bdid, drop_id))
}
