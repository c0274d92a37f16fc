//! Pipeline module
//!
//! Orchestrates one run: download reports for the window, build the drop,
//! publish manifests and optionally upload the result.

mod event;

pub use event::{handle_event, InvocationEvent, PARAM_TENANCY_NAMES, PARAMETER_PATH_ENV};

use crate::directory::{AccountNameResolver, DirectoryLookup};
use crate::error::{Error, Result};
use crate::sink::{upload_drops, DropSink};
use crate::source::{fetch_reports, ReportSource};
use crate::transform::{build_drop, DropSummary};
use crate::window::EvaluationWindow;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the staging directory created inside the temp dir
pub const STAGING_DIR_NAME: &str = "oci_cost_files";

/// Name of the drop directory created inside the temp dir by the event entry point
pub const DROP_DIR_NAME: &str = "anycost_drop";

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    /// Reports downloaded into staging
    pub downloaded: usize,
    /// The drop that was built
    pub drop: DropSummary,
    /// Files uploaded to the sink (0 without a sink)
    pub uploaded: usize,
}

/// Collaborators a run needs
pub struct Pipeline<'a> {
    source: &'a dyn ReportSource,
    directory: &'a dyn DirectoryLookup,
    sink: Option<&'a dyn DropSink>,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline without upload
    pub fn new(source: &'a dyn ReportSource, directory: &'a dyn DirectoryLookup) -> Self {
        Self {
            source,
            directory,
            sink: None,
        }
    }

    /// Upload finished drops to `sink`
    #[must_use]
    pub fn with_sink(mut self, sink: &'a dyn DropSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run the whole pipeline for one window
    pub async fn run(
        &self,
        window: &EvaluationWindow,
        staging_dir: &Path,
        output_dir: &Path,
    ) -> Result<RunReport> {
        let downloaded = fetch_reports(window, self.source, staging_dir).await?;

        let mut resolver = AccountNameResolver::new(self.directory);
        let drop = build_drop(window, staging_dir, output_dir, &mut resolver).await?;
        info!(
            "Created drops in: {:?} ({} tenancy lookups)",
            drop.drop_paths,
            resolver.lookups()
        );

        let uploaded = match self.sink {
            Some(sink) => upload_drops(&drop, sink).await?,
            None => 0,
        };

        Ok(RunReport {
            window_start: window.start_date(),
            window_end: window.end_date(),
            downloaded: downloaded.len(),
            drop,
            uploaded,
        })
    }
}

/// Create the drop output directory, refusing one that already has content
pub fn prepare_output_dir(path: &Path) -> Result<()> {
    if path.exists() {
        let mut entries = std::fs::read_dir(path)?;
        if entries.next().is_some() {
            return Err(Error::OutputDirNotEmpty {
                path: path.display().to_string(),
            });
        }
    }
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Create (or reuse) the staging directory for downloads under `temp_dir`
pub fn prepare_staging_dir(temp_dir: &Path) -> Result<PathBuf> {
    let staging = temp_dir.join(STAGING_DIR_NAME);
    std::fs::create_dir_all(&staging)?;
    Ok(staging)
}

#[cfg(test)]
mod tests;
