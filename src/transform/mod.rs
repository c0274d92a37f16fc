//! CBF transform module
//!
//! Turns raw OCI cost reports into CBF files inside a drop.
//!
//! # Overview
//!
//! For every report the transformer:
//! 1. decompresses and parses the CSV
//! 2. maps the fixed columns and the `tags/*` columns onto the CBF header
//! 3. adds the `resource/tag:oci_tenancy_name` column via the name resolver
//! 4. keeps rows whose usage start date falls inside the evaluation window
//! 5. writes one file per billing window the surviving rows belong to
//!
//! `build_drop` runs this over a staging directory and publishes manifests.

mod columns;
mod timestamp;
mod writer;

pub use columns::{
    classify, sanitize_tag_key, CbfColumn, ColumnClass, ColumnPlan, SourceColumn, TagColumn,
    CBF_TAG_PREFIX, LINE_ITEM_TYPE, SOURCE_TAG_PREFIX, TENANCY_NAME_TAG,
};
pub use timestamp::{format_usage_timestamp, parse_usage_timestamp};
pub use writer::write_cbf_file;

use crate::directory::AccountNameResolver;
use crate::drop::{resolve_drop_path, DropId};
use crate::error::{Error, Result};
use crate::manifest::publish_manifests;
use crate::window::{first_of_month, EvaluationWindow};
use chrono::NaiveDate;
use flate2::read::GzDecoder;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Suffix of staged raw reports
pub const RAW_REPORT_SUFFIX: &str = ".csv.gz";

/// Result of transforming one report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOutcome {
    /// Drop directories written to
    pub drop_paths: BTreeSet<PathBuf>,
    /// Data rows read from the report
    pub rows_read: usize,
    /// Rows written after the window filter
    pub rows_written: usize,
    /// Whether the report was skipped as unreadable or empty
    pub skipped: bool,
}

/// Result of building a drop from a staging directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropSummary {
    /// Drop id shared by every file written
    pub drop_id: DropId,
    /// Drop directories written to
    pub drop_paths: BTreeSet<PathBuf>,
    /// Manifests published
    pub manifests: Vec<PathBuf>,
    /// Reports examined
    pub files_processed: usize,
    /// Reports skipped as unreadable or empty
    pub files_skipped: usize,
    /// CBF rows written
    pub rows_written: usize,
}

/// Transforms reports into one drop
#[derive(Debug, Clone)]
pub struct CbfTransformer {
    window: EvaluationWindow,
    drop_id: DropId,
    output_root: PathBuf,
}

impl CbfTransformer {
    /// Create a transformer writing `drop_id` under `output_root`
    pub fn new(window: EvaluationWindow, drop_id: DropId, output_root: impl Into<PathBuf>) -> Self {
        Self {
            window,
            drop_id,
            output_root: output_root.into(),
        }
    }

    /// The drop id files are written under
    pub fn drop_id(&self) -> &DropId {
        &self.drop_id
    }

    /// The evaluation window rows are filtered to
    pub fn window(&self) -> &EvaluationWindow {
        &self.window
    }

    /// Transform one report, returning the drop directories touched
    pub async fn transform(
        &self,
        raw_file: &Path,
        resolver: &mut AccountNameResolver<'_>,
    ) -> Result<BTreeSet<PathBuf>> {
        Ok(self.transform_file(raw_file, resolver).await?.drop_paths)
    }

    /// Transform one report with row counts
    pub async fn transform_file(
        &self,
        raw_file: &Path,
        resolver: &mut AccountNameResolver<'_>,
    ) -> Result<FileOutcome> {
        info!("Processing file {}...", raw_file.display());

        let (plan, records) = match read_report(raw_file) {
            Ok(report) => report,
            Err(e) if !e.is_fatal() => {
                warn!("Skipping file {}: {e}", raw_file.display());
                return Ok(FileOutcome {
                    skipped: true,
                    ..FileOutcome::default()
                });
            }
            Err(e) => return Err(e),
        };

        if records.is_empty() {
            warn!("No rows read from file {}", raw_file.display());
            return Ok(FileOutcome {
                skipped: true,
                ..FileOutcome::default()
            });
        }

        let rows_read = records.len();
        let partitions = self.partition_rows(&plan, &records, raw_file, resolver).await;

        if partitions.is_empty() {
            warn!(
                "No rows remaining after date window prune in file {}",
                raw_file.display()
            );
            return Ok(FileOutcome {
                rows_read,
                ..FileOutcome::default()
            });
        }

        let file_name = raw_file
            .file_name()
            .ok_or_else(|| Error::output(format!("No file name in {}", raw_file.display())))?;
        let headers = plan.headers();

        let mut outcome = FileOutcome {
            rows_read,
            ..FileOutcome::default()
        };

        for (month, rows) in partitions {
            let drop_path = resolve_drop_path(month, &self.output_root, &self.drop_id)?;
            let cbf_path = drop_path.join(file_name);
            info!("Writing CBF file to {}", cbf_path.display());
            outcome.rows_written += write_cbf_file(&cbf_path, &headers, &rows)?;
            outcome.drop_paths.insert(drop_path);
        }

        Ok(outcome)
    }

    /// Build CBF rows inside the window, grouped by billing month
    async fn partition_rows(
        &self,
        plan: &ColumnPlan,
        records: &[csv::StringRecord],
        raw_file: &Path,
        resolver: &mut AccountNameResolver<'_>,
    ) -> BTreeMap<NaiveDate, Vec<Vec<String>>> {
        let mut partitions: BTreeMap<NaiveDate, Vec<Vec<String>>> = BTreeMap::new();
        let mut unparseable = 0usize;

        for record in records {
            let field = |index: usize| record.get(index).unwrap_or_default();

            let Some(usage_start) = parse_usage_timestamp(field(plan.usage_start())) else {
                unparseable += 1;
                continue;
            };
            let usage_date = usage_start.date_naive();
            if !self.window.contains(usage_date) {
                continue;
            }

            let mut row = Vec::with_capacity(plan.fixed().len() + plan.tags().len() + 1);
            for (column, index) in plan.fixed() {
                let value = match (column, index) {
                    (CbfColumn::LineItemType, _) => LINE_ITEM_TYPE.to_string(),
                    (CbfColumn::UsageStart, _) => format_usage_timestamp(usage_start),
                    (CbfColumn::UsageEnd, Some(i)) => {
                        let raw = field(*i);
                        parse_usage_timestamp(raw)
                            .map_or_else(|| raw.to_string(), format_usage_timestamp)
                    }
                    (_, Some(i)) => field(*i).to_string(),
                    (_, None) => String::new(),
                };
                row.push(value);
            }
            for tag in plan.tags() {
                row.push(field(tag.index).to_string());
            }

            let tenant_id = field(plan.tenant_id());
            let tenancy_name = if tenant_id.is_empty() {
                String::new()
            } else {
                resolver.resolve(tenant_id).await
            };
            row.push(tenancy_name);

            partitions
                .entry(first_of_month(usage_date))
                .or_default()
                .push(row);
        }

        if unparseable > 0 {
            warn!(
                "Dropped {} rows with unparseable usage start in file {}",
                unparseable,
                raw_file.display()
            );
        }

        partitions
    }

    /// Transform every staged report and publish manifests for the drop
    pub async fn build(
        &self,
        staging_dir: &Path,
        resolver: &mut AccountNameResolver<'_>,
    ) -> Result<DropSummary> {
        let files = staged_reports(staging_dir)?;

        let mut drop_paths = BTreeSet::new();
        let mut files_skipped = 0;
        let mut rows_written = 0;

        for file in &files {
            let outcome = self.transform_file(file, resolver).await?;
            if outcome.skipped {
                files_skipped += 1;
            }
            rows_written += outcome.rows_written;
            drop_paths.extend(outcome.drop_paths);
        }

        let manifests = publish_manifests(&drop_paths, &self.drop_id)?;

        info!(
            "Drop {} complete: {} files, {} skipped, {} rows, {} billing windows",
            self.drop_id,
            files.len(),
            files_skipped,
            rows_written,
            drop_paths.len()
        );

        Ok(DropSummary {
            drop_id: self.drop_id.clone(),
            drop_paths,
            manifests,
            files_processed: files.len(),
            files_skipped,
            rows_written,
        })
    }
}

/// Build a drop with a fresh drop id from every report in `staging_dir`
pub async fn build_drop(
    window: &EvaluationWindow,
    staging_dir: &Path,
    output_root: &Path,
    resolver: &mut AccountNameResolver<'_>,
) -> Result<DropSummary> {
    CbfTransformer::new(*window, DropId::generate(), output_root)
        .build(staging_dir, resolver)
        .await
}

/// Raw reports under `staging_dir`, sorted by path
pub fn staged_reports(staging_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(staging_dir) {
        let entry = entry.map_err(|e| {
            Error::output(format!("Failed to scan {}: {e}", staging_dir.display()))
        })?;
        let is_report = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(RAW_REPORT_SUFFIX));
        if entry.file_type().is_file() && is_report {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Decompress and parse a report into its column plan and records
///
/// Short rows are kept; their missing trailing fields read as empty.
fn read_report(path: &Path) -> Result<(ColumnPlan, Vec<csv::StringRecord>)> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(GzDecoder::new(BufReader::new(file)));

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(Error::decode("report has no header row"));
    }

    let plan = ColumnPlan::from_headers(headers.iter())?;
    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

    Ok((plan, records))
}
