//! Report download

use super::ReportSource;
use crate::error::Result;
use crate::window::EvaluationWindow;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

/// Object prefix OCI writes cost reports under
pub const REPORT_PREFIX: &str = "reports/cost-csv";

/// Write buffer used while streaming a report to disk
pub const DOWNLOAD_BUFFER_SIZE: usize = 1024 * 1024;

/// Local file name for a report created at `created_at`
pub fn report_file_name(created_at: DateTime<Utc>) -> String {
    format!("{}.csv.gz", created_at.format("%Y%m%d%H%M%S%Z"))
}

/// Download every report created inside the window (plus grace period)
///
/// Rows are not filtered here; a report's creation date only decides
/// whether it can contain usage for the window. Returns the local paths
/// written, in listing order.
pub async fn fetch_reports(
    window: &EvaluationWindow,
    source: &dyn ReportSource,
    local_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let objects = source.list_objects(REPORT_PREFIX).await?;
    info!(
        "Found {} report objects, keeping those created {} to {}",
        objects.len(),
        window.start_date(),
        window.report_end_date()
    );

    tokio::fs::create_dir_all(local_dir).await?;

    let mut used_names = HashSet::new();
    let mut downloaded = Vec::new();

    for object in objects
        .iter()
        .filter(|o| window.accepts_report_created(o.created_at.date_naive()))
    {
        let path = local_dir.join(unique_name(&mut used_names, object.created_at));

        let mut stream = source.get_object(&object.name).await?;
        let file = tokio::fs::File::create(&path).await?;
        let mut writer = BufWriter::with_capacity(DOWNLOAD_BUFFER_SIZE, file);

        while let Some(chunk) = stream.try_next().await? {
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;

        info!(
            "File {} downloaded - created {}",
            path.display(),
            object.created_at
        );
        downloaded.push(path);
    }

    Ok(downloaded)
}

/// Report file name, suffixed when two reports share a creation second
fn unique_name(used: &mut HashSet<String>, created_at: DateTime<Utc>) -> String {
    let base = report_file_name(created_at);
    if used.insert(base.clone()) {
        return base;
    }

    let stem = base.trim_end_matches(".csv.gz");
    (1..)
        .map(|n| format!("{stem}-{n}.csv.gz"))
        .find(|name| used.insert(name.clone()))
        .unwrap_or(base)
}
