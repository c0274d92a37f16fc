//! Drop sink module
//!
//! Uploads finished drops to remote storage, mirroring the local layout:
//! `<prefix>/<billing_data_id>/<drop_id>/<files>` and
//! `<prefix>/<billing_data_id>/manifest.json`.

use crate::drop::{billing_dir, drop_path_parts};
use crate::error::{Error, Result};
use crate::manifest::MANIFEST_FILE;
use crate::storage::StoreLocation;
use crate::transform::DropSummary;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::ObjectStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use walkdir::WalkDir;

/// Remote destination for drop files
#[async_trait]
pub trait DropSink: Send + Sync {
    /// Upload every file under `local` (recursively) below `remote`
    ///
    /// Returns the number of files uploaded.
    async fn put_directory(&self, local: &Path, remote: &str) -> Result<usize>;

    /// Upload a single file to `remote`
    async fn put_file(&self, local: &Path, remote: &str) -> Result<()>;
}

/// Drop sink writing to an object store
#[derive(Debug, Clone)]
pub struct ObjectStoreSink {
    location: StoreLocation,
}

impl ObjectStoreSink {
    /// Wrap a store location
    pub fn new(location: StoreLocation) -> Self {
        Self { location }
    }

    /// Wrap a bare store with a key prefix
    pub fn from_store(store: Arc<dyn ObjectStore>, prefix: &str) -> Self {
        Self::new(StoreLocation::new(store, prefix, "memory"))
    }

    /// Sink for a storage URL (s3://, r2://, gs://, az://, local path)
    pub fn parse(url: &str) -> Result<Self> {
        Ok(Self::new(StoreLocation::parse(url)?))
    }

    /// The store location
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }
}

#[async_trait]
impl DropSink for ObjectStoreSink {
    async fn put_directory(&self, local: &Path, remote: &str) -> Result<usize> {
        let files = files_under(local)?;
        for (path, relative) in &files {
            let key = format!("{}/{relative}", remote.trim_end_matches('/'));
            self.put_file(path, &key).await?;
        }
        Ok(files.len())
    }

    async fn put_file(&self, local: &Path, remote: &str) -> Result<()> {
        let data = tokio::fs::read(local).await.map_err(|e| {
            Error::sink(format!("Failed to read {}: {e}", local.display()))
        })?;

        let path = self.location.path(remote);
        let target = self.location.display(&path);
        self.location
            .store()
            .put(&path, Bytes::from(data).into())
            .await
            .map_err(|e| Error::sink(format!("Failed to write {target}: {e}")))?;

        info!("Put {} to {}", local.display(), target);
        Ok(())
    }
}

/// Files under `root` with their `/`-separated relative paths, sorted
fn files_under(root: &Path) -> Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry =
            entry.map_err(|e| Error::sink(format!("Failed to scan {}: {e}", root.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| Error::sink(format!("{}: {e}", entry.path().display())))?
            .to_string_lossy()
            .replace('\\', "/");
        files.push((entry.into_path(), relative));
    }
    Ok(files)
}

/// Upload each drop directory and its billing window manifest
///
/// Returns the number of files uploaded.
pub async fn upload_drops(summary: &DropSummary, sink: &dyn DropSink) -> Result<usize> {
    let mut uploaded = 0;

    for drop_path in &summary.drop_paths {
        let (bdid, drop_id) = drop_path_parts(drop_path)?;

        uploaded += sink
            .put_directory(drop_path, &format!("{bdid}/{drop_id}/"))
            .await?;

        let manifest = billing_dir(drop_path)?.join(MANIFEST_FILE);
        sink.put_file(&manifest, &format!("{bdid}/{MANIFEST_FILE}"))
            .await?;
        uploaded += 1;
    }

    Ok(uploaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drop::DropId;
    use crate::manifest::publish_manifests;
    use futures::TryStreamExt;
    use object_store::memory::InMemory;
    use object_store::path::Path as ObjectPath;
    use std::collections::BTreeSet;

    async fn keys(store: &InMemory) -> Vec<String> {
        let mut keys: Vec<String> = store
            .list(None)
            .map_ok(|meta| meta.location.to_string())
            .try_collect()
            .await
            .unwrap();
        keys.sort();
        keys
    }

    #[tokio::test]
    async fn test_put_directory_is_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.csv.gz"), "a").unwrap();
        std::fs::write(dir.path().join("sub/b.csv.gz"), "b").unwrap();

        let store = Arc::new(InMemory::new());
        let sink = ObjectStoreSink::from_store(store.clone(), "anycost");

        let count = sink.put_directory(dir.path(), "drop/").await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            keys(&store).await,
            vec!["anycost/drop/a.csv.gz", "anycost/drop/sub/b.csv.gz"]
        );
    }

    #[tokio::test]
    async fn test_put_file_missing_local_is_error() {
        let sink = ObjectStoreSink::from_store(Arc::new(InMemory::new()), "");
        let err = sink
            .put_file(Path::new("/nonexistent/manifest.json"), "x/manifest.json")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Sink { .. }));
    }

    #[tokio::test]
    async fn test_upload_drops_mirrors_layout() {
        let output = tempfile::tempdir().unwrap();
        let drop_id = DropId::new("20230205000000UTC");
        let drop_path = output.path().join("20230101-20230201").join(drop_id.as_str());
        std::fs::create_dir_all(&drop_path).unwrap();
        std::fs::write(drop_path.join("r1.csv.gz"), "data").unwrap();

        let drop_paths: BTreeSet<PathBuf> = BTreeSet::from([drop_path]);
        let manifests = publish_manifests(&drop_paths, &drop_id).unwrap();
        let summary = DropSummary {
            drop_id,
            drop_paths,
            manifests,
            files_processed: 1,
            files_skipped: 0,
            rows_written: 1,
        };

        let store = Arc::new(InMemory::new());
        let sink = ObjectStoreSink::from_store(store.clone(), "bucket-prefix/");

        let uploaded = upload_drops(&summary, &sink).await.unwrap();

        assert_eq!(uploaded, 2);
        assert_eq!(
            keys(&store).await,
            vec![
                "bucket-prefix/20230101-20230201/20230205000000UTC/r1.csv.gz",
                "bucket-prefix/20230101-20230201/manifest.json",
            ]
        );

        let manifest = store
            .get(&ObjectPath::from("bucket-prefix/20230101-20230201/manifest.json"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&manifest).unwrap();
        assert_eq!(json["current_drop_id"], "20230205000000UTC");
    }
}
