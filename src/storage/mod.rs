//! Object storage locations (S3, R2, GCS, Azure, local)
//!
//! Both the report source and the drop sink address storage by URL. This
//! module turns such a URL into an `ObjectStore` plus a key prefix.

use crate::error::{Error, Result};
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;

/// An object store together with the key prefix everything lives under
#[derive(Debug, Clone)]
pub struct StoreLocation {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: String,
    /// Original URL scheme for logging
    scheme: String,
}

impl StoreLocation {
    /// Wrap an existing store
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into().trim_matches('/').to_string(),
            scheme: scheme.into(),
        }
    }

    /// Parse a storage URL and create the matching object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `/local/path/`, `./path/` or `file:///path` - Local filesystem
    pub fn parse(url: &str) -> Result<Self> {
        if url.starts_with("s3://") {
            Self::parse_s3(url, false)
        } else if url.starts_with("r2://") {
            Self::parse_s3(url, true)
        } else if url.starts_with("gs://") {
            Self::parse_gcs(url)
        } else if url.starts_with("az://") {
            Self::parse_azure(url)
        } else {
            Self::parse_local(url)
        }
    }

    /// Parse S3 or R2 URL
    fn parse_s3(url: &str, is_r2: bool) -> Result<Self> {
        let scheme = if is_r2 { "r2" } else { "s3" };
        let (bucket, prefix) = split_bucket(url, scheme)?;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        // AWS_ENDPOINT is read by from_env(); R2 has its own variable
        if is_r2 {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;

        Ok(Self::new(Arc::new(store), prefix, scheme))
    }

    /// Parse GCS URL
    fn parse_gcs(url: &str) -> Result<Self> {
        let (bucket, prefix) = split_bucket(url, "gs")?;

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self::new(Arc::new(store), prefix, "gs"))
    }

    /// Parse Azure Blob URL
    fn parse_azure(url: &str) -> Result<Self> {
        let (container, prefix) = split_bucket(url, "az")?;

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self::new(Arc::new(store), prefix, "az"))
    }

    /// Parse local filesystem path
    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self::new(Arc::new(store), String::new(), "file"))
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Key prefix (no leading or trailing slash)
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Get the scheme (s3, r2, gs, az, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Object path for `key` under this location's prefix
    pub fn path(&self, key: &str) -> ObjectPath {
        let key = key.trim_matches('/');
        match (self.prefix.is_empty(), key.is_empty()) {
            (true, _) => ObjectPath::from(key),
            (false, true) => ObjectPath::from(self.prefix.as_str()),
            (false, false) => ObjectPath::from(format!("{}/{key}", self.prefix)),
        }
    }

    /// Display form of a path, for logging
    pub fn display(&self, path: &ObjectPath) -> String {
        format!("{}://{path}", self.scheme)
    }
}

/// Split `scheme://bucket/prefix` into its bucket and prefix
fn split_bucket<'a>(url: &'a str, scheme: &str) -> Result<(&'a str, String)> {
    let without_scheme = url
        .strip_prefix(&format!("{scheme}://"))
        .ok_or_else(|| Error::config(format!("Invalid {scheme} URL: {url}")))?;

    let (bucket, prefix) = match without_scheme.find('/') {
        Some(idx) => (
            &without_scheme[..idx],
            without_scheme[idx + 1..].to_string(),
        ),
        None => (without_scheme, String::new()),
    };

    if bucket.is_empty() {
        return Err(Error::config(format!("Missing bucket in {scheme} URL: {url}")));
    }

    Ok((bucket, prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    #[test]
    fn test_split_bucket() {
        let (bucket, prefix) = split_bucket("s3://drops/anycost/oci/", "s3").unwrap();
        assert_eq!(bucket, "drops");
        assert_eq!(prefix, "anycost/oci/");

        let (bucket, prefix) = split_bucket("gs://drops", "gs").unwrap();
        assert_eq!(bucket, "drops");
        assert!(prefix.is_empty());

        assert!(split_bucket("s3:///nobucket", "s3").is_err());
        assert!(split_bucket("gs://drops", "s3").is_err());
    }

    #[test]
    fn test_parse_local_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sink");
        let location = StoreLocation::parse(path.to_str().unwrap()).unwrap();
        assert_eq!(location.scheme(), "file");
        assert!(path.is_dir());
    }

    #[test]
    fn test_path_joins_prefix() {
        let location = StoreLocation::new(Arc::new(InMemory::new()), "/anycost/oci/", "s3");
        assert_eq!(location.prefix(), "anycost/oci");
        assert_eq!(
            location.path("20230101-20230201/manifest.json").as_ref(),
            "anycost/oci/20230101-20230201/manifest.json"
        );
        assert_eq!(location.path("").as_ref(), "anycost/oci");

        let bare = StoreLocation::new(Arc::new(InMemory::new()), "", "file");
        assert_eq!(bare.path("/a/b/").as_ref(), "a/b");
    }
}
