//! `ReportSource` backed by `object_store`

use super::{ReportObject, ReportSource};
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::storage::StoreLocation;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;
use tracing::debug;

/// Report source reading from an object store
#[derive(Debug, Clone)]
pub struct ObjectStoreSource {
    location: StoreLocation,
}

impl ObjectStoreSource {
    /// Wrap a store location
    pub fn new(location: StoreLocation) -> Self {
        Self { location }
    }

    /// Wrap a bare store with no prefix
    pub fn from_store(store: Arc<dyn ObjectStore>) -> Self {
        Self::new(StoreLocation::new(store, "", "memory"))
    }

    /// Source for a storage URL (s3://, gs://, az://, local path)
    pub fn parse(url: &str) -> Result<Self> {
        Ok(Self::new(StoreLocation::parse(url)?))
    }

    /// Source for the tenancy's report bucket
    ///
    /// Uses `report_url` when configured, otherwise the S3-compatible
    /// endpoint of the report namespace with the tenancy OCID as bucket.
    pub fn oci(config: &SourceConfig) -> Result<Self> {
        if let Some(url) = &config.report_url {
            return Self::parse(url);
        }

        let endpoint = config.compat_endpoint();
        debug!("Using report endpoint {}", endpoint);

        let mut builder = AmazonS3Builder::new()
            .with_endpoint(endpoint)
            .with_region(&config.region)
            .with_bucket_name(&config.tenancy)
            .with_virtual_hosted_style_request(false);

        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder = builder
                .with_access_key_id(key_id)
                .with_secret_access_key(secret);
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create report client: {e}")))?;

        Ok(Self::new(StoreLocation::new(Arc::new(store), "", "s3")))
    }

    /// The store location
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }
}

#[async_trait]
impl ReportSource for ObjectStoreSource {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ReportObject>> {
        let prefix = self.location.path(prefix);

        let objects: Vec<_> = self
            .location
            .store()
            .list(Some(&prefix))
            .try_collect()
            .await
            .map_err(|e| {
                Error::source(format!(
                    "Failed to list {}: {e}",
                    self.location.display(&prefix)
                ))
            })?;

        Ok(objects
            .into_iter()
            .map(|meta| ReportObject {
                name: meta.location.to_string(),
                created_at: meta.last_modified,
                size: meta.size as u64,
            })
            .collect())
    }

    async fn get_object(&self, name: &str) -> Result<BoxStream<'static, Result<Bytes>>> {
        let path = ObjectPath::from(name);
        let target = self.location.display(&path);

        let result = self
            .location
            .store()
            .get(&path)
            .await
            .map_err(|e| Error::source(format!("Failed to fetch {target}: {e}")))?;

        Ok(result
            .into_stream()
            .map_err(move |e| Error::source(format!("Failed to read {target}: {e}")))
            .boxed())
    }
}
