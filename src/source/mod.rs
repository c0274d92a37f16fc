//! Report source module
//!
//! Lists and downloads raw cost report objects.
//!
//! # Overview
//!
//! - `ReportSource` - listing and fetching capability
//! - `ObjectStoreSource` - `ReportSource` over any `object_store` backend,
//!   including OCI's S3-compatible endpoint
//! - `fetch_reports` - downloads the reports created inside a window

mod fetch;
mod object;

pub use fetch::{fetch_reports, report_file_name, DOWNLOAD_BUFFER_SIZE, REPORT_PREFIX};
pub use object::ObjectStoreSource;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

/// A report object in remote storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportObject {
    /// Full object name
    pub name: String,
    /// When the object was created
    pub created_at: DateTime<Utc>,
    /// Size in bytes
    pub size: u64,
}

/// Remote storage holding raw cost reports
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// List every object under `prefix`, draining all pages
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ReportObject>>;

    /// Stream an object's bytes
    async fn get_object(&self, name: &str) -> Result<BoxStream<'static, Result<Bytes>>>;
}
