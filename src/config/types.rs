//! Configuration types

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Object storage namespace OCI publishes cost reports in
pub const DEFAULT_REPORT_NAMESPACE: &str = "bling";

static OCID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9a-zA-Z_-]+[.:])([0-9a-zA-Z_-]*[.:]){3,}([0-9a-zA-Z_-]+)$")
        .unwrap()
});

static FINGERPRINT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9a-f]{2}:){15}[0-9a-f]{2}$").unwrap()
});

fn default_namespace() -> String {
    DEFAULT_REPORT_NAMESPACE.to_string()
}

// ============================================================================
// Source Config
// ============================================================================

/// Credentials and location of the tenancy that publishes cost reports
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// User OCID
    pub user: String,

    /// PEM private key
    #[serde(default)]
    pub key_content: String,

    /// Path to the PEM private key, read into `key_content` on load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,

    /// API key fingerprint
    pub fingerprint: String,

    /// Tenancy OCID (also the report bucket name)
    pub tenancy: String,

    /// Home region, e.g. `us-ashburn-1`
    pub region: String,

    /// Object storage namespace holding the reports
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Storage URL overriding the OCI endpoint (s3://, gs://, az://, local path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,

    /// Customer secret key id for the S3-compatible endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    /// Customer secret key for the S3-compatible endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}

impl SourceConfig {
    /// Config with the five required fields
    pub fn new(
        user: impl Into<String>,
        key_content: impl Into<String>,
        fingerprint: impl Into<String>,
        tenancy: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            key_content: key_content.into(),
            key_file: None,
            fingerprint: fingerprint.into(),
            tenancy: tenancy.into(),
            region: region.into(),
            namespace: default_namespace(),
            report_url: None,
            access_key_id: None,
            secret_access_key: None,
        }
    }

    /// Read `key_file` into `key_content` if one is configured
    pub fn load_key_file(&mut self) -> Result<()> {
        if let Some(path) = &self.key_file {
            self.key_content = std::fs::read_to_string(path).map_err(|e| {
                Error::invalid_value("key_file", format!("{}: {e}", path.display()))
            })?;
        }
        Ok(())
    }

    /// Check required fields are present and well formed
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("user", &self.user),
            ("key_content", &self.key_content),
            ("fingerprint", &self.fingerprint),
            ("tenancy", &self.tenancy),
            ("region", &self.region),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::missing_field(field));
            }
        }

        if !OCID_REGEX.is_match(&self.user) {
            return Err(Error::invalid_value("user", "not an OCID"));
        }
        if !OCID_REGEX.is_match(&self.tenancy) {
            return Err(Error::invalid_value("tenancy", "not an OCID"));
        }
        if !FINGERPRINT_REGEX.is_match(&self.fingerprint) {
            return Err(Error::invalid_value(
                "fingerprint",
                "expected 16 colon-separated hex pairs",
            ));
        }
        if self.region.contains(char::is_whitespace) {
            return Err(Error::invalid_value("region", "contains whitespace"));
        }

        Ok(())
    }

    /// Endpoint of the S3-compatible object storage API for this region
    pub fn compat_endpoint(&self) -> String {
        format!(
            "https://{}.compat.objectstorage.{}.oraclecloud.com",
            self.namespace, self.region
        )
    }
}

// Keys never reach the logs
impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("user", &self.user)
            .field("fingerprint", &self.fingerprint)
            .field("tenancy", &self.tenancy)
            .field("region", &self.region)
            .field("namespace", &self.namespace)
            .field("report_url", &self.report_url)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Sink Config
// ============================================================================

/// Where finished drops are uploaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Storage URL (s3://bucket/prefix, gs://..., local path)
    pub url: String,
}

impl SinkConfig {
    /// Sink for a storage URL
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// S3 sink for a bucket and key prefix
    pub fn s3(bucket: &str, prefix: &str) -> Self {
        let bucket = bucket.trim_start_matches("s3://").trim_matches('/');
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            Self::new(format!("s3://{bucket}"))
        } else {
            Self::new(format!("s3://{bucket}/{prefix}"))
        }
    }
}

// ============================================================================
// App Config
// ============================================================================

/// Top-level configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Report source
    pub source: SourceConfig,

    /// Optional upload target for finished drops
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<SinkConfig>,

    /// Tenancy id -> display name
    #[serde(default)]
    pub tenancy_names: HashMap<String, String>,
}

impl AppConfig {
    /// Load a config file (YAML unless the extension is `.json`), then validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let mut config = if is_json {
            Self::from_json(&content)?
        } else {
            Self::from_yaml(&content)?
        };

        config.source.load_key_file()?;
        config.source.validate()?;
        Ok(config)
    }

    /// Parse from a YAML string (no validation)
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse from a JSON string (no validation)
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
