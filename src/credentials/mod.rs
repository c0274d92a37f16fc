//! Credential providers
//!
//! The event entry point reads every setting from a parameter store. Each
//! parameter is named `<params_path><parameter>`, e.g. `/anycost/oci-user`.

use crate::config::{SinkConfig, SourceConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// Parameter holding the user OCID
pub const PARAM_USER: &str = "oci-user";
/// Parameter holding the PEM private key (stored encrypted)
pub const PARAM_KEY_CONTENT: &str = "oci-key-content";
/// Parameter holding the API key fingerprint
pub const PARAM_FINGERPRINT: &str = "oci-key-fingerprint";
/// Parameter holding the tenancy OCID
pub const PARAM_TENANCY: &str = "oci-tenancy";
/// Parameter holding the home region
pub const PARAM_REGION: &str = "oci-region";
/// Parameter holding the S3-compatible access key id (optional)
pub const PARAM_ACCESS_KEY_ID: &str = "oci-access-key-id";
/// Parameter holding the S3-compatible secret key (optional, encrypted)
pub const PARAM_SECRET_ACCESS_KEY: &str = "oci-secret-access-key";
/// Parameter holding the drop bucket
pub const PARAM_SINK_BUCKET: &str = "s3-bucket";
/// Parameter holding the drop key prefix
pub const PARAM_SINK_PREFIX: &str = "s3-bucket-prefix";

/// Source of named string parameters
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Fetch a parameter, decrypting it when `decrypt` is set
    ///
    /// Returns `Error::ParameterNotFound` when the name is unknown.
    async fn get_parameter(&self, name: &str, decrypt: bool) -> Result<String>;
}

/// Fetch a parameter that may legitimately be absent
pub async fn optional_parameter(
    provider: &dyn CredentialProvider,
    name: &str,
    decrypt: bool,
) -> Result<Option<String>> {
    match provider.get_parameter(name, decrypt).await {
        Ok(value) => Ok(Some(value)),
        Err(Error::ParameterNotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

// ============================================================================
// Environment Provider
// ============================================================================

/// Reads parameters from environment variables
///
/// `/anycost/oci-user` is read from `ANYCOST_OCI_USER`.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Create a new environment provider
    pub fn new() -> Self {
        Self
    }

    /// Environment variable holding parameter `name`
    pub fn variable_name(name: &str) -> String {
        name.split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(str::to_ascii_uppercase)
            .collect::<Vec<_>>()
            .join("_")
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn get_parameter(&self, name: &str, _decrypt: bool) -> Result<String> {
        let variable = Self::variable_name(name);
        match std::env::var(&variable) {
            Ok(value) => Ok(value),
            Err(std::env::VarError::NotPresent) => Err(Error::ParameterNotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(Error::credential(name, format!("{variable}: {e}"))),
        }
    }
}

// ============================================================================
// File Provider
// ============================================================================

/// Reads parameters from a flat JSON or YAML map of name -> value
#[derive(Debug, Clone, Default)]
pub struct FileCredentialProvider {
    parameters: HashMap<String, String>,
}

impl FileCredentialProvider {
    /// Create from an in-memory map
    pub fn from_map(parameters: HashMap<String, String>) -> Self {
        Self { parameters }
    }

    /// Load a parameter file (YAML unless the extension is `.json`)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read parameter file {}: {e}",
                path.display()
            ))
        })?;

        let parameters = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        Ok(Self { parameters })
    }
}

#[async_trait]
impl CredentialProvider for FileCredentialProvider {
    async fn get_parameter(&self, name: &str, _decrypt: bool) -> Result<String> {
        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ParameterNotFound {
                name: name.to_string(),
            })
    }
}

// ============================================================================
// Config Assembly
// ============================================================================

/// Assemble and validate the report source config from parameters
pub async fn load_source_config(
    provider: &dyn CredentialProvider,
    params_path: &str,
) -> Result<SourceConfig> {
    let param = |name: &str| format!("{params_path}{name}");

    let mut config = SourceConfig::new(
        provider.get_parameter(&param(PARAM_USER), false).await?,
        provider.get_parameter(&param(PARAM_KEY_CONTENT), true).await?,
        provider.get_parameter(&param(PARAM_FINGERPRINT), false).await?,
        provider.get_parameter(&param(PARAM_TENANCY), false).await?,
        provider.get_parameter(&param(PARAM_REGION), false).await?,
    );
    config.access_key_id = optional_parameter(provider, &param(PARAM_ACCESS_KEY_ID), false).await?;
    config.secret_access_key =
        optional_parameter(provider, &param(PARAM_SECRET_ACCESS_KEY), true).await?;

    config.validate()?;
    Ok(config)
}

/// Assemble the drop sink config from parameters
pub async fn load_sink_config(
    provider: &dyn CredentialProvider,
    params_path: &str,
) -> Result<SinkConfig> {
    let bucket = provider
        .get_parameter(&format!("{params_path}{PARAM_SINK_BUCKET}"), false)
        .await?;
    let prefix = provider
        .get_parameter(&format!("{params_path}{PARAM_SINK_PREFIX}"), false)
        .await?;
    Ok(SinkConfig::s3(&bucket, &prefix))
}
