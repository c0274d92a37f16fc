//! Error types for anycost-oci
//!
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Errors are split into two groups: the ones that abort a run and the ones
//! the transformer recovers from by skipping a file or substituting a value.

use thiserror::Error;

/// The main error type for anycost-oci
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Invalid lookback of {months} months: must be zero or positive")]
    InvalidLookback { months: i32 },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Collaborator Errors
    // ============================================================================
    #[error("Failed to read parameter '{name}': {message}")]
    Credential { name: String, message: String },

    #[error("Parameter '{name}' not found")]
    ParameterNotFound { name: String },

    #[error("Report source error: {message}")]
    Source { message: String },

    #[error("Drop sink error: {message}")]
    Sink { message: String },

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Directory lookup failed for '{id}': not found")]
    NotFound { id: String },

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to decode report: {message}")]
    Decode { message: String },

    #[error("Report is missing required column '{column}'")]
    MissingColumn { column: String },

    // ============================================================================
    // Filesystem Errors
    // ============================================================================
    #[error("Output directory {path} already exists and is not empty")]
    OutputDirNotEmpty { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a credential error
    pub fn credential(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Credential {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a report source error
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    /// Create a drop sink error
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    /// Create a "not found" directory lookup error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Check if this error must abort the run.
    ///
    /// Decode problems with a single report are skipped by the transformer;
    /// everything else stops the pipeline.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::Csv(_) | Error::Decode { .. } | Error::MissingColumn { .. }
        )
    }
}

/// Result type alias for anycost-oci
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
