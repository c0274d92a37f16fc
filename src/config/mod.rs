//! Configuration
//!
//! Settings for the report source (the OCI tenancy holding cost reports),
//! the drop sink, and the tenancy name table. They are read from a YAML or
//! JSON file by the command line entry point, or assembled from a
//! `CredentialProvider` by the event entry point.

mod types;

pub use types::{AppConfig, SinkConfig, SourceConfig, DEFAULT_REPORT_NAMESPACE};
