// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # anycost-oci
//!
//! Converts OCI cost reports into CBF (Common Billing Format) drops that
//! AnyCost ingests.
//!
//! ## Features
//!
//! - **Report download**: fetch `reports/cost-csv` objects created in the
//!   evaluation window (plus a three day grace period)
//! - **CBF transform**: fixed column mapping, sanitized `resource/tag:*`
//!   columns and a resolved tenancy name per row
//! - **Billing windows**: rows land in the monthly drop they belong to
//! - **Manifests**: one `manifest.json` per touched billing window
//! - **Upload**: drops mirrored to S3, GCS, Azure, R2 or a local path
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use anycost_oci::directory::StaticDirectory;
//! use anycost_oci::pipeline::Pipeline;
//! use anycost_oci::source::ObjectStoreSource;
//! use anycost_oci::window::months_lookback;
//!
//! #[tokio::main]
//! async fn main() -> anycost_oci::Result<()> {
//!     let window = months_lookback(1)?;
//!     let source = ObjectStoreSource::parse("s3://reports-mirror")?;
//!     let directory = StaticDirectory::new();
//!
//!     let report = Pipeline::new(&source, &directory)
//!         .run(&window, "/tmp/oci_cost_files".as_ref(), "/tmp/anycost_drop".as_ref())
//!         .await?;
//!     println!("{} rows written", report.drop.rows_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Entry Points                             │
//! │        cli run / check        serve (POST /invoke)               │
//! └──────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬────────────┬─────────────┐
//! │  Source  │ Transform │    Window     │  Manifest  │    Sink     │
//! ├──────────┼───────────┼───────────────┼────────────┼─────────────┤
//! │ OCI S3   │ Columns   │ Lookback      │ Drop id    │ S3 / GCS    │
//! │ compat   │ Tags      │ BDID          │ Publish    │ Azure / R2  │
//! │ fetch    │ Tenancy   │ Grace period  │            │ Local       │
//! └──────────┴───────────┴───────────────┴────────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Evaluation windows and billing data ids
pub mod window;

/// Drop ids and drop directory layout
pub mod drop;

/// Drop manifests
pub mod manifest;

/// Tenancy name lookup and caching
pub mod directory;

/// Object store locations
pub mod storage;

/// Configuration file
pub mod config;

/// Credential providers
pub mod credentials;

/// Report listing and download
pub mod source;

/// OCI report to CBF transform
pub mod transform;

/// Drop upload
pub mod sink;

/// Orchestration and the event entry point
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

pub use pipeline::{handle_event, InvocationEvent, Pipeline, RunReport};
pub use transform::{build_drop, CbfTransformer, DropSummary};
pub use window::{months_lookback, BillingDataId, EvaluationWindow};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
