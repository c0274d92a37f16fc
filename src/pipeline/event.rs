//! Event-triggered invocation
//!
//! Invoked with an event such as `{"lookback_months": 1}`. Everything else
//! comes from the credential provider under the configured parameter path.

use super::{Pipeline, RunReport, DROP_DIR_NAME, STAGING_DIR_NAME};
use crate::credentials::{
    load_sink_config, load_source_config, optional_parameter, CredentialProvider,
};
use crate::directory::StaticDirectory;
use crate::error::Result;
use crate::sink::ObjectStoreSink;
use crate::source::ObjectStoreSource;
use crate::window::months_lookback;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Environment variable naming the parameter path, e.g. `/anycost/`
pub const PARAMETER_PATH_ENV: &str = "ANYCOST_PARAMETER_PATH";

/// Optional parameter holding a JSON map of tenancy id -> name
pub const PARAM_TENANCY_NAMES: &str = "tenancy-names";

/// Event payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationEvent {
    /// Months to look back; the current month when absent
    #[serde(default)]
    pub lookback_months: Option<i32>,
}

/// Run the pipeline for one event, using a scratch directory that is removed afterwards
pub async fn handle_event(
    event: &InvocationEvent,
    provider: &dyn CredentialProvider,
    params_path: &str,
) -> Result<RunReport> {
    let source_config = load_source_config(provider, params_path).await?;
    let sink_config = load_sink_config(provider, params_path).await?;

    let directory = match optional_parameter(
        provider,
        &format!("{params_path}{PARAM_TENANCY_NAMES}"),
        false,
    )
    .await?
    {
        Some(json) => {
            StaticDirectory::from_map(serde_json::from_str::<HashMap<String, String>>(&json)?)
        }
        None => StaticDirectory::new(),
    };

    let lookback_months = event.lookback_months.unwrap_or(0);
    info!("Looking back {} months ago", lookback_months);
    let window = months_lookback(lookback_months)?;

    let source = ObjectStoreSource::oci(&source_config)?;
    let sink = ObjectStoreSink::parse(&sink_config.url)?;

    let temp_dir = tempfile::tempdir()?;
    let staging_dir = temp_dir.path().join(STAGING_DIR_NAME);
    let output_dir = temp_dir.path().join(DROP_DIR_NAME);
    std::fs::create_dir_all(&staging_dir)?;
    std::fs::create_dir_all(&output_dir)?;

    Pipeline::new(&source, &directory)
        .with_sink(&sink)
        .run(&window, &staging_dir, &output_dir)
        .await
}
