//! HTTP server mode for event-triggered runs

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::credentials::{CredentialProvider, EnvCredentialProvider, FileCredentialProvider};
use crate::error::{Error, Result};
use crate::pipeline::{handle_event, InvocationEvent};

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Parameter path prefix, e.g. `/anycost/`
    pub params_path: String,
    /// Where parameters are read from
    pub provider: Arc<dyn CredentialProvider>,
}

impl ServerConfig {
    /// Read parameters from `params_file`, or from the environment when absent
    pub fn new(params_path: impl Into<String>, params_file: Option<&PathBuf>) -> Result<Self> {
        let provider: Arc<dyn CredentialProvider> = match params_file {
            Some(path) => Arc::new(FileCredentialProvider::load(path)?),
            None => Arc::new(EnvCredentialProvider::new()),
        };
        Ok(Self {
            params_path: params_path.into(),
            provider,
        })
    }
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Build the router
pub fn router(config: ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/invoke", post(invoke))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(config))
}

/// Start the HTTP server
pub async fn serve(config: ServerConfig, port: u16) -> Result<()> {
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "name": crate::NAME, "version": crate::VERSION }))
}

/// Run the pipeline for one event; an empty body means the current month
///
/// The body is parsed as JSON whatever the content type, so
/// `curl -d '{"lookback_months": 1}'` works as well.
async fn invoke(State(config): State<Arc<ServerConfig>>, body: Bytes) -> impl IntoResponse {
    let event = match parse_event(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Rejected invocation: {e}");
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error(format!("Invalid event: {e}"))),
            )
                .into_response();
        }
    };

    match handle_event(&event, config.provider.as_ref(), &config.params_path).await {
        Ok(report) => (StatusCode::OK, Json(ApiResponse::success(report))).into_response(),
        Err(e) => {
            tracing::error!("Invocation failed: {e}");
            (status_for(&e), Json(ApiResponse::<()>::error(e.to_string()))).into_response()
        }
    }
}

/// Parse an invocation body; blank bodies select the default event
fn parse_event(body: &[u8]) -> Result<InvocationEvent> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(InvocationEvent::default());
    }
    Ok(serde_json::from_slice(body)?)
}

/// Caller mistakes are 400, everything else 500
fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::InvalidLookback { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
