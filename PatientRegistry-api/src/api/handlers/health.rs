use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use chrono::{DateTime, Utc};
use std::sync::Once;
use once_cell::sync::OnceCell;

use crate::api::handlers::patients::PatientServiceHandle;

/// Health check response with uptime and component status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Current service status ("ok" or "error")
    pub status: String,
    /// Current application version from Cargo manifest
    pub version: String,
    /// When the response was generated
    pub timestamp: DateTime<Utc>,
    /// Uptime of the service in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    /// Details about the components the service depends on
    pub components: ComponentStatus,
}

/// Status of individual system components
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    /// Registry file status
    pub storage: ComponentHealthStatus,
}

/// Health status for an individual component
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealthStatus {
    /// Status of the component ("ok" or "error")
    pub status: String,
    /// Optional message with more details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// Track the time when the server started using a thread-safe OnceCell
static SERVER_START_TIME: OnceCell<DateTime<Utc>> = OnceCell::new();
static INIT: Once = Once::new();

// Initialize the server start time
pub fn initialize_server_start_time() {
    INIT.call_once(|| {
        let _ = SERVER_START_TIME.set(Utc::now());
    });
}

/// Health check endpoint. Reports an error when the registry cannot be read.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API is healthy", body = HealthResponse),
        (status = 503, description = "Registry is unreadable", body = HealthResponse)
    ),
    tag = "health"
)]
#[instrument(skip(service))]
pub async fn health_check(State(service): State<PatientServiceHandle>) -> impl IntoResponse {
    info!("Health check requested");

    let now = Utc::now();
    let uptime = SERVER_START_TIME
        .get()
        .map(|start_time| (now - *start_time).num_seconds().max(0) as u64);

    let storage = match service.list_patients().await {
        Ok(registry) => ComponentHealthStatus {
            status: "ok".to_string(),
            message: Some(format!("{} patients registered", registry.len())),
        },
        Err(e) => {
            warn!("Registry unreadable during health check: {}", e);
            ComponentHealthStatus {
                status: "error".to_string(),
                message: Some("Patient registry could not be read".to_string()),
            }
        }
    };

    let healthy = storage.status == "ok";
    let response = HealthResponse {
        status: if healthy { "ok" } else { "error" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now,
        uptime,
        components: ComponentStatus { storage },
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
