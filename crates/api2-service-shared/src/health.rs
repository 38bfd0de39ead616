//! Liveness handlers: `/`, `/ping` and the `/health/*` probes.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Where `GET /` sends visitors.
pub const REPOSITORY_URL: &str = "https://github.com/hackclub/api2";

/// Body of `GET /ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pong {
    pub message: String,
}

/// Health status response for liveness and readiness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status indicator, always "ok" while the process serves requests.
    pub status: String,

    /// Service name for identification.
    pub service: String,

    /// Service version from build-time.
    pub version: String,

    /// Runtime mode (for readiness check).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl HealthStatus {
    /// Create a healthy liveness status.
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            mode: None,
        }
    }

    /// Create a ready status including the runtime mode.
    pub fn ready(service: &str, version: &str, mode: &str) -> Self {
        Self {
            mode: Some(mode.to_string()),
            ..Self::alive(service, version)
        }
    }
}

/// `GET /`: redirect to the project repository.
pub async fn root_redirect() -> Response {
    (StatusCode::FOUND, [(LOCATION, REPOSITORY_URL)]).into_response()
}

/// `GET /ping`: `{"message":"pong!"}`.
pub async fn ping() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(Pong {
            message: "pong!".to_string(),
        }),
    )
}

/// Liveness probe handler.
///
/// ```text
/// GET /health/live
/// {"status":"ok","service":"api2-service-shared","version":"0.1.0"}
/// ```
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness probe handler.
///
/// The service holds no remote connections of its own, so it is ready as
/// soon as state is built. Upstream reachability is not probed.
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let status = HealthStatus::ready(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        state.mode().as_str(),
    );
    (StatusCode::OK, Json(status))
}
