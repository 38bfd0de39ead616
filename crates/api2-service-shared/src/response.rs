//! Response shaping for the record endpoints.
//!
//! Success bodies are the bare result unless the caller asked for metadata,
//! in which case they become `{result, meta}`. Error bodies are always
//! `{error: {message, statusCode}, meta}`.

use std::time::Instant;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::credentials::AUTH_KEY_PARAM;
use crate::request::{QueryParams, TablePath};

/// API version reported in `meta.params.version`.
pub const API_VERSION: u32 = 0;

/// Replacement for credential values echoed in metadata.
pub const REDACTED: &str = "[redacted]";

/// Path parameters plus the fixed version marker.
#[derive(Debug, Clone, Serialize)]
pub struct MetaParams {
    #[serde(flatten)]
    pub path: TablePath,
    pub version: u32,
}

/// Request metadata attached to error responses and, on request, to successes.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMeta {
    pub params: MetaParams,

    /// Query parameters with any credential redacted.
    pub query: QueryParams,

    /// Milliseconds elapsed between handler entry and response composition.
    pub duration: u64,

    #[serde(skip)]
    started: Instant,
}

impl ResponseMeta {
    /// Start collecting metadata for a request that entered the handler at `started`.
    pub fn new(path: &TablePath, query: &QueryParams, started: Instant) -> Self {
        let mut query = query.clone();
        if let Some(value) = query.get_mut(AUTH_KEY_PARAM) {
            *value = REDACTED.to_string();
        }

        Self {
            params: MetaParams {
                path: path.clone(),
                version: API_VERSION,
            },
            query,
            duration: 0,
            started,
        }
    }

    /// Stamp the elapsed time.
    pub fn finish(mut self) -> Self {
        self.duration = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Error description carried in the `error` field of a failure body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl ErrorPayload {
    /// Build a payload, substituting 500 for anything that is not an error status.
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        let status_code = match StatusCode::from_u16(status_code) {
            Ok(status) if status.is_client_error() || status.is_server_error() => status_code,
            _ => StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        };
        Self {
            message: message.into(),
            status_code,
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<&api2_lib::Error> for ErrorPayload {
    fn from(err: &api2_lib::Error) -> Self {
        Self::new(err.status_code(), err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct SuccessEnvelope<T> {
    result: T,
    meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
    meta: ResponseMeta,
}

/// Compose a 200 response around `result`.
pub fn compose_success<T: Serialize>(
    result: T,
    meta: ResponseMeta,
    include_meta: bool,
) -> Response {
    let meta = meta.finish();
    if include_meta {
        (StatusCode::OK, Json(SuccessEnvelope { result, meta })).into_response()
    } else {
        (StatusCode::OK, Json(result)).into_response()
    }
}

/// Compose an error response; metadata is always included.
pub fn compose_failure(error: ErrorPayload, meta: ResponseMeta) -> Response {
    let meta = meta.finish();
    let status = error.status();
    (status, Json(ErrorEnvelope { error, meta })).into_response()
}
