//! Shared HTTP infrastructure for the api2 gateway.
//!
//! This crate holds everything between axum and the record accessor:
//!
//! - [`ServiceConfig`]: startup configuration read from the environment
//! - [`CredentialResolver`]: picks the caller credential per runtime mode
//! - [`build_options`]: turns path and query parameters into request options
//! - [`ResponseMeta`], [`compose_success`], [`compose_failure`]: response shaping
//! - [`AppState`]: the shared accessor and resolver
//! - [`health`]: `/`, `/ping` and the health probes
//! - [`metrics`]: Prometheus metrics infrastructure
//! - [`logging`]: Structured JSON logging setup
//! - [`middleware`]: Request tracking, metrics and panic reporting
//!
//! # Request pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Resolve credential (header or authKey)                   │
//! │  - Build RequestOptions (parse select)                      │
//! │  - Call RecordSource::fetch_one / fetch_many                │
//! │  - Compose bare result, {result, meta} or {error, meta}     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides a scripted accessor for handler
//! testing. Enable the `test-utils` feature to access it from dependent crates.

#![deny(warnings)]

pub mod config;
mod credentials;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod request;
mod response;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConfigError, DEFAULT_PORT, RuntimeMode, ServiceConfig};
pub use credentials::{AUTH_KEY_PARAM, CredentialResolver};
pub use health::{HealthStatus, REPOSITORY_URL, health_live, health_ready, ping, root_redirect};
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use metrics::{
    MetricsConfig, MetricsError, init_metrics, metrics_handler, record_fetch_failed,
    record_fetch_succeeded,
};
pub use middleware::{MetricsLayer, RequestId, extract_or_generate_request_id, report_panic};
pub use request::{META_PARAM, QueryParams, SELECT_PARAM, TablePath, build_options, wants_meta};
pub use response::{
    API_VERSION, ErrorPayload, MetaParams, REDACTED, ResponseMeta, compose_failure,
    compose_success,
};
pub use state::{AppState, AppStateError};
