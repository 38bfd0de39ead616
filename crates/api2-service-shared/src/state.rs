//! Application state for the HTTP service.
//!
//! This module provides the shared state structure that axum handlers use to
//! reach the record accessor and the credential resolver.

use std::sync::Arc;

use api2_lib::{AirtableClient, Error as LibError, RecordSource};
use thiserror::Error;

use crate::config::{RuntimeMode, ServiceConfig};
use crate::credentials::CredentialResolver;

/// Error during application state initialization.
#[derive(Debug, Error)]
pub enum AppStateError {
    /// The Airtable client could not be constructed.
    #[error("failed to build record client: {0}")]
    ClientBuild(#[from] LibError),
}

/// Shared application state for all axum handlers.
///
/// This struct is cheaply cloneable (using `Arc` internally) and should be
/// shared via axum's `State` extractor. Nothing in it is mutable, so requests
/// never coordinate with each other.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::get, extract::State};
/// use api2_service_shared::{AppState, ServiceConfig};
///
/// async fn handler(State(state): State<AppState>) {
///     let source = state.source();
///     // ... fetch records
/// }
///
/// let config = ServiceConfig::from_env().unwrap();
/// let state = AppState::from_config(&config).unwrap();
/// let app = Router::new()
///     .route("/v0/{base}/{tableName}", get(handler))
///     .with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    source: Arc<dyn RecordSource>,
    credentials: CredentialResolver,
}

impl AppState {
    /// Build state backed by the Airtable client described in `config`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, AppStateError> {
        let client = AirtableClient::new(config.airtable.clone())?;
        tracing::info!(
            api_url = %config.airtable.api_url,
            timeout_secs = config.airtable.timeout.as_secs(),
            base_aliases = config.airtable.bases.len(),
            "record client ready"
        );

        Ok(Self::from_components(
            Arc::new(client),
            CredentialResolver::new(config.mode),
        ))
    }

    /// Create application state from pre-built components.
    ///
    /// This is useful for testing with a stand-in accessor.
    pub fn from_components(source: Arc<dyn RecordSource>, credentials: CredentialResolver) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                source,
                credentials,
            }),
        }
    }

    /// Access the record accessor.
    pub fn source(&self) -> &dyn RecordSource {
        self.inner.source.as_ref()
    }

    pub fn credentials(&self) -> &CredentialResolver {
        &self.inner.credentials
    }

    pub fn mode(&self) -> RuntimeMode {
        self.inner.credentials.mode()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}
