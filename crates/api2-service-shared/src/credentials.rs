//! Caller credential resolution.

use axum::http::{HeaderMap, header::AUTHORIZATION};

use crate::config::RuntimeMode;

const BEARER_PREFIX: &str = "Bearer ";

/// Query parameter carrying the credential outside production.
pub const AUTH_KEY_PARAM: &str = "authKey";

/// Resolves the credential a request should be forwarded with.
///
/// In production the credential comes from `Authorization: Bearer <key>`.
/// In development and test modes it comes from the `authKey` query
/// parameter instead, and the header is ignored.
#[derive(Debug, Clone, Copy)]
pub struct CredentialResolver {
    mode: RuntimeMode,
}

impl CredentialResolver {
    pub fn new(mode: RuntimeMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    /// Resolve from a raw header value and the `authKey` query value.
    pub fn resolve(&self, authorization: Option<&str>, query_key: Option<&str>) -> Option<String> {
        if self.mode.allows_query_credential() {
            return query_key.map(str::to_string);
        }

        authorization.map(|value| value.strip_prefix(BEARER_PREFIX).unwrap_or(value).to_string())
    }

    /// Resolve from request headers and the `authKey` query value.
    ///
    /// A header that is not valid visible ASCII counts as absent.
    pub fn resolve_headers(&self, headers: &HeaderMap, query_key: Option<&str>) -> Option<String> {
        let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        self.resolve(authorization, query_key)
    }
}
