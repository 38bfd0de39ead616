//! Test utilities for handler testing.
//!
//! This module provides a scripted [`RecordSource`] that records every call
//! it receives, plus helpers for building application state around it.

use std::sync::{Arc, Mutex};

use api2_lib::{Error, Record, RecordSource, RequestOptions, Result};
use async_trait::async_trait;

use crate::config::RuntimeMode;
use crate::credentials::CredentialResolver;
use crate::state::AppState;

/// Which accessor operation was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchOne,
    FetchMany,
}

/// One recorded accessor invocation.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: Operation,
    pub options: RequestOptions,
    pub auth_key: Option<String>,
}

/// Scripted accessor returning canned records or a canned failure.
#[derive(Debug, Default)]
pub struct MockSource {
    record: Option<Record>,
    records: Vec<Record>,
    failure: Option<(u16, String)>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record returned by `fetch_one`.
    pub fn with_record(mut self, record: Record) -> Self {
        self.record = Some(record);
        self
    }

    /// Records returned by `fetch_many`.
    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }

    /// Make every call fail with an upstream error.
    pub fn failing(mut self, status: u16, message: impl Into<String>) -> Self {
        self.failure = Some((status, message.into()));
        self
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record_call(&self, operation: Operation, options: &RequestOptions, auth_key: Option<&str>) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(MockCall {
                operation,
                options: options.clone(),
                auth_key: auth_key.map(str::to_string),
            });
    }

    fn failure(&self) -> Option<Error> {
        self.failure
            .as_ref()
            .map(|(status, message)| Error::upstream(*status, message.clone()))
    }
}

#[async_trait]
impl RecordSource for MockSource {
    async fn fetch_one(&self, options: &RequestOptions, auth_key: Option<&str>) -> Result<Record> {
        self.record_call(Operation::FetchOne, options, auth_key);
        if let Some(err) = self.failure() {
            return Err(err);
        }
        self.record
            .clone()
            .ok_or_else(|| Error::upstream(404, "Record not found"))
    }

    async fn fetch_many(
        &self,
        options: &RequestOptions,
        auth_key: Option<&str>,
    ) -> Result<Vec<Record>> {
        self.record_call(Operation::FetchMany, options, auth_key);
        if let Some(err) = self.failure() {
            return Err(err);
        }
        Ok(self.records.clone())
    }
}

/// Build application state around `source` in the given mode.
pub fn test_state(source: Arc<MockSource>, mode: RuntimeMode) -> AppState {
    AppState::from_components(source, CredentialResolver::new(mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls() {
        let source = MockSource::new().with_records(vec![Record::new("r1")]);
        let options = RequestOptions::new("Operations", "Clubs");

        let records = source.fetch_many(&options, Some("keyABC")).await.unwrap();
        assert_eq!(records.len(), 1);

        let calls = source.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].operation, Operation::FetchMany);
        assert_eq!(calls[0].auth_key.as_deref(), Some("keyABC"));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let source = MockSource::new().failing(429, "Rate limited");
        let options = RequestOptions::new("Operations", "Clubs").with_record_id("rec1");

        let err = source.fetch_one(&options, None).await.unwrap_err();
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.to_string(), "Rate limited");
    }

    #[tokio::test]
    async fn test_mock_missing_record_is_404() {
        let source = MockSource::new();
        let options = RequestOptions::new("Operations", "Clubs").with_record_id("rec1");

        let err = source.fetch_one(&options, Some("k")).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
