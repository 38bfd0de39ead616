//! api2 REST gateway.
//!
//! Serves Airtable records as JSON.
//!
//! # Endpoints
//!
//! - `GET /` - Redirect to the project repository
//! - `GET /ping` - `{"message":"pong!"}`
//! - `GET /v0/{base}/{tableName}` - All records in a table
//! - `GET /v0/{base}/{tableName}/{recordID}` - A single record
//! - `GET /metrics` - Prometheus metrics endpoint
//! - `GET /health/live`, `GET /health/ready` - Liveness and readiness probes
//!
//! # Query parameters (record endpoints)
//!
//! - `authKey` - Credential, honoured only outside production
//! - `select` - JSON filter, e.g. `{"filterByFormula":"{Status}='Active'","maxRecords":10}`
//! - `meta` - Any non-empty value wraps the result as `{result, meta}`

#![deny(warnings)]

use std::time::Instant;

use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::{HeaderMap, Uri},
    response::Response,
    routing::get,
};
use serde::Serialize;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};
use tracing::{error, info};

use api2_lib::{RequestOptions, Result as LibResult};
use api2_service_shared::{
    AUTH_KEY_PARAM, AppState, ErrorPayload, MetricsLayer, QueryParams, ResponseMeta, TablePath,
    build_options, compose_failure, compose_success, health_live, health_ready, metrics_handler,
    ping, record_fetch_failed, record_fetch_succeeded, report_panic, root_redirect, wants_meta,
};

/// Build the service router.
///
/// `metrics_path` mounts the Prometheus endpoint when set.
pub fn router(state: AppState, metrics_path: Option<&str>) -> Router {
    let mut router = Router::new()
        .route("/", get(root_redirect))
        .route("/ping", get(ping))
        .route("/v0/{base}/{tableName}", get(fetch_records))
        .route("/v0/{base}/{tableName}/{recordID}", get(fetch_record))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready));

    if let Some(path) = metrics_path {
        router = router.route(path, get(metrics_handler));
    }

    router
        .layer(CatchPanicLayer::custom(report_panic))
        .layer(MetricsLayer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Which accessor operation a route performs.
#[derive(Debug, Clone, Copy)]
enum Lookup {
    One,
    Many,
}

impl Lookup {
    fn label(self) -> &'static str {
        match self {
            Lookup::One => "one",
            Lookup::Many => "many",
        }
    }
}

/// A record request that passed input parsing.
struct Prepared {
    options: RequestOptions,
    meta: ResponseMeta,
    include_meta: bool,
}

impl Prepared {
    /// Parse path, query and credentials. Failures are already shaped as responses.
    fn parse(
        state: &AppState,
        request: RecordRequest,
        started: Instant,
        lookup: Lookup,
    ) -> Result<Self, Response> {
        let RecordRequest {
            path,
            uri,
            headers,
            query,
        } = request;

        let query = match query {
            Ok(Query(query)) => Ok(query),
            Err(rejection) => Err(ErrorPayload::new(
                rejection.status().as_u16(),
                rejection.body_text(),
            )),
        };

        let path = match path {
            Ok(Path(path)) => path,
            Err(rejection) => {
                let empty = QueryParams::new();
                let params = query.as_ref().unwrap_or(&empty);
                let raw = TablePath::from_raw_path(uri.path());
                let meta = ResponseMeta::new(&raw, params, started);
                let payload = ErrorPayload::new(rejection.status().as_u16(), rejection.body_text());
                return Err(fail(payload, meta, lookup));
            }
        };

        let query = match query {
            Ok(query) => query,
            Err(payload) => {
                let meta = ResponseMeta::new(&path, &QueryParams::new(), started);
                return Err(fail(payload, meta, lookup));
            }
        };

        let meta = ResponseMeta::new(&path, &query, started);
        let auth_key = state
            .credentials()
            .resolve_headers(&headers, query.get(AUTH_KEY_PARAM).map(String::as_str));

        match build_options(&path, &query, auth_key) {
            Ok(options) => Ok(Self {
                options,
                meta,
                include_meta: wants_meta(&query),
            }),
            Err(err) => Err(fail(ErrorPayload::from(&err), meta, lookup)),
        }
    }

    fn respond<T: Serialize>(self, result: LibResult<(T, usize)>, lookup: Lookup) -> Response {
        match result {
            Ok((body, count)) => {
                record_fetch_succeeded(lookup.label(), count);
                info!(
                    operation = lookup.label(),
                    table = %self.options.table_name,
                    count,
                    "records fetched"
                );
                compose_success(body, self.meta, self.include_meta)
            }
            Err(err) => fail(ErrorPayload::from(&err), self.meta, lookup),
        }
    }
}

/// Raw extractor output for a record route.
///
/// Rejections are kept so they can be answered with the error envelope.
struct RecordRequest {
    path: Result<Path<TablePath>, PathRejection>,
    uri: Uri,
    headers: HeaderMap,
    query: Result<Query<QueryParams>, QueryRejection>,
}

fn fail(payload: ErrorPayload, meta: ResponseMeta, lookup: Lookup) -> Response {
    error!(status = payload.status_code, "{}", payload.message);
    record_fetch_failed(lookup.label(), payload.status_code);
    compose_failure(payload, meta)
}

/// Handle `GET /v0/{base}/{tableName}/{recordID}`.
async fn fetch_record(
    State(state): State<AppState>,
    path: Result<Path<TablePath>, PathRejection>,
    uri: Uri,
    headers: HeaderMap,
    query: Result<Query<QueryParams>, QueryRejection>,
) -> Response {
    let started = Instant::now();
    let request = RecordRequest {
        path,
        uri,
        headers,
        query,
    };
    let prepared = match Prepared::parse(&state, request, started, Lookup::One) {
        Ok(prepared) => prepared,
        Err(response) => return response,
    };

    let result = state
        .source()
        .fetch_one(&prepared.options, prepared.options.auth_key.as_deref())
        .await
        .map(|record| (record, 1));

    prepared.respond(result, Lookup::One)
}

/// Handle `GET /v0/{base}/{tableName}`.
async fn fetch_records(
    State(state): State<AppState>,
    path: Result<Path<TablePath>, PathRejection>,
    uri: Uri,
    headers: HeaderMap,
    query: Result<Query<QueryParams>, QueryRejection>,
) -> Response {
    let started = Instant::now();
    let request = RecordRequest {
        path,
        uri,
        headers,
        query,
    };
    let prepared = match Prepared::parse(&state, request, started, Lookup::Many) {
        Ok(prepared) => prepared,
        Err(response) => return response,
    };

    let result = state
        .source()
        .fetch_many(&prepared.options, prepared.options.auth_key.as_deref())
        .await
        .map(|records| {
            let count = records.len();
            (records, count)
        });

    prepared.respond(result, Lookup::Many)
}
