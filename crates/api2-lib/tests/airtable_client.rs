//! AirtableClient against an in-process stand-in for the Airtable REST API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use api2_lib::{
    AirtableClient, AirtableConfig, BaseDirectory, Error, RecordSource, RequestOptions,
    SelectFilter,
};
use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

const BASE_ID: &str = "apptEEFG5HTfGQE7h";
const GOOD_KEY: &str = "keyGood";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", GOOD_KEY))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": {"type": "AUTHENTICATION_REQUIRED", "message": "Authentication required"}})),
    )
        .into_response()
}

async fn list_records(
    Path((base, table)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if base != BASE_ID || table != "Clubs" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"type": "TABLE_NOT_FOUND", "message": "Could not find table Clubs in application"}})),
        )
            .into_response();
    }

    if let Some(formula) = query.get("filterByFormula") {
        if formula == "BROKEN(" {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"error": {"type": "INVALID_FILTER_BY_FORMULA", "message": "The formula for filtering records is invalid"}})),
            )
                .into_response();
        }
        return Json(json!({"records": [{"id": "r1", "fields": {"Name": "Alpha"}}]}))
            .into_response();
    }

    match query.get("offset").map(String::as_str) {
        None => Json(json!({
            "records": [
                {"id": "r1", "fields": {"Name": "Alpha"}},
                {"id": "r2", "fields": {"Name": "Beta"}}
            ],
            "offset": "page2"
        }))
        .into_response(),
        Some("page2") => Json(json!({
            "records": [{"id": "r3", "fields": {"Name": "Gamma"}}]
        }))
        .into_response(),
        Some(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "LIST_RECORDS_ITERATOR_NOT_AVAILABLE"})),
        )
            .into_response(),
    }
}

async fn get_record(
    Path((base, _table, record_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if base != BASE_ID || record_id != "rec123" {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "NOT_FOUND"}))).into_response();
    }
    Json(json!({
        "id": "rec123",
        "createdTime": "2018-01-01T00:00:00.000Z",
        "fields": {"Name": "Foo"}
    }))
    .into_response()
}

async fn spawn_fake_airtable() -> SocketAddr {
    let app = Router::new()
        .route("/v0/{base}/{table}", get(list_records))
        .route("/v0/{base}/{table}/{record}", get(get_record));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake airtable");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn client() -> AirtableClient {
    let addr = spawn_fake_airtable().await;
    AirtableClient::new(AirtableConfig {
        api_url: format!("http://{}", addr),
        timeout: Duration::from_secs(5),
        bases: BaseDirectory::new().with_alias("Operations", BASE_ID),
    })
    .expect("client")
}

#[tokio::test]
async fn fetch_many_follows_offsets() {
    let client = client().await;
    let options = RequestOptions::new("Operations", "Clubs");

    let records = client
        .fetch_many(&options, Some(GOOD_KEY))
        .await
        .expect("records");

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2", "r3"]);
}

#[tokio::test]
async fn fetch_many_stops_at_max_records() {
    let client = client().await;
    let select = SelectFilter::parse(r#"{"maxRecords": 1}"#).unwrap();
    let options = RequestOptions::new("Operations", "Clubs").with_select(select);

    let records = client.fetch_many(&options, Some(GOOD_KEY)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "r1");
}

#[tokio::test]
async fn fetch_many_forwards_formula() {
    let client = client().await;
    let select = SelectFilter::parse(r#"{"filterByFormula": "{Name} = 'Alpha'"}"#).unwrap();
    let options = RequestOptions::new("Operations", "Clubs").with_select(select);

    let records = client.fetch_many(&options, Some(GOOD_KEY)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fields["Name"], "Alpha");
}

#[tokio::test]
async fn fetch_many_passes_through_upstream_422() {
    let client = client().await;
    let select = SelectFilter::parse(r#"{"filterByFormula": "BROKEN("}"#).unwrap();
    let options = RequestOptions::new("Operations", "Clubs").with_select(select);

    let err = client.fetch_many(&options, Some(GOOD_KEY)).await.unwrap_err();
    assert_eq!(err.status_code(), 422);
    assert_eq!(err.to_string(), "The formula for filtering records is invalid");
}

#[tokio::test]
async fn fetch_many_unknown_table_is_404() {
    let client = client().await;
    let options = RequestOptions::new("Operations", "Nope");

    let err = client.fetch_many(&options, Some(GOOD_KEY)).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn fetch_one_returns_record() {
    let client = client().await;
    let options = RequestOptions::new(BASE_ID, "Clubs").with_record_id("rec123");

    let record = client.fetch_one(&options, Some(GOOD_KEY)).await.unwrap();
    assert_eq!(record.id, "rec123");
    assert_eq!(record.fields["Name"], "Foo");
    assert_eq!(
        record.created_time.as_deref(),
        Some("2018-01-01T00:00:00.000Z")
    );
}

#[tokio::test]
async fn fetch_one_missing_record_is_404() {
    let client = client().await;
    let options = RequestOptions::new("Operations", "Clubs").with_record_id("recMissing");

    let err = client.fetch_one(&options, Some(GOOD_KEY)).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(err.to_string(), "NOT_FOUND");
}

#[tokio::test]
async fn bad_credential_is_401() {
    let client = client().await;
    let options = RequestOptions::new("Operations", "Clubs").with_record_id("rec123");

    let err = client.fetch_one(&options, Some("keyBad")).await.unwrap_err();
    assert!(matches!(err, Error::Upstream { status: 401, .. }));
    assert_eq!(err.to_string(), "Authentication required");
}

#[tokio::test]
async fn unreachable_upstream_is_502() {
    let client = AirtableClient::new(AirtableConfig {
        // Port 9 (discard) is not expected to accept HTTP connections locally.
        api_url: "http://127.0.0.1:9".to_string(),
        timeout: Duration::from_secs(2),
        ..Default::default()
    })
    .unwrap();
    let options = RequestOptions::new("Operations", "Clubs");

    let err = client.fetch_many(&options, Some(GOOD_KEY)).await.unwrap_err();
    assert_eq!(err.status_code(), 502);
}
