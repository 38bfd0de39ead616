//! Airtable REST client implementing [`RecordSource`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::bases::BaseDirectory;
use crate::error::{Error, Result};
use crate::options::RequestOptions;
use crate::record::Record;
use crate::source::RecordSource;

/// Public Airtable API root.
pub const DEFAULT_API_URL: &str = "https://api.airtable.com";

/// Default network timeout for a single upstream call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_VERSION: &str = "v0";
const USER_AGENT: &str = concat!("api2/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`AirtableClient`].
#[derive(Debug, Clone)]
pub struct AirtableConfig {
    /// API root, without the version segment.
    pub api_url: String,
    pub timeout: Duration,
    pub bases: BaseDirectory,
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            bases: BaseDirectory::default(),
        }
    }
}

/// Reads records from Airtable on behalf of the caller's credential.
#[derive(Debug, Clone)]
pub struct AirtableClient {
    http: Client,
    api_url: Url,
    bases: BaseDirectory,
}

#[derive(Debug, Deserialize)]
struct ListPage {
    records: Vec<Record>,
    #[serde(default)]
    offset: Option<String>,
}

impl AirtableClient {
    /// Build a client from `config`.
    pub fn new(config: AirtableConfig) -> Result<Self> {
        let api_url =
            Url::parse(&config.api_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        if api_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(config.api_url));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            api_url,
            bases: config.bases,
        })
    }

    fn table_url(&self, options: &RequestOptions) -> Result<Url> {
        let mut url = self.api_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::InvalidUrl(self.api_url.to_string()))?;
            segments
                .pop_if_empty()
                .push(API_VERSION)
                .push(self.bases.resolve(&options.base))
                .push(&options.table_name);
            if let Some(record_id) = &options.record_id {
                segments.push(record_id);
            }
        }
        Ok(url)
    }

    async fn get(&self, url: Url, query: &[(String, String)], auth_key: &str) -> Result<Response> {
        debug!(url = %url, params = query.len(), "requesting records");

        let response = self
            .http
            .get(url)
            .query(query)
            .header(AUTHORIZATION, format!("Bearer {}", auth_key))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(upstream_error(response).await)
        }
    }
}

#[async_trait]
impl RecordSource for AirtableClient {
    async fn fetch_one(&self, options: &RequestOptions, auth_key: Option<&str>) -> Result<Record> {
        let auth_key = auth_key.ok_or(Error::MissingCredential)?;
        if options.record_id.is_none() {
            return Err(Error::upstream(404, "Record not found"));
        }

        let url = self.table_url(options)?;
        let response = self.get(url.clone(), &[], auth_key).await?;
        response.json::<Record>().await.map_err(|e| Error::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn fetch_many(
        &self,
        options: &RequestOptions,
        auth_key: Option<&str>,
    ) -> Result<Vec<Record>> {
        let auth_key = auth_key.ok_or(Error::MissingCredential)?;

        let url = self.table_url(&RequestOptions {
            record_id: None,
            ..options.clone()
        })?;
        let base_query = options
            .select
            .as_ref()
            .map(|s| s.to_query_pairs())
            .unwrap_or_default();
        let max_records = options
            .select
            .as_ref()
            .and_then(|s| s.max_records)
            .map(|m| m as usize);

        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut query = base_query.clone();
            if let Some(cursor) = &offset {
                query.push(("offset".to_string(), cursor.clone()));
            }

            let response = self.get(url.clone(), &query, auth_key).await?;
            let page = response.json::<ListPage>().await.map_err(|e| Error::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?;

            records.extend(page.records);

            if let Some(max) = max_records {
                if records.len() >= max {
                    records.truncate(max);
                    break;
                }
            }

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!(count = records.len(), table = %options.table_name, "fetched records");
        Ok(records)
    }
}

/// Turn a non-success response into an [`Error::Upstream`].
///
/// The remote service reports errors either as
/// `{"error": {"type": "...", "message": "..."}}` or as `{"error": "TYPE"}`.
async fn upstream_error(response: Response) -> Error {
    let status = response.status();
    let fallback = status
        .canonical_reason()
        .unwrap_or("Upstream request failed")
        .to_string();

    let message = match response.json::<Value>().await {
        Ok(body) => error_message(&body).unwrap_or(fallback),
        Err(_) => fallback,
    };

    Error::upstream(status.as_u16(), message)
}

fn error_message(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::String(kind) => Some(kind.clone()),
        Value::Object(detail) => detail
            .get("message")
            .or_else(|| detail.get("type"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> AirtableClient {
        AirtableClient::new(AirtableConfig {
            bases: BaseDirectory::new().with_alias("Operations", "apptEEFG5HTfGQE7h"),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_table_url_resolves_alias() {
        let url = client()
            .table_url(&RequestOptions::new("Operations", "Clubs"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.airtable.com/v0/apptEEFG5HTfGQE7h/Clubs"
        );
    }

    #[test]
    fn test_table_url_encodes_segments() {
        let url = client()
            .table_url(&RequestOptions::new("Operations", "Club Leaders").with_record_id("rec1"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.airtable.com/v0/apptEEFG5HTfGQE7h/Club%20Leaders/rec1"
        );
    }

    #[test]
    fn test_new_rejects_bad_url() {
        let result = AirtableClient::new(AirtableConfig {
            api_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(&json!({"error": {"type": "NOT_FOUND", "message": "Could not find table"}})),
            Some("Could not find table".to_string())
        );
        assert_eq!(
            error_message(&json!({"error": {"type": "INVALID_PERMISSIONS"}})),
            Some("INVALID_PERMISSIONS".to_string())
        );
        assert_eq!(
            error_message(&json!({"error": "NOT_FOUND"})),
            Some("NOT_FOUND".to_string())
        );
        assert_eq!(error_message(&json!({"ok": true})), None);
    }

    #[tokio::test]
    async fn test_missing_credential_short_circuits() {
        let options = RequestOptions::new("Operations", "Clubs").with_record_id("rec1");
        let err = client().fetch_one(&options, None).await.unwrap_err();
        assert!(matches!(err, Error::MissingCredential));
        assert_eq!(err.status_code(), 401);

        let err = client().fetch_many(&options, None).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
    }
}
