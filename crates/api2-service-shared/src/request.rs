//! Path and query parameter types for the record endpoints.

use std::collections::BTreeMap;

use api2_lib::{RequestOptions, Result, SelectFilter};
use serde::{Deserialize, Serialize};

/// Query parameter holding a JSON-encoded [`SelectFilter`].
pub const SELECT_PARAM: &str = "select";

/// Query parameter asking for `{result, meta}` on success.
pub const META_PARAM: &str = "meta";

/// Path parameters shared by both record routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePath {
    pub base: String,

    #[serde(rename = "tableName")]
    pub table_name: String,

    #[serde(rename = "recordID", default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl TablePath {
    /// Path parameters read straight off a raw `/v0/...` request path.
    ///
    /// Used when the route matched but its segments could not be decoded.
    /// Segments stay percent-encoded.
    pub fn from_raw_path(path: &str) -> Self {
        let mut segments = path
            .trim_start_matches('/')
            .split('/')
            .skip(1)
            .map(str::to_string);

        Self {
            base: segments.next().unwrap_or_default(),
            table_name: segments.next().unwrap_or_default(),
            record_id: segments.next(),
        }
    }
}

/// Query parameters of a record request, keyed by name.
pub type QueryParams = BTreeMap<String, String>;

/// Build the options for one lookup.
///
/// `base` and `tableName` are not validated here; unknown names surface as
/// errors from the accessor. A `select` value that is not a valid filter
/// document fails with a 400-class error.
pub fn build_options(
    path: &TablePath,
    query: &QueryParams,
    auth_key: Option<String>,
) -> Result<RequestOptions> {
    let mut options =
        RequestOptions::new(path.base.clone(), path.table_name.clone()).with_auth_key(auth_key);

    if let Some(record_id) = &path.record_id {
        options = options.with_record_id(record_id.clone());
    }

    if let Some(raw) = query.get(SELECT_PARAM).filter(|raw| !raw.is_empty()) {
        options = options.with_select(SelectFilter::parse(raw)?);
    }

    Ok(options)
}

/// Whether the caller asked for metadata on success.
///
/// Any non-empty value counts, including `0` and `false`.
pub fn wants_meta(query: &QueryParams) -> bool {
    query.get(META_PARAM).is_some_and(|v| !v.is_empty())
}
