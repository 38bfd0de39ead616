//! Typed request options handed to a [`RecordSource`](crate::RecordSource).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Everything an accessor needs to perform one lookup.
///
/// Built once per request by the HTTP layer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// Base identifier: either an ID (`appXXXXXXXXXXXXXX`) or a human-readable name.
    pub base: String,
    /// Table name within the base.
    pub table_name: String,
    /// Record identifier for single-record lookups.
    pub record_id: Option<String>,
    /// Optional filter narrowing a multi-record lookup.
    pub select: Option<SelectFilter>,
    /// Credential forwarded to the remote service.
    pub auth_key: Option<String>,
}

impl RequestOptions {
    /// Options for a whole-table lookup.
    pub fn new(base: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            table_name: table_name.into(),
            record_id: None,
            select: None,
            auth_key: None,
        }
    }

    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub fn with_select(mut self, select: SelectFilter) -> Self {
        self.select = Some(select);
        self
    }

    pub fn with_auth_key(mut self, auth_key: Option<String>) -> Self {
        self.auth_key = auth_key;
        self
    }
}

/// Structured filter accepted in the `select` query parameter.
///
/// Keys follow the remote service's naming so a caller can paste the same
/// document they would send upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SelectFilter {
    /// Only return these fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,

    /// Formula evaluated per record; records for which it is falsy are dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_by_formula: Option<String>,

    /// Upper bound on the total number of records returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_records: Option<u32>,

    /// Records per upstream page (the remote caps this at 100).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortSpec>,

    /// Name or ID of a view whose filters and ordering apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_format: Option<CellFormat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_locale: Option<String>,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellFormat {
    Json,
    String,
}

impl CellFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellFormat::Json => "json",
            CellFormat::String => "string",
        }
    }
}

impl SelectFilter {
    /// Parse a filter from its JSON text.
    ///
    /// Malformed JSON or unknown keys yield [`Error::InvalidSelect`].
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::InvalidSelect {
            message: e.to_string(),
        })
    }

    /// Encode the filter as remote query parameters.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        for field in &self.fields {
            pairs.push(("fields[]".to_string(), field.clone()));
        }
        if let Some(formula) = &self.filter_by_formula {
            pairs.push(("filterByFormula".to_string(), formula.clone()));
        }
        if let Some(max) = self.max_records {
            pairs.push(("maxRecords".to_string(), max.to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("pageSize".to_string(), size.to_string()));
        }
        for (i, spec) in self.sort.iter().enumerate() {
            pairs.push((format!("sort[{}][field]", i), spec.field.clone()));
            pairs.push((
                format!("sort[{}][direction]", i),
                spec.direction.as_str().to_string(),
            ));
        }
        if let Some(view) = &self.view {
            pairs.push(("view".to_string(), view.clone()));
        }
        if let Some(format) = self.cell_format {
            pairs.push(("cellFormat".to_string(), format.as_str().to_string()));
        }
        if let Some(tz) = &self.time_zone {
            pairs.push(("timeZone".to_string(), tz.clone()));
        }
        if let Some(locale) = &self.user_locale {
            pairs.push(("userLocale".to_string(), locale.clone()));
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_filter() {
        let raw = r#"{
            "fields": ["Name", "Leader"],
            "filterByFormula": "{Status} = 'Active'",
            "maxRecords": 20,
            "sort": [{"field": "Name", "direction": "desc"}],
            "view": "Grid view"
        }"#;

        let filter = SelectFilter::parse(raw).unwrap();
        assert_eq!(filter.fields, vec!["Name", "Leader"]);
        assert_eq!(
            filter.filter_by_formula.as_deref(),
            Some("{Status} = 'Active'")
        );
        assert_eq!(filter.max_records, Some(20));
        assert_eq!(filter.sort[0].direction, SortDirection::Desc);
        assert_eq!(filter.view.as_deref(), Some("Grid view"));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = SelectFilter::parse("{badjson").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().starts_with("Invalid select parameter"));
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = SelectFilter::parse(r#"{"limit": 5}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidSelect { .. }));
    }

    #[test]
    fn test_sort_direction_defaults_to_asc() {
        let filter = SelectFilter::parse(r#"{"sort":[{"field":"Name"}]}"#).unwrap();
        assert_eq!(filter.sort[0].direction, SortDirection::Asc);
    }

    #[test]
    fn test_query_pairs() {
        let filter = SelectFilter {
            fields: vec!["Name".to_string()],
            max_records: Some(3),
            sort: vec![SortSpec {
                field: "Created".to_string(),
                direction: SortDirection::Desc,
            }],
            cell_format: Some(CellFormat::String),
            ..Default::default()
        };

        let pairs = filter.to_query_pairs();
        assert!(pairs.contains(&("fields[]".to_string(), "Name".to_string())));
        assert!(pairs.contains(&("maxRecords".to_string(), "3".to_string())));
        assert!(pairs.contains(&("sort[0][field]".to_string(), "Created".to_string())));
        assert!(pairs.contains(&("sort[0][direction]".to_string(), "desc".to_string())));
        assert!(pairs.contains(&("cellFormat".to_string(), "string".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "view"));
    }

    #[test]
    fn test_options_builder() {
        let options = RequestOptions::new("Operations", "Clubs")
            .with_record_id("rec123")
            .with_auth_key(Some("keyABC".to_string()));

        assert_eq!(options.base, "Operations");
        assert_eq!(options.table_name, "Clubs");
        assert_eq!(options.record_id.as_deref(), Some("rec123"));
        assert_eq!(options.auth_key.as_deref(), Some("keyABC"));
        assert!(options.select.is_none());
    }
}
