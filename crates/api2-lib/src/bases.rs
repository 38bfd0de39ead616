//! Base name aliases.
//!
//! Callers may address a base by a configured name such as `Operations`
//! instead of its `app...` identifier.

use std::collections::HashMap;

/// Prefix shared by every base identifier on the remote service.
const BASE_ID_PREFIX: &str = "app";

/// Maps human-readable base names to base identifiers.
///
/// Lookups are case-insensitive. Identifiers and unknown names pass through
/// unchanged so the remote service can report them as missing.
#[derive(Debug, Clone, Default)]
pub struct BaseDirectory {
    aliases: HashMap<String, String>,
}

impl BaseDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alias.
    pub fn with_alias(mut self, name: impl AsRef<str>, id: impl Into<String>) -> Self {
        self.aliases
            .insert(name.as_ref().to_lowercase(), id.into());
        self
    }

    /// Parse a `Name=appId,Other=appId2` alias list.
    ///
    /// Entries without `=` or with an empty side are skipped.
    pub fn parse(spec: &str) -> Self {
        let mut directory = Self::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((name, id)) = entry.split_once('=') else {
                tracing::warn!(entry = %entry, "ignoring malformed base alias");
                continue;
            };
            let (name, id) = (name.trim(), id.trim());
            if name.is_empty() || id.is_empty() {
                continue;
            }
            directory = directory.with_alias(name, id);
        }
        directory
    }

    /// Resolve a base name or identifier to the identifier used upstream.
    pub fn resolve<'a>(&'a self, base: &'a str) -> &'a str {
        if looks_like_base_id(base) {
            return base;
        }
        self.aliases
            .get(&base.to_lowercase())
            .map(String::as_str)
            .unwrap_or(base)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

fn looks_like_base_id(base: &str) -> bool {
    base.len() == 17
        && base.starts_with(BASE_ID_PREFIX)
        && base.chars().all(|c| c.is_ascii_alphanumeric())
}
