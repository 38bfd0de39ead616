//! Record access for the api2 gateway.
//!
//! This crate owns everything below the HTTP layer:
//!
//! - [`RequestOptions`] and [`SelectFilter`]: the typed description of one lookup
//! - [`RecordSource`]: the asynchronous accessor seam used by the service
//! - [`AirtableClient`]: the production accessor talking to the Airtable REST API
//! - [`BaseDirectory`]: human-readable base names to base identifiers
//! - [`Error`]: a tagged error carrying the HTTP status it maps to

#![deny(warnings)]

pub mod airtable;
pub mod bases;
pub mod error;
pub mod options;
pub mod record;
pub mod source;

pub use airtable::{AirtableClient, AirtableConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use bases::BaseDirectory;
pub use error::{Error, Result};
pub use options::{CellFormat, RequestOptions, SelectFilter, SortDirection, SortSpec};
pub use record::Record;
pub use source::RecordSource;
