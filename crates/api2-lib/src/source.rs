//! The accessor seam between the HTTP layer and the remote record store.

use async_trait::async_trait;

use crate::error::Result;
use crate::options::RequestOptions;
use crate::record::Record;

/// Asynchronous access to records in a remote base.
///
/// Implementations must be cheap to share across requests; the HTTP layer
/// holds one behind an `Arc` for the lifetime of the process.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the record named by `options.record_id`.
    ///
    /// An absent `auth_key` must be rejected with a 401-class error.
    async fn fetch_one(&self, options: &RequestOptions, auth_key: Option<&str>) -> Result<Record>;

    /// Fetch every record in the table, narrowed by `options.select` when present.
    async fn fetch_many(
        &self,
        options: &RequestOptions,
        auth_key: Option<&str>,
    ) -> Result<Vec<Record>>;
}
