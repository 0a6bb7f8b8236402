//! Remote object store abstraction
//!
//! The host platform's data API reduced to the three operations this widget
//! consumes. Implementations live behind `Arc<dyn RemoteStore>` so the
//! session can be driven by the bundled Web API client or by a host-supplied
//! store.

use async_trait::async_trait;
use thiserror::Error;

use crate::record::RecordBag;

/// Failure talking to the remote store. These never escape the gateway; they
/// are caught there, logged, and degraded to empty results.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("store url invalid: {0}")]
    Url(String),

    #[error("store returned status {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("response decode failure: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("record {id} not found in {entity}")]
    NotFound { entity: String, id: String },
}

/// Read operations against the remote object store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Rows of a definition collection matching an OData filter, projected
    /// to the named columns.
    async fn list_collection(
        &self,
        collection: &str,
        filter: &str,
        columns: &[&str],
    ) -> Result<Vec<RecordBag>, StoreError>;

    /// Rows of an entity matching a FetchXML document.
    async fn query_by_fetch(&self, entity: &str, fetch_xml: &str)
        -> Result<Vec<RecordBag>, StoreError>;

    /// A single record by id. Absence is `StoreError::NotFound`.
    async fn retrieve_by_id(&self, entity: &str, id: &str) -> Result<RecordBag, StoreError>;
}
