// src/store/mod.rs
//
// Contract for the document data service. The application talks to a
// document-oriented store with per-document CRUD and live query
// subscriptions; this module defines that boundary plus the sqlite
// implementation used in-process.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Raw field map of one stored document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Field stamped by [`DocumentStore::create`] when the caller did not
/// set it (server-timestamp semantics).
pub const CREATED_AT: &str = "createdAt";

/// A full point-in-time result set for one query.
pub type Snapshot = Vec<Document>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }
}

/// A collection scan, optionally narrowed by one equality filter. This
/// is the only query shape the application uses.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filter: Option<(String, serde_json::Value)>,
}

impl Query {
    pub fn all(collection: &str) -> Query {
        Query {
            collection: collection.to_string(),
            filter: None,
        }
    }

    pub fn field_eq(
        collection: &str,
        field: &str,
        value: impl Into<serde_json::Value>,
    ) -> Query {
        Query {
            collection: collection.to_string(),
            filter: Some((field.to_string(), value.into())),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match &self.filter {
            None => true,
            Some((field, value)) => doc.fields.get(field) == Some(value),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// The service could not be reached at all.
    #[error("data service unreachable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Backend(String),

    #[error("invalid document data: {0}")]
    InvalidData(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> StoreError {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> StoreError {
        StoreError::Backend(err.to_string())
    }
}

/// Runs when the subscription is dropped, unregistering it at the
/// store. Cancellation is tied to ownership so a torn-down session
/// cannot leave a live subscription behind.
pub struct SubscriptionGuard {
    on_drop: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionGuard {
    pub fn new(on_drop: impl FnOnce() + Send + 'static) -> SubscriptionGuard {
        SubscriptionGuard {
            on_drop: Some(Box::new(on_drop)),
        }
    }

    pub fn noop() -> SubscriptionGuard {
        SubscriptionGuard { on_drop: None }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(f) = self.on_drop.take() {
            f();
        }
    }
}

/// A live query: the snapshot at registration time plus a stream of
/// full snapshots pushed after every matching change.
pub struct Subscription {
    pub initial: Snapshot,
    receiver: mpsc::UnboundedReceiver<Snapshot>,
    _guard: SubscriptionGuard,
}

impl Subscription {
    pub fn new(
        initial: Snapshot,
        receiver: mpsc::UnboundedReceiver<Snapshot>,
        guard: SubscriptionGuard,
    ) -> Subscription {
        Subscription {
            initial,
            receiver,
            _guard: guard,
        }
    }

    /// The next pushed snapshot, or `None` once the store side is gone.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }
}

/// The data service as the application consumes it.
///
/// The equality filter in [`Query`] is enforced by the implementation,
/// not by callers inspecting results: a subscriber only ever sees
/// documents its query matches.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Insert a new document and return its generated id. Implementations
    /// stamp a `createdAt` field when the caller did not provide one.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Create or replace a document under a caller-chosen id (profile
    /// documents are keyed by uid). Stamps `createdAt` like `create`.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Merge `fields` into an existing document.
    ///
    /// # Errors
    /// `StoreError::NotFound` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Fields)
        -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// One-shot evaluation of a query.
    async fn fetch(&self, query: &Query) -> Result<Snapshot, StoreError>;

    /// Register a live query. Every mutation that touches the queried
    /// collection triggers a fresh full snapshot push.
    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError>;
}
