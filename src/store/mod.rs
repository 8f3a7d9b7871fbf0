//! Remote collection store contract.
//!
//! The dashboard syncs against a document database exposed per named
//! collection. The database itself is an external collaborator; this module
//! defines the surface the sync layer consumes: per-collection CRUD, an
//! equality query, and a subscribe-for-changes primitive that delivers full
//! snapshots.

mod memory;

pub use memory::MemoryStore;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;

/// The four dashboard collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Students,
    Subjects,
    Doubts,
    WorkItems,
}

/// All collections, in subscription-registration order.
pub const ALL_COLLECTIONS: [Collection; 4] = [
    Collection::Students,
    Collection::Subjects,
    Collection::Doubts,
    Collection::WorkItems,
];

impl Collection {
    /// Returns the collection name as stored remotely.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Subjects => "subjects",
            Collection::Doubts => "doubts",
            Collection::WorkItems => "workItems",
        }
    }

    /// Parse from a collection name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "students" => Some(Collection::Students),
            "subjects" => Some(Collection::Subjects),
            "doubts" => Some(Collection::Doubts),
            "workItems" => Some(Collection::WorkItems),
            _ => None,
        }
    }
}

/// Field map of a document, without its id.
pub type Fields = Map<String, Value>;

/// A stored document: server-assigned id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Merges the id into the fields, producing the value the sync layer
    /// decodes records from.
    pub fn into_value(self) -> Value {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        Value::Object(fields)
    }
}

/// An equality filter for [`CollectionStore::query`].
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Snapshot ordering delivered by a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSpec {
    /// Most recently created first, by server-assigned creation order.
    CreatedDesc,
    /// No order guarantee.
    Unordered,
}

/// The full current document set of a collection.
pub type Snapshot = Vec<Document>;

/// Receiving end of a change subscription. Delivers the current snapshot
/// immediately on subscribe and a fresh one after every mutation of the
/// collection.
pub type SnapshotReceiver = mpsc::UnboundedReceiver<Snapshot>;

/// Errors surfaced by a collection store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no document {id} in collection {collection}")]
    NotFound { collection: &'static str, id: String },

    #[error("store backend error: {0}")]
    Backend(String),
}

/// A document database exposed per named collection.
///
/// `update` is a shallow merge: fields present in the written map replace
/// the stored fields, absent fields are left untouched. `delete` is
/// idempotent. Subscriptions are long-lived; the store stops delivering to
/// a subscriber once its receiver is dropped.
pub trait CollectionStore: Send + Sync {
    /// Adds a document; the store assigns its id and creation ordering.
    fn add(
        &self,
        collection: Collection,
        fields: Fields,
    ) -> impl std::future::Future<Output = Result<String, StoreError>> + Send;

    /// Shallow-merges `fields` into an existing document.
    fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Removes a document. Removing a missing id is a no-op.
    fn delete(
        &self,
        collection: Collection,
        id: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Point-in-time read of all documents matching every filter.
    fn query(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> impl std::future::Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Registers a change subscription for a collection.
    fn subscribe(&self, collection: Collection, order: OrderSpec) -> SnapshotReceiver;
}
