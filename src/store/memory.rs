//! In-memory collection store.
//!
//! Backs tests and local/demo runs with the same contract as the remote
//! store: server-assigned ids, creation ordering, shallow-merge updates,
//! and full-snapshot change subscriptions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use uuid::Uuid;

use super::{
    Collection, CollectionStore, Document, Fields, Filter, OrderSpec, Snapshot, SnapshotReceiver,
    StoreError, ALL_COLLECTIONS,
};

struct StoredDoc {
    id: String,
    fields: Fields,
    /// Creation sequence number, stands in for the server timestamp.
    seq: u64,
}

struct Subscriber {
    order: OrderSpec,
    sender: mpsc::UnboundedSender<Snapshot>,
}

#[derive(Default)]
struct CollectionState {
    docs: Vec<StoredDoc>,
    subscribers: Vec<Subscriber>,
}

struct Inner {
    collections: HashMap<Collection, CollectionState>,
    next_seq: u64,
}

/// In-memory [`CollectionStore`].
///
/// Cloning is cheap; clones share the same underlying state.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let collections = ALL_COLLECTIONS
            .into_iter()
            .map(|c| (c, CollectionState::default()))
            .collect();
        Self {
            inner: Arc::new(Mutex::new(Inner {
                collections,
                next_seq: 0,
            })),
        }
    }

    /// Point-in-time copy of a collection, in creation-descending order.
    /// Test helper mirroring what a subscription would deliver.
    pub fn snapshot(&self, collection: Collection) -> Snapshot {
        let inner = self.inner.lock().expect("store lock poisoned");
        Self::build_snapshot(&inner.collections[&collection].docs, OrderSpec::CreatedDesc)
    }

    fn build_snapshot(docs: &[StoredDoc], order: OrderSpec) -> Snapshot {
        let mut docs: Vec<&StoredDoc> = docs.iter().collect();
        if order == OrderSpec::CreatedDesc {
            docs.sort_by(|a, b| b.seq.cmp(&a.seq));
        }
        docs.into_iter()
            .map(|d| Document {
                id: d.id.clone(),
                fields: d.fields.clone(),
            })
            .collect()
    }

    /// Sends the current snapshot to every live subscriber of a collection,
    /// pruning subscribers whose receiver has been dropped.
    fn notify(state: &mut CollectionState) {
        let created_desc = Self::build_snapshot(&state.docs, OrderSpec::CreatedDesc);
        let unordered = Self::build_snapshot(&state.docs, OrderSpec::Unordered);
        state.subscribers.retain(|sub| {
            let snapshot = match sub.order {
                OrderSpec::CreatedDesc => created_desc.clone(),
                OrderSpec::Unordered => unordered.clone(),
            };
            sub.sender.send(snapshot).is_ok()
        });
    }
}

impl CollectionStore for MemoryStore {
    async fn add(&self, collection: Collection, fields: Fields) -> Result<String, StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let seq = inner.next_seq;
        inner.next_seq += 1;

        let id = Uuid::new_v4().to_string();
        let state = inner
            .collections
            .get_mut(&collection)
            .expect("all collections initialized");
        state.docs.push(StoredDoc {
            id: id.clone(),
            fields,
            seq,
        });
        Self::notify(state);
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let state = inner
            .collections
            .get_mut(&collection)
            .expect("all collections initialized");

        let doc = state
            .docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.name(),
                id: id.to_string(),
            })?;

        for (key, value) in fields {
            doc.fields.insert(key, value);
        }
        Self::notify(state);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let state = inner
            .collections
            .get_mut(&collection)
            .expect("all collections initialized");

        let before = state.docs.len();
        state.docs.retain(|d| d.id != id);
        if state.docs.len() != before {
            Self::notify(state);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let state = &inner.collections[&collection];

        Ok(state
            .docs
            .iter()
            .filter(|d| {
                filters
                    .iter()
                    .all(|f| d.fields.get(&f.field) == Some(&f.value))
            })
            .map(|d| Document {
                id: d.id.clone(),
                fields: d.fields.clone(),
            })
            .collect())
    }

    fn subscribe(&self, collection: Collection, order: OrderSpec) -> SnapshotReceiver {
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut inner = self.inner.lock().expect("store lock poisoned");
        let state = inner
            .collections
            .get_mut(&collection)
            .expect("all collections initialized");

        // Initial snapshot fires immediately, like the remote store's
        // on-snapshot listener.
        let _ = sender.send(Self::build_snapshot(&state.docs, order));
        state.subscribers.push(Subscriber { order, sender });
        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().expect("object literal").clone()
    }

    #[tokio::test]
    async fn test_add_assigns_unique_ids() {
        let store = MemoryStore::new();
        let a = store
            .add(Collection::Students, fields(json!({"fullName": "Asha"})))
            .await
            .unwrap();
        let b = store
            .add(Collection::Students, fields(json!({"fullName": "Ravi"})))
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_snapshot_created_desc_order() {
        let store = MemoryStore::new();
        store
            .add(Collection::Doubts, fields(json!({"n": 1})))
            .await
            .unwrap();
        store
            .add(Collection::Doubts, fields(json!({"n": 2})))
            .await
            .unwrap();
        store
            .add(Collection::Doubts, fields(json!({"n": 3})))
            .await
            .unwrap();

        let snapshot = store.snapshot(Collection::Doubts);
        let ns: Vec<i64> = snapshot
            .iter()
            .map(|d| d.fields["n"].as_i64().unwrap())
            .collect();
        assert_eq!(ns, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_update_shallow_merges() {
        let store = MemoryStore::new();
        let id = store
            .add(
                Collection::Students,
                fields(json!({"fullName": "Asha", "grade": "10"})),
            )
            .await
            .unwrap();

        store
            .update(Collection::Students, &id, fields(json!({"grade": "11"})))
            .await
            .unwrap();

        let snapshot = store.snapshot(Collection::Students);
        assert_eq!(snapshot[0].fields["fullName"], "Asha");
        assert_eq!(snapshot[0].fields["grade"], "11");
    }

    #[tokio::test]
    async fn test_update_missing_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(Collection::Students, "nope", Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        let id = store
            .add(Collection::Subjects, fields(json!({"name": "Science"})))
            .await
            .unwrap();

        store.delete(Collection::Subjects, &id).await.unwrap();
        assert!(store.snapshot(Collection::Subjects).is_empty());

        // Second delete of the same id succeeds silently.
        store.delete(Collection::Subjects, &id).await.unwrap();
    }

    #[tokio::test]
    async fn test_query_equality_filters() {
        let store = MemoryStore::new();
        store
            .add(
                Collection::Doubts,
                fields(json!({"studentId": "s1", "subject": "Science", "status": "open"})),
            )
            .await
            .unwrap();
        store
            .add(
                Collection::Doubts,
                fields(json!({"studentId": "s1", "subject": "Science", "status": "resolved"})),
            )
            .await
            .unwrap();
        store
            .add(
                Collection::Doubts,
                fields(json!({"studentId": "s2", "subject": "Science", "status": "open"})),
            )
            .await
            .unwrap();

        let open = store
            .query(
                Collection::Doubts,
                &[
                    Filter::eq("studentId", "s1"),
                    Filter::eq("subject", "Science"),
                    Filter::eq("status", "open"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].fields["status"], "open");
    }

    #[tokio::test]
    async fn test_query_no_matches_is_empty_not_error() {
        let store = MemoryStore::new();
        let result = store
            .query(Collection::Doubts, &[Filter::eq("studentId", "ghost")])
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_fires_initial_snapshot() {
        let store = MemoryStore::new();
        store
            .add(Collection::Students, fields(json!({"fullName": "Asha"})))
            .await
            .unwrap();

        let mut rx = store.subscribe(Collection::Students, OrderSpec::CreatedDesc);
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_delivers_one_snapshot_per_mutation() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe(Collection::Students, OrderSpec::CreatedDesc);
        assert!(rx.recv().await.unwrap().is_empty());

        let id = store
            .add(Collection::Students, fields(json!({"fullName": "Asha"})))
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap().len(), 1);

        store
            .update(Collection::Students, &id, fields(json!({"grade": "10"})))
            .await
            .unwrap();
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot[0].fields["grade"], "10");

        store.delete(Collection::Students, &id).await.unwrap();
        assert!(rx.recv().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subscriptions_isolated_per_collection() {
        let store = MemoryStore::new();
        let mut students_rx = store.subscribe(Collection::Students, OrderSpec::CreatedDesc);
        let mut doubts_rx = store.subscribe(Collection::Doubts, OrderSpec::CreatedDesc);
        students_rx.recv().await.unwrap();
        doubts_rx.recv().await.unwrap();

        store
            .add(Collection::Doubts, fields(json!({"title": "q"})))
            .await
            .unwrap();

        assert_eq!(doubts_rx.recv().await.unwrap().len(), 1);
        // No snapshot queued for the untouched collection.
        assert!(students_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let store = MemoryStore::new();
        let rx = store.subscribe(Collection::Students, OrderSpec::CreatedDesc);
        drop(rx);

        // Mutation after the receiver is gone must not fail.
        store
            .add(Collection::Students, fields(json!({"fullName": "Asha"})))
            .await
            .unwrap();
    }
}
