//! The synchronization layer.
//!
//! [`Dashboard`] mirrors the four remote collections in memory, keeps them
//! live through one change subscription per collection, and exposes the
//! write-through mutation operations. Each incoming snapshot wholesale
//! replaces its collection; there is no diffing and no optimistic local
//! update, so a mutation's effect becomes visible only once its snapshot
//! round-trips through the store.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::models::{
    derive_title, Doubt, DoubtPatch, DoubtStatus, NewDoubt, NewStudent, NewSubject, NewWorkItem,
    Student, StudentPatch, Subject, SubjectPatch, WorkItem, WorkItemPatch,
};
use crate::store::{
    Collection, CollectionStore, Fields, Filter, OrderSpec, Snapshot, SnapshotReceiver,
};

use super::error::SyncError;

#[derive(Default)]
struct Collections {
    students: RwLock<Vec<Student>>,
    subjects: RwLock<Vec<Subject>>,
    doubts: RwLock<Vec<Doubt>>,
    work_items: RwLock<Vec<WorkItem>>,
}

/// Live view of the four dashboard collections plus their write surface.
///
/// Construct exactly one per process lifetime: construction registers the
/// collection subscriptions, so a second instance would double them. Must
/// be created inside a tokio runtime; the listener tasks run until the
/// store ends their subscriptions.
pub struct Dashboard<S> {
    store: S,
    collections: Arc<Collections>,
    revision: watch::Sender<u64>,
}

impl<S: CollectionStore> Dashboard<S> {
    pub fn new(store: S) -> Self {
        let collections = Arc::new(Collections::default());
        let (revision, _) = watch::channel(0);

        let students_rx = store.subscribe(Collection::Students, OrderSpec::CreatedDesc);
        let subjects_rx = store.subscribe(Collection::Subjects, OrderSpec::Unordered);
        let doubts_rx = store.subscribe(Collection::Doubts, OrderSpec::CreatedDesc);
        let work_items_rx = store.subscribe(Collection::WorkItems, OrderSpec::CreatedDesc);

        let c = Arc::clone(&collections);
        spawn_listener::<Student>(Collection::Students, students_rx, revision.clone(), move |records| {
            *c.students.write().expect("collections lock poisoned") = records;
        });

        let c = Arc::clone(&collections);
        spawn_listener::<Subject>(Collection::Subjects, subjects_rx, revision.clone(), move |records| {
            *c.subjects.write().expect("collections lock poisoned") = records;
        });

        let c = Arc::clone(&collections);
        spawn_listener::<Doubt>(Collection::Doubts, doubts_rx, revision.clone(), move |records| {
            *c.doubts.write().expect("collections lock poisoned") = records;
        });

        let c = Arc::clone(&collections);
        spawn_listener::<WorkItem>(Collection::WorkItems, work_items_rx, revision.clone(), move |records| {
            *c.work_items.write().expect("collections lock poisoned") = records;
        });

        Self {
            store,
            collections,
            revision,
        }
    }

    /// Current students, most recently created first.
    pub fn students(&self) -> Vec<Student> {
        self.collections
            .students
            .read()
            .expect("collections lock poisoned")
            .clone()
    }

    /// Current subjects, in no guaranteed order.
    pub fn subjects(&self) -> Vec<Subject> {
        self.collections
            .subjects
            .read()
            .expect("collections lock poisoned")
            .clone()
    }

    /// Current doubts, most recently created first.
    pub fn doubts(&self) -> Vec<Doubt> {
        self.collections
            .doubts
            .read()
            .expect("collections lock poisoned")
            .clone()
    }

    /// Current work items, most recently created first.
    pub fn work_items(&self) -> Vec<WorkItem> {
        self.collections
            .work_items
            .read()
            .expect("collections lock poisoned")
            .clone()
    }

    /// Change signal for re-render-on-change consumers. The revision bumps
    /// after every applied snapshot; the value itself carries no meaning
    /// beyond "something changed".
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // ---- students ----

    /// Creates a student. `archived` starts false; the creation timestamp
    /// is stamped here.
    pub async fn add_student(&self, input: NewStudent) -> Result<String, SyncError> {
        let mut fields = to_fields(&input)?;
        fields.insert("archived".to_string(), Value::Bool(false));
        fields.insert("createdAt".to_string(), serde_json::to_value(Utc::now())?);
        Ok(self.store.add(Collection::Students, fields).await?)
    }

    pub async fn update_student(&self, id: &str, patch: StudentPatch) -> Result<(), SyncError> {
        let fields = to_fields(&patch)?;
        self.store.update(Collection::Students, id, fields).await?;
        Ok(())
    }

    /// Removes a student. Does not cascade: subjects, doubts, and work
    /// items keep their dangling reference and readers must tolerate it.
    pub async fn delete_student(&self, id: &str) -> Result<(), SyncError> {
        self.store.delete(Collection::Students, id).await?;
        Ok(())
    }

    /// Flips the student's archived flag. An id missing from the mirror is
    /// treated as unarchived, so the write attempts to archive it.
    pub async fn archive_student(&self, id: &str) -> Result<(), SyncError> {
        let archived = self
            .students()
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.archived)
            .unwrap_or(false);

        let mut fields = Fields::new();
        fields.insert("archived".to_string(), Value::Bool(!archived));
        self.store.update(Collection::Students, id, fields).await?;
        Ok(())
    }

    // ---- subjects ----

    /// Creates a subject, then one work item per chapter with a non-empty
    /// name: "Study {subject}: {chapter}", pending, medium priority, due
    /// immediately.
    pub async fn add_subject(&self, input: NewSubject) -> Result<String, SyncError> {
        let fields = to_fields(&input)?;
        let id = self.store.add(Collection::Subjects, fields).await?;

        for chapter in &input.chapters {
            if chapter.name.is_empty() {
                continue;
            }
            let item = NewWorkItem::new(
                input.student_id.clone(),
                format!("Study {}: {}", input.name, chapter.name),
                format!("Auto task for chapter {} in {}", chapter.name, input.name),
                input.name.clone(),
            )
            .with_chapter(chapter.name.clone())
            .with_due_date(Utc::now());
            self.add_work_item(item).await?;
        }

        Ok(id)
    }

    pub async fn update_subject(&self, id: &str, patch: SubjectPatch) -> Result<(), SyncError> {
        let fields = to_fields(&patch)?;
        self.store.update(Collection::Subjects, id, fields).await?;
        Ok(())
    }

    pub async fn delete_subject(&self, id: &str) -> Result<(), SyncError> {
        self.store.delete(Collection::Subjects, id).await?;
        Ok(())
    }

    // ---- doubts ----

    /// Raises a doubt. Status is forced to open, the title is derived from
    /// the description, and both timestamps are stamped here.
    pub async fn add_doubt(&self, input: NewDoubt) -> Result<String, SyncError> {
        let now = serde_json::to_value(Utc::now())?;
        let mut fields = to_fields(&input)?;
        fields.insert(
            "title".to_string(),
            Value::String(derive_title(&input.description)),
        );
        fields.insert(
            "status".to_string(),
            Value::String(DoubtStatus::Open.as_str().to_string()),
        );
        fields.insert("createdAt".to_string(), now.clone());
        fields.insert("updatedAt".to_string(), now);
        Ok(self.store.add(Collection::Doubts, fields).await?)
    }

    /// Merges the patch and refreshes `updated_at`, even for an empty
    /// patch.
    pub async fn update_doubt(&self, id: &str, patch: DoubtPatch) -> Result<(), SyncError> {
        let mut fields = to_fields(&patch)?;
        fields.insert("updatedAt".to_string(), serde_json::to_value(Utc::now())?);
        self.store.update(Collection::Doubts, id, fields).await?;
        Ok(())
    }

    pub async fn delete_doubt(&self, id: &str) -> Result<(), SyncError> {
        self.store.delete(Collection::Doubts, id).await?;
        Ok(())
    }

    // ---- work items ----

    pub async fn add_work_item(&self, input: NewWorkItem) -> Result<String, SyncError> {
        let now = serde_json::to_value(Utc::now())?;
        let mut fields = to_fields(&input)?;
        fields.insert("createdAt".to_string(), now.clone());
        fields.insert("updatedAt".to_string(), now);
        Ok(self.store.add(Collection::WorkItems, fields).await?)
    }

    /// Merges the patch and refreshes `updated_at`. A patch that sets the
    /// status to done additionally resolves matching open doubts.
    pub async fn update_work_item(&self, id: &str, patch: WorkItemPatch) -> Result<(), SyncError> {
        let mut fields = to_fields(&patch)?;
        fields.insert("updatedAt".to_string(), serde_json::to_value(Utc::now())?);
        self.store.update(Collection::WorkItems, id, fields).await?;

        if patch.status.is_some_and(|s| s.is_done()) {
            self.resolve_matching_doubts(id, &patch).await?;
        }
        Ok(())
    }

    pub async fn delete_work_item(&self, id: &str) -> Result<(), SyncError> {
        self.store.delete(Collection::WorkItems, id).await?;
        Ok(())
    }

    /// Finishing the assigned work for a topic answers any outstanding
    /// questions about that topic.
    ///
    /// The effective student, subject, and chapter come from the patch,
    /// falling back to the mirrored work item, so the rule evaluates the
    /// post-update values. Open doubts for that student and subject are
    /// read from the store at call time; each one resolves unless both
    /// sides carry a chapter tag and the tags differ. Empty-string tags
    /// count as absent. The read-then-write-many sequence has no isolation;
    /// concurrent doubt writes race last-write-wins.
    async fn resolve_matching_doubts(
        &self,
        id: &str,
        patch: &WorkItemPatch,
    ) -> Result<(), SyncError> {
        let current = self.work_items().into_iter().find(|w| w.id == id);

        let student_id = patch
            .student_id
            .clone()
            .or_else(|| current.as_ref().map(|w| w.student_id.clone()))
            .filter(|s| !s.is_empty());
        let subject = patch
            .subject
            .clone()
            .or_else(|| current.as_ref().map(|w| w.subject.clone()))
            .filter(|s| !s.is_empty());
        let chapter = patch
            .chapter
            .clone()
            .or_else(|| current.as_ref().and_then(|w| w.chapter.clone()))
            .filter(|c| !c.is_empty());

        let (Some(student_id), Some(subject)) = (student_id, subject) else {
            // No student or subject to match against: silent no-op.
            return Ok(());
        };

        let open_doubts = self
            .store
            .query(
                Collection::Doubts,
                &[
                    Filter::eq("studentId", student_id.as_str()),
                    Filter::eq("subject", subject.as_str()),
                    Filter::eq("status", DoubtStatus::Open.as_str()),
                ],
            )
            .await?;

        for doubt in open_doubts {
            let doubt_chapter = doubt
                .fields
                .get("chapter")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty());
            let matches = match (chapter.as_deref(), doubt_chapter) {
                (None, _) | (_, None) => true,
                (Some(work), Some(asked)) => work == asked,
            };
            if !matches {
                continue;
            }

            let now = serde_json::to_value(Utc::now())?;
            let mut fields = Fields::new();
            fields.insert(
                "status".to_string(),
                Value::String(DoubtStatus::Resolved.as_str().to_string()),
            );
            fields.insert("resolvedAt".to_string(), now.clone());
            fields.insert("updatedAt".to_string(), now);
            self.store.update(Collection::Doubts, &doubt.id, fields).await?;
        }

        Ok(())
    }
}

/// Serializes a record into its document fields.
fn to_fields<T: Serialize>(value: &T) -> Result<Fields, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(serde_json::Error::custom(
            "document must serialize to an object",
        )),
    }
}

/// Spawns the listener task for one collection. Every received snapshot
/// replaces the mirrored collection wholesale, then bumps the revision.
fn spawn_listener<T>(
    collection: Collection,
    mut rx: SnapshotReceiver,
    revision: watch::Sender<u64>,
    apply: impl Fn(Vec<T>) + Send + 'static,
) where
    T: DeserializeOwned + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(snapshot) = rx.recv().await {
            apply(decode_snapshot(collection, snapshot));
            revision.send_modify(|rev| *rev += 1);
        }
        tracing::debug!("{} subscription ended", collection.name());
    });
}

/// Decodes a snapshot, skipping documents that no longer match the record
/// shape (orphaned or foreign writes) rather than failing the whole
/// snapshot.
fn decode_snapshot<T: DeserializeOwned>(collection: Collection, snapshot: Snapshot) -> Vec<T> {
    snapshot
        .into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match serde_json::from_value(doc.into_value()) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(
                        "skipping undecodable {} document {}: {}",
                        collection.name(),
                        id,
                        e
                    );
                    None
                }
            }
        })
        .collect()
}
