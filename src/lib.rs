//! MentorDesk Core Library
//!
//! Record models and the live collection-sync layer for the MentorDesk
//! tutoring dashboard. The [`sync::Dashboard`] mirrors four remote
//! collections (students, subjects, doubts, work items), writes mutations
//! through to the store, and applies the one cross-entity rule: completing
//! a work item resolves matching open doubts.

pub mod models;
pub mod store;
pub mod sync;

pub use models::{
    batch_for_time_slot, derive_title, BorderColor, Chapter, Doubt, DoubtPatch, DoubtStatus,
    NewDoubt, NewStudent, NewSubject, NewWorkItem, Priority, Student, StudentPatch, Subject,
    SubjectPatch, SyllabusProgress, WorkItem, WorkItemPatch, WorkStatus,
};
pub use store::{
    Collection, CollectionStore, Document, Fields, Filter, MemoryStore, OrderSpec, Snapshot,
    SnapshotReceiver, StoreError,
};
pub use sync::{Dashboard, SyncError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
