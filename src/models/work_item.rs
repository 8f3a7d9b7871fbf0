use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::priority::Priority;

/// Lifecycle of a work item.
///
/// Canonical values are `pending`, `in-progress`, and `done`. Older
/// documents written by the original creation form may carry `assigned` or
/// `completed`; those are accepted on input and normalized to `Pending` and
/// `Done` respectively, and are never written back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkStatus {
    #[serde(rename = "pending", alias = "assigned")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "done", alias = "completed")]
    Done,
}

impl Default for WorkStatus {
    fn default() -> Self {
        WorkStatus::Pending
    }
}

impl WorkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Pending => "pending",
            WorkStatus::InProgress => "in-progress",
            WorkStatus::Done => "done",
        }
    }

    /// Parse from string name, accepting the legacy vocabulary.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" | "assigned" => Some(WorkStatus::Pending),
            "in-progress" => Some(WorkStatus::InProgress),
            "done" | "completed" => Some(WorkStatus::Done),
            _ => None,
        }
    }

    /// Whether this status counts as finished for the doubt-resolution rule.
    pub fn is_done(&self) -> bool {
        matches!(self, WorkStatus::Done)
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An assignable task tied to a student, a subject, and optionally a
/// chapter. `updated_at` is refreshed on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: String,
    pub student_id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub status: WorkStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentor_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields supplied when assigning a work item; timestamps are stamped by
/// the sync layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkItem {
    pub student_id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub status: WorkStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentor_note: Option<String>,
}

impl NewWorkItem {
    pub fn new(
        student_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            title: title.into(),
            description: description.into(),
            subject: subject.into(),
            chapter: None,
            topic: None,
            due_date: Utc::now(),
            status: WorkStatus::default(),
            priority: Priority::default(),
            links: Vec::new(),
            mentor_note: None,
        }
    }

    pub fn with_chapter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter = Some(chapter.into());
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = links;
        self
    }
}

/// Partial update for a work item.
///
/// Setting `status` to [`WorkStatus::Done`] triggers the doubt-resolution
/// side effect in the sync layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentor_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}, due {})",
            self.status,
            self.title,
            self.subject,
            self.due_date.format("%Y-%m-%d")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_canonical_serde() {
        assert_eq!(serde_json::to_value(WorkStatus::Pending).unwrap(), "pending");
        assert_eq!(serde_json::to_value(WorkStatus::InProgress).unwrap(), "in-progress");
        assert_eq!(serde_json::to_value(WorkStatus::Done).unwrap(), "done");
    }

    #[test]
    fn test_status_legacy_aliases_decode() {
        let assigned: WorkStatus = serde_json::from_value(serde_json::json!("assigned")).unwrap();
        assert_eq!(assigned, WorkStatus::Pending);

        let completed: WorkStatus = serde_json::from_value(serde_json::json!("completed")).unwrap();
        assert_eq!(completed, WorkStatus::Done);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(WorkStatus::parse("pending"), Some(WorkStatus::Pending));
        assert_eq!(WorkStatus::parse("ASSIGNED"), Some(WorkStatus::Pending));
        assert_eq!(WorkStatus::parse("in-progress"), Some(WorkStatus::InProgress));
        assert_eq!(WorkStatus::parse("completed"), Some(WorkStatus::Done));
        assert_eq!(WorkStatus::parse("archived"), None);
    }

    #[test]
    fn test_is_done() {
        assert!(WorkStatus::Done.is_done());
        assert!(!WorkStatus::Pending.is_done());
        assert!(!WorkStatus::InProgress.is_done());
    }

    #[test]
    fn test_work_item_json_roundtrip() {
        let now = Utc::now();
        let item = WorkItem {
            id: "w1".to_string(),
            student_id: "s1".to_string(),
            title: "Study Mathematics: Real Numbers".to_string(),
            description: "Auto task for chapter Real Numbers in Mathematics".to_string(),
            subject: "Mathematics".to_string(),
            chapter: Some("Real Numbers".to_string()),
            topic: None,
            due_date: now,
            status: WorkStatus::Pending,
            priority: Priority::Medium,
            links: vec![],
            mentor_note: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["dueDate"], serde_json::to_value(now).unwrap());

        let parsed: WorkItem = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, item);
    }

    #[test]
    fn test_builder() {
        let item = NewWorkItem::new("s1", "Read chapter 4", "Read and take notes", "Science")
            .with_chapter("Light")
            .with_priority(Priority::High)
            .with_links(vec!["https://example.com/notes".to_string()]);

        assert_eq!(item.chapter.as_deref(), Some("Light"));
        assert_eq!(item.priority, Priority::High);
        assert_eq!(item.links.len(), 1);
        assert_eq!(item.status, WorkStatus::Pending);
    }
}
