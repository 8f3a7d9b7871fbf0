use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A curriculum unit for one student, with its ordered chapters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub student_id: String,
    pub name: String,
    /// Display order is insertion order; chapter ids are unique within the
    /// subject.
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

/// A sub-topic of a subject. Embedded in its subject, not a collection of
/// its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Chapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            completed: false,
            started_at: None,
            completed_at: None,
        }
    }
}

/// Fields supplied when creating a subject. The chapter list may be empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
    pub student_id: String,
    pub name: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl NewSubject {
    pub fn new(student_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            name: name.into(),
            chapters: Vec::new(),
        }
    }

    pub fn with_chapters(mut self, chapters: Vec<Chapter>) -> Self {
        self.chapters = chapters;
        self
    }
}

/// Partial update for a subject. Setting `chapters` replaces the whole
/// sequence; there is no per-chapter patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapters: Option<Vec<Chapter>>,
}

/// Completion summary for one subject's syllabus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyllabusProgress {
    pub completed_chapters: usize,
    pub total_chapters: usize,
    /// Rounded to the nearest whole percent; 0 when there are no chapters.
    pub percentage: u8,
}

impl Subject {
    /// Summarizes chapter completion for progress views.
    pub fn progress(&self) -> SyllabusProgress {
        let total = self.chapters.len();
        let completed = self.chapters.iter().filter(|c| c.completed).count();
        let percentage = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        SyllabusProgress {
            completed_chapters: completed,
            total_chapters: total,
            percentage,
        }
    }
}
