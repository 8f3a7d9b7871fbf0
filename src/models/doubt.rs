use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::priority::Priority;

/// Maximum length of a derived doubt title, in characters.
pub const TITLE_MAX_CHARS: usize = 50;

/// Lifecycle of a doubt. Starts `open`; the modeled flow only ever moves it
/// to `resolved`, never back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DoubtStatus {
    Open,
    Resolved,
}

impl DoubtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoubtStatus::Open => "open",
            DoubtStatus::Resolved => "resolved",
        }
    }
}

/// A student-raised question.
///
/// `updated_at` is refreshed on every mutation. Resolution may happen
/// directly or as a side effect of completing a matching work item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Doubt {
    pub id: String,
    pub student_id: String,
    /// Derived from the description, truncated to [`TITLE_MAX_CHARS`].
    pub title: String,
    pub description: String,
    pub status: DoubtStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

/// Truncates a doubt description into its title.
///
/// Cuts at a character boundary so multi-byte text never splits mid-char.
pub fn derive_title(description: &str) -> String {
    description.chars().take(TITLE_MAX_CHARS).collect()
}

/// Fields supplied when raising a doubt. Status, title, and timestamps are
/// stamped by the sync layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewDoubt {
    pub student_id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

impl NewDoubt {
    pub fn new(student_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            description: description.into(),
            subject: None,
            chapter: None,
            priority: Priority::default(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_chapter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter = Some(chapter.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Partial update for a doubt. `None` fields leave the stored value
/// untouched; `updated_at` is stamped by the sync layer on every update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoubtPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DoubtStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl fmt::Display for Doubt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_str(), self.title)?;
        if let Some(subject) = &self.subject {
            write!(f, " ({})", subject)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_title_short_description() {
        assert_eq!(derive_title("Why is the sky blue?"), "Why is the sky blue?");
    }

    #[test]
    fn test_derive_title_truncates_at_50_chars() {
        let description = "a".repeat(80);
        let title = derive_title(&description);
        assert_eq!(title.chars().count(), 50);
    }

    #[test]
    fn test_derive_title_multibyte_safe() {
        let description = "光".repeat(60);
        let title = derive_title(&description);
        assert_eq!(title.chars().count(), 50);
        assert!(description.starts_with(&title));
    }

    #[test]
    fn test_doubt_json_roundtrip() {
        let now = Utc::now();
        let doubt = Doubt {
            id: "d1".to_string(),
            student_id: "s1".to_string(),
            title: "Why does light refract?".to_string(),
            description: "Why does light refract?".to_string(),
            status: DoubtStatus::Open,
            created_at: now,
            updated_at: now,
            resolved_at: None,
            subject: Some("Science".to_string()),
            chapter: Some("Light".to_string()),
            priority: Priority::High,
        };

        let json = serde_json::to_value(&doubt).unwrap();
        assert_eq!(json["status"], "open");
        assert_eq!(json["studentId"], "s1");
        assert!(json.get("resolvedAt").is_none());

        let parsed: Doubt = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, doubt);
    }

    #[test]
    fn test_patch_status_only() {
        let patch = DoubtPatch {
            status: Some(DoubtStatus::Resolved),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["status"], "resolved");
    }
}
