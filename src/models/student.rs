use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display-grouping tag for student cards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BorderColor {
    Orange,
    Green,
    Blue,
    Purple,
}

impl Default for BorderColor {
    fn default() -> Self {
        BorderColor::Orange
    }
}

/// A student enrolled at the center.
///
/// Stored in the `students` collection. `archived` is a soft-delete flag:
/// archived students are hidden from default views but never removed by the
/// archive flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub full_name: String,
    pub grade: String,
    pub board: String,
    pub school: String,
    /// Batch code, derived from the time slot (see [`batch_for_time_slot`]).
    pub batch: String,
    pub time_slot: String,
    /// Primary contact number.
    pub contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub border_color: BorderColor,
}

/// Fields supplied by the caller when creating a student.
///
/// `archived` and `created_at` are stamped by the sync layer, the id by the
/// store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub full_name: String,
    pub grade: String,
    pub board: String,
    pub school: String,
    pub batch: String,
    pub time_slot: String,
    pub contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub border_color: BorderColor,
}

impl NewStudent {
    /// Creates a student input with the required fields; the batch code is
    /// derived from the time slot when the slot is a known one.
    pub fn new(
        full_name: impl Into<String>,
        grade: impl Into<String>,
        board: impl Into<String>,
        school: impl Into<String>,
        time_slot: impl Into<String>,
        contact: impl Into<String>,
    ) -> Self {
        let time_slot = time_slot.into();
        let batch = batch_for_time_slot(&time_slot).unwrap_or_default().to_string();
        Self {
            full_name: full_name.into(),
            grade: grade.into(),
            board: board.into(),
            school: school.into(),
            batch,
            time_slot,
            contact: contact.into(),
            personal_phone: None,
            father_phone: None,
            mother_phone: None,
            address: None,
            profile_image: None,
            border_color: BorderColor::default(),
        }
    }

    pub fn with_border_color(mut self, color: BorderColor) -> Self {
        self.border_color = color;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// Partial update for a student.
///
/// `None` fields are omitted from the written document and leave the stored
/// value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub father_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mother_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<BorderColor>,
}

/// Maps a scheduling time slot to its batch letter.
///
/// Returns `None` for slots outside the fixed timetable.
pub fn batch_for_time_slot(time_slot: &str) -> Option<&'static str> {
    match time_slot {
        "3:00-4:30" => Some("A"),
        "4:30-6:00" => Some("B"),
        "6:00-8:00" => Some("C"),
        "8:00-9:30" => Some("D"),
        "10:00-11:30" => Some("E"),
        "11:30-1:00" => Some("F"),
        "1:00-2:30" => Some("G"),
        "2:30-4:00" => Some("H"),
        _ => None,
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (grade {}, {}, batch {})",
            self.full_name, self.grade, self.board, self.batch
        )?;
        if self.archived {
            write!(f, " [archived]")?;
        }
        Ok(())
    }
}
