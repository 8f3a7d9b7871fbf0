//! Record types for the four dashboard collections.

mod doubt;
mod priority;
mod student;
mod subject;
mod work_item;

pub use doubt::{derive_title, Doubt, DoubtPatch, DoubtStatus, NewDoubt, TITLE_MAX_CHARS};
pub use priority::Priority;
pub use student::{batch_for_time_slot, BorderColor, NewStudent, Student, StudentPatch};
pub use subject::{Chapter, NewSubject, Subject, SubjectPatch, SyllabusProgress};
pub use work_item::{NewWorkItem, WorkItem, WorkItemPatch, WorkStatus};
