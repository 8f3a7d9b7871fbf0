//! Live synchronization between the remote collections and local state.

mod dashboard;
mod error;

pub use dashboard::Dashboard;
pub use error::SyncError;
