//! Serializable views of stored entities, as returned by services and the API.

pub mod file;
pub mod issue;
pub mod stats;
pub mod user;

pub use file::IssueFile;
pub use issue::{Issue, IssueChanges, IssueFilter, NewIssue};
pub use stats::{DailySnapshot, DashboardStats};
pub use user::User;
