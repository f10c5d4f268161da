pub use super::daily_stats::Entity as DailyStats;
pub use super::issue_files::Entity as IssueFiles;
pub use super::issues::Entity as Issues;
pub use super::users::Entity as Users;
