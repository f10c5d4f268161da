pub mod prelude;

pub mod daily_stats;
pub mod issue_files;
pub mod issues;
pub mod users;
