pub mod file;
pub mod issue;
pub mod stats;
pub mod user;
