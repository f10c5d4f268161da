mod aggregate;
mod create_user;
mod init;

pub use aggregate::cmd_aggregate;
pub use create_user::cmd_create_user;
pub use init::cmd_init;
