//! Domain service for user accounts.

use thiserror::Error;

use crate::domain::{Actor, UserId};
use crate::models::User;
use crate::models::user::UserChanges;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Not enough permissions")]
    Forbidden,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn me(&self, actor: &Actor) -> Result<User, UserError>;

    /// Every account. Admin only.
    async fn list(&self, actor: &Actor) -> Result<Vec<User>, UserError>;

    /// Admins may read anyone; everyone else only themselves.
    async fn get(&self, id: UserId, actor: &Actor) -> Result<User, UserError>;

    /// Admins may change anything. A user editing themselves can only rename;
    /// role and active flag are dropped, not rejected.
    async fn update(
        &self,
        id: UserId,
        changes: UserChanges,
        actor: &Actor,
    ) -> Result<User, UserError>;
}
