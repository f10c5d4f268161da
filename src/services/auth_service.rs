//! Domain service for authentication and account self-service.
//!
//! Handles registration, login, password changes, and API key management.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Actor, Role, UserId};
use crate::models::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Inactive user")]
    Inactive,

    #[error("User not found")]
    UserNotFound,

    #[error("Not enough permissions")]
    Forbidden,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// Self-registration request. `role` defaults to reporter.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Login result containing user info and API key.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: User,
    pub api_key: String,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and queues a welcome email.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Forbidden`] when an admin account is requested
    /// - [`AuthError::EmailTaken`] if the email is already registered
    /// - [`AuthError::Validation`] on a short password or empty name
    async fn register(&self, registration: Registration) -> Result<User, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails and
    /// [`AuthError::Inactive`] for a deactivated account.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves an API key to its owner, active or not.
    async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>, AuthError>;

    /// Resolves a session's user id.
    async fn find_user(&self, id: UserId) -> Result<Option<User>, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is incorrect
    /// or the new one is too short or unchanged.
    async fn change_password(
        &self,
        actor: &Actor,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    async fn get_api_key(&self, actor: &Actor) -> Result<String, AuthError>;

    /// Replaces the caller's API key and returns the new one.
    async fn regenerate_api_key(&self, actor: &Actor) -> Result<String, AuthError>;
}
