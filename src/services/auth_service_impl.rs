//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::config::SecurityConfig;
use crate::constants::limits::MIN_PASSWORD_LENGTH;
use crate::db::{NewUser, Store};
use crate::domain::{Actor, Role, UserId};
use crate::models::User;
use crate::services::auth_service::{AuthError, AuthService, LoginResult, Registration};
use crate::services::notification::NotificationFanout;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
    notifications: NotificationFanout,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(
        store: Store,
        security: SecurityConfig,
        notifications: NotificationFanout,
    ) -> Self {
        Self {
            store,
            security,
            notifications,
        }
    }
}

fn check_password_length(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let role = registration.role.unwrap_or(Role::Reporter);
        if role == Role::Admin {
            return Err(AuthError::Forbidden);
        }

        let name = registration.name.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("Name cannot be empty".to_string()));
        }
        check_password_length(&registration.password)?;

        let email = registration.email.trim().to_lowercase();
        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let user = self
            .store
            .create_user(
                NewUser {
                    email,
                    name: name.to_string(),
                    password: registration.password,
                    role,
                },
                &self.security,
            )
            .await?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        self.notifications.welcome(&user);
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self
            .store
            .verify_credentials(&email.trim().to_lowercase(), password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        let api_key = self
            .store
            .get_api_key(user.id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(LoginResult { user, api_key })
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>, AuthError> {
        Ok(self.store.verify_api_key(api_key).await?)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.store.get_user(id).await?)
    }

    async fn change_password(
        &self,
        actor: &Actor,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        check_password_length(new_password)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let is_valid = self
            .store
            .verify_user_password(actor.id, current_password)
            .await?;

        if !is_valid {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(actor.id, new_password, &self.security)
            .await?;

        info!(user_id = %actor.id, "Password changed");
        Ok(())
    }

    async fn get_api_key(&self, actor: &Actor) -> Result<String, AuthError> {
        self.store
            .get_api_key(actor.id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn regenerate_api_key(&self, actor: &Actor) -> Result<String, AuthError> {
        let key = self.store.regenerate_api_key(actor.id).await?;
        info!(user_id = %actor.id, "API key regenerated");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::{EmailQueue, MemoryMailer};
    use crate::services::live::LiveUpdates;
    use std::sync::Arc;

    async fn service() -> SeaOrmAuthService {
        let store = Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .unwrap();
        let (emails, _worker) = EmailQueue::start(Arc::new(MemoryMailer::new()), 8);
        let notifications = NotificationFanout::new(
            store.clone(),
            emails,
            LiveUpdates::new(),
            "http://localhost:3000".to_string(),
        );
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        };
        SeaOrmAuthService::new(store, security, notifications)
    }

    fn registration(email: &str, role: Option<Role>) -> Registration {
        Registration {
            email: email.to_string(),
            name: "Dana".to_string(),
            password: "correct horse".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn registration_defaults_to_reporter_and_refuses_admin() {
        let auth = service().await;

        let dana = auth
            .register(registration("Dana@Example.com", None))
            .await
            .unwrap();
        assert_eq!(dana.role, Role::Reporter);
        assert_eq!(dana.email, "dana@example.com");

        assert!(matches!(
            auth.register(registration("dana@example.com", None)).await,
            Err(AuthError::EmailTaken)
        ));
        assert!(matches!(
            auth.register(registration("root@example.com", Some(Role::Admin)))
                .await,
            Err(AuthError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn login_and_password_change() {
        let auth = service().await;
        let dana = auth
            .register(registration("dana@example.com", Some(Role::Maintainer)))
            .await
            .unwrap();

        assert!(matches!(
            auth.login("dana@example.com", "wrong password").await,
            Err(AuthError::InvalidCredentials)
        ));
        let session = auth
            .login("dana@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(session.api_key.len(), 64);

        let actor = dana.as_actor();
        assert!(matches!(
            auth.change_password(&actor, "correct horse", "short").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            auth.change_password(&actor, "correct horse", "correct horse")
                .await,
            Err(AuthError::Validation(_))
        ));
        auth.change_password(&actor, "correct horse", "battery staple")
            .await
            .unwrap();
        assert!(auth.login("dana@example.com", "battery staple").await.is_ok());

        let rotated = auth.regenerate_api_key(&actor).await.unwrap();
        assert_ne!(rotated, session.api_key);
        assert_eq!(
            auth.verify_api_key(&rotated).await.unwrap().map(|u| u.id),
            Some(dana.id)
        );
    }
}
