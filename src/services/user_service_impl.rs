//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::domain::permissions::can_manage_users;
use crate::domain::{Actor, UserId};
use crate::models::User;
use crate::models::user::UserChanges;
use crate::services::user_service::{UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn may_access(actor: &Actor, id: UserId) -> bool {
    can_manage_users(actor.role) || actor.id == id
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn me(&self, actor: &Actor) -> Result<User, UserError> {
        self.store
            .get_user(actor.id)
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn list(&self, actor: &Actor) -> Result<Vec<User>, UserError> {
        if !can_manage_users(actor.role) {
            return Err(UserError::Forbidden);
        }
        Ok(self.store.list_users().await?)
    }

    async fn get(&self, id: UserId, actor: &Actor) -> Result<User, UserError> {
        if !may_access(actor, id) {
            return Err(UserError::Forbidden);
        }
        self.store.get_user(id).await?.ok_or(UserError::NotFound)
    }

    async fn update(
        &self,
        id: UserId,
        mut changes: UserChanges,
        actor: &Actor,
    ) -> Result<User, UserError> {
        if !may_access(actor, id) {
            return Err(UserError::Forbidden);
        }

        if !can_manage_users(actor.role) {
            changes.role = None;
            changes.is_active = None;
        }

        if let Some(name) = &changes.name {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(UserError::Validation("Name cannot be empty".to_string()));
            }
            changes.name = Some(trimmed.to_string());
        }

        let user = self
            .store
            .update_user(id, &changes)
            .await?
            .ok_or(UserError::NotFound)?;

        info!(user_id = %id, by = %actor.id, "User updated");
        Ok(user)
    }
}
