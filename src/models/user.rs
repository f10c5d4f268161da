use serde::{Deserialize, Serialize};

use crate::domain::{Actor, Role, UserId};
use crate::entities::users;

/// User data exposed outside the store (no password hash, no API key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: UserId::new(model.id),
            email: model.email,
            name: model.name,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl User {
    #[must_use]
    pub fn as_actor(&self) -> Actor {
        Actor {
            id: self.id,
            role: self.role,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Partial update of a user account; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChanges {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}
