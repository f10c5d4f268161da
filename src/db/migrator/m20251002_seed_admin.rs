use crate::entities::prelude::*;
use crate::entities::users;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Default API key (regenerate it after the first login)
pub const DEFAULT_API_KEY: &str = "bugdesk_default_api_key_please_regenerate";

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@localhost";

fn hash_default_password() -> Result<String, DbErr> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(b"password", &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbErr::Custom(format!("Failed to hash default password: {e}")))
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password()?;

        let insert = Query::insert()
            .into_table(Users)
            .columns([
                users::Column::Email,
                users::Column::Name,
                users::Column::PasswordHash,
                users::Column::Role,
                users::Column::IsActive,
                users::Column::ApiKey,
                users::Column::CreatedAt,
                users::Column::UpdatedAt,
            ])
            .values_panic([
                DEFAULT_ADMIN_EMAIL.into(),
                "Administrator".into(),
                password_hash.into(),
                crate::domain::Role::Admin.as_str().into(),
                true.into(),
                DEFAULT_API_KEY.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Users)
            .and_where(Expr::col(users::Column::Email).eq(DEFAULT_ADMIN_EMAIL))
            .to_owned();

        manager.exec_stmt(delete).await?;

        Ok(())
    }
}
