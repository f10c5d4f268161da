//! Create user command handler

use anyhow::Context;

use crate::config::Config;
use crate::constants::limits::MIN_PASSWORD_LENGTH;
use crate::db::{NewUser, Store};
use crate::domain::Role;

pub async fn cmd_create_user(
    config: &Config,
    email: &str,
    name: &str,
    role: Role,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => std::env::var("BUGDESK_PASSWORD")
            .context("Pass --password or set BUGDESK_PASSWORD")?,
    };

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        anyhow::bail!("Password must be at least {MIN_PASSWORD_LENGTH} characters");
    }

    let store = Store::new(&config.general.database_url).await?;
    let email = email.trim().to_lowercase();

    if store.get_user_by_email(&email).await?.is_some() {
        anyhow::bail!("A user with email {email} already exists");
    }

    let user = store
        .create_user(
            NewUser {
                email,
                name: name.trim().to_string(),
                password,
                role,
            },
            &config.security,
        )
        .await?;
    let api_key = store.get_api_key(user.id).await?.unwrap_or_default();

    println!("Created {} ({}) with id {}", user.email, user.role, user.id);
    println!("API key: {api_key}");

    Ok(())
}
