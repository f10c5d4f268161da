use sea_orm_migration::prelude::*;

mod m20251001_initial;
mod m20251002_seed_admin;
mod m20251003_add_issue_indexes;

pub use m20251002_seed_admin::{DEFAULT_ADMIN_EMAIL, DEFAULT_API_KEY};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_initial::Migration),
            Box::new(m20251002_seed_admin::Migration),
            Box::new(m20251003_add_issue_indexes::Migration),
        ]
    }
}
