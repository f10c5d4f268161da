use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{FileId, IssueId, IssueStatus, Role, Severity, UserId};
use crate::models::user::UserChanges;
use crate::models::{DailySnapshot, Issue, IssueChanges, IssueFile, IssueFilter, NewIssue, User};

pub mod migrator;
pub mod repositories;

pub use repositories::file::StoredFile;
pub use repositories::user::NewUser;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn issue_repo(&self) -> repositories::issue::IssueRepository {
        repositories::issue::IssueRepository::new(self.conn.clone())
    }

    fn file_repo(&self) -> repositories::file::FileRepository {
        repositories::file::FileRepository::new(self.conn.clone())
    }

    fn stats_repo(&self) -> repositories::stats::StatsRepository {
        repositories::stats::StatsRepository::new(self.conn.clone())
    }

    pub async fn create_user(&self, new_user: NewUser, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list().await
    }

    pub async fn list_active_users_with_roles(&self, roles: &[Role]) -> Result<Vec<User>> {
        self.user_repo().list_active_with_roles(roles).await
    }

    pub async fn update_user(&self, id: UserId, changes: &UserChanges) -> Result<Option<User>> {
        self.user_repo().update(id, changes).await
    }

    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_credentials(email, password).await
    }

    pub async fn verify_user_password(&self, id: UserId, password: &str) -> Result<bool> {
        self.user_repo().verify_password_for(id, password).await
    }

    pub async fn update_user_password(
        &self,
        id: UserId,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(id, new_password, security)
            .await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn get_api_key(&self, id: UserId) -> Result<Option<String>> {
        self.user_repo().get_api_key(id).await
    }

    pub async fn regenerate_api_key(&self, id: UserId) -> Result<String> {
        self.user_repo().regenerate_api_key(id).await
    }

    pub async fn create_issue(&self, input: &NewIssue, reporter: UserId) -> Result<Issue> {
        self.issue_repo().create(input, reporter).await
    }

    pub async fn get_issue(&self, id: IssueId) -> Result<Option<Issue>> {
        self.issue_repo().get(id).await
    }

    pub async fn list_issues(
        &self,
        filter: IssueFilter,
        reporter: Option<UserId>,
    ) -> Result<Vec<Issue>> {
        self.issue_repo().list(filter, reporter).await
    }

    pub async fn update_issue(&self, id: IssueId, changes: &IssueChanges) -> Result<Option<Issue>> {
        self.issue_repo().update(id, changes).await
    }

    pub async fn delete_issue(&self, id: IssueId) -> Result<Option<Vec<IssueFile>>> {
        self.issue_repo().delete(id).await
    }

    pub async fn count_issues_by_status(
        &self,
        reporter: Option<UserId>,
    ) -> Result<Vec<(IssueStatus, u64)>> {
        self.issue_repo().count_by_status(reporter).await
    }

    pub async fn count_issues_by_severity(
        &self,
        reporter: Option<UserId>,
    ) -> Result<Vec<(Severity, u64)>> {
        self.issue_repo().count_by_severity(reporter).await
    }

    pub async fn add_file(
        &self,
        issue_id: IssueId,
        uploaded_by: UserId,
        stored: StoredFile,
    ) -> Result<IssueFile> {
        self.file_repo().create(issue_id, uploaded_by, stored).await
    }

    pub async fn get_file(&self, id: FileId) -> Result<Option<IssueFile>> {
        self.file_repo().get(id).await
    }

    pub async fn delete_file(&self, id: FileId) -> Result<bool> {
        self.file_repo().delete(id).await
    }

    pub async fn snapshot_daily_stats(&self, date: &str) -> Result<DailySnapshot> {
        self.stats_repo().snapshot(date).await
    }

    pub async fn recent_daily_stats(&self, limit: u64) -> Result<Vec<DailySnapshot>> {
        self.stats_repo().recent(limit).await
    }
}
