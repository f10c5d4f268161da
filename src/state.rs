use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::AbortHandle;

use crate::config::Config;
use crate::db::Store;
use crate::services::email::{EmailQueue, EmailTransport, transport_from_config};
use crate::services::{
    AuthService, FileService, FileStorage, IssueService, LiveUpdates, NotificationFanout,
    SeaOrmAuthService, SeaOrmFileService, SeaOrmIssueService, SeaOrmStatsService,
    SeaOrmUserService, StatsService, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub live: LiveUpdates,

    /// Lets shutdown stop the email worker.
    pub email_worker: AbortHandle,

    pub notifications: NotificationFanout,

    pub storage: FileStorage,

    pub issue_service: Arc<dyn IssueService>,

    pub file_service: Arc<dyn FileService>,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub stats_service: Arc<dyn StatsService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let transport = transport_from_config(&config.email);
        Self::with_email_transport(config, transport).await
    }

    /// Same as [`SharedState::new`] but with a caller-chosen email transport.
    pub async fn with_email_transport(
        config: Config,
        transport: Arc<dyn EmailTransport>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let storage = FileStorage::new(&config.uploads.dir);
        tokio::fs::create_dir_all(storage.root()).await?;

        let (emails, worker) = EmailQueue::start(transport, config.email.queue_capacity);
        let live = LiveUpdates::new();

        let notifications = NotificationFanout::new(
            store.clone(),
            emails,
            live.clone(),
            config.email.frontend_base_url.clone(),
        );

        let issue_service = Arc::new(SeaOrmIssueService::new(
            store.clone(),
            notifications.clone(),
            storage.clone(),
        )) as Arc<dyn IssueService + Send + Sync + 'static>;

        let file_service = Arc::new(SeaOrmFileService::new(
            store.clone(),
            storage.clone(),
            config.uploads.max_file_size,
        )) as Arc<dyn FileService + Send + Sync + 'static>;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
            notifications.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let user_service = Arc::new(SeaOrmUserService::new(store.clone()))
            as Arc<dyn UserService + Send + Sync + 'static>;

        let stats_service = Arc::new(SeaOrmStatsService::new(store.clone()))
            as Arc<dyn StatsService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            live,
            email_worker: worker.abort_handle(),
            notifications,
            storage,
            issue_service,
            file_service,
            auth_service,
            user_service,
            stats_service,
        })
    }
}
