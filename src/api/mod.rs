use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::warn;

use crate::config::Config;
use crate::constants::limits::MULTIPART_OVERHEAD;
use crate::services::email::EmailTransport;
use crate::state::SharedState;

pub mod auth;
mod error;
mod files;
mod issues;
mod notifications;
mod observability;
mod stats;
mod system;
mod types;
mod updates;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

/// Builds the state around a caller-supplied email transport.
pub async fn create_app_state_with_transport(
    config: Config,
    transport: Arc<dyn EmailTransport>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_email_transport(config, transport).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

/// Signing key for session cookies. Secrets shorter than 64 bytes are not
/// usable as a key, so a random one is generated instead.
fn session_key(secret: Option<&str>) -> Key {
    match secret.map(|s| Key::try_from(s.as_bytes())) {
        Some(Ok(key)) => key,
        Some(Err(_)) => {
            warn!("SECRET_KEY is shorter than 64 bytes, using a random session key");
            Key::generate()
        }
        None => {
            warn!("No SECRET_KEY configured, sessions will not survive a restart");
            Key::generate()
        }
    }
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, secret, inactivity_minutes, upload_limit) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.secret_key.clone(),
            config.server.session_inactivity_minutes,
            config.uploads.max_file_size,
        )
    };

    let protected_routes = create_protected_router(state.clone(), upload_limit);

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_signed(session_key(secret.as_deref()))
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            inactivity_minutes,
        )));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/health", get(system::health))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>, upload_limit: u64) -> Router<Arc<AppState>> {
    let body_limit = usize::try_from(upload_limit)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/auth/password", put(auth::change_password))
        .route("/auth/api-key", get(auth::get_api_key))
        .route("/auth/api-key/regenerate", post(auth::regenerate_api_key))
        .route("/users/me", get(users::me))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user).put(users::update_user))
        .route(
            "/issues",
            get(issues::list_issues).post(issues::create_issue),
        )
        .route(
            "/issues/{id}",
            get(issues::get_issue)
                .put(issues::update_issue)
                .delete(issues::delete_issue),
        )
        .route(
            "/files/upload/{issue_id}",
            post(files::upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/files/{id}",
            get(files::download_file).delete(files::delete_file),
        )
        .route("/stats/dashboard", get(stats::dashboard))
        .route("/stats/daily", get(stats::daily))
        .route("/notifications/send-bulk", post(notifications::send_bulk))
        .route("/notifications/test-email", post(notifications::test_email))
        .route("/updates/{client_id}", get(updates::updates_ws))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
