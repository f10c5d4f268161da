#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use bugdesk::api::AppState;
use bugdesk::config::{Config, SecurityConfig};
use bugdesk::services::MemoryMailer;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub use bugdesk::db::migrator::DEFAULT_API_KEY as ADMIN_KEY;

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<MemoryMailer>,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// In-memory database on a single connection, uploads in a fresh temp dir.
pub async fn spawn_app_with(tweak: impl FnOnce(&mut Config)) -> TestApp {
    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.uploads.dir = std::env::temp_dir()
        .join(format!("bugdesk-test-{}", uuid::Uuid::new_v4()))
        .display()
        .to_string();
    config.scheduler.enabled = false;
    config.security = SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    };
    tweak(&mut config);

    let mailer = Arc::new(MemoryMailer::new());
    let state = bugdesk::api::create_app_state_with_transport(config, mailer.clone(), None)
        .await
        .expect("Failed to create app state");
    let router = bugdesk::api::router(state.clone()).await;

    TestApp {
        router,
        state,
        mailer,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        api_key: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = api_key {
            builder = builder.header("X-Api-Key", key);
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.send(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// Registers a user with `role` and returns their API key.
    pub async fn user_key(&self, email: &str, role: &str) -> String {
        let (status, _) = self
            .json(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "name": email.split('@').next().unwrap(),
                    "password": "password123",
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register {email}");

        let (status, body) = self
            .json(
                "POST",
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": "password123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {email}");
        body["data"]["api_key"].as_str().unwrap().to_string()
    }

    pub async fn create_issue(&self, api_key: &str, title: &str) -> Value {
        let (status, body) = self
            .json(
                "POST",
                "/api/issues",
                Some(api_key),
                Some(serde_json::json!({
                    "title": title,
                    "description": "Steps to reproduce",
                    "severity": "HIGH",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create issue: {body}");
        body["data"].clone()
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    }
}

pub fn multipart_request(uri: &str, api_key: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let boundary = "bugdesk-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: text/plain\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("X-Api-Key", api_key)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}
