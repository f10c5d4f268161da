mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{ADMIN_KEY, spawn_app};

#[tokio::test]
async fn test_auth_required() {
    let app = spawn_app().await;

    let (status, body) = app.json("GET", "/api/issues", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app.json("GET", "/api/issues", Some("wrong-key"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.json("GET", "/api/issues", Some(ADMIN_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_api_key_in_query() {
    let app = spawn_app().await;
    let uri = format!("/api/users/me?api_key={ADMIN_KEY}");

    let (status, body) = app.json("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "ADMIN");
}

#[tokio::test]
async fn test_register_and_login() {
    let app = spawn_app().await;

    let (status, _) = app
        .json(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "root@example.com",
                "name": "Root",
                "password": "password123",
                "role": "ADMIN",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let key = app.user_key("dana@example.com", "REPORTER").await;
    let (status, body) = app.json("GET", "/api/users/me", Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "dana@example.com");

    let (status, _) = app
        .json(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "DANA@example.com",
                "name": "Dana again",
                "password": "password123",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .json(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "dana@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reporter_creates_open_issue() {
    let app = spawn_app().await;
    let key = app.user_key("rita@example.com", "REPORTER").await;

    let (status, body) = app
        .json(
            "POST",
            "/api/issues",
            Some(&key),
            Some(json!({
                "title": "  Crash on save  ",
                "description": "Saving a draft crashes",
                "severity": "CRITICAL",
                "tags": ["ui", "crash", "ui-save"],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let issue = &body["data"];
    assert_eq!(issue["status"], "OPEN");
    assert_eq!(issue["title"], "Crash on save");
    assert_eq!(issue["tags"], json!(["ui", "crash", "ui-save"]));
    assert_eq!(issue["reporter"]["email"], "rita@example.com");
    assert!(issue["assignee"].is_null());
}

#[tokio::test]
async fn test_blank_title_is_rejected() {
    let app = spawn_app().await;

    let (status, body) = app
        .json(
            "POST",
            "/api/issues",
            Some(ADMIN_KEY),
            Some(json!({ "title": "   ", "description": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_reporters_only_see_their_issues() {
    let app = spawn_app().await;
    let alice = app.user_key("alice@example.com", "REPORTER").await;
    let bob = app.user_key("bob@example.com", "REPORTER").await;

    let issue = app.create_issue(&alice, "Alice's bug").await;
    app.create_issue(&bob, "Bob's bug").await;

    let (_, body) = app.json("GET", "/api/issues", Some(&alice), None).await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Alice's bug"]);

    let uri = format!("/api/issues/{}", issue["id"]);
    let (status, _) = app.json("GET", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.json("GET", "/api/issues", Some(ADMIN_KEY), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_reporter_cannot_assign() {
    let app = spawn_app().await;
    let reporter = app.user_key("rex@example.com", "REPORTER").await;
    let maintainer = app.user_key("mia@example.com", "MAINTAINER").await;

    let issue = app.create_issue(&reporter, "Broken link").await;
    let uri = format!("/api/issues/{}", issue["id"]);

    let (_, me) = app.json("GET", "/api/users/me", Some(&maintainer), None).await;
    let maintainer_id = me["data"]["id"].clone();

    let (status, body) = app
        .json(
            "PUT",
            &uri,
            Some(&reporter),
            Some(json!({ "title": "Broken footer link", "assignee_id": maintainer_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Broken footer link");
    assert!(body["data"]["assignee_id"].is_null());

    let (status, body) = app
        .json(
            "PUT",
            &uri,
            Some(&maintainer),
            Some(json!({ "assignee_id": maintainer_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["assignee"]["email"], "mia@example.com");
}

#[tokio::test]
async fn test_status_only_update() {
    let app = spawn_app().await;
    let (_, created) = app
        .json(
            "POST",
            "/api/issues",
            Some(ADMIN_KEY),
            Some(json!({
                "title": "Slow search",
                "description": "Search takes ten seconds",
                "severity": "HIGH",
                "tags": ["search", "perf"],
            })),
        )
        .await;
    let issue = &created["data"];
    let uri = format!("/api/issues/{}", issue["id"]);

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let (status, body) = app
        .json("PUT", &uri, Some(ADMIN_KEY), Some(json!({ "status": "IN_PROGRESS" })))
        .await;

    assert_eq!(status, StatusCode::OK);
    let updated = &body["data"];
    assert_eq!(updated["status"], "IN_PROGRESS");
    assert_eq!(updated["title"], "Slow search");
    assert_eq!(updated["description"], "Search takes ten seconds");
    assert_eq!(updated["severity"], "HIGH");
    assert_eq!(updated["tags"], json!(["search", "perf"]));
    assert_eq!(updated["created_at"], issue["created_at"]);
    assert_ne!(updated["updated_at"], issue["updated_at"]);
}

#[tokio::test]
async fn test_delete_issue() {
    let app = spawn_app().await;
    let reporter = app.user_key("rory@example.com", "REPORTER").await;
    let stranger = app.user_key("sam@example.com", "REPORTER").await;
    let maintainer = app.user_key("moe@example.com", "MAINTAINER").await;

    for key in [ADMIN_KEY, maintainer.as_str(), reporter.as_str()] {
        let (status, _) = app.json("DELETE", "/api/issues/9999", Some(key), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let issue = app.create_issue(&reporter, "Typo").await;
    let uri = format!("/api/issues/{}", issue["id"]);

    let (status, _) = app.json("DELETE", &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.json("DELETE", &uri, Some(ADMIN_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Issue deleted successfully");

    let (status, _) = app.json("GET", &uri, Some(ADMIN_KEY), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let own = app.create_issue(&reporter, "Duplicate").await;
    let uri = format!("/api/issues/{}", own["id"]);
    let (status, _) = app.json("DELETE", &uri, Some(&reporter), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_id_is_rejected() {
    let app = spawn_app().await;

    let (status, _) = app.json("GET", "/api/issues/0", Some(ADMIN_KEY), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_users_admin_only() {
    let app = spawn_app().await;
    let reporter = app.user_key("ruth@example.com", "REPORTER").await;

    let (status, _) = app.json("GET", "/api/users", Some(&reporter), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.json("GET", "/api/users", Some(ADMIN_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, me) = app.json("GET", "/api/users/me", Some(&reporter), None).await;
    let uri = format!("/api/users/{}", me["data"]["id"]);
    let (status, body) = app
        .json(
            "PUT",
            &uri,
            Some(&reporter),
            Some(json!({ "name": "Ruth B", "role": "ADMIN" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Ruth B");
    assert_eq!(body["data"]["role"], "REPORTER");
}
