mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use bugdesk::services::LiveUpdates;
use common::{ADMIN_KEY, TestApp, spawn_app};

async fn wait_for_mail(app: &TestApp, count: usize) -> Vec<String> {
    for _ in 0..100 {
        if app.mailer.sent().len() >= count {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    app.mailer.recipients()
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let (status, body) = app.json("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], true);
    assert_eq!(body["data"]["live_clients"], 0);
}

#[tokio::test]
async fn test_dashboard_is_scoped() {
    let app = spawn_app().await;
    let reporter = app.user_key("rae@example.com", "REPORTER").await;

    app.create_issue(&reporter, "Mine").await;
    app.create_issue(ADMIN_KEY, "Not mine").await;

    let (status, body) = app.json("GET", "/api/stats/dashboard", Some(&reporter), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_issues"], 1);
    assert_eq!(body["data"]["open_issues"], 1);

    let (_, body) = app.json("GET", "/api/stats/dashboard", Some(ADMIN_KEY), None).await;
    assert_eq!(body["data"]["total_issues"], 2);
    assert_eq!(body["data"]["issues_by_severity"]["HIGH"], 2);
}

#[tokio::test]
async fn test_daily_stats() {
    let app = spawn_app().await;
    let reporter = app.user_key("ray@example.com", "REPORTER").await;
    app.create_issue(ADMIN_KEY, "Counted").await;

    app.state.shared.stats_service.aggregate_today().await.unwrap();
    app.state.shared.stats_service.aggregate_today().await.unwrap();

    let (status, body) = app.json("GET", "/api/stats/daily", Some(ADMIN_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["total_issues"], 1);
    assert_eq!(rows[0]["high_count"], 1);

    let (status, _) = app.json("GET", "/api/stats/daily?days=0", Some(ADMIN_KEY), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.json("GET", "/api/stats/daily", Some(&reporter), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_send_bulk() {
    let app = spawn_app().await;
    let reporter = app.user_key("rob@example.com", "REPORTER").await;
    let request = json!({
        "subject": "Maintenance",
        "message": "Down at midnight.",
        "recipient_emails": ["ops@example.com", "OPS@example.com"],
        "recipient_roles": ["REPORTER"],
    });

    let (status, _) = app
        .json("POST", "/api/notifications/send-bulk", Some(&reporter), Some(request.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .json(
            "POST",
            "/api/notifications/send-bulk",
            Some(ADMIN_KEY),
            Some(json!({ "subject": "Nothing", "message": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .json(
            "POST",
            "/api/notifications/send-bulk",
            Some(ADMIN_KEY),
            Some(json!({
                "subject": "Bad",
                "message": "x",
                "recipient_emails": ["not-an-email"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .json("POST", "/api/notifications/send-bulk", Some(ADMIN_KEY), Some(request))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["recipients_count"], 2);
    assert_eq!(body["data"]["message"], "Notification queued for 2 recipients");

    let recipients = wait_for_mail(&app, 3).await;
    assert!(recipients.contains(&"ops@example.com".to_string()));
    assert!(recipients.contains(&"rob@example.com".to_string()));
}

#[tokio::test]
async fn test_test_email() {
    let app = spawn_app().await;

    let (status, body) = app
        .json("POST", "/api/notifications/test-email", Some(ADMIN_KEY), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Test email sent successfully");
    assert_eq!(app.mailer.recipients(), vec!["admin@localhost"]);
}

#[tokio::test]
async fn test_issue_events_reach_staff_and_live_clients() {
    let app = spawn_app().await;
    let reporter = app.user_key("rene@example.com", "REPORTER").await;
    app.user_key("max@example.com", "MAINTAINER").await;

    let (tx, mut rx) = LiveUpdates::channel();
    app.state.shared.live.connect("dashboard-1", tx).await;

    let issue = app.create_issue(&reporter, "Live crash").await;

    let payload = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let event: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(event["type"], "issue_update");
    assert_eq!(event["data"]["action"], "created");
    assert_eq!(event["data"]["issue"]["id"], issue["id"]);

    // two welcome mails, then the new-issue mail to each staff member
    let recipients = wait_for_mail(&app, 4).await;
    let count = |who: &str| recipients.iter().filter(|r| *r == who).count();
    assert_eq!(count("admin@localhost"), 1);
    assert_eq!(count("max@example.com"), 2);
    assert_eq!(count("rene@example.com"), 1);

    let uri = format!("/api/issues/{}", issue["id"]);
    app.json("PUT", &uri, Some(ADMIN_KEY), Some(json!({ "status": "DONE" })))
        .await;
    let payload = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let event: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(event["data"]["action"], "updated");
    assert_eq!(event["data"]["issue"]["status"], "DONE");

    app.json("DELETE", &uri, Some(ADMIN_KEY), None).await;
    let payload = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let event: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(event["data"]["action"], "deleted");
}

#[tokio::test]
async fn test_status_change_mails_reporter_and_assignee() {
    let app = spawn_app().await;
    let reporter = app.user_key("rhea@example.com", "REPORTER").await;
    let maintainer = app.user_key("milo@example.com", "MAINTAINER").await;
    let (_, me) = app.json("GET", "/api/users/me", Some(&maintainer), None).await;

    let issue = app.create_issue(&reporter, "Export fails").await;
    let uri = format!("/api/issues/{}", issue["id"]);

    // two welcome mails plus the new-issue mail to both staff members
    wait_for_mail(&app, 4).await;

    let (status, _) = app
        .json("PUT", &uri, Some(ADMIN_KEY), Some(json!({ "assignee_id": me["data"]["id"] })))
        .await;
    assert_eq!(status, StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(app.mailer.sent().len(), 4);

    let (status, _) = app
        .json("PUT", &uri, Some(ADMIN_KEY), Some(json!({ "status": "DONE" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    wait_for_mail(&app, 6).await;

    let status_mails: Vec<(String, String)> = app
        .mailer
        .sent()
        .into_iter()
        .skip(4)
        .map(|m| (m.to, m.subject))
        .collect();
    assert_eq!(status_mails.len(), 2);
    for who in ["rhea@example.com", "milo@example.com"] {
        assert!(
            status_mails
                .iter()
                .any(|(to, subject)| to == who
                    && subject == "Issue Status changed to DONE: Export fails"),
            "missing status mail for {who}: {status_mails:?}"
        );
    }

    let (status, _) = app
        .json("PUT", &uri, Some(ADMIN_KEY), Some(json!({ "status": "DONE" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(app.mailer.sent().len(), 6);
}

#[tokio::test]
async fn test_session_login_and_logout() {
    let app = spawn_app().await;

    let response = app
        .send(
            axum::http::Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(axum::body::Body::from(
                    json!({ "email": "admin@localhost", "password": "password" }).to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("set-cookie"));

    let (status, _) = app.json("POST", "/api/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
