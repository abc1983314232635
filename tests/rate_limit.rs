use axum::http::{header, StatusCode};
use email_otp_gate::Storage;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

mod common;
use common::{post_json, spawn_app};

#[tokio::test(start_paused = true)]
async fn test_cooldown_between_requests() {
    let (app, _, _) = spawn_app().await;
    let email = format!("cooldown_{}@example.com", Uuid::new_v4());
    let body = json!({ "email": email, "name": "Ada" });

    let response = post_json(&app, "/request-otp", body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(&app, "/request-otp", body.clone()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "30");

    tokio::time::advance(Duration::from_secs(30)).await;
    let response = post_json(&app, "/request-otp", body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn test_request_otp_spam_lock() {
    let (app, email_sender, _) = spawn_app().await;
    let email = format!("rate_limit_{}@example.com", Uuid::new_v4());
    let body = json!({ "email": email, "name": "Ada" });

    // 2 allowed requests per window (default config), spaced past the cooldown
    for _ in 0..2 {
        let response = post_json(&app, "/request-otp", body.clone()).await;
        assert_eq!(response.status(), StatusCode::OK);
        tokio::time::advance(Duration::from_secs(31)).await;
    }

    // 3rd request trips the spam lock
    let response = post_json(&app, "/request-otp", body.clone()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "3600");

    // Still locked once the request window is long gone
    tokio::time::advance(Duration::from_secs(600)).await;
    let response = post_json(&app, "/request-otp", body).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    assert_eq!(email_sender.sent_emails.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_verifications_lock_requests() {
    let (app, _, storage) = spawn_app().await;
    let email = format!("lock_{}@example.com", Uuid::new_v4());
    storage
        .set(&format!("otp:{}", email), "4821", 300)
        .await
        .unwrap();

    for _ in 0..2 {
        let response =
            post_json(&app, "/verify-otp", json!({ "email": email, "otp": "0000" })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = post_json(&app, "/verify-otp", json!({ "email": email, "otp": "0000" })).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "1800");

    // The lock deleted the code, so the right one is now unknown.
    let response = post_json(&app, "/verify-otp", json!({ "email": email, "otp": "4821" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json!({ "email": email, "name": "Ada" });
    let response = post_json(&app, "/request-otp", body.clone()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    tokio::time::advance(Duration::from_secs(1800)).await;
    let response = post_json(&app, "/request-otp", body).await;
    assert_eq!(response.status(), StatusCode::OK);
}
