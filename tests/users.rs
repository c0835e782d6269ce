mod common;

use axum::http::StatusCode;
use common::{TestApp, body_json};
use serde_json::json;

#[tokio::test]
async fn create_user_returns_public_fields_only() {
    let app = TestApp::new().await;

    let resp = app
        .register("test@example.com", "testpass123", "Test Name")
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = body_json(resp).await;
    assert_eq!(body["email"], "test@example.com");
    assert_eq!(body["name"], "Test Name");
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    // The stored credential verifies against the submitted password.
    let (hash,): (String,) =
        sqlx::query_as("SELECT password_hash FROM users WHERE email = 'test@example.com'")
            .fetch_one(&app.db)
            .await
            .unwrap();
    assert_ne!(hash, "testpass123");
}

#[tokio::test]
async fn create_user_with_duplicate_email_fails() {
    let app = TestApp::new().await;

    app.register("test@example.com", "testpass123", "Test Name")
        .await;
    let resp = app
        .register("test@example.com", "otherpass123", "Other Name")
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(resp).await;
    assert!(body["email"][0].is_string());
}

#[tokio::test]
async fn duplicate_email_check_is_case_insensitive() {
    let app = TestApp::new().await;

    app.register("test@example.com", "testpass123", "Test Name")
        .await;
    let resp = app
        .register("TEST@EXAMPLE.COM", "testpass123", "Test Name")
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_user_with_short_password_fails_and_stores_nothing() {
    let app = TestApp::new().await;

    let resp = app.register("test@example.com", "pw", "Test Name").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = 'test@example.com'")
            .fetch_one(&app.db)
            .await
            .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn create_token_with_valid_credentials() {
    let app = TestApp::new().await;
    app.register("test@example.com", "testpass123", "Test Name")
        .await;

    let resp = app
        .post_json(
            "/user/token",
            &json!({ "email": "test@example.com", "password": "testpass123" }),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn create_token_with_bad_credentials_fails() {
    let app = TestApp::new().await;
    app.register("test@example.com", "testpass123", "Test Name")
        .await;

    let resp = app
        .post_json(
            "/user/token",
            &json!({ "email": "test@example.com", "password": "wrongpass" }),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(resp).await;
    assert!(body.get("token").is_none());
    assert!(body["non_field_errors"][0].is_string());
}

#[tokio::test]
async fn create_token_with_blank_password_fails() {
    let app = TestApp::new().await;
    app.register("test@example.com", "testpass123", "Test Name")
        .await;

    let resp = app
        .post_json(
            "/user/token",
            &json!({ "email": "test@example.com", "password": "" }),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(resp).await;
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn profile_requires_auth() {
    let app = TestApp::new().await;

    let resp = app.get("/user/me", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.get("/user/me", Some("bogus-token")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn retrieve_profile() {
    let app = TestApp::new().await;
    let token = app.create_user("test@example.com", "testpass123").await;

    let resp = app.get("/user/me", Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(
        body,
        json!({ "email": "test@example.com", "name": "Test User" })
    );
}

#[tokio::test]
async fn post_to_profile_is_not_allowed() {
    let app = TestApp::new().await;
    let token = app.create_user("test@example.com", "testpass123").await;

    let resp = app.post_json("/user/me", &json!({}), Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn update_profile_replaces_name_and_rehashes_password() {
    let app = TestApp::new().await;
    let token = app.create_user("test@example.com", "testpass123").await;

    let resp = app
        .patch_json(
            "/user/me",
            &json!({ "name": "Updated Name", "password": "newpassword" }),
            Some(&token),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["name"], "Updated Name");

    // Old password no longer authenticates, the new one does.
    let resp = app
        .post_json(
            "/user/token",
            &json!({ "email": "test@example.com", "password": "testpass123" }),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    app.login("test@example.com", "newpassword").await;
}

#[tokio::test]
async fn update_profile_rejects_short_password() {
    let app = TestApp::new().await;
    let token = app.create_user("test@example.com", "testpass123").await;

    let resp = app
        .patch_json("/user/me", &json!({ "password": "pw" }), Some(&token))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejected_update_writes_nothing() {
    let app = TestApp::new().await;
    let token = app.create_user("test@example.com", "testpass123").await;

    // A valid name paired with an invalid password must not persist either.
    let resp = app
        .patch_json(
            "/user/me",
            &json!({ "name": "New Name", "password": "pw" }),
            Some(&token),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.get("/user/me", Some(&token)).await;
    let body = body_json(resp).await;
    assert_eq!(body["name"], "Test User");

    // The old password still authenticates.
    app.login("test@example.com", "testpass123").await;
}
