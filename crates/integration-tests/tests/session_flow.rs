//! Account and session flow against a running server.
//!
//! Ignored by default; see the crate docs for how to run them.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use vitrinex_integration_tests::{TEST_PASSWORD, TestClient};

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_health() {
    let client = TestClient::new().unwrap();
    let resp = client.get("/health").await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_register_sets_session_cookie() {
    let client = TestClient::new().unwrap();
    let (email, resp) = client.register("ana").await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let cookie = resp.headers()["set-cookie"].to_str().unwrap().to_owned();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["email"], email.as_str());
    assert!(body.get("passwordHash").is_none());

    // The jar now carries the session
    let verify = client.get("/api/auth/verify").await.unwrap();
    assert_eq!(verify.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_logout_ends_session() {
    let client = TestClient::new().unwrap();
    client.register("ana").await.unwrap();

    let logout = client.post("/api/auth/logout", &json!({})).await.unwrap();
    assert_eq!(logout.status(), StatusCode::OK);

    let profile = client.get("/api/auth/profile").await.unwrap();
    assert_eq!(profile.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_login_from_another_client() {
    let first = TestClient::new().unwrap();
    let (email, _) = first.register("ana").await.unwrap();

    let second = TestClient::new().unwrap();
    let anonymous = second.get("/api/auth/profile").await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let wrong = second
        .post("/api/auth/login", &json!({ "email": email, "password": "nope-nope" }))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let login = second
        .post("/api/auth/login", &json!({ "email": email, "password": TEST_PASSWORD }))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);

    let profile: Value = second
        .get("/api/auth/profile")
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["email"], email.as_str());
}
