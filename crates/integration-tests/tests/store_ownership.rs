//! Ownership-scoped store operations against a running server.
//!
//! Ignored by default; see the crate docs for how to run them.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use vitrinex_integration_tests::TestClient;

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_owner_lifecycle() {
    let owner = TestClient::new().unwrap();
    owner.register("ana").await.unwrap();

    let created = owner
        .post(
            "/api/stores/my",
            &json!({ "name": "Panadería Ana", "mode": "products", "comuna": "Ñuñoa" }),
        )
        .await
        .unwrap();
    assert!(created.status().is_success());
    let store: Value = created.json().await.unwrap();
    let id = store["id"].as_str().unwrap().to_owned();

    let public: Value = owner
        .get(&format!("/api/stores/{id}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(public["name"], "Panadería Ana");
    assert!(public.get("ownerId").is_none());

    let updated = owner
        .put(&format!("/api/stores/my/{id}"), &json!({ "description": "Masa madre" }))
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);

    let deleted = owner.delete(&format!("/api/stores/my/{id}")).await.unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = owner.get(&format!("/api/stores/{id}")).await.unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_other_account_cannot_touch_store() {
    let owner = TestClient::new().unwrap();
    owner.register("ana").await.unwrap();
    let store: Value = owner
        .post("/api/stores/my", &json!({ "name": "Panadería Ana" }))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = store["id"].as_str().unwrap().to_owned();

    let intruder = TestClient::new().unwrap();
    intruder.register("beto").await.unwrap();

    let update = intruder
        .put(&format!("/api/stores/my/{id}"), &json!({ "name": "Robada" }))
        .await
        .unwrap();
    assert_eq!(update.status(), StatusCode::NOT_FOUND);

    let delete = intruder.delete(&format!("/api/stores/my/{id}")).await.unwrap();
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);

    let mine: Value = intruder.get("/api/stores/my").await.unwrap().json().await.unwrap();
    assert_eq!(mine, json!([]));

    let still: Value = owner
        .get(&format!("/api/stores/{id}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(still["name"], "Panadería Ana");
}
