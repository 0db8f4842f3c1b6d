//! Authentication, credential delivery queue and service endpoints.
//!
//! Run with: `cargo test -p roster-api --test admin_test`

mod helpers;

use std::time::Duration;

use helpers::auth::{bearer, expired_admin_token, forged_admin_token, member_token};
use helpers::{api_path, setup_test_app};
use roster_core::models::DeliveryStatus;
use roster_db::CredentialDeliveryStore;
use serde_json::Value;

#[tokio::test]
async fn test_health_is_public() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/openapi.json").await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    assert!(body["paths"]["/api/v1/registrations"].is_object());
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let app = setup_test_app().await;
    let path = api_path("/registrations");

    let response = app.client().get(&path).await;
    assert_eq!(response.status_code(), 401);
    assert_eq!(response.json::<Value>()["code"], "UNAUTHORIZED");

    let response = app
        .client()
        .get(&path)
        .add_header("Authorization", format!("Basic {}", app.admin_token))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .client()
        .get(&path)
        .add_header("Authorization", bearer(&expired_admin_token()))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .client()
        .get(&path)
        .add_header("Authorization", bearer(&forged_admin_token()))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .client()
        .get(&path)
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = setup_test_app().await;

    let response = app.client().get(&api_path("/nothing-here")).await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_members_cannot_use_admin_endpoints() {
    let app = setup_test_app().await;
    let member = app.provision("ada@x.com", "Individual Member").await;
    let token = member_token(member["id"].as_str().unwrap());

    for path in ["/registrations", "/admin/credential-deliveries"] {
        let response = app
            .client()
            .get(&api_path(path))
            .add_header("Authorization", bearer(&token))
            .await;
        assert_eq!(response.status_code(), 403, "{}", path);
    }

    let response = app
        .client()
        .put(&api_path("/registrations"))
        .add_header("Authorization", bearer(&token))
        .json(&serde_json::json!({ "id": uuid::Uuid::new_v4() }))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_failed_credential_delivery_is_queued() {
    let app = setup_test_app().await;
    let member = app.provision("ada@x.com", "Individual Member").await;
    app.wait_for_pending(1).await;

    let response = app
        .client()
        .get(&api_path("/admin/credential-deliveries"))
        .add_header("Authorization", bearer(&app.admin_token))
        .await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry["memberRef"], member["id"]);
    assert_eq!(entry["memberId"], "I10000");
    assert_eq!(entry["email"], "ada@x.com");
    assert_eq!(entry["status"], "pending");
    assert_eq!(entry["attempts"], 1);
    assert!(entry["lastError"].as_str().is_some());
    assert!(entry.get("password").is_none());
}

#[tokio::test]
async fn test_reissue_dispatches_new_credentials() {
    let app = setup_test_app().await;
    let member = app.provision("ada@x.com", "Individual Member").await;
    let member_ref = member["id"].as_str().unwrap();
    app.wait_for_pending(1).await;

    let response = app
        .client()
        .post(&api_path(&format!(
            "/admin/credential-deliveries/{}/reissue",
            member_ref
        )))
        .add_header("Authorization", bearer(&app.admin_token))
        .await;

    assert_eq!(response.status_code(), 202);
    let body = response.json::<Value>();
    assert_eq!(body["memberRef"], member_ref);
    assert_eq!(body["status"], "dispatched");

    // Email is disabled, so the second attempt fails as well.
    let member_ref = uuid::Uuid::parse_str(member_ref).unwrap();
    let mut attempts = 0;
    for _ in 0..100 {
        let entry = app.store.get(member_ref).await.unwrap().unwrap();
        attempts = entry.attempts;
        if attempts == 2 {
            assert_eq!(entry.status, DeliveryStatus::Pending);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(attempts, 2);
}

#[tokio::test]
async fn test_reissue_unknown_member() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path(&format!(
            "/admin/credential-deliveries/{}/reissue",
            uuid::Uuid::new_v4()
        )))
        .add_header("Authorization", bearer(&app.admin_token))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_file_read_requires_auth_and_existing_file() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get(&api_path("/files/profileimages/missing.jpg"))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .client()
        .get(&api_path("/files/profileimages/missing.jpg"))
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    assert_eq!(response.status_code(), 404);
}
