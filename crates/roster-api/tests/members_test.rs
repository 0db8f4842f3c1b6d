//! Member API integration tests.
//!
//! Run with: `cargo test -p roster-api --test members_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::auth::{bearer, member_token};
use helpers::{api_path, jpeg_bytes, setup_test_app};
use serde_json::{json, Value};

#[tokio::test]
async fn test_member_reads_own_record_only() {
    let app = setup_test_app().await;
    let ada = app.provision("ada@x.com", "Individual Member").await;
    let bob = app.provision("bob@x.com", "Corporate Member").await;
    let ada_id = ada["id"].as_str().unwrap();
    let token = member_token(ada_id);

    let response = app
        .client()
        .get(&api_path(&format!("/members/{}", ada_id)))
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["memberId"], "I10000");

    let response = app
        .client()
        .get(&api_path(&format!("/members/{}", bob["id"].as_str().unwrap())))
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(response.status_code(), 403);
    assert_eq!(response.json::<Value>()["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_member_update_drops_admin_only_fields() {
    let app = setup_test_app().await;
    let ada = app.provision("ada@x.com", "Individual Member").await;
    let ada_id = ada["id"].as_str().unwrap();

    let response = app
        .client()
        .patch(&api_path(&format!("/members/{}", ada_id)))
        .add_header("Authorization", bearer(&member_token(ada_id)))
        .json(&json!({
            "memberId": "I99999",
            "name": "Someone Else",
            "role": "admin",
            "companyBrief": "Looms and engines",
            "social": { "instagram": "@ada" }
        }))
        .await;

    assert_eq!(response.status_code(), 200, "{}", response.text());
    let body = response.json::<Value>();
    assert_eq!(body["memberId"], "I10000");
    assert_eq!(body["name"], "Ada Lovelace");
    assert_eq!(body["role"], "member");
    assert_eq!(body["companyBrief"], "Looms and engines");
    assert_eq!(body["instagram"], "@ada");
}

#[tokio::test]
async fn test_admin_update_writes_admin_fields_but_not_identifiers() {
    let app = setup_test_app().await;
    let ada = app.provision("ada@x.com", "Individual Member").await;
    let ada_id = ada["id"].as_str().unwrap();

    let response = app
        .client()
        .patch(&api_path(&format!("/members/{}", ada_id)))
        .add_header("Authorization", bearer(&app.admin_token))
        .json(&json!({
            "uniqueId": "99999",
            "name": "Ada King",
            "membershipValidity": "2028-01-01"
        }))
        .await;

    assert_eq!(response.status_code(), 200, "{}", response.text());
    let body = response.json::<Value>();
    assert_eq!(body["uniqueId"], "10001");
    assert_eq!(body["name"], "Ada King");
    assert_eq!(body["membershipValidity"], "2028-01-01");
}

#[tokio::test]
async fn test_blank_required_field_is_rejected() {
    let app = setup_test_app().await;
    let ada = app.provision("ada@x.com", "Individual Member").await;
    let ada_id = ada["id"].as_str().unwrap();

    let response = app
        .client()
        .patch(&api_path(&format!("/members/{}", ada_id)))
        .add_header("Authorization", bearer(&member_token(ada_id)))
        .json(&json!({ "mobile": "   " }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_multipart_photo_upload_and_file_read() {
    let app = setup_test_app().await;
    let ada = app.provision("ada@x.com", "Individual Member").await;
    let ada_id = ada["id"].as_str().unwrap();
    let token = member_token(ada_id);

    let form = MultipartForm::new()
        .add_text("designation", "Director")
        .add_text("social.twitter", "@ada")
        .add_part(
            "photo",
            Part::bytes(jpeg_bytes())
                .file_name("portrait.JPG")
                .mime_type("image/jpeg"),
        );

    let response = app
        .client()
        .patch(&api_path(&format!("/members/{}", ada_id)))
        .add_header("Authorization", bearer(&token))
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 200, "{}", response.text());
    let body = response.json::<Value>();
    assert_eq!(body["designation"], "Director");
    assert_eq!(body["twitter"], "@ada");
    assert_eq!(
        body["photo"],
        "/api/v1/files/profileimages/I10000-photo.jpg"
    );

    let response = app
        .client()
        .get(body["photo"].as_str().unwrap())
        .add_header("Authorization", bearer(&token))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "image/jpeg");
    assert_eq!(response.header("cache-control"), "private, no-cache");
    assert_eq!(response.as_bytes().to_vec(), jpeg_bytes());
    let etag = response.header("etag").to_str().unwrap().to_string();

    let response = app
        .client()
        .get(body["photo"].as_str().unwrap())
        .add_header("Authorization", bearer(&token))
        .add_header("If-None-Match", etag.clone())
        .await;
    assert_eq!(response.status_code(), 304);

    // Re-uploading to the same key changes the validator.
    let form = MultipartForm::new().add_part(
        "photo",
        Part::bytes(b"\xff\xd8\xff\xe0 another jpeg".to_vec())
            .file_name("new.jpg")
            .mime_type("image/jpeg"),
    );
    let updated = app
        .client()
        .patch(&api_path(&format!("/members/{}", ada_id)))
        .add_header("Authorization", bearer(&token))
        .multipart(form)
        .await
        .json::<Value>();
    assert_eq!(updated["photo"], body["photo"]);

    let response = app
        .client()
        .get(body["photo"].as_str().unwrap())
        .add_header("Authorization", bearer(&token))
        .add_header("If-None-Match", etag.clone())
        .await;
    assert_eq!(response.status_code(), 200);
    assert_ne!(response.header("etag").to_str().unwrap(), etag);
    assert_eq!(response.as_bytes().to_vec(), b"\xff\xd8\xff\xe0 another jpeg".to_vec());
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = setup_test_app().await;
    let ada = app.provision("ada@x.com", "Individual Member").await;
    let ada_id = ada["id"].as_str().unwrap();

    let form = MultipartForm::new()
        .add_text("designation", "Director")
        .add_part(
            "logo",
            Part::bytes(vec![0u8; 64 * 1024 + 1])
                .file_name("logo.png")
                .mime_type("image/png"),
        );

    let response = app
        .client()
        .patch(&api_path(&format!("/members/{}", ada_id)))
        .add_header("Authorization", bearer(&app.admin_token))
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 413);
    assert_eq!(response.json::<Value>()["code"], "PAYLOAD_TOO_LARGE");

    let response = app
        .client()
        .get(&api_path(&format!("/members/{}", ada_id)))
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    let body = response.json::<Value>();
    assert_eq!(body["designation"], Value::Null);
    assert_eq!(body["logo"], Value::Null);
}

#[tokio::test]
async fn test_update_unknown_member() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .patch(&api_path(&format!("/members/{}", uuid::Uuid::new_v4())))
        .add_header("Authorization", bearer(&app.admin_token))
        .json(&json!({ "companyBrief": "x" }))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_list_members_ordered_and_searchable() {
    let app = setup_test_app().await;
    app.provision("ada@x.com", "Individual Member").await;
    app.provision("bob@x.com", "Corporate Member").await;
    app.provision("cy@x.com", "Individual Member").await;
    let token = member_token(&uuid::Uuid::new_v4().to_string());

    let response = app
        .client()
        .get(&api_path("/members"))
        .add_header("Authorization", bearer(&token))
        .await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    let ids: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["uniqueId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["10001", "10002", "10003"]);
    assert_eq!(body["pagination"]["totalCount"], 3);

    let response = app
        .client()
        .get(&api_path("/members"))
        .add_query_param("search", "i10001")
        .add_header("Authorization", bearer(&token))
        .await;
    let body = response.json::<Value>();
    assert_eq!(body["pagination"]["totalCount"], 1);
    assert_eq!(body["items"][0]["email"], "cy@x.com");
}
