//! Test application over the in-memory store and temp-dir local storage.
//!
//! Email is disabled, so every credential notification lands in the pending
//! delivery queue.

#![allow(dead_code)]

pub mod auth;

use std::sync::Arc;
use std::time::Duration;

use argon2::Params;
use axum_test::TestServer;
use roster_api::setup::routes::setup_routes;
use roster_api::setup::services::{initialize_services, Repositories};
use roster_core::models::CredentialDelivery;
use roster_core::{BaseConfig, Config, EmailConfig, RosterConfig, StorageConfig, StorageBackend};
use roster_db::{CredentialDeliveryStore, MemoryStore};
use roster_services::{CredentialIssuer, DisabledNotifier};
use roster_storage::{LocalStorage, Storage};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const TEST_JWT_SECRET: &str = "roster-test-secret-at-least-32-characters";

/// Returns the versioned API path, e.g. `api_path("/members")` -> `/api/v1/members`.
pub fn api_path(path: &str) -> String {
    format!("{}{}", roster_api::constants::API_PREFIX, path)
}

pub fn test_config(storage_path: &str) -> Config {
    Config(Box::new(RosterConfig {
        base: BaseConfig {
            server_port: 0,
            environment: "test".to_string(),
            cors_origins: vec!["*".to_string()],
            database_url: "postgresql://localhost/roster_test".to_string(),
            db_max_connections: 1,
            db_timeout_seconds: 1,
            jwt_secret: TEST_JWT_SECRET.to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::Local,
            local_storage_path: storage_path.to_string(),
            local_storage_base_url: "/api/v1/files".to_string(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            signed_url_ttl_secs: 3600,
            max_photo_size_bytes: 64 * 1024,
            allowed_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
        },
        email: EmailConfig {
            enabled: false,
            smtp_host: None,
            smtp_port: 587,
            smtp_user: None,
            smtp_password: None,
            smtp_from: None,
            smtp_tls: true,
            notification_timeout_secs: 1,
        },
        organization_name: "Roster".to_string(),
        portal_url: Some("https://members.example.com".to_string()),
        max_allocation_attempts: 5,
    }))
}

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub admin_token: String,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn storage_root(&self) -> &std::path::Path {
        self._temp_dir.path()
    }

    /// Submit a JSON registration and return the created record.
    pub async fn submit(&self, email: &str, membership_type: &str) -> Value {
        let response = self
            .server
            .post(&api_path("/registrations"))
            .json(&registration_body(email, membership_type))
            .await;
        assert_eq!(response.status_code(), 201, "{}", response.text());
        response.json::<Value>()
    }

    /// Approve a registration as admin and return `{registration, member}`.
    pub async fn approve(&self, registration_id: &str) -> Value {
        let response = self
            .server
            .put(&api_path("/registrations"))
            .add_header("Authorization", format!("Bearer {}", self.admin_token))
            .json(&json!({ "id": registration_id }))
            .await;
        assert_eq!(response.status_code(), 200, "{}", response.text());
        response.json::<Value>()
    }

    /// Submit and approve; returns the member record.
    pub async fn provision(&self, email: &str, membership_type: &str) -> Value {
        let registration = self.submit(email, membership_type).await;
        let id = registration["id"].as_str().unwrap().to_string();
        self.approve(&id).await["member"].clone()
    }

    /// Wait until the detached credential notifications have been recorded.
    pub async fn wait_for_pending(&self, count: usize) -> Vec<CredentialDelivery> {
        for _ in 0..100 {
            let pending = self.store.list_pending().await.unwrap();
            if pending.len() >= count {
                return pending;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("expected {} pending credential deliveries", count);
    }
}

pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = test_config(&temp_dir.path().to_string_lossy());

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(temp_dir.path(), "/api/v1/files".to_string())
            .await
            .unwrap(),
    );
    let store = Arc::new(MemoryStore::new());
    let repos = Repositories {
        registrations: store.clone(),
        members: store.clone(),
        deliveries: store.clone(),
    };
    let issuer = CredentialIssuer::with_params(Params::new(1024, 1, 1, None).unwrap());

    let state = initialize_services(&config, repos, storage, Arc::new(DisabledNotifier), issuer);
    let router = setup_routes(&config, state).unwrap();

    TestApp {
        server: TestServer::new(router).unwrap(),
        store,
        admin_token: auth::admin_token(),
        _temp_dir: temp_dir,
    }
}

pub fn registration_body(email: &str, membership_type: &str) -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": email,
        "mobile": "+96550000000",
        "companyName": "Analytical Engines",
        "profession": "Engineer",
        "nationality": "British",
        "membershipType": membership_type,
        "consent": true
    })
}

/// Bytes that pass the upload policy as a JPEG.
pub fn jpeg_bytes() -> Vec<u8> {
    b"\xff\xd8\xff\xe0 fake jpeg".to_vec()
}
