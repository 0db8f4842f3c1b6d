//! Shared fixtures: services over the in-memory store, temp-dir local
//! storage and a notifier that records instead of sending.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use argon2::Params;
use async_trait::async_trait;
use roster_core::models::{RegistrationResponse, RegistrationSubmission};
use roster_db::MemoryStore;
use roster_services::{
    ApprovalWorkflow, CredentialDeliveryService, CredentialIssuer, CredentialMailer,
    MemberService, Notification, NotificationDispatcher, NotificationError, Notifier,
    RegistrationService, UploadPolicy, UploadedFile,
};
use roster_storage::{LocalStorage, Storage};
use tempfile::TempDir;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierMode {
    Deliver,
    Fail,
    Hang,
}

/// Records every notification it is asked to send.
pub struct RecordingNotifier {
    mode: Mutex<NotifierMode>,
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new(mode: NotifierMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub async fn set_mode(&self, mode: NotifierMode) {
        *self.mode.lock().await = mode;
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, email: &str) -> Vec<Notification> {
        self.sent()
            .await
            .into_iter()
            .filter(|n| n.to == email)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let mode = *self.mode.lock().await;
        match mode {
            NotifierMode::Deliver => {
                self.sent.lock().await.push(notification.clone());
                Ok(())
            }
            NotifierMode::Fail => Err(NotificationError::Transport(
                "connection refused".to_string(),
            )),
            NotifierMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub storage: Arc<dyn Storage>,
    pub notifier: Arc<RecordingNotifier>,
    pub issuer: CredentialIssuer,
    pub registrations: RegistrationService,
    pub approvals: ApprovalWorkflow,
    pub members: MemberService,
    pub deliveries: CredentialDeliveryService,
    pub temp_dir: TempDir,
}

pub fn upload_policy() -> UploadPolicy {
    UploadPolicy {
        max_size_bytes: 1024 * 1024,
        allowed_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
        allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
    }
}

pub async fn harness() -> Harness {
    harness_with(NotifierMode::Deliver, 5).await
}

pub async fn harness_with(mode: NotifierMode, max_attempts: u32) -> Harness {
    let temp_dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(temp_dir.path(), "/api/v1/files".to_string())
            .await
            .unwrap(),
    );
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new(mode));
    let dispatcher = NotificationDispatcher::new(notifier.clone(), Duration::from_millis(200));
    let issuer = CredentialIssuer::with_params(Params::new(1024, 1, 1, None).unwrap());
    let mailer = CredentialMailer::new(
        dispatcher.clone(),
        store.clone(),
        "Roster".to_string(),
        Some("https://members.example.com".to_string()),
    );

    Harness {
        registrations: RegistrationService::new(
            store.clone(),
            store.clone(),
            storage.clone(),
            upload_policy(),
            dispatcher,
            "Roster".to_string(),
        ),
        approvals: ApprovalWorkflow::new(
            store.clone(),
            store.clone(),
            issuer.clone(),
            mailer.clone(),
            max_attempts,
        ),
        members: MemberService::new(store.clone(), storage.clone(), upload_policy()),
        deliveries: CredentialDeliveryService::new(
            store.clone(),
            store.clone(),
            issuer.clone(),
            mailer,
        ),
        store,
        storage,
        notifier,
        issuer,
        temp_dir,
    }
}

pub fn submission(email: &str, membership_type: &str) -> RegistrationSubmission {
    RegistrationSubmission {
        name: Some("Ada Lovelace".to_string()),
        email: Some(email.to_string()),
        mobile: Some("+96550000000".to_string()),
        company_name: Some("Analytical Engines".to_string()),
        profession: Some("Engineer".to_string()),
        nationality: Some("British".to_string()),
        membership_type: Some(membership_type.to_string()),
        consent: Some(true),
        ..Default::default()
    }
}

pub fn jpeg(name: &str) -> UploadedFile {
    UploadedFile {
        filename: name.to_string(),
        content_type: "image/jpeg".to_string(),
        data: b"\xff\xd8\xff\xe0 fake jpeg".to_vec(),
    }
}

impl Harness {
    pub async fn submit(&self, email: &str, membership_type: &str) -> RegistrationResponse {
        self.registrations
            .submit(submission(email, membership_type), None)
            .await
            .unwrap()
    }
}
