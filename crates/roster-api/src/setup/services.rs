//! Service wiring.

use crate::auth::JwtVerifier;
use crate::state::AppState;
use roster_core::Config;
use roster_db::{
    CredentialDeliveryRepository, CredentialDeliveryStore, MemberRepository, MemberStore,
    RegistrationRepository, RegistrationStore,
};
use roster_services::{
    ApprovalWorkflow, CredentialDeliveryService, CredentialIssuer, CredentialMailer,
    MemberService, NotificationDispatcher, Notifier, RegistrationService, UploadPolicy,
};
use roster_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// The persistence backends every service is built on.
#[derive(Clone)]
pub struct Repositories {
    pub registrations: Arc<dyn RegistrationStore>,
    pub members: Arc<dyn MemberStore>,
    pub deliveries: Arc<dyn CredentialDeliveryStore>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            registrations: Arc::new(RegistrationRepository::new(pool.clone())),
            members: Arc::new(MemberRepository::new(pool.clone())),
            deliveries: Arc::new(CredentialDeliveryRepository::new(pool)),
        }
    }
}

pub fn initialize_services(
    config: &Config,
    repos: Repositories,
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    issuer: CredentialIssuer,
) -> Arc<AppState> {
    let dispatcher = NotificationDispatcher::new(notifier, config.notification_timeout());
    let upload_policy = UploadPolicy::from_config(config);
    let mailer = CredentialMailer::new(
        dispatcher.clone(),
        repos.deliveries.clone(),
        config.organization_name().to_string(),
        config.portal_url().map(str::to_string),
    );

    let registrations = RegistrationService::new(
        repos.registrations.clone(),
        repos.members.clone(),
        storage.clone(),
        upload_policy.clone(),
        dispatcher,
        config.organization_name().to_string(),
    );

    let approvals = ApprovalWorkflow::new(
        repos.registrations,
        repos.members.clone(),
        issuer.clone(),
        mailer.clone(),
        config.max_allocation_attempts(),
    );

    let members = MemberService::new(repos.members.clone(), storage.clone(), upload_policy);

    let deliveries =
        CredentialDeliveryService::new(repos.members, repos.deliveries, issuer, mailer);

    tracing::info!(
        notification_timeout_secs = config.notification_timeout().as_secs(),
        max_allocation_attempts = config.max_allocation_attempts(),
        "Services initialized"
    );

    Arc::new(AppState {
        config: config.clone(),
        registrations,
        approvals,
        members,
        deliveries,
        storage,
        jwt: Arc::new(JwtVerifier::new(config.jwt_secret())),
    })
}
