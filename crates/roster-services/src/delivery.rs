//! Credential delivery and the pending delivery queue.
//!
//! A credential notification that fails or times out is recorded against the
//! member so an admin can see who never received their password and issue a
//! fresh one. The plaintext is never stored or logged.

use std::sync::Arc;

use roster_core::models::{CredentialDelivery, Member};
use roster_core::AppError;
use roster_db::{CredentialDeliveryStore, MemberStore};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::credentials::{CredentialIssuer, IssuedCredentials};
use crate::notification::templates::{credentials_email, CredentialNotice};
use crate::notification::{NotificationDispatcher, NotificationError};

/// Sends credential notifications and keeps the delivery queue current.
#[derive(Clone)]
pub struct CredentialMailer {
    dispatcher: NotificationDispatcher,
    deliveries: Arc<dyn CredentialDeliveryStore>,
    organization: String,
    portal_url: Option<String>,
}

impl CredentialMailer {
    pub fn new(
        dispatcher: NotificationDispatcher,
        deliveries: Arc<dyn CredentialDeliveryStore>,
        organization: String,
        portal_url: Option<String>,
    ) -> Self {
        Self {
            dispatcher,
            deliveries,
            organization,
            portal_url,
        }
    }

    /// Send `credentials` to `member` on a detached task.
    ///
    /// Failure lands in the pending delivery queue, success closes any open
    /// entry. The returned handle resolves after the queue is updated.
    pub fn send_detached(
        &self,
        member: &Member,
        credentials: IssuedCredentials,
    ) -> JoinHandle<Result<(), NotificationError>> {
        let notification = credentials_email(&CredentialNotice {
            organization: &self.organization,
            portal_url: self.portal_url.as_deref(),
            name: &member.profile.name,
            email: &member.profile.email,
            member_id: &member.member_id,
            unique_id: &member.unique_id,
            password: &credentials.plaintext,
        });
        drop(credentials);

        let mailer = self.clone();
        let member_ref = member.id;
        let member_id = member.member_id.clone();
        let email = member.profile.email.clone();

        tokio::spawn(async move {
            let result = mailer.dispatcher.deliver(&notification).await;
            match &result {
                Ok(()) => {
                    tracing::info!(member_id = %member_id, "Credential notification sent");
                    if let Err(e) = mailer.deliveries.mark_delivered(member_ref).await {
                        tracing::error!(
                            error = %e,
                            member_id = %member_id,
                            "Failed to close credential delivery entry"
                        );
                    }
                }
                Err(reason) => {
                    tracing::warn!(
                        error = %reason,
                        member_id = %member_id,
                        "Credential notification failed, queued for reissue"
                    );
                    if let Err(e) = mailer
                        .deliveries
                        .record_failure(member_ref, &member_id, &email, &reason.to_string())
                        .await
                    {
                        tracing::error!(
                            error = %e,
                            member_id = %member_id,
                            "Failed to record pending credential delivery"
                        );
                    }
                }
            }
            result
        })
    }
}

/// Admin operations on the pending credential delivery queue.
#[derive(Clone)]
pub struct CredentialDeliveryService {
    members: Arc<dyn MemberStore>,
    deliveries: Arc<dyn CredentialDeliveryStore>,
    issuer: CredentialIssuer,
    mailer: CredentialMailer,
}

impl CredentialDeliveryService {
    pub fn new(
        members: Arc<dyn MemberStore>,
        deliveries: Arc<dyn CredentialDeliveryStore>,
        issuer: CredentialIssuer,
        mailer: CredentialMailer,
    ) -> Self {
        Self {
            members,
            deliveries,
            issuer,
            mailer,
        }
    }

    pub async fn list_pending(&self) -> Result<Vec<CredentialDelivery>, AppError> {
        self.deliveries.list_pending().await
    }

    /// Replace the member's password with a fresh one and send it again.
    ///
    /// The previous password stops working immediately. Delivery of the new
    /// one is best-effort, as on approval.
    #[tracing::instrument(skip(self), fields(operation = "reissue_credentials"))]
    pub async fn reissue(
        &self,
        member_ref: Uuid,
    ) -> Result<JoinHandle<Result<(), NotificationError>>, AppError> {
        let member = self
            .members
            .get(member_ref)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", member_ref)))?;

        let credentials = self.issuer.issue()?;
        if !self
            .members
            .set_password_hash(member.id, &credentials.hash)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "Member {} not found",
                member_ref
            )));
        }

        tracing::info!(member_id = %member.member_id, "Credentials reissued");
        Ok(self.mailer.send_detached(&member, credentials))
    }
}
