//! Registration approval.
//!
//! `Pending` (or `Rejected`) to `Approved`, creating exactly one member per
//! registration. Identifiers are allocated by max-scan and the member insert
//! is retried with fresh values when a concurrent approval took them first.
//! The credential notification runs detached and cannot fail the approval.

use std::sync::Arc;

use roster_core::models::{Member, MembershipType, NewMember, Registration};
use roster_core::AppError;
use roster_db::{MemberStore, RegistrationStore};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::allocator::IdentifierAllocator;
use crate::credentials::CredentialIssuer;
use crate::delivery::CredentialMailer;
use crate::notification::NotificationError;

pub struct ApprovalOutcome {
    pub member: Member,
    /// Detached credential notification. Dropping it does not cancel delivery.
    pub notification: JoinHandle<Result<(), NotificationError>>,
}

#[derive(Clone)]
pub struct ApprovalWorkflow {
    registrations: Arc<dyn RegistrationStore>,
    members: Arc<dyn MemberStore>,
    allocator: IdentifierAllocator,
    issuer: CredentialIssuer,
    mailer: CredentialMailer,
    max_attempts: u32,
}

impl ApprovalWorkflow {
    pub fn new(
        registrations: Arc<dyn RegistrationStore>,
        members: Arc<dyn MemberStore>,
        issuer: CredentialIssuer,
        mailer: CredentialMailer,
        max_attempts: u32,
    ) -> Self {
        Self {
            allocator: IdentifierAllocator::new(members.clone()),
            registrations,
            members,
            issuer,
            mailer,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Approve a registration.
    ///
    /// Fails with `NotFound` for an unknown id and `AlreadyApproved`, without
    /// side effects, when the registration was approved before.
    #[tracing::instrument(skip(self), fields(operation = "approve_registration"))]
    pub async fn approve(&self, registration_id: Uuid) -> Result<ApprovalOutcome, AppError> {
        let registration = self
            .registrations
            .get(registration_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Registration {} not found", registration_id))
            })?;

        if registration.is_approved() {
            return Err(AppError::AlreadyApproved(format!(
                "Registration {} is already approved",
                registration_id
            )));
        }

        let membership_type = MembershipType::from_label(&registration.profile.membership_type);
        let credentials = self.issuer.issue()?;
        let member = self
            .create_member(&registration, membership_type, &credentials.hash)
            .await?;

        let marked = self
            .registrations
            .mark_approved(registration.id, &member.unique_id, &member.member_id)
            .await?;
        if !marked {
            // The member insert is unique per registration, so this only
            // happens if the registration changed underneath us.
            tracing::warn!(
                registration_id = %registration.id,
                member_id = %member.member_id,
                "Registration was not pending when marking it approved"
            );
        }

        tracing::info!(
            registration_id = %registration.id,
            unique_id = %member.unique_id,
            member_id = %member.member_id,
            "Registration approved"
        );

        let notification = self.mailer.send_detached(&member, credentials);

        Ok(ApprovalOutcome {
            member,
            notification,
        })
    }

    async fn create_member(
        &self,
        registration: &Registration,
        membership_type: MembershipType,
        password_hash: &str,
    ) -> Result<Member, AppError> {
        for attempt in 1..=self.max_attempts {
            let unique_id = self.allocator.next_unique_id().await?;
            let member_id = self.allocator.next_member_id(membership_type).await?;

            let new_member = NewMember::from_registration(
                registration,
                unique_id.clone(),
                member_id.clone(),
                password_hash.to_string(),
            );

            match self.members.insert(new_member).await {
                Ok(member) => return Ok(member),
                Err(AppError::IdentifierConflict(reason)) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        unique_id = %unique_id,
                        member_id = %member_id,
                        reason = %reason,
                        "Identifier taken by a concurrent approval, allocating again"
                    );
                    tokio::task::yield_now().await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::IdentifierConflict(format!(
            "Could not allocate unique identifiers after {} attempts",
            self.max_attempts
        )))
    }
}
