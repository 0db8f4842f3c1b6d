use std::sync::Arc;

use roster_core::models::{
    Paginated, Registration, RegistrationQuery, RegistrationResponse, RegistrationSubmission,
};
use roster_core::validation::{check_submission, validate_submission};
use roster_core::AppError;
use roster_db::{MemberStore, RegistrationStore};
use roster_storage::{Storage, StorageFolder};
use uuid::Uuid;

use crate::notification::templates::thank_you_email;
use crate::notification::NotificationDispatcher;
use crate::upload::{UploadPolicy, UploadedFile};

/// Applicant submissions and the admin actions on them other than approval.
#[derive(Clone)]
pub struct RegistrationService {
    registrations: Arc<dyn RegistrationStore>,
    members: Arc<dyn MemberStore>,
    storage: Arc<dyn Storage>,
    upload_policy: UploadPolicy,
    dispatcher: NotificationDispatcher,
    organization: String,
}

impl RegistrationService {
    pub fn new(
        registrations: Arc<dyn RegistrationStore>,
        members: Arc<dyn MemberStore>,
        storage: Arc<dyn Storage>,
        upload_policy: UploadPolicy,
        dispatcher: NotificationDispatcher,
        organization: String,
    ) -> Self {
        Self {
            registrations,
            members,
            storage,
            upload_policy,
            dispatcher,
            organization,
        }
    }

    /// Accept a new application.
    ///
    /// Validation, the duplicate-email check and upload validation all run
    /// before the photo is stored. If the insert fails afterwards the stored
    /// photo is removed again.
    #[tracing::instrument(skip(self, submission, photo), fields(operation = "submit_registration"))]
    pub async fn submit(
        &self,
        submission: RegistrationSubmission,
        photo: Option<UploadedFile>,
    ) -> Result<RegistrationResponse, AppError> {
        let email = check_submission(&submission)?;

        if self.registrations.email_in_use(&email).await?
            || self.members.email_exists(&email).await?
        {
            return Err(AppError::DuplicateEmail(
                "This email is already registered".to_string(),
            ));
        }

        if let Some(file) = &photo {
            self.upload_policy.validate(file)?;
        }

        let photo_key = match photo {
            Some(file) => Some(
                self.storage
                    .store(
                        StorageFolder::ProfileImages,
                        &file.filename,
                        &file.content_type,
                        file.data,
                        None,
                    )
                    .await?,
            ),
            None => None,
        };

        let new_registration = validate_submission(submission, photo_key.clone())?;
        let registration = match self.registrations.insert(new_registration).await {
            Ok(registration) => registration,
            Err(e) => {
                if let Some(key) = &photo_key {
                    if let Err(cleanup) = self.storage.delete(key).await {
                        tracing::warn!(
                            error = %cleanup,
                            key = %key,
                            "Failed to remove photo of rejected submission"
                        );
                    }
                }
                return Err(e);
            }
        };

        tracing::info!(registration_id = %registration.id, "Registration submitted");

        self.dispatcher.dispatch_detached(thank_you_email(
            &self.organization,
            &registration.profile.name,
            &registration.profile.email,
        ));

        Ok(self.to_response(registration).await)
    }

    pub async fn get(&self, id: Uuid) -> Result<RegistrationResponse, AppError> {
        let registration = self.find(id).await?;
        Ok(self.to_response(registration).await)
    }

    #[tracing::instrument(skip(self), fields(operation = "list_registrations"))]
    pub async fn list(
        &self,
        query: &RegistrationQuery,
    ) -> Result<Paginated<RegistrationResponse>, AppError> {
        let (items, total) = self.registrations.list(query).await?;

        let mut responses = Vec::with_capacity(items.len());
        for registration in items {
            responses.push(self.to_response(registration).await);
        }

        Ok(Paginated::new(responses, query.page, total))
    }

    /// Update only `membershipValidity`, whatever the registration's status.
    #[tracing::instrument(skip(self), fields(operation = "set_membership_validity"))]
    pub async fn set_membership_validity(
        &self,
        id: Uuid,
        validity: Option<String>,
    ) -> Result<RegistrationResponse, AppError> {
        let validity = validity
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let registration = self
            .registrations
            .set_membership_validity(id, validity)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Registration {} not found", id)))?;

        Ok(self.to_response(registration).await)
    }

    /// Reject a pending registration. Its email becomes available again.
    #[tracing::instrument(skip(self), fields(operation = "reject_registration"))]
    pub async fn reject(&self, id: Uuid) -> Result<RegistrationResponse, AppError> {
        let registration = self.find(id).await?;

        if !self.registrations.mark_rejected(registration.id).await? {
            return Err(AppError::BadRequest(format!(
                "Only pending registrations can be rejected (status is {})",
                registration.status
            )));
        }

        tracing::info!(registration_id = %id, "Registration rejected");
        self.get(id).await
    }

    async fn find(&self, id: Uuid) -> Result<Registration, AppError> {
        self.registrations
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Registration {} not found", id)))
    }

    async fn to_response(&self, registration: Registration) -> RegistrationResponse {
        let photo_url = self.storage.resolve(registration.photo.as_deref()).await;
        RegistrationResponse::new(registration, photo_url)
    }
}
