use std::sync::Arc;

use roster_core::models::{Member, MemberQuery, MemberResponse, Paginated, UserRole};
use roster_core::{AppError, MemberChanges};
use roster_db::MemberStore;
use roster_storage::keys::{is_owned_by, normalize_key};
use roster_storage::{KeyContext, Storage, StorageFolder};
use uuid::Uuid;

use crate::upload::{UploadPolicy, UploadedFile};

/// Profile update request after transport decoding.
#[derive(Debug, Default)]
pub struct MemberUpdate {
    pub fields: Vec<(String, Option<String>)>,
    pub photo: Option<UploadedFile>,
    pub logo: Option<UploadedFile>,
}

#[derive(Clone)]
pub struct MemberService {
    members: Arc<dyn MemberStore>,
    storage: Arc<dyn Storage>,
    upload_policy: UploadPolicy,
}

impl MemberService {
    pub fn new(
        members: Arc<dyn MemberStore>,
        storage: Arc<dyn Storage>,
        upload_policy: UploadPolicy,
    ) -> Self {
        Self {
            members,
            storage,
            upload_policy,
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<MemberResponse, AppError> {
        let member = self.find(id).await?;
        Ok(self.to_response(member).await)
    }

    #[tracing::instrument(skip(self), fields(operation = "list_members"))]
    pub async fn list(&self, query: &MemberQuery) -> Result<Paginated<MemberResponse>, AppError> {
        let (items, total) = self.members.list(query).await?;

        let mut responses = Vec::with_capacity(items.len());
        for member in items {
            responses.push(self.to_response(member).await);
        }

        Ok(Paginated::new(responses, query.page, total))
    }

    /// Apply a profile update as `role`.
    ///
    /// Keys the role may not write are dropped. New photo/logo uploads are
    /// stored under keys derived from the member id so they replace the
    /// previous file. Once the record points elsewhere, a previous file in
    /// the member's own key namespace is deleted best-effort; files the
    /// member did not upload itself, such as the registration photo, stay.
    #[tracing::instrument(skip(self, update), fields(operation = "update_member", role = %role))]
    pub async fn update(
        &self,
        id: Uuid,
        role: UserRole,
        update: MemberUpdate,
    ) -> Result<MemberResponse, AppError> {
        let existing = self.find(id).await?;
        let mut changes = MemberChanges::authorize(role, update.fields)?;

        if !changes.dropped().is_empty() {
            tracing::debug!(
                member_id = %existing.member_id,
                dropped = ?changes.dropped(),
                "Ignoring fields the caller may not write"
            );
        }

        let uploads = [
            ("photo", StorageFolder::ProfileImages, update.photo),
            ("logo", StorageFolder::CompanyLogos, update.logo),
        ];
        for (_, _, file) in &uploads {
            if let Some(file) = file {
                self.upload_policy.validate(file)?;
            }
        }

        let context = KeyContext::new(existing.member_id.clone());
        for (column, folder, file) in uploads {
            if let Some(file) = file {
                let key = self
                    .storage
                    .store(
                        folder,
                        &file.filename,
                        &file.content_type,
                        file.data,
                        Some(&context),
                    )
                    .await?;
                changes.set_storage_key(column, key)?;
            }
        }

        let updated = self
            .members
            .update_fields(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))?;

        let replaced = [
            (&existing.photo, "photo", StorageFolder::ProfileImages),
            (&existing.logo, "logo", StorageFolder::CompanyLogos),
        ];
        for (previous, column, folder) in replaced {
            if let Some(current) = changes.get(column) {
                self.remove_replaced(previous.as_deref(), current, folder, &context)
                    .await;
            }
        }

        tracing::info!(
            member_id = %updated.member_id,
            fields = changes.len(),
            "Member updated"
        );

        Ok(self.to_response(updated).await)
    }

    async fn remove_replaced(
        &self,
        previous: Option<&str>,
        current: Option<&str>,
        folder: StorageFolder,
        owner: &KeyContext,
    ) {
        let Some(previous) = previous.and_then(normalize_key) else {
            return;
        };
        if current.and_then(normalize_key).as_deref() == Some(previous.as_str()) {
            return;
        }
        if !is_owned_by(&previous, folder, owner) {
            tracing::debug!(key = %previous, "Keeping replaced file not owned by the member");
            return;
        }
        if let Err(e) = self.storage.delete(&previous).await {
            tracing::warn!(error = %e, key = %previous, "Failed to delete replaced file");
        }
    }

    async fn find(&self, id: Uuid) -> Result<Member, AppError> {
        self.members
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))
    }

    async fn to_response(&self, member: Member) -> MemberResponse {
        let photo_url = self.storage.resolve(member.photo.as_deref()).await;
        let logo_url = self.storage.resolve(member.logo.as_deref()).await;
        MemberResponse::new(member, photo_url, logo_url)
    }
}
