use async_trait::async_trait;
use roster_core::models::{
    CredentialDelivery, Member, MemberQuery, NewMember, NewRegistration, Registration,
    RegistrationQuery,
};
use roster_core::{AppError, MemberChanges};
use uuid::Uuid;

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Whether a registration that is not `Rejected` already uses `email`.
    async fn email_in_use(&self, email: &str) -> Result<bool, AppError>;

    /// Insert a `Pending` registration. Fails with `DuplicateEmail` when the
    /// email is held by another registration that is not `Rejected`.
    async fn insert(&self, registration: NewRegistration) -> Result<Registration, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Registration>, AppError>;

    /// One page of registrations, newest first, plus the total match count.
    async fn list(&self, query: &RegistrationQuery) -> Result<(Vec<Registration>, i64), AppError>;

    /// Move a registration to `Approved` and record its identifiers.
    ///
    /// Returns `false` when the registration is missing or already approved.
    async fn mark_approved(
        &self,
        id: Uuid,
        unique_id: &str,
        member_id: &str,
    ) -> Result<bool, AppError>;

    /// Move a `Pending` registration to `Rejected`. Returns `false` otherwise.
    async fn mark_rejected(&self, id: Uuid) -> Result<bool, AppError>;

    /// Set `membershipValidity` regardless of status.
    async fn set_membership_validity(
        &self,
        id: Uuid,
        validity: Option<String>,
    ) -> Result<Option<Registration>, AppError>;
}

#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Greatest `uniqueId` made of exactly five digits.
    async fn max_unique_id(&self) -> Result<Option<String>, AppError>;

    /// Greatest `memberId` of the form `<prefix><digits>`, compared numerically.
    async fn max_member_id(&self, prefix: char) -> Result<Option<String>, AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// Insert a member.
    ///
    /// Fails with `IdentifierConflict` when `uniqueId` or `memberId` is taken,
    /// `DuplicateEmail` when the email is taken and `AlreadyApproved` when the
    /// registration already produced a member.
    async fn insert(&self, member: NewMember) -> Result<Member, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Member>, AppError>;

    async fn find_by_registration(&self, registration_id: Uuid)
        -> Result<Option<Member>, AppError>;

    /// One page of members ordered by `uniqueId`, plus the total match count.
    async fn list(&self, query: &MemberQuery) -> Result<(Vec<Member>, i64), AppError>;

    /// Apply already authorized changes. Returns `None` when the member is missing.
    async fn update_fields(
        &self,
        id: Uuid,
        changes: &MemberChanges,
    ) -> Result<Option<Member>, AppError>;

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait CredentialDeliveryStore: Send + Sync {
    /// Record a failed credential notification, creating or re-opening the
    /// member's pending entry and counting the attempt.
    async fn record_failure(
        &self,
        member_ref: Uuid,
        member_id: &str,
        email: &str,
        reason: &str,
    ) -> Result<CredentialDelivery, AppError>;

    /// Close the member's pending entry, if any.
    async fn mark_delivered(&self, member_ref: Uuid) -> Result<(), AppError>;

    async fn get(&self, member_ref: Uuid) -> Result<Option<CredentialDelivery>, AppError>;

    /// Pending entries, oldest first.
    async fn list_pending(&self) -> Result<Vec<CredentialDelivery>, AppError>;
}
