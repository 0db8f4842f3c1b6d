//! Roster Services Layer
//!
//! Business services for the registration-to-membership pipeline: identifier
//! allocation, credential issuance, the approval workflow, profile updates
//! and best-effort notification dispatch. Thin HTTP handling stays in
//! roster-api.

pub mod allocator;
pub mod approval;
pub mod credentials;
pub mod delivery;
pub mod member;
pub mod notification;
pub mod registration;
pub mod upload;

pub use allocator::IdentifierAllocator;
pub use approval::{ApprovalOutcome, ApprovalWorkflow};
pub use credentials::{CredentialIssuer, IssuedCredentials};
pub use delivery::{CredentialDeliveryService, CredentialMailer};
pub use member::{MemberService, MemberUpdate};
pub use notification::{
    create_notifier, DisabledNotifier, Notification, NotificationDispatcher, NotificationError,
    Notifier, SmtpNotifier,
};
pub use registration::RegistrationService;
pub use upload::{UploadPolicy, UploadedFile};
