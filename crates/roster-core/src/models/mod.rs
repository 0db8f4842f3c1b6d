//! Data models for the application
//!
//! Registrations are applicant submissions, members are the accounts
//! provisioned from approved registrations.

mod credential_delivery;
mod member;
mod membership;
mod pagination;
mod registration;

pub use credential_delivery::*;
pub use member::*;
pub use membership::*;
pub use pagination::*;
pub use registration::*;
