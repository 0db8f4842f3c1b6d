//! Persistence for registrations, members and credential deliveries.

pub mod db;

pub use db::{
    CredentialDeliveryRepository, CredentialDeliveryStore, MemberRepository, MemberStore,
    RegistrationRepository, RegistrationStore,
};

#[cfg(feature = "memory")]
pub use db::MemoryStore;
