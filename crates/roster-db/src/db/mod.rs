//! Database repositories for the data access layer.
//!
//! Each store is a trait so services can run against Postgres in production
//! and against the in-memory implementation in tests. Uniqueness is enforced
//! by the store, never by a read-then-check in the caller alone.

pub mod credential_delivery;
mod errors;
pub mod member;
#[cfg(feature = "memory")]
pub mod memory;
pub mod registration;
pub mod store;

pub use credential_delivery::CredentialDeliveryRepository;
pub use member::MemberRepository;
#[cfg(feature = "memory")]
pub use memory::MemoryStore;
pub use registration::RegistrationRepository;
pub use store::{CredentialDeliveryStore, MemberStore, RegistrationStore};
