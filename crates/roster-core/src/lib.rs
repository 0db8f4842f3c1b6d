//! Roster Core Library
//!
//! Domain models, error types, configuration, field authorization and
//! submission validation shared by every roster crate.

pub mod config;
pub mod error;
pub mod fields;
pub mod models;
pub mod storage_types;
pub mod validation;

pub use config::{BaseConfig, Config, EmailConfig, RosterConfig, StorageConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use fields::{FieldAccess, FieldKind, FieldSpec, MemberChanges, FIELD_REGISTRY};
pub use storage_types::StorageBackend;
