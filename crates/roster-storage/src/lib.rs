//! Roster Storage Library
//!
//! Storage locator for uploaded photos and logos. Records persist an opaque
//! storage key; a backend turns that key into a usable URL at read time.
//!
//! # Storage key format
//!
//! - Random: `{folder}/{photo|logo}-{unix_millis}-{random}{.ext}`
//! - With an owner context: `{folder}/{owner}-{photo|logo}{.ext}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation lives in the
//! `keys` module so every backend produces the same layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

pub use factory::create_storage;
pub use keys::{KeyContext, StorageFolder};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use roster_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
