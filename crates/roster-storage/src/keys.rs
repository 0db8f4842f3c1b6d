//! Shared key generation and normalization for storage backends.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::distr::Alphanumeric;
use rand::Rng;

use crate::traits::{StorageError, StorageResult};

/// Legacy prefix of same-origin file URLs that older records stored verbatim.
const LEGACY_FILES_PREFIX: &str = "/api/files/";

/// Logical bucket an upload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFolder {
    ProfileImages,
    CompanyLogos,
}

impl StorageFolder {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageFolder::ProfileImages => "profileimages",
            StorageFolder::CompanyLogos => "companylogos",
        }
    }

    fn file_prefix(self) -> &'static str {
        match self {
            StorageFolder::ProfileImages => "photo",
            StorageFolder::CompanyLogos => "logo",
        }
    }
}

impl Display for StorageFolder {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Identity an upload is attached to, used to derive a stable key so that a
/// re-upload replaces the previous file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyContext {
    pub owner: String,
}

impl KeyContext {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
        }
    }
}

/// Lower-cased extension of `filename` including the dot, or an empty string.
fn extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Generate the storage key for an upload.
pub fn generate_key(
    folder: StorageFolder,
    filename: &str,
    context: Option<&KeyContext>,
) -> StorageResult<String> {
    let ext = extension(filename);

    match context {
        Some(ctx) => {
            let owner = ctx.owner.trim();
            if owner.is_empty()
                || !owner
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(StorageError::InvalidKey(format!(
                    "Invalid key owner: {:?}",
                    ctx.owner
                )));
            }
            Ok(format!(
                "{}/{}-{}{}",
                folder.as_str(),
                owner,
                folder.file_prefix(),
                ext
            ))
        }
        None => {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default();
            Ok(format!(
                "{}/{}-{}-{}{}",
                folder.as_str(),
                folder.file_prefix(),
                millis,
                random_suffix(6),
                ext
            ))
        }
    }
}

/// Whether `key` lies in the namespace `generate_key` uses for `context` in
/// `folder`, whatever the extension.
pub fn is_owned_by(key: &str, folder: StorageFolder, context: &KeyContext) -> bool {
    let stem = format!(
        "{}/{}-{}",
        folder.as_str(),
        context.owner.trim(),
        folder.file_prefix()
    );
    match key.strip_prefix(stem.as_str()) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// Reject keys that could escape the storage root.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Turn a persisted value into a resolvable key.
///
/// Blank values yield `None`. Legacy values stored as same-origin paths are
/// reduced to their key, and a bare legacy filename belongs to the profile
/// image folder. Absolute URLs are not keys and yield `None`.
pub fn normalize_key(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.starts_with("http://") || raw.starts_with("https://") {
        tracing::warn!(value = %raw, "Persisted image reference is a URL, not a storage key");
        return None;
    }

    let key = raw
        .strip_prefix(LEGACY_FILES_PREFIX)
        .unwrap_or(raw)
        .trim_start_matches('/');

    if key.is_empty() {
        None
    } else if !key.contains('/') {
        Some(format!("{}/{}", StorageFolder::ProfileImages.as_str(), key))
    } else {
        Some(key.to_string())
    }
}
