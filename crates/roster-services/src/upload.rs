//! Upload validation for photos and logos.
//!
//! Runs before anything is written so a rejected file never leaves a stored
//! object or a record behind.

use roster_core::{AppError, Config};

/// A file received from a form.
#[derive(Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size_bytes", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
}

impl UploadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_size_bytes: config.max_photo_size_bytes(),
            allowed_extensions: config.allowed_extensions().to_vec(),
            allowed_content_types: config.allowed_content_types().to_vec(),
        }
    }

    pub fn validate(&self, file: &UploadedFile) -> Result<(), AppError> {
        if file.data.is_empty() {
            return Err(AppError::InvalidInput("Uploaded file is empty".to_string()));
        }
        validate_file_size(file.data.len(), self.max_size_bytes)?;
        sanitize_filename(&file.filename)?;
        validate_file_extension(&file.filename, &self.allowed_extensions)?;
        validate_content_type(&file.content_type, &self.allowed_content_types)?;
        Ok(())
    }
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Normalize MIME type by stripping parameters (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Validate content type against allowlist. Compares normalized MIME type only.
pub fn validate_content_type(content_type: &str, allowed_types: &[String]) -> Result<(), AppError> {
    let normalized = normalize_mime_type(content_type).to_lowercase();
    if !allowed_types.iter().any(|ct| normalized == ct.to_lowercase()) {
        return Err(AppError::InvalidInput(format!(
            "Invalid content type. Allowed types: {}",
            allowed_types.join(", ")
        )));
    }
    Ok(())
}

/// Validate file extension
pub fn validate_file_extension(
    filename: &str,
    allowed_extensions: &[String],
) -> Result<String, AppError> {
    let extension = match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    };

    if !allowed_extensions.contains(&extension) {
        return Err(AppError::InvalidInput(format!(
            "Invalid file extension. Allowed extensions: {}",
            allowed_extensions.join(", ")
        )));
    }

    Ok(extension)
}

/// Reject filenames carrying path components or traversal.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    const MAX_FILENAME_LENGTH: usize = 255;

    let path = std::path::Path::new(filename);
    let filename_only = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    if filename_only.contains("..") || filename_only.trim().is_empty() {
        return Err(AppError::InvalidInput("Invalid filename".to_string()));
    }
    if filename_only.len() > MAX_FILENAME_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Filename exceeds {} characters",
            MAX_FILENAME_LENGTH
        )));
    }

    Ok(filename_only.to_string())
}
