//! Request bodies that may arrive either as JSON or as a multipart form.

use crate::error::{HttpAppError, ValidatedJson};
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use roster_core::AppError;
use roster_services::UploadedFile;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Body of an endpoint that accepts JSON or `multipart/form-data`,
/// selected by the request's content type.
pub enum JsonOrMultipart<T> {
    Json(T),
    Multipart(Multipart),
}

impl<T, S> FromRequest<S> for JsonOrMultipart<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.trim_start().starts_with("multipart/form-data"))
            .unwrap_or(false);

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                HttpAppError(AppError::InvalidInput(format!(
                    "Invalid multipart body: {}",
                    e.body_text()
                )))
            })?;
            Ok(JsonOrMultipart::Multipart(multipart))
        } else {
            let ValidatedJson(body) = ValidatedJson::<T>::from_request(req, state).await?;
            Ok(JsonOrMultipart::Json(body))
        }
    }
}

/// A decoded multipart form: text fields in order of appearance plus the
/// files posted under the requested field names.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

/// Drain a multipart body.
///
/// Parts named in `file_fields` are read as files; an empty part with no
/// filename (a form submitted without choosing a file) is skipped. Any other
/// part is read as text.
pub async fn read_form(
    mut multipart: Multipart,
    file_fields: &[&str],
) -> Result<MultipartForm, AppError> {
    let mut form = MultipartForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };

        if file_fields.contains(&name.as_str()) {
            let filename = field
                .file_name()
                .map(|s| s.trim().to_string())
                .unwrap_or_default();
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

            if filename.is_empty() && data.is_empty() {
                continue;
            }
            if form.files.contains_key(&name) {
                return Err(AppError::InvalidInput(format!(
                    "Multiple files are not allowed for field '{}'",
                    name
                )));
            }

            form.files.insert(
                name,
                UploadedFile {
                    filename: if filename.is_empty() {
                        "upload".to_string()
                    } else {
                        filename
                    },
                    content_type,
                    data: data.to_vec(),
                },
            );
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read field '{}': {}", name, e)))?;
            form.fields.push((name, value));
        }
    }

    Ok(form)
}
