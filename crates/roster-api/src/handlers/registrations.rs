//! Registration endpoints: public submission plus the admin review actions.

use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::multipart::{read_form, JsonOrMultipart};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use roster_core::models::{
    MemberResponse, PageRequest, Paginated, RegistrationQuery, RegistrationResponse,
    RegistrationSubmission, StatusFilter,
};
use roster_core::AppError;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RegistrationListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// `Pending`, `Approved`, `Rejected` or `all`
    pub status: Option<String>,
    /// Case-insensitive match on name, email or company
    pub search: Option<String>,
}

impl RegistrationListQuery {
    fn into_query(self) -> Result<RegistrationQuery, AppError> {
        let status = match self.status.as_deref() {
            Some(raw) => raw.parse::<StatusFilter>().map_err(AppError::InvalidInput)?,
            None => StatusFilter::All,
        };
        Ok(RegistrationQuery {
            status,
            search: self.search.filter(|s| !s.trim().is_empty()),
            page: PageRequest::new(self.page, self.limit),
        })
    }
}

/// `{id}` approves; `{id, membershipValidity}` only updates the validity.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRegistrationRequest {
    pub id: Uuid,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, nullable)]
    pub membership_validity: Option<Option<String>>,
}

/// Distinguishes an explicit `null` from an absent key.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalResponse {
    pub registration: RegistrationResponse,
    pub member: MemberResponse,
}

#[utoipa::path(
    post,
    path = "/api/v1/registrations",
    tag = "registrations",
    request_body(content = RegistrationSubmission, description = "JSON, or multipart/form-data with an optional `photo` file"),
    responses(
        (status = 201, description = "Registration created", body = RegistrationResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 413, description = "Photo too large", body = ErrorResponse),
        (status = 502, description = "Photo could not be stored", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, body), fields(operation = "submit_registration"))]
pub async fn submit_registration(
    State(state): State<Arc<AppState>>,
    body: JsonOrMultipart<RegistrationSubmission>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (submission, photo) = match body {
        JsonOrMultipart::Json(submission) => (submission, None),
        JsonOrMultipart::Multipart(multipart) => {
            let mut form = read_form(multipart, &["photo"]).await?;
            let mut submission = RegistrationSubmission::default();
            for (name, value) in std::mem::take(&mut form.fields) {
                if !submission.set_text(&name, value) {
                    tracing::debug!(field = %name, "Ignoring unknown registration field");
                }
            }
            (submission, form.take_file("photo"))
        }
    };

    let registration = state.registrations.submit(submission, photo).await?;

    Ok((StatusCode::CREATED, Json(registration)))
}

#[utoipa::path(
    get,
    path = "/api/v1/registrations",
    tag = "registrations",
    params(RegistrationListQuery),
    responses(
        (status = 200, description = "Registrations page", body = Paginated<RegistrationResponse>),
        (status = 400, description = "Invalid status filter", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip(state, query), fields(operation = "list_registrations"))]
pub async fn list_registrations(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(query): Query<RegistrationListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_admin()?;
    let query = query.into_query()?;
    let page = state.registrations.list(&query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/registrations/{id}",
    tag = "registrations",
    params(("id" = Uuid, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Registration found", body = RegistrationResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn get_registration(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_admin()?;
    Ok(Json(state.registrations.get(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/registrations",
    tag = "registrations",
    request_body = UpdateRegistrationRequest,
    responses(
        (status = 200, description = "Validity updated (RegistrationResponse) or registration approved (ApprovalResponse)", body = ApprovalResponse),
        (status = 400, description = "Already approved", body = ErrorResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse),
        (status = 409, description = "Identifiers could not be allocated", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip(state, request), fields(operation = "update_registration", registration_id = %request.id))]
pub async fn update_registration(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    ValidatedJson(request): ValidatedJson<UpdateRegistrationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_admin()?;

    if let Some(validity) = request.membership_validity {
        let registration = state
            .registrations
            .set_membership_validity(request.id, validity)
            .await?;
        return Ok(Json(serde_json::to_value(registration).map_err(AppError::from)?));
    }

    // The credential notification keeps running after the handle is dropped.
    let outcome = state.approvals.approve(request.id).await?;
    let member = state.members.get(outcome.member.id).await?;
    let registration = state.registrations.get(request.id).await?;

    let response = ApprovalResponse {
        registration,
        member,
    };
    Ok(Json(serde_json::to_value(response).map_err(AppError::from)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/registrations/{id}/reject",
    tag = "registrations",
    params(("id" = Uuid, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Registration rejected", body = RegistrationResponse),
        (status = 400, description = "Registration is not pending", body = ErrorResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip(state), fields(operation = "reject_registration"))]
pub async fn reject_registration(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_admin()?;
    Ok(Json(state.registrations.reject(id).await?))
}
