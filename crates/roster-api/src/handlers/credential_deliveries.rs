//! Admin view of credential notifications that could not be delivered.

use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use roster_core::models::CredentialDelivery;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReissueResponse {
    pub member_ref: Uuid,
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/credential-deliveries",
    tag = "admin",
    responses(
        (status = 200, description = "Pending credential deliveries", body = Vec<CredentialDelivery>),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn list_pending_deliveries(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_admin()?;
    Ok(Json(state.deliveries.list_pending().await?))
}

/// Issue a new password for the member and send it again.
#[utoipa::path(
    post,
    path = "/api/v1/admin/credential-deliveries/{member_ref}/reissue",
    tag = "admin",
    params(("member_ref" = Uuid, Path, description = "Member ID")),
    responses(
        (status = 202, description = "New credentials issued, delivery dispatched", body = ReissueResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Member not found", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip(state), fields(operation = "reissue_credentials"))]
pub async fn reissue_credentials(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(member_ref): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_admin()?;
    // Delivery outcome lands in the queue; the handle is not awaited.
    let _ = state.deliveries.reissue(member_ref).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ReissueResponse {
            member_ref,
            status: "dispatched".to_string(),
        }),
    ))
}
