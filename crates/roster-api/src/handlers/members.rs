use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::multipart::{read_form, JsonOrMultipart};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use roster_core::models::{MemberQuery, MemberResponse, PageRequest, Paginated};
use roster_core::AppError;
use roster_services::MemberUpdate;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MemberListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Case-insensitive match on name, email, mobile, memberId or company
    pub search: Option<String>,
}

/// Flatten a JSON update body into `(key, value)` pairs.
///
/// A nested `social` object becomes `social.<network>` keys. `null` clears a
/// field; numbers and booleans are taken as their text form.
fn json_fields(body: Value) -> Result<Vec<(String, Option<String>)>, AppError> {
    let Value::Object(map) = body else {
        return Err(AppError::InvalidInput(
            "Request body must be a JSON object".to_string(),
        ));
    };

    let mut fields = Vec::with_capacity(map.len());
    flatten_into(&mut fields, None, map)?;
    Ok(fields)
}

fn flatten_into(
    fields: &mut Vec<(String, Option<String>)>,
    prefix: Option<&str>,
    map: Map<String, Value>,
) -> Result<(), AppError> {
    for (key, value) in map {
        let key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key,
        };
        match value {
            Value::Null => fields.push((key, None)),
            Value::String(s) => fields.push((key, Some(s))),
            Value::Number(n) => fields.push((key, Some(n.to_string()))),
            Value::Bool(b) => fields.push((key, Some(b.to_string()))),
            Value::Object(nested) if prefix.is_none() && key == "social" => {
                flatten_into(fields, Some("social"), nested)?;
            }
            Value::Object(_) | Value::Array(_) => {
                return Err(AppError::InvalidInput(format!(
                    "Field '{}' must be a string or null",
                    key
                )));
            }
        }
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/members",
    tag = "members",
    params(MemberListQuery),
    responses(
        (status = 200, description = "Members page, ordered by uniqueId", body = Paginated<MemberResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip(state, query), fields(operation = "list_members", user_id = %auth.user_id))]
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(query): Query<MemberListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let query = MemberQuery {
        search: query.search.filter(|s| !s.trim().is_empty()),
        page: PageRequest::new(query.page, query.limit),
    };
    Ok(Json(state.members.list(&query).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/members/{id}",
    tag = "members",
    params(("id" = Uuid, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member found", body = MemberResponse),
        (status = 403, description = "Not the caller's own record", body = ErrorResponse),
        (status = 404, description = "Member not found", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn get_member(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_self_or_admin(id)?;
    Ok(Json(state.members.get(id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/members/{id}",
    tag = "members",
    params(("id" = Uuid, Path, description = "Member ID")),
    request_body(content = inline(Object), description = "JSON object, or multipart/form-data with optional `photo`/`logo` files; keys the caller's role may not write are ignored"),
    responses(
        (status = 200, description = "Member updated", body = MemberResponse),
        (status = 400, description = "Invalid field value or upload", body = ErrorResponse),
        (status = 403, description = "Not the caller's own record", body = ErrorResponse),
        (status = 404, description = "Member not found", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip(state, body), fields(operation = "update_member", role = %auth.role))]
pub async fn update_member(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    body: JsonOrMultipart<Value>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_self_or_admin(id)?;

    let update = match body {
        JsonOrMultipart::Json(body) => MemberUpdate {
            fields: json_fields(body)?,
            ..Default::default()
        },
        JsonOrMultipart::Multipart(multipart) => {
            let mut form = read_form(multipart, &["photo", "logo"]).await?;
            MemberUpdate {
                photo: form.take_file("photo"),
                logo: form.take_file("logo"),
                fields: form
                    .fields
                    .into_iter()
                    .map(|(key, value)| (key, Some(value)))
                    .collect(),
            }
        }
    };

    let member = state.members.update(id, auth.role, update).await?;
    Ok(Json(member))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_fields_flattens_social() {
        let mut fields = json_fields(json!({
            "companyBrief": "Looms",
            "photo": null,
            "social": { "instagram": "@ada", "twitter": null }
        }))
        .unwrap();
        fields.sort();

        assert_eq!(
            fields,
            vec![
                ("companyBrief".to_string(), Some("Looms".to_string())),
                ("photo".to_string(), None),
                ("social.instagram".to_string(), Some("@ada".to_string())),
                ("social.twitter".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_json_fields_rejects_nested_values() {
        assert!(json_fields(json!({ "name": ["a", "b"] })).is_err());
        assert!(json_fields(json!({ "social": { "x": { "y": "z" } } })).is_err());
        assert!(json_fields(json!("not an object")).is_err());
    }
}
