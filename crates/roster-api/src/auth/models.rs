use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use roster_core::models::UserRole;
use roster_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid,    // member id, or an admin account id
    pub role: String, // "admin" or "member"
    pub exp: i64,
    pub iat: i64,
}

/// Caller identity verified by the auth middleware and stored in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthContext {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin role required".to_string()))
        }
    }

    /// Admins may act on any member, members only on their own record.
    pub fn require_self_or_admin(&self, member_id: Uuid) -> Result<(), AppError> {
        if self.role.is_admin() || self.user_id == member_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Members may only access their own record".to_string(),
            ))
        }
    }
}

// Read from extensions rather than re-verifying, so handlers that also take
// Multipart can still extract it.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing authentication context".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_passes_every_check() {
        let ctx = AuthContext {
            user_id: Uuid::new_v4(),
            role: UserRole::Admin,
        };
        assert!(ctx.require_admin().is_ok());
        assert!(ctx.require_self_or_admin(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_member_limited_to_own_record() {
        let id = Uuid::new_v4();
        let ctx = AuthContext {
            user_id: id,
            role: UserRole::Member,
        };
        assert!(matches!(ctx.require_admin(), Err(AppError::Forbidden(_))));
        assert!(ctx.require_self_or_admin(id).is_ok());
        assert!(matches!(
            ctx.require_self_or_admin(Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));
    }
}
