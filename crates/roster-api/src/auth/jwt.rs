//! HS256 bearer token verification.
//!
//! Tokens are issued elsewhere; this service only checks signature, expiry
//! and role.

use crate::auth::models::{AuthContext, JwtClaims};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use roster_core::models::UserRole;
use roster_core::AppError;

pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthContext, AppError> {
        let token_data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        let role = token_data
            .claims
            .role
            .parse::<UserRole>()
            .map_err(AppError::Unauthorized)?;

        Ok(AuthContext {
            user_id: token_data.claims.sub,
            role,
        })
    }
}
