use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use roster_api::auth::JwtClaims;
use uuid::Uuid;

use super::TEST_JWT_SECRET;

fn sign(claims: &JwtClaims, secret: &str) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn token_for(user_id: Uuid, role: &str) -> String {
    let now = Utc::now();
    sign(
        &JwtClaims {
            sub: user_id,
            role: role.to_string(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        },
        TEST_JWT_SECRET,
    )
}

pub fn admin_token() -> String {
    token_for(Uuid::new_v4(), "admin")
}

/// Token for the member with the given id, as returned in member JSON.
pub fn member_token(member_id: &str) -> String {
    token_for(Uuid::parse_str(member_id).unwrap(), "member")
}

pub fn expired_admin_token() -> String {
    let now = Utc::now();
    sign(
        &JwtClaims {
            sub: Uuid::new_v4(),
            role: "admin".to_string(),
            exp: (now - Duration::hours(1)).timestamp(),
            iat: (now - Duration::hours(2)).timestamp(),
        },
        TEST_JWT_SECRET,
    )
}

pub fn forged_admin_token() -> String {
    let now = Utc::now();
    sign(
        &JwtClaims {
            sub: Uuid::new_v4(),
            role: "admin".to_string(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        },
        "some-other-secret-that-is-32-characters-long",
    )
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
