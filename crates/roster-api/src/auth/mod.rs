pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::JwtVerifier;
pub use middleware::auth_middleware;
pub use models::{AuthContext, JwtClaims};
