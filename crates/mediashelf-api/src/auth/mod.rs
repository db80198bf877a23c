//! Bearer token authentication.

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{JwtClaims, JwtKeys};
pub use middleware::auth_middleware;
pub use models::CurrentActor;
