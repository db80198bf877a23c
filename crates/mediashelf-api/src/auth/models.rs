use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mediashelf_core::{Actor, AppError};

/// The authenticated actor, placed in request extensions by `auth_middleware`.
///
/// Extracted from request parts so it can be combined with `Multipart`.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .map(CurrentActor)
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Missing actor context".to_string())))
    }
}
