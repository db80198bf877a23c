use crate::auth::jwt::JwtKeys;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use mediashelf_core::AppError;
use std::sync::Arc;

/// Validate the bearer token and attach the resulting `Actor` to the request.
pub async fn auth_middleware(
    State(keys): State<Arc<JwtKeys>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    match keys.validate_token(token) {
        Ok(claims) => {
            let actor = claims.into_actor();
            tracing::debug!(actor = %actor.id, "Request authenticated");
            request.extensions_mut().insert(actor);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
