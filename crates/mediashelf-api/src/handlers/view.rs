use crate::auth::CurrentActor;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Response, StatusCode},
    response::IntoResponse,
};
use futures::StreamExt;
use mediashelf_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ViewQuery {
    /// `<media id>/<relative path>` as produced by the URL resolver
    pub path: Option<String>,
}

#[utoipa::path(
    get,
    path = "/view",
    tag = "media",
    params(ViewQuery),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Missing the collection's view permission", body = ErrorResponse),
        (status = 404, description = "Medium or file not found", body = ErrorResponse),
        (status = 422, description = "Missing path", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, query), fields(actor = %actor.id, operation = "view_file"))]
pub async fn view_file(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ViewQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let ctx = state.media_context(actor);
    let file = state.views.view(&ctx, query.path.as_deref()).await?;

    let content_disposition = file.content_disposition();
    let body_stream = file.body.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.content_type.as_str())
        .header(header::CONTENT_DISPOSITION, content_disposition.as_str())
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
