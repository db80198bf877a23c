use crate::auth::CurrentActor;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    Json,
};
use mediashelf_core::AppError;
use mediashelf_storage::keys::staged_key;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Permission required to stage files.
pub const UPLOAD_PERMISSION: &str = "admin.upload";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Name of the staged file, used as `path` of a later `add` operation.
    pub path: String,
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "media",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File staged", body = UploadResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Missing admin.upload permission", body = ErrorResponse),
        (status = 422, description = "File not provided", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(actor = %actor.id, operation = "upload"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    if !actor.has_permission(UPLOAD_PERMISSION) {
        return Err(AppError::PermissionDenied(UPLOAD_PERMISSION.to_string()).into());
    }

    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        file = Some((file_name, data.to_vec()));
        break;
    }

    let (file_name, data) =
        file.ok_or_else(|| AppError::InvalidInput("File not provided".to_string()))?;

    let key = staged_key(&file_name);
    let handle = state
        .gateway
        .put_bytes(state.config.uploads_disk(), &key, data, &file_name)
        .await?;

    tracing::info!(
        path = %handle.path,
        size_bytes = handle.size_bytes,
        mime_type = %handle.mime_type,
        "File staged"
    );

    Ok(Json(UploadResponse { path: handle.path }))
}
