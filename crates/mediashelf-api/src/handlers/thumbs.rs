use crate::auth::CurrentActor;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use mediashelf_collections::{
    authorize_optional, thumbs_200_for_collection, OwnerResolver, ThumbEntry,
};
use mediashelf_core::{AppError, OwnerRef};
use std::sync::Arc;
use uuid::Uuid;

/// List a collection's media with 200x200 thumbnail URLs.
#[utoipa::path(
    get,
    path = "/owners/{owner_type}/{owner_id}/collections/{collection}/thumbs",
    tag = "media",
    params(
        ("owner_type" = String, Path, description = "Owner type, e.g. post"),
        ("owner_id" = Uuid, Path, description = "Owner ID"),
        ("collection" = String, Path, description = "Collection name")
    ),
    responses(
        (status = 200, description = "Thumbnail listing", body = Vec<ThumbEntry>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Missing the collection's view permission", body = ErrorResponse),
        (status = 404, description = "Unknown owner or collection", body = ErrorResponse),
        (status = 500, description = "Image collection without thumbnail conversion", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(actor = %actor.id, operation = "list_thumbs"))]
pub async fn list_thumbs(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path((owner_type, owner_id, collection)): Path<(String, Uuid, String)>,
) -> Result<Json<Vec<ThumbEntry>>, HttpAppError> {
    let ctx = state.media_context(actor);
    let owner_ref = OwnerRef::new(owner_type, owner_id);

    let owner = state
        .owners
        .resolve(&owner_ref)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Owner type {} not found", owner_ref.owner_type)))?;

    let registry = owner.build_registry(&ctx.defaults);
    let conversions = owner.build_conversions(&registry);

    if let Some(policy) = registry.get(&collection) {
        authorize_optional(
            state.gate.as_ref(),
            policy.view_permission(),
            &ctx.actor,
            &owner_ref,
        )?;
    }

    let thumbs = thumbs_200_for_collection(
        state.store.as_ref(),
        &state.urls,
        &owner_ref,
        &registry,
        &conversions,
        &collection,
    )
    .await?;

    Ok(Json(thumbs))
}
