//! OpenAPI documentation.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mediashelf API",
        version = "0.1.0",
        description = "Media collections attached to owning entities. Files are staged with /upload, attached through collection batches, and files of non-public disks are served by /view after a permission check."
    ),
    paths(
        handlers::health::health_check,
        handlers::upload::upload_file,
        handlers::view::view_file,
        handlers::thumbs::list_thumbs,
    ),
    components(
        schemas(
            error::ErrorResponse,
            handlers::upload::UploadResponse,
            mediashelf_collections::ThumbEntry,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Service health"),
        (name = "media", description = "Staging and serving media files")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// The served OpenAPI document.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_media_routes() {
        let spec = get_openapi_spec();
        assert!(spec.paths.paths.contains_key("/upload"));
        assert!(spec.paths.paths.contains_key("/view"));
        assert!(spec
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
