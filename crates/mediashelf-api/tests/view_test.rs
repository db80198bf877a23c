//! View API integration tests: staged upload, batch attach, permission-checked read.
//!
//! Run with: `cargo test -p mediashelf-api --test view_test`

mod helpers;

use helpers::{actor, setup_test_app, TestApp};
use mediashelf_api::catalog::Post;
use mediashelf_core::{CustomProperties, MediaBatch, MediaRecord, OperationInput};
use uuid::Uuid;

const PDF: &[u8] = b"%PDF-1.4 quarterly figures";

/// Stage a file over HTTP and attach it to a post's collection.
async fn attach(app: &TestApp, collection: &str, file_name: &str, bytes: &[u8]) -> MediaRecord {
    let staged = app.stage(file_name, "application/pdf", bytes).await;

    let post = Post { id: Uuid::new_v4() };
    let ctx = app.state.media_context(actor(&["vop.upload"]));

    let mut metadata = CustomProperties::new();
    metadata.insert("file_name".into(), serde_json::json!(file_name));
    let add = OperationInput::add(collection, staged).with_metadata(metadata);
    let batch = MediaBatch::new().with(collection, vec![add]);

    let report = app
        .state
        .reconciler
        .process_owner(&ctx, &post, &batch)
        .await
        .expect("Batch should be applied");
    assert_eq!(report.added.len(), 1);
    report.added.into_iter().next().unwrap()
}

#[tokio::test]
async fn test_view_private_document() {
    let app = setup_test_app().await;
    let record = attach(&app, "documents", "figures.pdf", PDF).await;
    assert_eq!(record.disk, "media_private");

    let url = app.state.urls.resolve(&record).unwrap();
    assert_eq!(url, format!("/view?path={}/figures.pdf", record.id));

    let denied = app
        .client()
        .get("/view")
        .add_query_param("path", &record.storage_path)
        .add_header("Authorization", format!("Bearer {}", app.token(&[])))
        .await;
    assert_eq!(denied.status_code(), 403);

    let allowed = app
        .client()
        .get("/view")
        .add_query_param("path", &record.storage_path)
        .add_header("Authorization", format!("Bearer {}", app.token(&["vop.view"])))
        .await;
    assert_eq!(allowed.status_code(), 200);
    assert_eq!(allowed.header("content-type"), "application/pdf");
    assert_eq!(
        allowed.header("content-disposition"),
        "inline; filename=\"figures.pdf\""
    );
    assert_eq!(allowed.as_bytes().as_ref(), PDF);
}

#[tokio::test]
async fn test_view_unknown_medium() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/view")
        .add_query_param("path", format!("{}/missing.pdf", Uuid::new_v4()))
        .add_header("Authorization", format!("Bearer {}", app.token(&["vop.view"])))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_view_missing_file_on_disk() {
    let app = setup_test_app().await;
    let record = attach(&app, "documents", "figures.pdf", PDF).await;

    let response = app
        .client()
        .get("/view")
        .add_query_param("path", format!("{}/other.pdf", record.id))
        .add_header("Authorization", format!("Bearer {}", app.token(&["vop.view"])))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_view_path_escaping_medium_is_not_found() {
    let app = setup_test_app().await;
    let record = attach(&app, "documents", "figures.pdf", PDF).await;

    let response = app
        .client()
        .get("/view")
        .add_query_param("path", format!("{}/../x", record.id))
        .add_header("Authorization", format!("Bearer {}", app.token(&["vop.view"])))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_view_without_path() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/view")
        .add_header("Authorization", format!("Bearer {}", app.token(&["vop.view"])))
        .await;

    assert_eq!(response.status_code(), 422);
}

#[tokio::test]
async fn test_view_requires_token() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/view")
        .add_query_param("path", format!("{}/figures.pdf", Uuid::new_v4()))
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_thumbs_listing_for_documents() {
    let app = setup_test_app().await;
    let record = attach(&app, "documents", "figures.pdf", PDF).await;
    let thumbs_path = format!(
        "/owners/{}/{}/collections/documents/thumbs",
        record.owner.owner_type, record.owner.owner_id
    );

    let denied = app
        .client()
        .get(&thumbs_path)
        .add_header("Authorization", format!("Bearer {}", app.token(&[])))
        .await;
    assert_eq!(denied.status_code(), 403);

    let response = app
        .client()
        .get(&thumbs_path)
        .add_header("Authorization", format!("Bearer {}", app.token(&["vop.view"])))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["type"], "application/pdf");
    assert_eq!(entries[0]["thumb_url"], entries[0]["url"]);
    assert_eq!(entries[0]["mediaCollection"], "documents");
}
