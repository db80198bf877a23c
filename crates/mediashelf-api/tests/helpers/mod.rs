//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p mediashelf-api`. Media records are kept
//! in memory and every disk lives under a fresh temp directory.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use mediashelf_api::catalog;
use mediashelf_api::setup::routes;
use mediashelf_api::state::AppState;
use mediashelf_collections::{InMemoryMediaStore, PermissionGate};
use mediashelf_core::{Actor, BaseConfig, Config, MediaShelfConfig, StorageBackend};
use mediashelf_storage::create_gateway;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-key-min-32-characters-long-for-testing";

/// Test application: server, shared state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Bearer token for a fresh actor holding `permissions`.
    pub fn token(&self, permissions: &[&str]) -> String {
        self.token_for(&actor(permissions))
    }

    pub fn token_for(&self, actor: &Actor) -> String {
        self.state
            .jwt
            .issue_token(actor, chrono::Duration::hours(1))
            .expect("Failed to issue test token")
    }

    /// Stage `bytes` through `POST /upload` and return the staged path.
    pub async fn stage(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> String {
        let response = self
            .client()
            .post("/upload")
            .add_header("Authorization", format!("Bearer {}", self.token(&["admin.upload"])))
            .multipart(file_form(file_name, mime_type, bytes))
            .await;
        assert_eq!(response.status_code(), 200);

        let body: serde_json::Value = response.json();
        body["path"]
            .as_str()
            .expect("Expected 'path' in upload response")
            .to_string()
    }
}

pub fn actor(permissions: &[&str]) -> Actor {
    Actor::new(Uuid::new_v4(), permissions.iter().copied())
}

pub fn file_form(file_name: &str, mime_type: &str, bytes: &[u8]) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(bytes.to_vec()))
        .file_name(file_name.to_string())
        .mime_type(mime_type.to_string());
    MultipartForm::new().add_part("file", part)
}

/// Setup test app with in-memory records and local disks.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = create_test_config(&temp_dir);

    let gateway = create_gateway(&config)
        .await
        .expect("Failed to create storage gateway");

    let state = Arc::new(AppState::new(
        config.clone(),
        gateway,
        Arc::new(InMemoryMediaStore::new()),
        catalog::owner_types(),
        Arc::new(PermissionGate),
    ));

    let app = routes::setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}

fn create_test_config(temp_dir: &TempDir) -> Config {
    let base = BaseConfig {
        server_port: 4000,
        cors_origins: vec!["*".to_string()],
        db_max_connections: 5,
        db_timeout_seconds: 30,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        environment: "test".to_string(),
    };

    Config(Box::new(MediaShelfConfig {
        base,
        database_url: None,
        public_disk: "media".to_string(),
        private_disk: "media_private".to_string(),
        uploads_disk: "uploads".to_string(),
        extra_disks: Vec::new(),
        storage_backend: Some(StorageBackend::Local),
        storage_root: temp_dir.path().to_string_lossy().into_owned(),
        public_base_url: "http://localhost:4000/media".to_string(),
        view_endpoint: "/view".to_string(),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        auto_process: true,
        max_file_size_bytes: 10 * 1024 * 1024,
    }))
}
