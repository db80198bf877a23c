//! Configuration module
//!
//! Environment-driven configuration for the HTTP service, the storage disks and
//! the collection defaults (`public_disk`, `private_disk`, `auto_process`,
//! default `max_file_size`).

use std::env;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_BYTES: u64 = 1024 * 1024 * 10;

pub const DEFAULT_PUBLIC_DISK: &str = "media";
pub const DEFAULT_PRIVATE_DISK: &str = "media_private";
pub const DEFAULT_UPLOADS_DISK: &str = "uploads";

/// Settings shared by every process that serves HTTP
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
}

/// Mediashelf service configuration
#[derive(Clone, Debug)]
pub struct MediaShelfConfig {
    pub base: BaseConfig,
    /// When unset the service keeps media records in memory.
    pub database_url: Option<String>,
    // Disk layout
    pub public_disk: String,
    pub private_disk: String,
    pub uploads_disk: String,
    /// Additional custom-named disks collections may select with `disk(name)`.
    pub extra_disks: Vec<String>,
    pub storage_backend: Option<StorageBackend>,
    pub storage_root: String,
    pub public_base_url: String,
    pub view_endpoint: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    // Collection defaults
    pub auto_process: bool,
    pub max_file_size_bytes: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<MediaShelfConfig>);

impl Config {
    fn as_shelf(&self) -> &MediaShelfConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_shelf().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = MediaShelfConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_shelf().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_shelf().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_shelf().base.cors_origins
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_shelf().base.jwt_secret
    }

    pub fn environment(&self) -> &str {
        &self.as_shelf().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_shelf().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_shelf().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_shelf().database_url.as_deref()
    }

    pub fn public_disk(&self) -> &str {
        &self.as_shelf().public_disk
    }

    pub fn private_disk(&self) -> &str {
        &self.as_shelf().private_disk
    }

    pub fn uploads_disk(&self) -> &str {
        &self.as_shelf().uploads_disk
    }

    pub fn extra_disks(&self) -> &[String] {
        &self.as_shelf().extra_disks
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_shelf().storage_backend.unwrap_or_default()
    }

    pub fn storage_root(&self) -> &str {
        &self.as_shelf().storage_root
    }

    pub fn public_base_url(&self) -> &str {
        &self.as_shelf().public_base_url
    }

    pub fn view_endpoint(&self) -> &str {
        &self.as_shelf().view_endpoint
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_shelf().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_shelf().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_shelf().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_shelf().aws_region.as_deref()
    }

    pub fn auto_process(&self) -> bool {
        self.as_shelf().auto_process
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.as_shelf().max_file_size_bytes
    }
}

impl MediaShelfConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .unwrap_or(SERVER_PORT),
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?,
            environment,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => Some(value.parse::<StorageBackend>()?),
            Err(_) => None,
        };

        let auto_process = env::var("AUTO_PROCESS")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        Ok(MediaShelfConfig {
            base,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            public_disk: env::var("PUBLIC_DISK").unwrap_or_else(|_| DEFAULT_PUBLIC_DISK.to_string()),
            private_disk: env::var("PRIVATE_DISK")
                .unwrap_or_else(|_| DEFAULT_PRIVATE_DISK.to_string()),
            uploads_disk: env::var("UPLOADS_DISK")
                .unwrap_or_else(|_| DEFAULT_UPLOADS_DISK.to_string()),
            extra_disks: env::var("EXTRA_DISKS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            storage_backend,
            storage_root: env::var("STORAGE_ROOT").unwrap_or_else(|_| "./storage".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4000/media".to_string()),
            view_endpoint: env::var("VIEW_ENDPOINT").unwrap_or_else(|_| "/view".to_string()),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            auto_process,
            max_file_size_bytes: env::var("MAX_FILE_SIZE_BYTES")
                .unwrap_or_else(|_| MAX_FILE_SIZE_BYTES.to_string())
                .parse()
                .unwrap_or(MAX_FILE_SIZE_BYTES),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if let Some(ref url) = self.database_url {
            if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.public_disk == self.private_disk {
            return Err(anyhow::anyhow!(
                "PUBLIC_DISK and PRIVATE_DISK must name different disks"
            ));
        }

        if self.uploads_disk == self.public_disk || self.uploads_disk == self.private_disk {
            return Err(anyhow::anyhow!(
                "UPLOADS_DISK must not share a name with the public or private disk"
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_BYTES must be positive"));
        }

        if self.storage_backend == Some(StorageBackend::S3) {
            if self.s3_bucket.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_BUCKET must be set when using S3 storage backend"
                ));
            }
            if self.s3_region.is_none() && self.aws_region.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                ));
            }
        }

        Ok(())
    }
}
