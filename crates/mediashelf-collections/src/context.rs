use mediashelf_core::{Actor, AppError, Config};
use mediashelf_storage::keys::is_safe_key;
use std::path::PathBuf;

use crate::policy::CollectionDefaults;

/// Request-scoped inputs of a reconciliation pass or a view request.
#[derive(Debug, Clone)]
pub struct MediaContext {
    pub actor: Actor,
    pub defaults: CollectionDefaults,
    /// Root of the uploads disk; `add` paths are relative to it.
    pub staging_dir: PathBuf,
    pub auto_process: bool,
}

impl MediaContext {
    pub fn new(actor: Actor, defaults: CollectionDefaults, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            actor,
            defaults,
            staging_dir: staging_dir.into(),
            auto_process: true,
        }
    }

    pub fn from_config(config: &Config, actor: Actor) -> Self {
        Self {
            actor,
            defaults: CollectionDefaults::from_config(config),
            staging_dir: PathBuf::from(config.storage_root()).join(config.uploads_disk()),
            auto_process: config.auto_process(),
        }
    }

    /// Absolute path of a staged upload.
    pub fn staged_path(&self, source_path: &str) -> Result<PathBuf, AppError> {
        if !is_safe_key(source_path) {
            return Err(AppError::InvalidOperation(format!(
                "invalid staged path: {}",
                source_path
            )));
        }
        Ok(self.staging_dir.join(source_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_path() {
        let ctx = MediaContext::new(
            Actor::anonymous(),
            CollectionDefaults::default(),
            "/srv/uploads",
        );
        assert_eq!(
            ctx.staged_path("abc.pdf").unwrap(),
            PathBuf::from("/srv/uploads/abc.pdf")
        );
        assert!(ctx.staged_path("../secret").is_err());
        assert!(ctx.staged_path("/etc/passwd").is_err());
    }
}
