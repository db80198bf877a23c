//! Collection policies.
//!
//! A policy is built fresh every time an owner registers its collections and is
//! never persisted. Setters chain on `&mut Self`:
//!
//! ```
//! use mediashelf_collections::{CollectionDefaults, CollectionPolicy};
//!
//! let defaults = CollectionDefaults::default();
//! let mut documents = CollectionPolicy::new("documents", &defaults);
//! documents
//!     .private()
//!     .max_number_of_files(20)
//!     .accepts(["application/pdf"])
//!     .can_view("vop.view");
//! assert!(documents.is_private());
//! ```

use mediashelf_core::config::{DEFAULT_PRIVATE_DISK, DEFAULT_PUBLIC_DISK};
use mediashelf_core::Config;

const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 10;

/// Configured values new policies start from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDefaults {
    pub public_disk: String,
    pub private_disk: String,
    /// Size limit given to every new policy; `None` leaves new policies unlimited.
    pub max_file_size: Option<u64>,
}

impl Default for CollectionDefaults {
    fn default() -> Self {
        Self {
            public_disk: DEFAULT_PUBLIC_DISK.to_string(),
            private_disk: DEFAULT_PRIVATE_DISK.to_string(),
            max_file_size: Some(DEFAULT_MAX_FILE_SIZE),
        }
    }
}

impl CollectionDefaults {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_disk: config.public_disk().to_string(),
            private_disk: config.private_disk().to_string(),
            max_file_size: Some(config.max_file_size_bytes()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPolicy {
    name: String,
    disk: String,
    private_disk: String,
    max_number_of_files: Option<u64>,
    max_file_size: Option<u64>,
    accepted_mime_types: Option<Vec<String>>,
    is_image: bool,
    view_permission: Option<String>,
    upload_permission: Option<String>,
}

impl CollectionPolicy {
    pub fn new(name: impl Into<String>, defaults: &CollectionDefaults) -> Self {
        Self {
            name: name.into(),
            disk: defaults.public_disk.clone(),
            private_disk: defaults.private_disk.clone(),
            max_number_of_files: None,
            max_file_size: defaults.max_file_size,
            accepted_mime_types: None,
            is_image: false,
            view_permission: None,
            upload_permission: None,
        }
    }

    pub fn disk(&mut self, disk: impl Into<String>) -> &mut Self {
        self.disk = disk.into();
        self
    }

    /// Store files on the configured private disk.
    pub fn private(&mut self) -> &mut Self {
        self.disk = self.private_disk.clone();
        self
    }

    pub fn max_number_of_files(&mut self, max: u64) -> &mut Self {
        self.max_number_of_files = Some(max);
        self
    }

    pub fn max_file_size(&mut self, bytes: u64) -> &mut Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Lift the size limit inherited from the defaults.
    pub fn unlimited_file_size(&mut self) -> &mut Self {
        self.max_file_size = None;
        self
    }

    /// Replace the accepted MIME types (`"image/png"` or `"image/*"`).
    pub fn accepts<I, S>(&mut self, mime_types: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mime_types: Vec<String> = mime_types.into_iter().map(Into::into).collect();
        self.is_image = !mime_types.is_empty()
            && mime_types
                .iter()
                .all(|mime| primary_type(mime).eq_ignore_ascii_case("image"));
        self.accepted_mime_types = Some(mime_types);
        self
    }

    pub fn can_view(&mut self, permission: impl Into<String>) -> &mut Self {
        self.view_permission = Some(permission.into());
        self
    }

    pub fn can_upload(&mut self, permission: impl Into<String>) -> &mut Self {
        self.upload_permission = Some(permission.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn disk_name(&self) -> &str {
        &self.disk
    }

    pub fn is_private(&self) -> bool {
        self.disk == self.private_disk
    }

    pub fn file_limit(&self) -> Option<u64> {
        self.max_number_of_files
    }

    pub fn size_limit(&self) -> Option<u64> {
        self.max_file_size
    }

    /// Non-blank accepted types, or `None` when any type is accepted.
    pub fn accepted_mime_types(&self) -> Option<Vec<&str>> {
        let types: Vec<&str> = self
            .accepted_mime_types
            .as_ref()?
            .iter()
            .map(|mime| mime.trim())
            .filter(|mime| !mime.is_empty())
            .collect();
        if types.is_empty() {
            None
        } else {
            Some(types)
        }
    }

    pub fn is_image(&self) -> bool {
        self.is_image
    }

    pub fn view_permission(&self) -> Option<&str> {
        self.view_permission.as_deref()
    }

    pub fn upload_permission(&self) -> Option<&str> {
        self.upload_permission.as_deref()
    }
}

/// `"image"` for `"image/png"`, the whole string when there is no slash.
pub(crate) fn primary_type(mime: &str) -> &str {
    mime.trim().split('/').next().unwrap_or_default().trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CollectionPolicy {
        CollectionPolicy::new("gallery", &CollectionDefaults::default())
    }

    #[test]
    fn test_defaults() {
        let policy = policy();
        assert_eq!(policy.name(), "gallery");
        assert_eq!(policy.disk_name(), "media");
        assert!(!policy.is_private());
        assert_eq!(policy.file_limit(), None);
        assert_eq!(policy.size_limit(), Some(10 * 1024 * 1024));
        assert_eq!(policy.accepted_mime_types(), None);
        assert!(!policy.is_image());
        assert_eq!(policy.view_permission(), None);
    }

    #[test]
    fn test_is_image_derivation() {
        let mut p = policy();
        assert!(!p.accepts(Vec::<String>::new()).is_image());
        assert!(p.accepts(["image/jpeg", "image/png"]).is_image());
        assert!(!p.accepts(["image/jpeg", "application/pdf"]).is_image());
        assert!(!p.accepts([""]).is_image());
        assert!(p.accepts(["image/*"]).is_image());
    }

    #[test]
    fn test_blank_accepts_means_any_type() {
        let mut p = policy();
        p.accepts(["", "  "]);
        assert_eq!(p.accepted_mime_types(), None);

        p.accepts(["application/pdf", ""]);
        assert_eq!(p.accepted_mime_types(), Some(vec!["application/pdf"]));
    }

    #[test]
    fn test_chaining_only_touches_this_policy() {
        let defaults = CollectionDefaults::default();
        let mut documents = CollectionPolicy::new("documents", &defaults);
        let untouched = CollectionPolicy::new("gallery", &defaults);

        documents
            .private()
            .max_number_of_files(2)
            .max_file_size(2048)
            .can_view("vop.view")
            .can_upload("vop.upload");

        assert!(documents.is_private());
        assert_eq!(documents.disk_name(), "media_private");
        assert_eq!(documents.file_limit(), Some(2));
        assert_eq!(documents.size_limit(), Some(2048));
        assert_eq!(documents.view_permission(), Some("vop.view"));
        assert_eq!(documents.upload_permission(), Some("vop.upload"));
        assert_eq!(untouched, CollectionPolicy::new("gallery", &defaults));
    }

    #[test]
    fn test_custom_disk_is_neither_public_nor_private() {
        let mut p = policy();
        p.disk("archive");
        assert_eq!(p.disk_name(), "archive");
        assert!(!p.is_private());

        p.unlimited_file_size();
        assert_eq!(p.size_limit(), None);
    }
}
