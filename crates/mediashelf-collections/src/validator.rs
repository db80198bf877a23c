//! Stateless guards run against staged files before a batch is applied.

use mediashelf_core::AppError;
use mediashelf_storage::content_type;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::policy::primary_type;

/// Bytes read from the start of a file for magic-number sniffing.
const SNIFF_LEN: usize = 8192;

/// Detect the content type of a local file.
pub async fn detect_mime_type(path: &Path) -> Result<String, AppError> {
    let mut file = fs::File::open(path).await.map_err(|e| missing_or_io(path, e))?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    (&mut file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut header)
        .await?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(content_type::detect(&header, &file_name))
}

/// Size of a local file in bytes.
pub async fn actual_size(path: &Path) -> Result<u64, AppError> {
    let meta = fs::metadata(path).await.map_err(|e| missing_or_io(path, e))?;
    Ok(meta.len())
}

/// Fail with `MimeTypeNotAllowed` unless the file's detected type matches an entry of `allowed`.
pub async fn guard_mime_type(path: &Path, allowed: &[&str]) -> Result<(), AppError> {
    let mime_type = detect_mime_type(path).await?;

    if allowed.iter().any(|pattern| mime_matches(&mime_type, pattern)) {
        return Ok(());
    }

    Err(AppError::MimeTypeNotAllowed {
        mime_type,
        allowed: allowed.iter().map(|s| s.to_string()).collect(),
    })
}

/// Fail with `FileTooBig` unless the file is at most `max_bytes` long.
pub async fn guard_file_size(path: &Path, max_bytes: u64, collection: &str) -> Result<(), AppError> {
    let size = actual_size(path).await?;

    if size <= max_bytes {
        return Ok(());
    }

    Err(AppError::FileTooBig {
        size,
        max: max_bytes,
        collection: collection.to_string(),
    })
}

/// Exact match or `type/*` wildcard, case-insensitive, ignoring parameters.
pub fn mime_matches(mime_type: &str, pattern: &str) -> bool {
    let mime = essence(mime_type);
    let pattern = essence(pattern);
    if pattern.is_empty() {
        return false;
    }

    match pattern.strip_suffix("/*") {
        Some(primary) => primary.eq_ignore_ascii_case(primary_type(&mime)),
        None => pattern.eq_ignore_ascii_case(&mime),
    }
}

fn essence(mime: &str) -> String {
    mime.split(';').next().unwrap_or_default().trim().to_string()
}

fn missing_or_io(path: &Path, err: std::io::Error) -> AppError {
    match err.kind() {
        std::io::ErrorKind::NotFound => AppError::FileDoesNotExist(path.display().to_string()),
        _ => AppError::from(err),
    }
}
