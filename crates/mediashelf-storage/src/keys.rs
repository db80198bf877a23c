//! Shared key generation for storage backends.

use uuid::Uuid;

/// Directory, below a medium's own directory, holding derived files.
pub const CONVERSIONS_DIR: &str = "conversions";

/// Reduce an arbitrary client supplied name to a single safe path segment.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Key of a medium's file: `{media_id}/{file_name}`.
pub fn media_key(media_id: Uuid, file_name: &str) -> String {
    format!("{}/{}", media_id, sanitize_file_name(file_name))
}

/// Key of a conversion of a medium: `{media_id}/conversions/{stem}-{conversion}.jpg`.
pub fn conversion_key(media_id: Uuid, file_name: &str, conversion: &str) -> String {
    let file_name = sanitize_file_name(file_name);
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name.as_str(),
    };
    format!("{}/{}/{}-{}.jpg", media_id, CONVERSIONS_DIR, stem, conversion)
}

/// Key for a freshly staged upload: `{uuid}.{ext}` with the original extension.
pub fn staged_key(original_file_name: &str) -> String {
    let extension = sanitize_file_name(original_file_name)
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

/// Reject keys that could escape the disk root.
///
/// Only a whole `..` segment is a traversal; `dog..v2.png` is an ordinary name.
pub fn is_safe_key(storage_key: &str) -> bool {
    !storage_key.is_empty()
        && !storage_key.starts_with('/')
        && !storage_key.starts_with('\\')
        && !storage_key
            .split(['/', '\\'])
            .any(|segment| segment == ".." || segment.contains('\0'))
}
