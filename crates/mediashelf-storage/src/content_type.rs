//! Content type detection for stored files.
//!
//! Magic bytes win over the file extension so a renamed file cannot smuggle in
//! a type its collection refuses.

/// Fallback for content that neither sniffing nor the extension identifies.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Detect the MIME type of `data`, using `file_name` only when the bytes are not recognised.
pub fn detect(data: &[u8], file_name: &str) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }
    from_file_name(file_name)
}

/// Guess the MIME type from a file name extension.
pub fn from_file_name(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_magic_bytes_win_over_extension() {
        assert_eq!(detect(PNG_HEADER, "photo.pdf"), "image/png");
        assert_eq!(detect(b"%PDF-1.4\n%...", "scan.bin"), "application/pdf");
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(detect(b"hello world", "notes.txt"), "text/plain");
        assert_eq!(detect(b"hello world", "no_extension"), OCTET_STREAM);
    }
}
