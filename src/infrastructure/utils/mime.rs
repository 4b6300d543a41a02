const GENERIC_CONTENT_TYPES: [&str; 2] = ["application/octet-stream", "binary/octet-stream"];

/// Resolves the MIME type to upload a file with.
///
/// A declared `image/*` type is trusted. A missing or generic type falls back
/// to sniffing the bytes. Returns `None` when the file is not an image.
pub fn resolve_image_mime(declared: Option<&str>, data: &[u8]) -> Option<String> {
    let declared = declared
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty());

    match declared {
        Some(ct) if ct.starts_with("image/") => Some(ct),
        Some(ct) if !GENERIC_CONTENT_TYPES.contains(&ct.as_str()) => None,
        _ if infer::is_image(data) => infer::get(data).map(|kind| kind.mime_type().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn trusts_declared_image_type() {
        assert_eq!(resolve_image_mime(Some("image/JPEG"), b"anything"), Some("image/jpeg".into()));
    }

    #[test]
    fn sniffs_when_type_missing_or_generic() {
        assert_eq!(resolve_image_mime(None, &PNG_HEADER), Some("image/png".into()));
        assert_eq!(
            resolve_image_mime(Some("application/octet-stream"), &PNG_HEADER),
            Some("image/png".into())
        );
    }

    #[test]
    fn rejects_non_images() {
        assert_eq!(resolve_image_mime(Some("application/pdf"), &PNG_HEADER), None);
        assert_eq!(resolve_image_mime(None, b"plain text"), None);
    }
}
