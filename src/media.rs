//! Media type detection from magic bytes.

/// Media type reported when no signature matches.
pub const DEFAULT_MEDIA_TYPE: &str = "image/png";

/// Detect the media type of a byte buffer from its signature.
///
/// Recognizes the formats vision providers commonly accept. Returns `None`
/// when no signature matches; absence of a match is not an error.
pub fn detect(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
        Some("image/jpeg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if data.starts_with(b"RIFF") && data.len() > 12 && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else if data.starts_with(b"BM") {
        Some("image/bmp")
    } else if data.starts_with(b"II*\x00") || data.starts_with(b"MM\x00*") {
        Some("image/tiff")
    } else {
        None
    }
}

/// Detect the media type, falling back to [`DEFAULT_MEDIA_TYPE`].
pub fn resolve(data: &[u8]) -> &'static str {
    detect(data).unwrap_or(DEFAULT_MEDIA_TYPE)
}
