/// MIME type assumed when an image's format cannot be recognised.
pub const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

/// Sniff the formats Gemini accepts as inline image data. Anything else is sent as jpeg.
pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to {}",
                &bytes[..bytes.len().min(4)],
                FALLBACK_IMAGE_MIME
            );
            FALLBACK_IMAGE_MIME
        }
    }
}

/// Split a `data:<mime>;base64,<payload>` URL into its MIME type and payload.
///
/// Returns `None` for plain base64 strings.
pub fn split_data_url(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime, payload))
}
