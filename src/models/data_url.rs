use base64::{engine::general_purpose, Engine};
use std::path::Path;

use crate::error::{NutrError, NutrResult};

const DEFAULT_MIME: &str = "image/jpeg";

/// A `data:<mime>;base64,<payload>` string holding the current image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl(String);

impl DataUrl {
    pub fn encode(mime: &str, bytes: &[u8]) -> Self {
        let payload = general_purpose::STANDARD.encode(bytes);
        Self(format!("data:{};base64,{}", mime, payload))
    }

    /// Validates that `raw` is a base64 data URL with a decodable payload.
    pub fn parse(raw: &str) -> NutrResult<Self> {
        let raw = raw.trim();
        let url = Self(raw.to_string());
        url.decode()?;
        Ok(url)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn mime(&self) -> &str {
        self.split()
            .map(|(header, _)| header)
            .and_then(|header| header.split(';').next())
            .filter(|mime| !mime.is_empty())
            .unwrap_or(DEFAULT_MIME)
    }

    /// Returns the MIME type and the raw bytes behind the payload.
    pub fn decode(&self) -> NutrResult<(String, Vec<u8>)> {
        let (header, payload) = self
            .split()
            .ok_or_else(|| NutrError::InvalidDataUrl("expected data:<mime>;base64,<payload>".to_string()))?;

        if !header.split(';').any(|param| param == "base64") {
            return Err(NutrError::InvalidDataUrl("payload is not base64 encoded".to_string()));
        }

        let bytes = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| NutrError::InvalidDataUrl(e.to_string()))?;
        if bytes.is_empty() {
            return Err(NutrError::InvalidDataUrl("image payload is empty".to_string()));
        }

        Ok((self.mime().to_string(), bytes))
    }

    fn split(&self) -> Option<(&str, &str)> {
        self.0.strip_prefix("data:")?.split_once(',')
    }
}

impl std::fmt::Display for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Payloads run to megabytes; show the header only
        let header = self.0.split(',').next().unwrap_or_default();
        write!(f, "{},… ({} chars)", header, self.0.len())
    }
}

/// Guesses an image MIME type from magic bytes, then the file extension.
pub fn sniff_mime(bytes: &[u8], path: Option<&Path>) -> &'static str {
    if let Ok(format) = image::guess_format(bytes) {
        match format {
            image::ImageFormat::Png => return "image/png",
            image::ImageFormat::Jpeg => return "image/jpeg",
            image::ImageFormat::Gif => return "image/gif",
            image::ImageFormat::WebP => return "image/webp",
            image::ImageFormat::Bmp => return "image/bmp",
            _ => {}
        }
    }

    let extension = path
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => DEFAULT_MIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];

    #[test]
    fn test_encode_produces_data_url() {
        let url = DataUrl::encode("image/png", b"hello");

        assert_eq!(url.as_str(), "data:image/png;base64,aGVsbG8=");
        assert_eq!(url.mime(), "image/png");
    }

    #[test]
    fn test_decode_returns_original_bytes() {
        let url = DataUrl::parse("data:image/jpeg;base64,/9j/AA==").unwrap();
        let (mime, bytes) = url.decode().unwrap();

        assert_eq!(mime, "image/jpeg");
        assert_eq!(bytes, vec![0xff, 0xd8, 0xff, 0x00]);
    }

    #[test]
    fn test_missing_mime_defaults_to_jpeg() {
        let url = DataUrl::parse("data:;base64,aGVsbG8=").unwrap();
        assert_eq!(url.mime(), "image/jpeg");
    }

    #[test]
    fn test_parse_rejects_non_data_urls() {
        assert!(DataUrl::parse("https://example.com/food.jpg").is_err());
        assert!(DataUrl::parse("data:image/png;base64").is_err());
        assert!(DataUrl::parse("data:text/plain,hello").is_err());
        assert!(DataUrl::parse("data:image/png;base64,***").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_payload() {
        let err = DataUrl::parse("data:image/png;base64,").unwrap_err();
        assert_eq!(err.to_string(), "Invalid image data: image payload is empty");

        assert!(DataUrl::encode("image/png", b"").decode().is_err());
    }

    #[test]
    fn test_display_hides_payload() {
        let url = DataUrl::encode("image/png", &[0u8; 64]);
        let shown = url.to_string();

        assert!(shown.starts_with("data:image/png;base64,"));
        assert!(!shown.contains("AAAA"));
    }

    #[test]
    fn test_sniff_mime_prefers_magic_bytes() {
        assert_eq!(sniff_mime(PNG_HEADER, Some(Path::new("meal.jpg"))), "image/png");
        assert_eq!(sniff_mime(&[0xff, 0xd8, 0xff, 0xe0], None), "image/jpeg");
    }

    #[test]
    fn test_sniff_mime_falls_back_to_extension() {
        assert_eq!(sniff_mime(b"not an image", Some(Path::new("Meal.WEBP"))), "image/webp");
        assert_eq!(sniff_mime(b"not an image", None), "image/jpeg");
    }
}
