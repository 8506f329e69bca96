//! Data-URL encoding and decoding.
//!
//! The export boundary ships the flattened composition as a
//! `data:image/png;base64,...` URL inside the order payload; these
//! helpers build and split such URLs without touching browser APIs,
//! so they are usable from tests and the worker alike.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Errors from parsing a data URL.
#[derive(Debug, thiserror::Error)]
pub enum DataUrlError {
    /// The string does not start with `data:`.
    #[error("not a data URL")]
    MissingPrefix,

    /// The URL is not base64-encoded.
    #[error("data URL is not base64-encoded")]
    NotBase64,

    /// The payload failed to decode.
    #[error("invalid base64 payload: {0}")]
    Base64(String),
}

/// Build a base64 data URL from a MIME type and raw bytes.
#[must_use]
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Split a base64 data URL into its MIME type and decoded bytes.
///
/// # Errors
///
/// Returns [`DataUrlError::MissingPrefix`] without a `data:` scheme,
/// [`DataUrlError::NotBase64`] without a `;base64,` marker, and
/// [`DataUrlError::Base64`] when the payload fails to decode.
pub fn decode(url: &str) -> Result<(String, Vec<u8>), DataUrlError> {
    let rest = url.strip_prefix("data:").ok_or(DataUrlError::MissingPrefix)?;
    let (mime, payload) = rest.split_once(";base64,").ok_or(DataUrlError::NotBase64)?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| DataUrlError::Base64(e.to_string()))?;
    Ok((mime.to_owned(), bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let bytes = [1u8, 2, 3, 250];
        let url = encode("image/png", &bytes);
        let (mime, back) = decode(&url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(back, bytes);
    }

    #[test]
    fn engine_export_urls_decode() {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([9, 8, 7, 255]));
        let url = kasane_engine::export::to_data_url(&img).unwrap();
        let (mime, bytes) = decode(&url).unwrap();
        assert_eq!(mime, "image/png");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn rejects_non_data_urls() {
        assert!(matches!(
            decode("https://example.com/a.png"),
            Err(DataUrlError::MissingPrefix)
        ));
    }

    #[test]
    fn rejects_non_base64_data_urls() {
        assert!(matches!(
            decode("data:text/plain,hello"),
            Err(DataUrlError::NotBase64)
        ));
    }

    #[test]
    fn rejects_corrupt_payloads() {
        assert!(matches!(
            decode("data:image/png;base64,@@not-base64@@"),
            Err(DataUrlError::Base64(_))
        ));
    }
}
