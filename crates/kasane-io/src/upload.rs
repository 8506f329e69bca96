//! Image source boundary: upload validation.
//!
//! Every upload path (file picker and drag-and-drop) funnels through
//! [`validate_upload`] before any buffer is allocated downstream:
//! extension allow-list, the 10 MB size limit, and a magic-byte
//! format sniff restricted to the formats the print pipeline accepts.

use kasane_engine::MAX_UPLOAD_BYTES;

/// Allowed file extensions for image uploads.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Check whether a filename has an allowed image extension.
#[must_use]
pub fn has_allowed_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ext))
    })
}

/// Errors rejecting an upload, surfaced directly to the user.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The file contained no data.
    #[error("the selected file is empty")]
    Empty,

    /// The file exceeds the upload limit.
    #[error("file is {size} bytes; the limit is {limit} bytes")]
    TooLarge {
        /// Actual size of the rejected file.
        size: usize,
        /// The configured limit.
        limit: usize,
    },

    /// The filename's extension is not in the allow-list.
    #[error("unsupported file type: {name}")]
    UnsupportedExtension {
        /// The rejected filename.
        name: String,
    },

    /// The bytes are a recognizable image of a disallowed format.
    #[error("unsupported image format: {format}")]
    UnsupportedFormat {
        /// Name of the sniffed format.
        format: String,
    },

    /// The bytes do not look like any known image format.
    #[error("the file does not appear to be an image")]
    Unrecognized,
}

/// Validate an upload before any editor state is created.
///
/// # Errors
///
/// Returns the first failing check: [`UploadError::Empty`],
/// [`UploadError::UnsupportedExtension`], [`UploadError::TooLarge`],
/// [`UploadError::Unrecognized`] (magic bytes match nothing), or
/// [`UploadError::UnsupportedFormat`] (a real image format outside
/// {PNG, JPEG, GIF, WebP}).
pub fn validate_upload(name: &str, bytes: &[u8]) -> Result<(), UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if !has_allowed_extension(name) {
        return Err(UploadError::UnsupportedExtension {
            name: name.to_owned(),
        });
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size: bytes.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }

    let format = image::guess_format(bytes).map_err(|_| UploadError::Unrecognized)?;
    match format {
        image::ImageFormat::Png
        | image::ImageFormat::Jpeg
        | image::ImageFormat::Gif
        | image::ImageFormat::WebP => Ok(()),
        other => Err(UploadError::UnsupportedFormat {
            format: format!("{other:?}"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Minimal valid PNG bytes (1x1 white pixel).
    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        kasane_engine::export::encode_png(&img).unwrap()
    }

    #[test]
    fn accepts_known_extensions_case_insensitively() {
        for name in ["a.png", "b.JPG", "c.jpeg", "d.GIF", "e.webp"] {
            assert!(has_allowed_extension(name), "{name} should be allowed");
        }
    }

    #[test]
    fn rejects_unknown_or_missing_extensions() {
        for name in ["archive.zip", "noext", "script.png.exe", "x.bmp"] {
            assert!(!has_allowed_extension(name), "{name} should be rejected");
        }
    }

    #[test]
    fn valid_png_upload_passes() {
        assert!(validate_upload("photo.png", &tiny_png()).is_ok());
    }

    #[test]
    fn empty_file_is_rejected_first() {
        assert!(matches!(
            validate_upload("photo.png", &[]),
            Err(UploadError::Empty)
        ));
    }

    #[test]
    fn wrong_extension_is_rejected_before_sniffing() {
        assert!(matches!(
            validate_upload("photo.tiff", &tiny_png()),
            Err(UploadError::UnsupportedExtension { name }) if name == "photo.tiff"
        ));
    }

    #[test]
    fn oversized_upload_is_rejected() {
        let huge = vec![0u8; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            validate_upload("big.png", &huge),
            Err(UploadError::TooLarge { .. })
        ));
    }

    #[test]
    fn garbage_bytes_are_unrecognized() {
        assert!(matches!(
            validate_upload("fake.png", &[0x00, 0x01, 0x02, 0x03]),
            Err(UploadError::Unrecognized)
        ));
    }

    #[test]
    fn disallowed_format_with_spoofed_extension_is_rejected() {
        // BMP magic bytes behind a .png name: the sniff wins.
        let mut bmp = vec![0x42, 0x4D];
        bmp.extend_from_slice(&[0u8; 64]);
        assert!(matches!(
            validate_upload("fake.png", &bmp),
            Err(UploadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn error_messages_are_user_facing() {
        let err = validate_upload("photo.png", &[]).unwrap_err();
        assert_eq!(err.to_string(), "the selected file is empty");
        let err = UploadError::UnsupportedExtension {
            name: "a.tiff".into(),
        };
        assert_eq!(err.to_string(), "unsupported file type: a.tiff");
    }
}
