//! Validation of submitted images.

use crate::services::providers::ImageInput;
use base64::Engine as _;
use thiserror::Error;

const DATA_URL_MARKER: &str = "base64,";

#[derive(Debug, Error)]
pub enum ImageInputError {
    #[error("No image provided")]
    Empty,

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unrecognised image data: {0}")]
    Image(#[from] image::ImageError),
}

/// A submitted image that decoded successfully.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub format: image::ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Base64 payload with any data-URL prefix removed.
    pub payload: String,
}

impl DecodedImage {
    pub fn as_input(&self) -> ImageInput {
        ImageInput {
            mime_type: self.format.to_mime_type().to_string(),
            data: self.payload.clone(),
        }
    }
}

/// Drop everything up to and including the first `base64,` marker.
pub fn strip_data_url(raw: &str) -> &str {
    match raw.split_once(DATA_URL_MARKER) {
        Some((_, payload)) => payload,
        None => raw,
    }
}

/// Decode a raw or data-URL base64 string and check that it is an image.
pub fn decode_image(raw: &str) -> Result<DecodedImage, ImageInputError> {
    if raw.is_empty() {
        return Err(ImageInputError::Empty);
    }

    // MIME-style line wrapping is valid base64; drop it before strict decoding.
    let payload: String = strip_data_url(raw)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(&payload)?;

    let format = image::guess_format(&bytes)?;
    let img = image::load_from_memory_with_format(&bytes, format)?;

    Ok(DecodedImage {
        format,
        width: img.width(),
        height: img.height(),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_base64(width: u32, height: u32) -> String {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            if (x + y) % 20 < 10 {
                image::Rgb([255, 0, 0])
            } else {
                image::Rgb([0, 0, 255])
            }
        });
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
    }

    #[test]
    fn strips_data_url_prefix() {
        assert_eq!(strip_data_url("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url("AAAA"), "AAAA");
    }

    #[test]
    fn decodes_data_url_png() {
        let raw = format!("data:image/png;base64,{}", png_base64(100, 100));
        let decoded = decode_image(&raw).unwrap();

        assert_eq!(decoded.format, image::ImageFormat::Png);
        assert_eq!((decoded.width, decoded.height), (100, 100));
        assert_eq!(decoded.as_input().mime_type, "image/png");
        assert!(!decoded.payload.starts_with("data:"));
    }

    #[test]
    fn decodes_raw_base64_png() {
        let decoded = decode_image(&png_base64(10, 20)).unwrap();
        assert_eq!((decoded.width, decoded.height), (10, 20));
    }

    #[test]
    fn decodes_line_wrapped_base64() {
        let encoded = png_base64(100, 100);
        let wrapped = encoded
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");
        assert!(wrapped.contains('\n'));

        let decoded = decode_image(&format!("data:image/png;base64,{}", wrapped)).unwrap();
        assert_eq!((decoded.width, decoded.height), (100, 100));
        assert_eq!(decoded.payload, encoded);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(decode_image(""), Err(ImageInputError::Empty)));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(matches!(
            decode_image("invalid_base64_data"),
            Err(ImageInputError::Base64(_))
        ));
    }

    #[test]
    fn valid_base64_that_is_not_an_image_is_rejected() {
        let not_an_image = base64::engine::general_purpose::STANDARD.encode(b"hello world");
        assert!(matches!(
            decode_image(&not_an_image),
            Err(ImageInputError::Image(_))
        ));
    }

    #[test]
    fn truncated_png_is_rejected() {
        let full = base64::engine::general_purpose::STANDARD
            .decode(png_base64(50, 50))
            .unwrap();
        let truncated = base64::engine::general_purpose::STANDARD.encode(&full[..40]);
        assert!(decode_image(&truncated).is_err());
    }
}
