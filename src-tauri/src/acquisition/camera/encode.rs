//! Turning a captured camera frame into a JPEG [`EncodedImage`].

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::models::{DataUriError, EncodedImage};

pub const JPEG_QUALITY: u8 = 95;

/// A single video frame as the webview hands it over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CameraFrame {
    /// Raw canvas pixels, four bytes per pixel, base64 encoded.
    Rgba {
        width: u32,
        height: u32,
        pixels: String,
    },
    /// A frame the webview already encoded (e.g. `canvas.toDataURL()`).
    Encoded {
        #[serde(rename = "dataUri")]
        data_uri: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame has no pixels")]
    Empty,
    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("frame pixels are not valid base64: {0}")]
    Base64(String),
    #[error(transparent)]
    DataUri(#[from] DataUriError),
    #[error("image codec failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Rasterizes `frame` and encodes it as JPEG at [`JPEG_QUALITY`]. Blocking.
pub fn encode_frame(frame: CameraFrame) -> Result<EncodedImage, FrameError> {
    let raster = match frame {
        CameraFrame::Rgba {
            width,
            height,
            pixels,
        } => {
            if width == 0 || height == 0 {
                return Err(FrameError::Empty);
            }
            let pixels = STANDARD
                .decode(pixels.trim())
                .map_err(|err| FrameError::Base64(err.to_string()))?;
            let expected = (width as usize)
                .checked_mul(height as usize)
                .and_then(|count| count.checked_mul(4))
                .unwrap_or(usize::MAX);
            if pixels.len() != expected {
                return Err(FrameError::SizeMismatch {
                    expected,
                    actual: pixels.len(),
                });
            }
            let actual = pixels.len();
            let buffer = RgbaImage::from_raw(width, height, pixels)
                .ok_or(FrameError::SizeMismatch { expected, actual })?;
            DynamicImage::ImageRgba8(buffer)
        }
        CameraFrame::Encoded { data_uri } => {
            let source = EncodedImage::from_data_uri(&data_uri)?;
            if source.is_empty() {
                return Err(FrameError::Empty);
            }
            image::load_from_memory(source.bytes())?
        }
    };

    // JPEG has no alpha channel.
    let rgb = raster.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(&rgb)?;

    Ok(EncodedImage::new("image/jpeg", out.into_inner()))
}
