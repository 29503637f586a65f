//! Placeholder generation: downsample, ThumbHash, and a PNG data-URL preview.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

use super::decode::ImageDecoder;
use super::thumbhash;
use super::validate::Validator;

/// Longest side of the image the signature is computed from.
pub const TARGET_SIZE: u32 = 100;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Perceptual placeholder for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Standard base64 of the ThumbHash bytes
    pub signature_base64: String,
    /// PNG preview decoded from the ThumbHash, as a data URL
    pub preview_data_url: String,
    /// Width of the downsampled image
    pub width: u32,
    /// Height of the downsampled image
    pub height: u32,
    /// Width of the source image
    pub original_width: u32,
    /// Height of the source image
    pub original_height: u32,
}

/// Turns raw image bytes into a [`Placeholder`].
#[derive(Debug, Clone)]
pub struct PlaceholderEncoder {
    validator: Validator,
    decoder: ImageDecoder,
}

impl PlaceholderEncoder {
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            validator: Validator::new(limits.clone()),
            decoder: ImageDecoder::new(limits),
        }
    }

    /// Sniff, decode, downsample and sign an encoded image.
    ///
    /// `path` is only used for error context. CPU-bound.
    pub fn encode(&self, bytes: &[u8], path: &Path) -> Result<Placeholder, PipelineError> {
        let format = self.validator.validate(bytes, path)?;
        let decoded = self.decoder.decode(bytes, format, path)?;
        tracing::trace!(
            "  Decoded {:?} as {} ({}x{})",
            path,
            format.as_str(),
            decoded.width,
            decoded.height
        );
        Self::encode_image(&decoded.image, path)
    }

    /// Build a placeholder from an already decoded image.
    pub fn encode_image(image: &DynamicImage, path: &Path) -> Result<Placeholder, PipelineError> {
        let (original_width, original_height) = (image.width(), image.height());
        let (width, height) = target_dimensions(original_width, original_height);

        // Straight (non-premultiplied) RGBA, as ThumbHash expects
        let rgba = image
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgba8();

        let hash = thumbhash::encode(width as usize, height as usize, rgba.as_raw()).map_err(
            |e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        )?;
        let preview_data_url = preview_data_url(&hash).map_err(|message| PipelineError::Preview {
            path: path.to_path_buf(),
            message,
        })?;

        Ok(Placeholder {
            signature_base64: BASE64.encode(&hash),
            preview_data_url,
            width,
            height,
            original_width,
            original_height,
        })
    }
}

/// Dimensions of the downsampled image: the longer side becomes
/// [`TARGET_SIZE`], the other keeps the aspect ratio.
///
/// Rounds half away from zero and clamps both sides to `1..=TARGET_SIZE`.
pub fn target_dimensions(width: u32, height: u32) -> (u32, u32) {
    let longest = width.max(height).max(1) as f64;
    let scale = TARGET_SIZE as f64 / longest;
    let fit = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, TARGET_SIZE);
    (fit(width), fit(height))
}

/// Decode a ThumbHash and render it as a `data:image/png;base64,` URL.
pub fn preview_data_url(hash: &[u8]) -> Result<String, String> {
    let bitmap = thumbhash::decode(hash).map_err(|e| e.to_string())?;
    let image = RgbaImage::from_raw(bitmap.width as u32, bitmap.height as u32, bitmap.rgba)
        .ok_or_else(|| "preview buffer does not match its dimensions".to_string())?;

    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    let mut url = String::from(DATA_URL_PREFIX);
    BASE64.encode_string(buffer.into_inner(), &mut url);
    Ok(url)
}
