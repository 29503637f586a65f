//! Image decoding with format dispatch and dimension limits.

use image::{DynamicImage, GenericImageView};
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

use super::validate::RasterFormat;

/// Image decoder with configurable limits.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Format the bytes were decoded as
    pub format: RasterFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode an in-memory buffer with the decoder selected for `format`.
    ///
    /// CPU-bound; async callers run it under `spawn_blocking`.
    pub fn decode(
        &self,
        bytes: &[u8],
        format: RasterFormat,
        path: &Path,
    ) -> Result<DecodedImage, PipelineError> {
        let image = image::load_from_memory_with_format(bytes, format.image_format()).map_err(
            |e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        )?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Image has no pixels ({width}x{height})"),
            });
        }
        if width > self.limits.max_image_dimension || height > self.limits.max_image_dimension {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim: self.limits.max_image_dimension,
            });
        }

        Ok(DecodedImage {
            image,
            format,
            width,
            height,
        })
    }
}
