//! Per-file processing: read, fingerprint, encode, resolve.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tokio::time::timeout;

use crate::config::{Config, SitePaths};
use crate::error::PipelineError;
use crate::types::ImageRecord;

use super::fingerprint::Fingerprint;
use super::placeholder::{Placeholder, PlaceholderEncoder};
use super::resolve::resolve;

/// Turns one image file into an [`ImageRecord`].
///
/// Cheap to clone; clones share the encoder and site layout.
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    encoder: Arc<PlaceholderEncoder>,
    site: Arc<SitePaths>,
    decode_timeout_ms: u64,
}

impl ImageProcessor {
    /// Create a processor for a validated site layout.
    pub fn new(config: &Config, site: SitePaths) -> Self {
        Self {
            encoder: Arc::new(PlaceholderEncoder::new(config.limits.clone())),
            site: Arc::new(site),
            decode_timeout_ms: config.limits.decode_timeout_ms,
        }
    }

    /// Process a single image file.
    ///
    /// Returns the record together with the number of bytes read.
    pub async fn process(&self, path: &Path) -> Result<(ImageRecord, u64), PipelineError> {
        let start = Instant::now();
        tracing::debug!("Processing: {:?}", path);

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| PipelineError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let file_size = bytes.len() as u64;
        tracing::trace!("  Read: {:?} ({} bytes)", start.elapsed(), file_size);

        let encode_start = Instant::now();
        let (fingerprint, placeholder) = self.fingerprint_and_encode(bytes, path).await?;
        tracing::trace!("  Fingerprint + encode: {:?}", encode_start.elapsed());

        let paths = resolve(
            &self.site.root_dir,
            &self.site.asset_dir,
            &self.site.base_path,
            path,
        );

        tracing::debug!(
            "Processed {} in {:?} ({}x{} -> {}x{})",
            paths.asset_file_name,
            start.elapsed(),
            placeholder.original_width,
            placeholder.original_height,
            placeholder.width,
            placeholder.height
        );

        let record = ImageRecord {
            signature_base64: placeholder.signature_base64,
            preview_data_url: placeholder.preview_data_url,
            width: placeholder.width,
            height: placeholder.height,
            original_width: placeholder.original_width,
            original_height: placeholder.original_height,
            asset_file_name: paths.asset_file_name,
            asset_full_file_name: paths.asset_full_file_name,
            asset_full_hash: fingerprint.full,
            asset_file_hash: fingerprint.short,
            asset_url: paths.asset_url,
            asset_url_with_base: paths.asset_url_with_base,
        };
        Ok((record, file_size))
    }

    /// Hash and encode on the blocking pool, bounded by the decode timeout.
    async fn fingerprint_and_encode(
        &self,
        bytes: Vec<u8>,
        path: &Path,
    ) -> Result<(Fingerprint, Placeholder), PipelineError> {
        let encoder = Arc::clone(&self.encoder);
        let path_owned = path.to_path_buf();
        let timeout_duration = Duration::from_millis(self.decode_timeout_ms);

        let result = timeout(
            timeout_duration,
            tokio::task::spawn_blocking(move || {
                let fingerprint = Fingerprint::from_bytes(&bytes);
                encoder
                    .encode(&bytes, &path_owned)
                    .map(|placeholder| (fingerprint, placeholder))
            }),
        )
        .await;

        match result {
            Ok(Ok(inner)) => inner,
            Ok(Err(e)) => Err(join_error(path, e)),
            Err(_) => Err(PipelineError::Timeout {
                path: path.to_path_buf(),
                stage: "decode".to_string(),
                timeout_ms: self.decode_timeout_ms,
            }),
        }
    }
}

/// A crashed worker is a task failure, not a property of the image.
fn join_error(path: &Path, err: JoinError) -> PipelineError {
    PipelineError::Task(format!(
        "encoding {} panicked or was cancelled: {err}",
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::path::PathBuf;

    fn write_image(path: &Path, width: u32, height: u32, format: ImageFormat) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 90])
        }));
        img.save_with_format(path, format).unwrap();
    }

    fn site(root: &Path) -> SitePaths {
        SitePaths {
            root_dir: root.to_path_buf(),
            asset_dir: "assets".into(),
            base_path: "/docs/".into(),
            cache_dir: root.join(".cache"),
        }
    }

    #[tokio::test]
    async fn test_process_builds_full_record() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("images/a.jpg");
        write_image(&file, 400, 200, ImageFormat::Jpeg);

        let processor = ImageProcessor::new(&Config::default(), site(dir.path()));
        let (record, size) = processor.process(&file).await.unwrap();

        assert_eq!(size, std::fs::metadata(&file).unwrap().len());
        assert_eq!((record.original_width, record.original_height), (400, 200));
        assert_eq!((record.width, record.height), (100, 50));
        assert_eq!(record.asset_file_name, "images/a.jpg");
        assert_eq!(record.asset_url, "assets/images/a.jpg");
        assert_eq!(record.asset_url_with_base, "/docs/assets/images/a.jpg");
        assert!(record.asset_full_file_name.ends_with("/images/a.jpg"));

        let expected = Fingerprint::from_bytes(&std::fs::read(&file).unwrap());
        assert_eq!(record.asset_full_hash, expected.full);
        assert_eq!(record.asset_file_hash, expected.short);
    }

    #[tokio::test]
    async fn test_identical_bytes_share_placeholder_fields() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("nested/b.png");
        write_image(&a, 64, 48, ImageFormat::Png);
        std::fs::create_dir_all(b.parent().unwrap()).unwrap();
        std::fs::copy(&a, &b).unwrap();

        let processor = ImageProcessor::new(&Config::default(), site(dir.path()));
        let (ra, _) = processor.process(&a).await.unwrap();
        let (rb, _) = processor.process(&b).await.unwrap();

        assert_eq!(ra.signature_base64, rb.signature_base64);
        assert_eq!(ra.preview_data_url, rb.preview_data_url);
        assert_eq!(ra.asset_full_hash, rb.asset_full_hash);
        assert_ne!(ra.asset_file_name, rb.asset_file_name);
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let processor = ImageProcessor::new(&Config::default(), site(dir.path()));
        let err = processor
            .process(&PathBuf::from("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Read { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.jpg");
        std::fs::write(&file, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F']).unwrap();

        let processor = ImageProcessor::new(&Config::default(), site(dir.path()));
        let err = processor.process(&file).await.unwrap_err();
        assert!(err.is_decode_error(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_worker_panic_is_task_error() {
        let join_err = tokio::spawn(async { panic!("decoder crashed") })
            .await
            .unwrap_err();
        let err = join_error(Path::new("a.png"), join_err);
        assert!(matches!(err, PipelineError::Task(_)));
        assert!(!err.is_decode_error());
        assert!(err.to_string().contains("a.png"));
    }
}
