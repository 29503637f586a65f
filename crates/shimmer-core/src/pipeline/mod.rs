//! Placeholder pipeline components.
//!
//! This module contains all the stages of the pipeline:
//! - **discovery**: Find image files under the project root
//! - **fingerprint**: BLAKE3 content fingerprints and short cache tokens
//! - **validate**: Size limits and magic-byte format sniffing
//! - **decode**: Decode bytes with the sniffed format's decoder
//! - **thumbhash**: DCT-based perceptual signature
//! - **placeholder**: Downsample, sign, and render the preview data URL
//! - **resolve**: Record keys and public URLs
//! - **processor**: Runs every stage for one file
//! - **batch**: Bounded concurrent fan-out and table aggregation

pub mod batch;
pub mod decode;
pub mod discovery;
pub mod fingerprint;
pub mod placeholder;
pub mod processor;
pub mod resolve;
pub mod thumbhash;
pub mod validate;

// Re-exports for convenient access
pub use batch::process_batch;
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use fingerprint::Fingerprint;
pub use placeholder::{Placeholder, PlaceholderEncoder};
pub use processor::ImageProcessor;
pub use resolve::{resolve, AssetPaths};
pub use validate::{RasterFormat, Validator};
