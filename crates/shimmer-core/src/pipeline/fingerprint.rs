//! Content fingerprints used as cache keys for source images.

use base64::{engine::general_purpose::URL_SAFE as BASE64, Engine as _};
use blake3::Hasher as Blake3Hasher;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Length of the short cache-busting token, in characters of the full digest.
pub const SHORT_TOKEN_LEN: usize = 10;

/// A BLAKE3 digest of a file's bytes and the short token derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// URL-safe base64 of the full 32-byte digest, with padding
    pub full: String,
    /// First [`SHORT_TOKEN_LEN`] characters of `full`, made URL/filesystem safe
    pub short: String,
}

impl Fingerprint {
    /// Fingerprint an in-memory byte buffer.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Blake3Hasher::new();
        hasher.update(data);
        Self::from_hasher(&hasher)
    }

    /// Fingerprint a file by streaming it, without loading it into memory.
    ///
    /// Produces the same value as [`Fingerprint::from_bytes`] on the file's contents.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut hasher = Blake3Hasher::new();

        let mut buffer = [0u8; 65536];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Self::from_hasher(&hasher))
    }

    fn from_hasher(hasher: &Blake3Hasher) -> Self {
        let full = BASE64.encode(hasher.finalize().as_bytes());
        let short = short_token(&full);
        Self { full, short }
    }
}

/// Derive the bundler-style short token from a full base64 digest.
///
/// Takes the first [`SHORT_TOKEN_LEN`] characters, maps `+` to `-` and `/` to
/// `_` (for digests in the standard alphabet), and strips trailing `=` padding.
pub fn short_token(full: &str) -> String {
    let token: String = full
        .chars()
        .take(SHORT_TOKEN_LEN)
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    token.trim_end_matches('=').to_string()
}
