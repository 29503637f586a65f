//! Record keys and public URLs for discovered assets.
//!
//! Everything here is a pure string transform: no file-system access, and
//! both `/` and `\` are treated as separators so results are identical on
//! every host.

use std::path::Path;

/// Path- and URL-derived fields of an image record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    /// Path relative to the project root, forward slashes
    pub asset_file_name: String,
    /// Absolute path, forward slashes
    pub asset_full_file_name: String,
    /// `asset_dir` joined with `asset_file_name`
    pub asset_url: String,
    /// `base_path`, `asset_dir` and `asset_file_name` joined; starts with `/`
    pub asset_url_with_base: String,
}

/// Compute the record key and public URLs for `file` under `root`.
pub fn resolve(root: &Path, asset_dir: &str, base_path: &str, file: &Path) -> AssetPaths {
    let root = to_slash(root);
    let full = to_slash(file);
    let asset_file_name = relative(&root, &full);
    let asset_url = join(&[asset_dir, &asset_file_name]);

    let mut asset_url_with_base = join(&[base_path, asset_dir, &asset_file_name]);
    if !asset_url_with_base.starts_with('/') {
        asset_url_with_base.insert(0, '/');
    }

    AssetPaths {
        asset_file_name,
        asset_full_file_name: full,
        asset_url,
        asset_url_with_base,
    }
}

/// Render a path with forward slashes regardless of the host separator.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Lexically compute `target` relative to `base`, using `..` when `target`
/// lies outside `base`. Both are forward-slash paths.
pub fn relative(base: &str, target: &str) -> String {
    let base = normalize_segments(base);
    let target = normalize_segments(target);

    let common = base
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = std::iter::repeat("..").take(base.len() - common);
    let downs = target[common..].iter().copied();
    ups.chain(downs).collect::<Vec<_>>().join("/")
}

/// POSIX-style join: collapses repeated separators and `.` segments,
/// resolves `..`, keeps a leading `/` from the first non-empty part, and
/// keeps a trailing `/` from the last one.
pub fn join(parts: &[&str]) -> String {
    let parts: Vec<String> = parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.replace('\\', "/"))
        .collect();
    if parts.is_empty() {
        return ".".to_string();
    }

    let absolute = parts[0].starts_with('/');
    let trailing = parts.last().is_some_and(|p| p.ends_with('/'));

    let mut segments: Vec<&str> = Vec::new();
    for segment in parts.iter().flat_map(|p| p.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let mut joined = segments.join("/");
    if absolute {
        joined.insert(0, '/');
    }
    if joined.is_empty() {
        joined.push('.');
    } else if trailing && !joined.ends_with('/') {
        joined.push('/');
    }
    joined
}

/// Split a slash path into segments, dropping empty and `.` parts and
/// resolving `..` against earlier segments.
fn normalize_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments
}
