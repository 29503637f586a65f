//! ThumbHash: a DCT-based perceptual signature for image placeholders.
//!
//! The image is converted to an LPQA color space (luminance, two chroma
//! channels, alpha), each channel is reduced to a handful of low-frequency DCT
//! coefficients, and the result is packed into a short byte string:
//!
//! ```text
//! byte 0..3   header24: L dc (6b) | P dc (6b) | Q dc (6b) | L scale (5b) | alpha flag
//! byte 3..5   header16: lx or ly (3b) | P scale (6b) | Q scale (6b) | landscape flag
//! byte 5      A dc (4b) | A scale (4b)          (only when the alpha flag is set)
//! rest        4-bit AC coefficients: L, P, Q, then A
//! ```
//!
//! Inputs are limited to 100×100 pixels; callers downsample first.

use std::f32::consts::PI;
use thiserror::Error;

/// Largest width or height accepted by [`encode`].
pub const MAX_INPUT_DIMENSION: usize = 100;

/// Longest side of the bitmap produced by [`decode`].
pub const PREVIEW_SIZE: f32 = 32.0;

/// Errors from ThumbHash encoding and decoding.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ThumbHashError {
    #[error("image is {width}x{height}, ThumbHash input must be at most 100x100")]
    TooLarge { width: usize, height: usize },

    #[error("image has zero width or height")]
    Empty,

    #[error("expected {expected} RGBA bytes for the given size, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("hash is truncated ({len} bytes)")]
    Truncated { len: usize },
}

/// A decoded ThumbHash bitmap, RGBA8 row-major with straight alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

/// Encode an RGBA8 image of at most 100×100 pixels into a ThumbHash.
pub fn encode(width: usize, height: usize, rgba: &[u8]) -> Result<Vec<u8>, ThumbHashError> {
    if width == 0 || height == 0 {
        return Err(ThumbHashError::Empty);
    }
    if width > MAX_INPUT_DIMENSION || height > MAX_INPUT_DIMENSION {
        return Err(ThumbHashError::TooLarge { width, height });
    }
    let expected = width * height * 4;
    if rgba.len() != expected {
        return Err(ThumbHashError::BufferSize {
            expected,
            actual: rgba.len(),
        });
    }

    // Average color, weighted by alpha
    let (mut avg_r, mut avg_g, mut avg_b, mut avg_a) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
    for px in rgba.chunks_exact(4) {
        let alpha = px[3] as f32 / 255.0;
        avg_r += alpha / 255.0 * px[0] as f32;
        avg_g += alpha / 255.0 * px[1] as f32;
        avg_b += alpha / 255.0 * px[2] as f32;
        avg_a += alpha;
    }
    if avg_a > 0.0 {
        avg_r /= avg_a;
        avg_g /= avg_a;
        avg_b /= avg_a;
    }

    let pixel_count = width * height;
    let has_alpha = avg_a < pixel_count as f32;
    // Fewer luminance bits when alpha takes up room
    let l_limit = if has_alpha { 5.0 } else { 7.0 };
    let longest = width.max(height) as f32;
    let lx = ((l_limit * width as f32 / longest).round() as usize).max(1);
    let ly = ((l_limit * height as f32 / longest).round() as usize).max(1);

    // RGBA -> LPQA, composited over the average color
    let mut l = Vec::with_capacity(pixel_count);
    let mut p = Vec::with_capacity(pixel_count);
    let mut q = Vec::with_capacity(pixel_count);
    let mut a = Vec::with_capacity(pixel_count);
    for px in rgba.chunks_exact(4) {
        let alpha = px[3] as f32 / 255.0;
        let r = avg_r * (1.0 - alpha) + alpha / 255.0 * px[0] as f32;
        let g = avg_g * (1.0 - alpha) + alpha / 255.0 * px[1] as f32;
        let b = avg_b * (1.0 - alpha) + alpha / 255.0 * px[2] as f32;
        l.push((r + g + b) / 3.0);
        p.push((r + g) / 2.0 - b);
        q.push(r - g);
        a.push(alpha);
    }

    let l_channel = encode_channel(&l, width, height, lx.max(3), ly.max(3));
    let p_channel = encode_channel(&p, width, height, 3, 3);
    let q_channel = encode_channel(&q, width, height, 3, 3);
    let a_channel = if has_alpha {
        encode_channel(&a, width, height, 5, 5)
    } else {
        Channel {
            dc: 1.0,
            ac: Vec::new(),
            scale: 1.0,
        }
    };

    let is_landscape = width > height;
    let header24 = quantize(63.0 * l_channel.dc)
        | (quantize(31.5 + 31.5 * p_channel.dc) << 6)
        | (quantize(31.5 + 31.5 * q_channel.dc) << 12)
        | (quantize(31.0 * l_channel.scale) << 18)
        | if has_alpha { 1 << 23 } else { 0 };
    let header16 = (if is_landscape { ly } else { lx }) as u32
        | (quantize(63.0 * p_channel.scale) << 3)
        | (quantize(63.0 * q_channel.scale) << 9)
        | if is_landscape { 1 << 15 } else { 0 };

    let mut hash = Vec::with_capacity(25);
    hash.extend_from_slice(&[
        (header24 & 255) as u8,
        ((header24 >> 8) & 255) as u8,
        (header24 >> 16) as u8,
        (header16 & 255) as u8,
        (header16 >> 8) as u8,
    ]);
    if has_alpha {
        hash.push((quantize(15.0 * a_channel.dc) | (quantize(15.0 * a_channel.scale) << 4)) as u8);
    }

    let mut is_odd = false;
    let acs = [&l_channel.ac, &p_channel.ac, &q_channel.ac, &a_channel.ac];
    for f in acs.into_iter().flatten() {
        let nibble = quantize(15.0 * f) as u8;
        if is_odd {
            if let Some(last) = hash.last_mut() {
                *last |= nibble << 4;
            }
        } else {
            hash.push(nibble);
        }
        is_odd = !is_odd;
    }

    Ok(hash)
}

/// Decode a ThumbHash into a small bitmap (longest side 32 pixels).
pub fn decode(hash: &[u8]) -> Result<Bitmap, ThumbHashError> {
    let header = Header::parse(hash)?;

    let ac_start = if header.has_alpha { 6 } else { 5 };
    let mut reader = AcReader {
        hash,
        start: ac_start,
        index: 0,
    };
    // Saturation boosted by 1.25 to offset quantization
    let l_ac = reader.channel(header.lx, header.ly, header.l_scale)?;
    let p_ac = reader.channel(3, 3, header.p_scale * 1.25)?;
    let q_ac = reader.channel(3, 3, header.q_scale * 1.25)?;
    let a_ac = if header.has_alpha {
        reader.channel(5, 5, header.a_scale)?
    } else {
        Vec::new()
    };

    let ratio = aspect_ratio(hash)?;
    let width = (if ratio > 1.0 { PREVIEW_SIZE } else { PREVIEW_SIZE * ratio }).round() as usize;
    let height = (if ratio > 1.0 { PREVIEW_SIZE / ratio } else { PREVIEW_SIZE }).round() as usize;
    let (width, height) = (width.max(1), height.max(1));

    let cx_stop = header.lx.max(if header.has_alpha { 5 } else { 3 });
    let cy_stop = header.ly.max(if header.has_alpha { 5 } else { 3 });
    let mut fx = vec![0.0f32; cx_stop];
    let mut fy = vec![0.0f32; cy_stop];
    let mut rgba = Vec::with_capacity(width * height * 4);

    for y in 0..height {
        for (cy, f) in fy.iter_mut().enumerate() {
            *f = (PI / height as f32 * (y as f32 + 0.5) * cy as f32).cos();
        }
        for x in 0..width {
            for (cx, f) in fx.iter_mut().enumerate() {
                *f = (PI / width as f32 * (x as f32 + 0.5) * cx as f32).cos();
            }

            let l = header.l_dc + inverse_dct(&l_ac, &fx, &fy, header.lx, header.ly);
            let p = header.p_dc + inverse_dct(&p_ac, &fx, &fy, 3, 3);
            let q = header.q_dc + inverse_dct(&q_ac, &fx, &fy, 3, 3);
            let a = if header.has_alpha {
                header.a_dc + inverse_dct(&a_ac, &fx, &fy, 5, 5)
            } else {
                header.a_dc
            };

            let [r, g, b] = lpq_to_rgb(l, p, q);
            rgba.extend_from_slice(&[to_byte(r), to_byte(g), to_byte(b), to_byte(a)]);
        }
    }

    Ok(Bitmap {
        width,
        height,
        rgba,
    })
}

/// Approximate width/height ratio of the image a hash was made from.
pub fn aspect_ratio(hash: &[u8]) -> Result<f32, ThumbHashError> {
    if hash.len() < 5 {
        return Err(ThumbHashError::Truncated { len: hash.len() });
    }
    let header = hash[3];
    let has_alpha = hash[2] & 0x80 != 0;
    let is_landscape = hash[4] & 0x80 != 0;
    let long_side = if has_alpha { 5.0 } else { 7.0 };
    let (lx, ly) = if is_landscape {
        (long_side, (header & 7) as f32)
    } else {
        ((header & 7) as f32, long_side)
    };
    if lx == 0.0 || ly == 0.0 {
        return Err(ThumbHashError::Truncated { len: hash.len() });
    }
    Ok(lx / ly)
}

struct Channel {
    dc: f32,
    ac: Vec<f32>,
    scale: f32,
}

/// Forward DCT of one channel, keeping the triangle of coefficients with
/// `cx * ny < nx * (ny - cy)`. AC terms are normalized into `0.0..=1.0`.
fn encode_channel(channel: &[f32], w: usize, h: usize, nx: usize, ny: usize) -> Channel {
    let mut dc = 0.0;
    let mut ac = Vec::with_capacity(nx * ny / 2);
    let mut scale = 0.0f32;
    let mut fx = vec![0.0f32; w];

    for cy in 0..ny {
        let mut cx = 0;
        while cx * ny < nx * (ny - cy) {
            for (x, f) in fx.iter_mut().enumerate() {
                *f = (PI / w as f32 * cx as f32 * (x as f32 + 0.5)).cos();
            }
            let mut f = 0.0;
            for y in 0..h {
                let fy = (PI / h as f32 * cy as f32 * (y as f32 + 0.5)).cos();
                let row = &channel[y * w..(y + 1) * w];
                for (value, fx) in row.iter().zip(&fx) {
                    f += value * fx * fy;
                }
            }
            f /= (w * h) as f32;
            if cx > 0 || cy > 0 {
                ac.push(f);
                scale = scale.max(f.abs());
            } else {
                dc = f;
            }
            cx += 1;
        }
    }

    if scale > 0.0 {
        for f in &mut ac {
            *f = 0.5 + 0.5 / scale * *f;
        }
    }

    Channel { dc, ac, scale }
}

/// Sum the AC terms of one channel at a pixel, given its cosine tables.
fn inverse_dct(ac: &[f32], fx: &[f32], fy: &[f32], nx: usize, ny: usize) -> f32 {
    let mut value = 0.0;
    let mut j = 0;
    for cy in 0..ny {
        let fy2 = fy[cy] * 2.0;
        let mut cx = if cy > 0 { 0 } else { 1 };
        while cx * ny < nx * (ny - cy) {
            value += ac[j] * fx[cx] * fy2;
            j += 1;
            cx += 1;
        }
    }
    value
}

fn lpq_to_rgb(l: f32, p: f32, q: f32) -> [f32; 3] {
    let b = l - 2.0 / 3.0 * p;
    let r = (3.0 * l - b + q) / 2.0;
    let g = r - q;
    [r, g, b]
}

fn quantize(value: f32) -> u32 {
    value.round().max(0.0) as u32
}

fn to_byte(value: f32) -> u8 {
    (255.0 * value.min(1.0)).max(0.0) as u8
}

/// Constants unpacked from the first five or six bytes of a hash.
struct Header {
    l_dc: f32,
    p_dc: f32,
    q_dc: f32,
    l_scale: f32,
    p_scale: f32,
    q_scale: f32,
    a_dc: f32,
    a_scale: f32,
    has_alpha: bool,
    lx: usize,
    ly: usize,
}

impl Header {
    fn parse(hash: &[u8]) -> Result<Self, ThumbHashError> {
        if hash.len() < 5 {
            return Err(ThumbHashError::Truncated { len: hash.len() });
        }
        let header24 = hash[0] as u32 | (hash[1] as u32) << 8 | (hash[2] as u32) << 16;
        let header16 = hash[3] as u32 | (hash[4] as u32) << 8;

        let has_alpha = header24 >> 23 != 0;
        let is_landscape = header16 >> 15 != 0;
        let long_side = if has_alpha { 5 } else { 7 };
        let short_side = (header16 & 7) as usize;
        let (lx, ly) = if is_landscape {
            (long_side, short_side)
        } else {
            (short_side, long_side)
        };

        let (a_dc, a_scale) = if has_alpha {
            let byte = *hash
                .get(5)
                .ok_or(ThumbHashError::Truncated { len: hash.len() })?;
            ((byte & 15) as f32 / 15.0, (byte >> 4) as f32 / 15.0)
        } else {
            (1.0, 0.0)
        };

        Ok(Self {
            l_dc: (header24 & 63) as f32 / 63.0,
            p_dc: ((header24 >> 6) & 63) as f32 / 31.5 - 1.0,
            q_dc: ((header24 >> 12) & 63) as f32 / 31.5 - 1.0,
            l_scale: ((header24 >> 18) & 31) as f32 / 31.0,
            p_scale: ((header16 >> 3) & 63) as f32 / 63.0,
            q_scale: ((header16 >> 9) & 63) as f32 / 63.0,
            a_dc,
            a_scale,
            has_alpha,
            lx: lx.max(3),
            ly: ly.max(3),
        })
    }
}

/// Sequential reader over the packed 4-bit AC coefficients.
struct AcReader<'a> {
    hash: &'a [u8],
    start: usize,
    index: usize,
}

impl AcReader<'_> {
    fn channel(&mut self, nx: usize, ny: usize, scale: f32) -> Result<Vec<f32>, ThumbHashError> {
        let mut ac = Vec::new();
        for cy in 0..ny {
            let mut cx = if cy > 0 { 0 } else { 1 };
            while cx * ny < nx * (ny - cy) {
                let byte = *self
                    .hash
                    .get(self.start + (self.index >> 1))
                    .ok_or(ThumbHashError::Truncated {
                        len: self.hash.len(),
                    })?;
                let nibble = (byte >> ((self.index & 1) << 2)) & 15;
                ac.push((nibble as f32 / 7.5 - 1.0) * scale);
                self.index += 1;
                cx += 1;
            }
        }
        Ok(ac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Average color of the hashed image as straight-alpha RGBA in `0.0..=1.0`.
    fn average_rgba(hash: &[u8]) -> Result<[f32; 4], ThumbHashError> {
        let header = Header::parse(hash)?;
        let [r, g, b] = lpq_to_rgb(header.l_dc, header.p_dc, header.q_dc);
        Ok([
            r.clamp(0.0, 1.0),
            g.clamp(0.0, 1.0),
            b.clamp(0.0, 1.0),
            header.a_dc,
        ])
    }

    fn solid(width: usize, height: usize, px: [u8; 4]) -> Vec<u8> {
        px.repeat(width * height)
    }

    fn gradient(width: usize, height: usize) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&[
                    (x * 255 / width) as u8,
                    (y * 255 / height) as u8,
                    128,
                    255,
                ]);
            }
        }
        rgba
    }

    #[test]
    fn test_opaque_square_hash_length() {
        // 5 header bytes + (27 L + 5 P + 5 Q) nibbles = 5 + 19
        let hash = encode(8, 8, &solid(8, 8, [255, 0, 0, 255])).unwrap();
        assert_eq!(hash.len(), 24);
        assert_eq!(hash[2] & 0x80, 0, "alpha flag must be clear");
    }

    #[test]
    fn test_encode_is_deterministic() {
        let rgba = gradient(100, 50);
        assert_eq!(encode(100, 50, &rgba).unwrap(), encode(100, 50, &rgba).unwrap());
    }

    #[test]
    fn test_gradient_differs_from_solid() {
        let a = encode(40, 40, &gradient(40, 40)).unwrap();
        let b = encode(40, 40, &solid(40, 40, [128, 128, 128, 255])).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_average_color_of_solid_red() {
        let hash = encode(16, 16, &solid(16, 16, [255, 0, 0, 255])).unwrap();
        let [r, g, b, a] = average_rgba(&hash).unwrap();
        assert!(r > 0.95, "r = {r}");
        assert!(g < 0.05, "g = {g}");
        assert!(b < 0.05, "b = {b}");
        assert_eq!(a, 1.0);
    }

    #[test]
    fn test_solid_color_decodes_uniformly() {
        let hash = encode(10, 10, &solid(10, 10, [40, 120, 200, 255])).unwrap();
        let bitmap = decode(&hash).unwrap();
        let first = &bitmap.rgba[0..4];
        for px in bitmap.rgba.chunks_exact(4) {
            assert_eq!(px, first);
        }
        assert!((first[0] as i32 - 40).abs() <= 8);
        assert!((first[1] as i32 - 120).abs() <= 8);
        assert!((first[2] as i32 - 200).abs() <= 8);
        assert_eq!(first[3], 255);
    }

    #[test]
    fn test_landscape_preview_dimensions() {
        // lx = 7, ly = round(3.5) = 4 -> ratio 1.75 -> 32 x 18
        let hash = encode(100, 50, &gradient(100, 50)).unwrap();
        assert!((aspect_ratio(&hash).unwrap() - 1.75).abs() < 1e-6);
        let bitmap = decode(&hash).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (32, 18));
        assert_eq!(bitmap.rgba.len(), 32 * 18 * 4);
    }

    #[test]
    fn test_portrait_preview_dimensions() {
        let hash = encode(50, 100, &gradient(50, 100)).unwrap();
        let bitmap = decode(&hash).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (18, 32));
    }

    #[test]
    fn test_square_preview_dimensions() {
        let hash = encode(64, 64, &gradient(64, 64)).unwrap();
        let bitmap = decode(&hash).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (32, 32));
    }

    #[test]
    fn test_degenerate_strip_encodes() {
        let hash = encode(100, 1, &gradient(100, 1)).unwrap();
        let bitmap = decode(&hash).unwrap();
        assert_eq!(bitmap.width, 32);
        assert!(bitmap.height >= 1);
    }

    #[test]
    fn test_transparent_image_sets_alpha_flag() {
        let hash = encode(20, 20, &solid(20, 20, [0, 0, 0, 0])).unwrap();
        assert_ne!(hash[2] & 0x80, 0);
        let bitmap = decode(&hash).unwrap();
        assert!(bitmap.rgba.chunks_exact(4).all(|px| px[3] == 0));
    }

    #[test]
    fn test_partial_alpha_round_trips_roughly() {
        let hash = encode(20, 20, &solid(20, 20, [255, 255, 255, 128])).unwrap();
        let [_, _, _, a] = average_rgba(&hash).unwrap();
        assert!((a - 0.5).abs() < 0.1, "a = {a}");
    }

    #[test]
    fn test_rejects_oversized_input() {
        let err = encode(101, 10, &solid(101, 10, [0, 0, 0, 255])).unwrap_err();
        assert_eq!(
            err,
            ThumbHashError::TooLarge {
                width: 101,
                height: 10
            }
        );
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        let err = encode(4, 4, &[0u8; 10]).unwrap_err();
        assert_eq!(
            err,
            ThumbHashError::BufferSize {
                expected: 64,
                actual: 10
            }
        );
    }

    #[test]
    fn test_rejects_empty_input() {
        assert_eq!(encode(0, 4, &[]).unwrap_err(), ThumbHashError::Empty);
    }

    #[test]
    fn test_decode_rejects_truncated_hash() {
        let hash = encode(8, 8, &gradient(8, 8)).unwrap();
        assert!(matches!(
            decode(&hash[..10]),
            Err(ThumbHashError::Truncated { .. })
        ));
        assert!(matches!(decode(&[1, 2]), Err(ThumbHashError::Truncated { .. })));
    }
}
