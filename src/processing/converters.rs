// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion utilities
//!
//! CPU conversions shared by the processing blocks and the renderer:
//! packed YUV decoding, depth colorization and per-pixel RGB sampling.

use crate::constants::{DEPTH_COLORMAP_BANDS, DEPTH_INVALID_MM, DEPTH_MAX_MM, DEPTH_MIN_MM};
use crate::frames::{PixelFormat, VideoFrame};

/// Convert YUV (BT.601) to RGB
#[inline]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    [r, g, b]
}

/// Decode a packed 4:2:2 image (YUYV or UYVY) to tightly packed RGB
///
/// Each 4-byte group encodes 2 pixels sharing one chroma pair.
pub fn packed_yuv_to_rgb(frame: &VideoFrame, format: PixelFormat) -> Vec<u8> {
    let w = frame.width as usize;
    let h = frame.height as usize;
    let mut rgb = Vec::with_capacity(w * h * 3);

    for y in 0..h {
        let row = y * frame.stride as usize;
        for pair in 0..w.div_ceil(2) {
            let base = row + pair * 4;
            let Some(chunk) = frame.data.get(base..base + 4) else {
                // Truncated row: pad with black
                rgb.resize(rgb.len() + (w - pair * 2).min(2) * 3, 0);
                continue;
            };
            let (y0, y1, u, v) = match format {
                PixelFormat::Uyvy => (chunk[1], chunk[3], chunk[0], chunk[2]),
                _ => (chunk[0], chunk[2], chunk[1], chunk[3]),
            };
            rgb.extend_from_slice(&yuv_to_rgb(y0, u, v));
            if pair * 2 + 1 < w {
                rgb.extend_from_slice(&yuv_to_rgb(y1, u, v));
            }
        }
    }

    rgb
}

/// Depth visualization options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthVisualizationOptions {
    /// Use grayscale instead of colormap (near=bright, far=dark)
    pub grayscale: bool,
    /// Number of quantization bands, 0 disables quantization
    pub quantize_bands: u32,
    /// Minimum depth in mm (values below are clamped)
    pub min_depth_mm: u16,
    /// Maximum depth in mm (values above are clamped), 0 = auto-range
    pub max_depth_mm: u16,
}

impl Default for DepthVisualizationOptions {
    fn default() -> Self {
        Self {
            grayscale: false,
            quantize_bands: DEPTH_COLORMAP_BANDS,
            min_depth_mm: DEPTH_MIN_MM,
            max_depth_mm: DEPTH_MAX_MM,
        }
    }
}

/// Turbo colormap: perceptually uniform rainbow (blue=near, red=far)
///
/// Based on the Google Turbo colormap, polynomial approximation.
fn turbo(t: f32) -> [u8; 3] {
    let r = (0.13572138
        + t * (4.6153926 + t * (-42.66032 + t * (132.13108 + t * (-152.54825 + t * 59.28144)))))
        .clamp(0.0, 1.0);
    let g = (0.09140261
        + t * (2.19418 + t * (4.84296 + t * (-14.18503 + t * (4.27805 + t * 2.53377)))))
        .clamp(0.0, 1.0);
    let b = (0.1066733
        + t * (12.64194 + t * (-60.58204 + t * (109.99648 + t * (-82.52904 + t * 20.43388)))))
        .clamp(0.0, 1.0);
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}

/// Convert 16-bit depth (mm) to an RGB visualization
///
/// Zero and out-of-range samples are black.
pub fn depth_to_rgb(depth: &[u16], options: &DepthVisualizationOptions) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(depth.len() * 3);

    let (min_depth, max_depth) = if options.max_depth_mm == 0 {
        // Auto-range over valid samples
        let mut min_d = u16::MAX;
        let mut max_d = 0u16;
        for &d in depth {
            if d != 0 && d < DEPTH_INVALID_MM {
                min_d = min_d.min(d);
                max_d = max_d.max(d);
            }
        }
        if max_d <= min_d {
            (0, DEPTH_MAX_MM)
        } else {
            (min_d, max_d)
        }
    } else {
        (options.min_depth_mm, options.max_depth_mm.max(options.min_depth_mm.saturating_add(1)))
    };

    let range = (max_depth - min_depth) as f32;

    for &d in depth {
        if d == 0 || d >= DEPTH_INVALID_MM {
            rgb.extend_from_slice(&[0, 0, 0]);
            continue;
        }

        let mut t = (d.saturating_sub(min_depth) as f32 / range).clamp(0.0, 1.0);
        if options.quantize_bands > 0 {
            let bands = options.quantize_bands as f32;
            t = (t * bands).floor() / bands;
        }

        if options.grayscale {
            let gray = ((1.0 - t) * 255.0) as u8;
            rgb.extend_from_slice(&[gray, gray, gray]);
        } else {
            rgb.extend_from_slice(&turbo(t));
        }
    }

    rgb
}

/// Sample pixel (x, y) of a video frame as RGB
///
/// Coordinates are clamped to the image. Z16 shows the upper 8 bits.
pub fn sample_rgb(frame: &VideoFrame, format: PixelFormat, x: u32, y: u32) -> [u8; 3] {
    if frame.width == 0 || frame.height == 0 {
        return [0, 0, 0];
    }
    let x = x.min(frame.width - 1);
    let y = y.min(frame.height - 1);
    let data = &frame.data;

    match format {
        PixelFormat::Rgb8 | PixelFormat::Rgba8 => {
            let idx = frame.offset(x, y);
            match data.get(idx..idx + 3) {
                Some(px) => [px[0], px[1], px[2]],
                None => [0, 0, 0],
            }
        }
        PixelFormat::Bgr8 => {
            let idx = frame.offset(x, y);
            match data.get(idx..idx + 3) {
                Some(px) => [px[2], px[1], px[0]],
                None => [0, 0, 0],
            }
        }
        PixelFormat::Y8 => {
            let v = data.get(frame.offset(x, y)).copied().unwrap_or(0);
            [v, v, v]
        }
        PixelFormat::Z16 => {
            let v = data.get(frame.offset(x, y) + 1).copied().unwrap_or(0);
            [v, v, v]
        }
        PixelFormat::Yuyv | PixelFormat::Uyvy => {
            let base = (y * frame.stride) as usize + (x & !1) as usize * 2;
            let Some(chunk) = data.get(base..base + 4) else {
                return [0, 0, 0];
            };
            let (y0, y1, u, v) = if format == PixelFormat::Uyvy {
                (chunk[1], chunk[3], chunk[0], chunk[2])
            } else {
                (chunk[0], chunk[2], chunk[1], chunk[3])
            };
            let luma = if x & 1 == 0 { y0 } else { y1 };
            yuv_to_rgb(luma, u, v)
        }
        PixelFormat::MotionXyz32f | PixelFormat::Xyz32f => [0, 0, 0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_white() {
        // Pure white in YUV (Y=255, U=128, V=128)
        let frame = VideoFrame::new(2, 1, PixelFormat::Yuyv, vec![255, 128, 255, 128]).unwrap();
        let rgb = packed_yuv_to_rgb(&frame, PixelFormat::Yuyv);
        assert_eq!(rgb.len(), 6);
        assert!(rgb.iter().all(|&c| c > 250));
    }

    #[test]
    fn test_uyvy_byte_order() {
        // Y0 = 0 (black), Y1 = 255 (white)
        let frame = VideoFrame::new(2, 1, PixelFormat::Uyvy, vec![128, 0, 128, 255]).unwrap();
        let rgb = packed_yuv_to_rgb(&frame, PixelFormat::Uyvy);
        assert!(rgb[0] < 5);
        assert!(rgb[3] > 250);
    }

    #[test]
    fn test_sample_matches_bulk_decode() {
        let frame =
            VideoFrame::new(2, 1, PixelFormat::Yuyv, vec![200, 90, 40, 160]).unwrap();
        let rgb = packed_yuv_to_rgb(&frame, PixelFormat::Yuyv);
        assert_eq!(sample_rgb(&frame, PixelFormat::Yuyv, 0, 0), [rgb[0], rgb[1], rgb[2]]);
        assert_eq!(sample_rgb(&frame, PixelFormat::Yuyv, 1, 0), [rgb[3], rgb[4], rgb[5]]);
    }

    #[test]
    fn test_depth_invalid_is_black() {
        let rgb = depth_to_rgb(&[0, DEPTH_INVALID_MM], &DepthVisualizationOptions::default());
        assert_eq!(rgb, vec![0; 6]);
    }

    #[test]
    fn test_depth_grayscale_near_is_bright() {
        let options = DepthVisualizationOptions {
            grayscale: true,
            ..Default::default()
        };
        let rgb = depth_to_rgb(&[400, 3900], &options);
        assert!(rgb[0] > 200);
        assert!(rgb[3] < 50);
    }

    #[test]
    fn test_turbo_colormap() {
        let start = turbo(0.0);
        let mid = turbo(0.5);
        let end = turbo(1.0);
        assert_ne!(start, mid);
        assert_ne!(mid, end);
        assert!(end[0] > start[0]);
    }

    #[test]
    fn test_sample_bgr_swaps_channels() {
        let frame = VideoFrame::new(1, 1, PixelFormat::Bgr8, vec![1, 2, 3]).unwrap();
        assert_eq!(sample_rgb(&frame, PixelFormat::Bgr8, 0, 0), [3, 2, 1]);
    }
}
