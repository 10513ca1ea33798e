// SPDX-License-Identifier: GPL-3.0-only

//! Point-cloud texture back-projection
//!
//! Turns a point cloud plus a texture-source image into one RGBA texel per
//! vertex. Entries that can't be sampled stay fully transparent.

use crate::frames::{PointCloud, VideoFrame};

/// Bytes per output texel
pub const TEXEL_BYTES: usize = 4;

/// Sample an RGB texture at every vertex's texture coordinate
///
/// Zero-depth vertices and coordinates on or outside the image border are
/// skipped. The texture may be far larger than the cloud.
pub fn map_texture(cloud: &PointCloud, texture: &VideoFrame) -> Vec<u8> {
    let mut out = vec![0u8; cloud.len() * TEXEL_BYTES];
    let (w, h) = (texture.width as i64, texture.height as i64);

    for (i, (vertex, tc)) in cloud.vertices.iter().zip(&cloud.tex_coords).enumerate() {
        if vertex.z == 0.0 {
            continue;
        }

        let x = (tc.u * w as f32).round() as i64;
        let y = (tc.v * h as f32).round() as i64;
        if x <= 0 || y <= 0 || x >= w || y >= h {
            continue;
        }

        let src = texture.offset(x as u32, y as u32);
        let Some(rgb) = texture.data.get(src..src + 3) else {
            continue;
        };
        let dst = i * TEXEL_BYTES;
        out[dst..dst + 3].copy_from_slice(rgb);
        out[dst + 3] = 255;
    }

    out
}

/// Grayscale stand-in used when no texture source is available
///
/// Depth maps linearly to brightness, reaching white at `max_range` meters;
/// farther points saturate. Zero-depth vertices stay transparent.
pub fn grayscale_texture(cloud: &PointCloud, max_range: f32) -> Vec<u8> {
    let mut out = vec![0u8; cloud.len() * TEXEL_BYTES];
    for (texel, vertex) in out.chunks_exact_mut(TEXEL_BYTES).zip(&cloud.vertices) {
        if vertex.z == 0.0 {
            continue;
        }
        let gray = (vertex.z / max_range * 255.0) as u8;
        texel.copy_from_slice(&[gray, gray, gray, 255]);
    }
    out
}
