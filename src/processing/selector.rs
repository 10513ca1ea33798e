// SPDX-License-Identifier: GPL-3.0-only

//! Per-tick pipeline selection
//!
//! The block order is fixed: depth colorization must run before the depth
//! stream can serve as a fallback point-cloud texture, and packed YUV must be
//! decoded before it can be displayed or used to texture a point cloud.

use super::{BlockKind, TextureTarget};
use crate::frames::{FrameSet, PixelFormat, StreamKind};

/// What a frame-set contains, recomputed every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineFlags {
    pub has_color_rgb: bool,
    pub has_color_packed_yuv: bool,
    pub has_depth: bool,
    pub has_colorized_depth: bool,
    pub wants_point_cloud: bool,
}

impl PipelineFlags {
    /// Inspect the stream identities in `frames`
    pub fn inspect(frames: &FrameSet, point_cloud_requested: bool) -> Self {
        let mut flags = Self {
            wants_point_cloud: point_cloud_requested,
            ..Self::default()
        };

        frames.for_each(|frame| {
            let id = frame.identity();
            match (id.kind, id.format) {
                (StreamKind::Color, f) if f.is_rgb() => flags.has_color_rgb = true,
                (StreamKind::Color, f) if f.is_packed_yuv() => flags.has_color_packed_yuv = true,
                (StreamKind::Depth, PixelFormat::Z16) => flags.has_depth = true,
                (StreamKind::Depth, f) if f.is_rgb() => flags.has_colorized_depth = true,
                _ => {}
            }
        });

        flags
    }
}

/// Ordered list of blocks to apply for `flags`
pub fn select_pipeline(flags: &PipelineFlags) -> Vec<BlockKind> {
    let mut blocks = Vec::with_capacity(3);

    if flags.has_depth && !flags.has_colorized_depth && !flags.wants_point_cloud {
        blocks.push(BlockKind::ColorizeDepth);
    }

    if flags.has_color_packed_yuv {
        blocks.push(BlockKind::DecodePackedColor);
    }

    if flags.wants_point_cloud {
        let rgb_available = flags.has_color_rgb || flags.has_color_packed_yuv;
        if rgb_available {
            blocks.push(BlockKind::PointCloud(TextureTarget::Color));
        } else if flags.has_depth {
            blocks.push(BlockKind::PointCloud(TextureTarget::Depth));
        }
    }

    blocks
}
