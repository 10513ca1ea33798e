// SPDX-License-Identifier: GPL-3.0-only

//! Processing blocks and the filter chain
//!
//! A processing block turns one frame-set into another (colorize depth,
//! decode packed YUV, compute a point cloud, align). Each tick the
//! [`selector`] decides which blocks apply and in what order, and the
//! [`executor`] runs them over a cloned copy of the captured frame-set.
//!
//! Blocks are synchronous: a call either yields a new frame-set or nothing,
//! in which case the input is passed on unchanged.

pub mod blocks;
pub mod converters;
pub mod executor;
pub mod selector;

pub use blocks::{Aligner, DepthColorizer, Intrinsics, PackedColorDecoder, PointCloudGenerator};
pub use executor::FilterChain;
pub use selector::{PipelineFlags, select_pipeline};

use crate::config::Config;
use crate::frames::{FrameSet, StreamKind};

/// What a point cloud's texture coordinates refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    /// The RGB color stream (native or decoded)
    Color,
    /// The depth stream itself (colorized at draw time)
    Depth,
}

/// Processing block identity, in the order the selector emits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    ColorizeDepth,
    DecodePackedColor,
    PointCloud(TextureTarget),
    Align(StreamKind),
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockKind::ColorizeDepth => write!(f, "colorize-depth"),
            BlockKind::DecodePackedColor => write!(f, "decode-packed-color"),
            BlockKind::PointCloud(TextureTarget::Color) => write!(f, "point-cloud(color)"),
            BlockKind::PointCloud(TextureTarget::Depth) => write!(f, "point-cloud(depth)"),
            BlockKind::Align(kind) => write!(f, "align-to-{}", kind),
        }
    }
}

/// A frame-set transform
pub trait ProcessingBlock: Send {
    fn kind(&self) -> BlockKind;

    /// Transform `input`, or return `None` when there is nothing to
    /// contribute this tick. Never consumes `input`.
    fn process(&mut self, input: &FrameSet) -> Option<FrameSet>;

    /// Number of derived stream profiles currently registered
    fn derived_streams(&self) -> usize {
        0
    }

    /// Forget every derived stream profile
    fn reset(&mut self) {}
}

/// Run one block, falling back to the unchanged input
///
/// On success the superseded input is released before returning.
pub fn invoke(block: &mut dyn ProcessingBlock, input: FrameSet) -> FrameSet {
    match block.process(&input) {
        Some(output) => {
            input.release();
            output
        }
        None => {
            tracing::trace!(block = %block.kind(), "Block produced no output");
            input
        }
    }
}

/// One instance of every block, reused across ticks
///
/// Blocks keep derived stream profiles between ticks, so the same source
/// stream always maps to the same derived stream id.
pub struct ProcessingBlocks {
    colorizer: DepthColorizer,
    decoder: PackedColorDecoder,
    point_cloud: PointCloudGenerator,
    aligner: Aligner,
}

impl ProcessingBlocks {
    pub fn new(config: &Config) -> Self {
        Self {
            colorizer: DepthColorizer::new(config.depth.visualization()),
            decoder: PackedColorDecoder::new(),
            point_cloud: PointCloudGenerator::new(TextureTarget::Color),
            aligner: Aligner::new(StreamKind::Color),
        }
    }

    /// Drop derived-profile state held by every block
    pub fn reset(&mut self) {
        self.colorizer.reset();
        self.decoder.reset();
        self.point_cloud.reset();
        self.aligner.reset();
    }

    pub fn derived_streams(&self) -> usize {
        self.colorizer.derived_streams()
            + self.decoder.derived_streams()
            + self.point_cloud.derived_streams()
            + self.aligner.derived_streams()
    }

    /// Resolve a block kind to the instance that implements it
    pub fn get(&mut self, kind: BlockKind) -> &mut dyn ProcessingBlock {
        match kind {
            BlockKind::ColorizeDepth => &mut self.colorizer,
            BlockKind::DecodePackedColor => &mut self.decoder,
            BlockKind::PointCloud(target) => {
                self.point_cloud.set_target(target);
                &mut self.point_cloud
            }
            BlockKind::Align(to) => {
                self.aligner.set_target(to);
                &mut self.aligner
            }
        }
    }
}
