// SPDX-License-Identifier: GPL-3.0-only

//! Filter chain execution

use tracing::debug;

use super::{BlockKind, ProcessingBlocks, invoke};
use crate::frames::FrameSet;

/// Applies an ordered block list to a frame-set
pub struct FilterChain;

impl FilterChain {
    /// Run `pipeline` over a clone of `input`
    ///
    /// Every intermediate frame-set is released as soon as the next one
    /// supersedes it. The caller owns the returned set and releases it after
    /// handing it to the render cache.
    pub fn run(blocks: &mut ProcessingBlocks, input: &FrameSet, pipeline: &[BlockKind]) -> FrameSet {
        let mut current = input.clone();
        for &kind in pipeline {
            current = invoke(blocks.get(kind), current);
        }
        debug!(
            blocks = pipeline.len(),
            frames_in = input.len(),
            frames_out = current.len(),
            "Filter chain complete"
        );
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::frames::{
        Frame, FrameData, HandleTracker, PixelFormat, StreamIdentity, StreamKind, VideoFrame,
    };
    use crate::processing::TextureTarget;

    fn frame(tracker: &HandleTracker, kind: StreamKind, format: PixelFormat) -> Frame {
        let bpp = format.bytes_per_pixel() as usize;
        let video = VideoFrame::new(4, 2, format, vec![128; 8 * bpp]).unwrap();
        Frame::new(
            StreamIdentity::new(kind, format, 0, 30),
            1,
            FrameData::Video(video),
            tracker,
        )
        .unwrap()
    }

    #[test]
    fn test_chain_releases_intermediates() {
        let tracker = HandleTracker::new();
        let input = FrameSet::from_frames(vec![
            frame(&tracker, StreamKind::Color, PixelFormat::Yuyv),
            frame(&tracker, StreamKind::Depth, PixelFormat::Z16),
        ])
        .unwrap();
        let mut blocks = ProcessingBlocks::new(&Config::default());

        let output = FilterChain::run(
            &mut blocks,
            &input,
            &[BlockKind::DecodePackedColor, BlockKind::PointCloud(TextureTarget::Color)],
        );
        assert_eq!(output.len(), 3, "decoded color, depth, points");
        assert!(output.find(StreamKind::Color, |f| f == PixelFormat::Rgb8).is_some());

        // input (2) + output (3)
        assert_eq!(tracker.live(), 5);
        output.release();
        assert_eq!(tracker.live(), 2);
        input.release();
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn test_empty_pipeline_returns_clone() {
        let tracker = HandleTracker::new();
        let input =
            FrameSet::from_frames(vec![frame(&tracker, StreamKind::Color, PixelFormat::Rgb8)])
                .unwrap();
        let mut blocks = ProcessingBlocks::new(&Config::default());
        let output = FilterChain::run(&mut blocks, &input, &[]);
        assert!(output.iter().next().unwrap().same_frame(input.iter().next().unwrap()));
        assert_eq!(tracker.live(), 2);
    }
}
