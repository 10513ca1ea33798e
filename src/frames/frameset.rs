// SPDX-License-Identifier: GPL-3.0-only

//! Synchronized frame bundles

use super::handle::Frame;
use super::types::{PixelFormat, StreamKind};
use crate::constants::MAX_FRAMES_PER_SET;
use crate::errors::FrameError;

/// Frames captured in the same synchronized burst
///
/// Cloning takes a new reference on every frame; sample data is shared.
#[derive(Debug, Clone, Default)]
pub struct FrameSet {
    frames: Vec<Frame>,
}

impl FrameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame-set, failing if it would exceed the per-set bound
    pub fn from_frames(frames: Vec<Frame>) -> Result<Self, FrameError> {
        if frames.len() > MAX_FRAMES_PER_SET {
            return Err(FrameError::FrameSetFull {
                capacity: MAX_FRAMES_PER_SET,
            });
        }
        Ok(Self { frames })
    }

    /// Append a frame, taking ownership of the reference
    pub fn push(&mut self, frame: Frame) -> Result<(), FrameError> {
        if self.frames.len() >= MAX_FRAMES_PER_SET {
            return Err(FrameError::FrameSetFull {
                capacity: MAX_FRAMES_PER_SET,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn for_each<F: FnMut(&Frame)>(&self, f: F) {
        self.frames.iter().for_each(f);
    }

    /// First frame of `kind` whose format satisfies `pred`
    pub fn find<P>(&self, kind: StreamKind, pred: P) -> Option<&Frame>
    where
        P: Fn(PixelFormat) -> bool,
    {
        self.frames.iter().find(|f| {
            let id = f.identity();
            id.kind == kind && pred(id.format)
        })
    }

    /// Release every frame reference held by this set
    pub fn release(self) {
        drop(self);
    }
}

impl IntoIterator for FrameSet {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{FrameData, HandleTracker, MotionSample, StreamIdentity};

    fn frame(tracker: &HandleTracker) -> Frame {
        let identity = StreamIdentity::new(StreamKind::Motion, PixelFormat::MotionXyz32f, 0, 200);
        Frame::new(
            identity,
            0,
            FrameData::Motion(MotionSample { vector: [0.0; 3] }),
            tracker,
        )
        .unwrap()
    }

    #[test]
    fn test_clone_shares_frames() {
        let tracker = HandleTracker::new();
        let set = FrameSet::from_frames(vec![frame(&tracker), frame(&tracker)]).unwrap();
        let copy = set.clone();
        assert_eq!(tracker.live(), 4);
        assert!(copy.iter().zip(set.iter()).all(|(a, b)| a.same_frame(b)));
        copy.release();
        set.release();
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn test_bounded() {
        let tracker = HandleTracker::new();
        let mut set = FrameSet::new();
        for _ in 0..MAX_FRAMES_PER_SET {
            set.push(frame(&tracker)).unwrap();
        }
        let overflow = set.push(frame(&tracker));
        assert_eq!(
            overflow,
            Err(FrameError::FrameSetFull {
                capacity: MAX_FRAMES_PER_SET
            })
        );
        drop(set);
        assert_eq!(tracker.live(), 0, "the rejected frame is released too");
    }

    #[test]
    fn test_find_by_kind_and_format() {
        let tracker = HandleTracker::new();
        let set = FrameSet::from_frames(vec![frame(&tracker)]).unwrap();
        assert!(set.find(StreamKind::Motion, |_| true).is_some());
        assert!(set.find(StreamKind::Depth, |_| true).is_none());
        assert!(set.find(StreamKind::Motion, |f| f == PixelFormat::Z16).is_none());
    }
}
