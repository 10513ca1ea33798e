// SPDX-License-Identifier: GPL-3.0-only

//! Counted frame handles
//!
//! A [`Frame`] behaves like a native frame reference: every clone is a new
//! owning reference and every drop gives one back. The shared payload is only
//! freed when the last reference goes away. All references report to a
//! [`HandleTracker`], so a test (or a debug log line) can check the number of
//! references still alive after a tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::{MotionSample, PointCloud, RenderKind, StreamIdentity, VideoFrame};
use crate::errors::FrameError;

/// Counts live frame references
#[derive(Debug, Clone, Default)]
pub struct HandleTracker {
    live: Arc<AtomicUsize>,
    acquired: Arc<AtomicUsize>,
}

impl HandleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// References currently held
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// References ever taken
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    fn acquire(&self) {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Frame payload, one variant per renderable capability
#[derive(Debug, Clone)]
pub enum FrameData {
    Video(VideoFrame),
    Motion(MotionSample),
    Points(PointCloud),
}

impl FrameData {
    pub fn render_kind(&self) -> RenderKind {
        match self {
            FrameData::Video(_) => RenderKind::Video,
            FrameData::Motion(_) => RenderKind::Motion,
            FrameData::Points(_) => RenderKind::Points,
        }
    }
}

struct FrameInner {
    identity: StreamIdentity,
    number: u64,
    data: FrameData,
    tracker: HandleTracker,
}

/// Owning reference to a captured or derived frame
pub struct Frame {
    inner: Arc<FrameInner>,
}

impl Frame {
    /// Create a frame, taking the first reference on `tracker`
    ///
    /// Fails when the payload does not match the capability recorded on the
    /// stream identity. Streams without a capability accept any payload.
    pub fn new(
        identity: StreamIdentity,
        number: u64,
        data: FrameData,
        tracker: &HandleTracker,
    ) -> Result<Self, FrameError> {
        let found = data.render_kind();
        if let Some(expected) = identity.capability
            && expected != found
        {
            return Err(FrameError::PayloadMismatch {
                uid: identity.unique_id,
                format: identity.format,
                expected: Some(expected),
                found,
            });
        }

        tracker.acquire();
        Ok(Self {
            inner: Arc::new(FrameInner {
                identity,
                number,
                data,
                tracker: tracker.clone(),
            }),
        })
    }

    pub fn identity(&self) -> &StreamIdentity {
        &self.inner.identity
    }

    pub fn unique_id(&self) -> u32 {
        self.inner.identity.unique_id
    }

    /// Frame counter assigned by the producer
    pub fn number(&self) -> u64 {
        self.inner.number
    }

    pub fn data(&self) -> &FrameData {
        &self.inner.data
    }

    pub fn as_video(&self) -> Option<&VideoFrame> {
        match &self.inner.data {
            FrameData::Video(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_motion(&self) -> Option<&MotionSample> {
        match &self.inner.data {
            FrameData::Motion(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_points(&self) -> Option<&PointCloud> {
        match &self.inner.data {
            FrameData::Points(p) => Some(p),
            _ => None,
        }
    }

    /// Tracker this frame reports to
    pub fn tracker(&self) -> &HandleTracker {
        &self.inner.tracker
    }

    /// True when both handles reference the same underlying frame
    pub fn same_frame(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Give this reference back
    pub fn release(self) {
        drop(self);
    }
}

impl Clone for Frame {
    fn clone(&self) -> Self {
        self.inner.tracker.acquire();
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        self.inner.tracker.release();
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("stream", &self.inner.identity.unique_id)
            .field("format", &self.inner.identity.format)
            .field("number", &self.inner.number)
            .finish()
    }
}
