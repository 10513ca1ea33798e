// SPDX-License-Identifier: GPL-3.0-only

//! Frame handles, frame-sets and stream identities
//!
//! Frames are produced by the capture side and flow through the processing
//! chain into the render cache. A [`Frame`] is a counted owning reference:
//! cloning takes a new reference, dropping (or [`Frame::release`]) gives it
//! back. [`HandleTracker`] keeps the number of live references so callers can
//! verify that a tick left nothing behind.

mod frameset;
mod handle;
mod types;

pub use frameset::FrameSet;
pub use handle::{Frame, FrameData, HandleTracker};
pub use types::{
    MotionSample, PixelFormat, PointCloud, RenderKind, StreamIdentity, StreamKind, TexCoord,
    Vertex, VideoFrame, next_stream_uid,
};
