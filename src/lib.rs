// SPDX-License-Identifier: GPL-3.0-only

//! Multi-stream frame compositing and rendering
//!
//! Synchronized frame-sets from a depth/color/motion sensor are run through a
//! per-tick selection of processing blocks, cached per stream, and drawn into
//! a tiled viewport. Point clouds are colored by back-projecting each vertex
//! into a texture-source image.
//!
//! # Architecture
//!
//! - [`frames`]: counted frame handles, frame-sets and stream identities
//! - [`processing`]: processing blocks, pipeline selection and the filter chain
//! - [`render`]: render cache, texture mapping, layout and drawing
//! - [`compositor`]: the thread-safe entry points tying it together
//! - [`streaming`]: synthetic sensor and capture thread
//! - [`config`]: user configuration handling
//! - [`storage`]: snapshot files

pub mod compositor;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frames;
pub mod processing;
pub mod render;
pub mod storage;
pub mod streaming;
pub mod terminal;

pub use compositor::{Compositor, DrawStats};
pub use config::Config;
pub use errors::{AppError, AppResult, FrameError};
pub use frames::{Frame, FrameSet, StreamIdentity};
