// SPDX-License-Identifier: GPL-3.0-only

//! Render cache, texture mapping, layout and drawing
//!
//! The cache keeps the newest frame of every stream so a partial frame-set
//! still renders all tiles. Each draw tick the viewport is tiled with
//! [`compute_layout`] and every entry is drawn into its tile by [`draw`].

pub mod cache;
pub mod canvas;
pub mod draw;
pub mod layout;
pub mod texture;

pub use cache::{MotionView, PointsView, RenderCache, RenderEntry, Renderable, VideoView};
pub use canvas::Canvas;
pub use draw::{DrawParams, draw};
pub use layout::{Rect, compute_layout};
pub use texture::{grayscale_texture, map_texture};
