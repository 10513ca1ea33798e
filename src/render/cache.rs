// SPDX-License-Identifier: GPL-3.0-only

//! Per-stream render cache
//!
//! Holds the most recent frame of every renderable stream, keyed by stream
//! unique id and kept in first-seen order. Point-cloud entries additionally
//! hold the texture-source frame for a single mapping pass and the per-vertex
//! colors that pass produced.

use tracing::{debug, trace};

use super::texture::{grayscale_texture, map_texture};
use crate::frames::{
    Frame, FrameSet, MotionSample, PixelFormat, PointCloud, RenderKind, StreamIdentity,
    StreamKind, VideoFrame,
};
use crate::processing::DepthColorizer;
use crate::processing::converters::DepthVisualizationOptions;

/// Cached 2-D image stream
#[derive(Debug)]
pub struct VideoView {
    frame: Frame,
}

impl VideoView {
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn image(&self) -> Option<&VideoFrame> {
        self.frame.as_video()
    }
}

/// Cached motion stream
#[derive(Debug)]
pub struct MotionView {
    frame: Frame,
}

impl MotionView {
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn sample(&self) -> Option<&MotionSample> {
        self.frame.as_motion()
    }
}

/// Cached point cloud with its texture state
#[derive(Debug)]
pub struct PointsView {
    frame: Frame,
    /// Texture source waiting for the next mapping pass
    texture: Option<Frame>,
    /// RGBA per vertex, produced by the last mapping pass
    colors: Vec<u8>,
    needs_mapping: bool,
}

impl PointsView {
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn cloud(&self) -> Option<&PointCloud> {
        self.frame.as_points()
    }

    pub fn colors(&self) -> &[u8] {
        &self.colors
    }

    pub fn has_pending_texture(&self) -> bool {
        self.texture.is_some()
    }

    fn map(&mut self, grayscale_max_range: f32) -> bool {
        let texture = self.texture.take();
        if texture.is_none() && !self.needs_mapping {
            return false;
        }
        self.needs_mapping = false;

        let Some(cloud) = self.frame.as_points() else {
            self.colors.clear();
            return true;
        };

        self.colors = match texture.as_ref().and_then(|t| t.as_video().map(|v| (t, v))) {
            Some((source, image)) => {
                let mut colors = map_texture(cloud, image);
                if source.identity().format == PixelFormat::Bgr8 {
                    colors.chunks_exact_mut(4).for_each(|texel| texel.swap(0, 2));
                }
                colors
            }
            None => grayscale_texture(cloud, grayscale_max_range),
        };
        true
    }
}

/// Drawable state of one stream; the variant is fixed when the entry is created
#[derive(Debug)]
pub enum Renderable {
    Video(VideoView),
    Motion(MotionView),
    Points(PointsView),
}

impl Renderable {
    fn for_frame(kind: RenderKind, frame: Frame) -> Self {
        match kind {
            RenderKind::Video => Renderable::Video(VideoView { frame }),
            RenderKind::Motion => Renderable::Motion(MotionView { frame }),
            RenderKind::Points => Renderable::Points(PointsView {
                frame,
                texture: None,
                colors: Vec::new(),
                needs_mapping: true,
            }),
        }
    }

    pub fn kind(&self) -> RenderKind {
        match self {
            Renderable::Video(_) => RenderKind::Video,
            Renderable::Motion(_) => RenderKind::Motion,
            Renderable::Points(_) => RenderKind::Points,
        }
    }

    pub fn frame(&self) -> &Frame {
        match self {
            Renderable::Video(v) => &v.frame,
            Renderable::Motion(m) => &m.frame,
            Renderable::Points(p) => &p.frame,
        }
    }

    /// Swap in a newer frame of the same stream, releasing the old one
    fn replace(&mut self, frame: Frame) {
        match self {
            Renderable::Video(v) => v.frame = frame,
            Renderable::Motion(m) => m.frame = frame,
            Renderable::Points(p) => {
                p.frame = frame;
                // A texture left over from an earlier tick no longer matches
                p.texture = None;
                p.needs_mapping = true;
            }
        }
    }
}

/// One registry slot
#[derive(Debug)]
pub struct RenderEntry {
    identity: StreamIdentity,
    view: Renderable,
}

impl RenderEntry {
    pub fn identity(&self) -> &StreamIdentity {
        &self.identity
    }

    pub fn view(&self) -> &Renderable {
        &self.view
    }
}

/// Registry of the latest frame per stream
pub struct RenderCache {
    entries: Vec<RenderEntry>,
    depth_options: DepthVisualizationOptions,
    /// Created on demand to colorize depth as a last-resort texture
    colorizer: Option<DepthColorizer>,
}

impl RenderCache {
    pub fn new(depth_options: DepthVisualizationOptions) -> Self {
        Self {
            entries: Vec::new(),
            depth_options,
            colorizer: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order
    pub fn entries(&self) -> &[RenderEntry] {
        &self.entries
    }

    pub fn frame_for(&self, uid: u32) -> Option<&Frame> {
        self.entry(uid).map(|e| e.view.frame())
    }

    fn entry(&self, uid: u32) -> Option<&RenderEntry> {
        self.entries.iter().find(|e| e.identity.unique_id == uid)
    }

    fn entry_mut(&mut self, uid: u32) -> Option<&mut RenderEntry> {
        self.entries.iter_mut().find(|e| e.identity.unique_id == uid)
    }

    /// Cache every renderable frame of `set`
    ///
    /// Streams missing from `set` keep their previous frame. Streams without
    /// a render capability are skipped.
    pub fn update(&mut self, set: &FrameSet) {
        for frame in set.iter() {
            let identity = *frame.identity();
            let Some(kind) = identity.capability else {
                trace!(stream = %identity, "Skipping stream without render capability");
                continue;
            };
            if frame.data().render_kind() != kind {
                continue;
            }

            match self.entry_mut(identity.unique_id) {
                Some(entry) => entry.view.replace(frame.clone()),
                None => {
                    debug!(stream = %identity, ?kind, "New render entry");
                    self.entries.push(RenderEntry {
                        identity,
                        view: Renderable::for_frame(kind, frame.clone()),
                    });
                }
            }
        }
    }

    /// Hand the best available texture source to the point-cloud entry
    ///
    /// Preference: native RGB color, then decoded color, then colorized
    /// depth. Nothing happens unless point-cloud mode is on and `set`
    /// carries a point cloud already cached by [`update`](Self::update).
    pub fn attach_point_cloud_texture(&mut self, set: &FrameSet, point_cloud_on: bool) {
        if !point_cloud_on {
            return;
        }
        let Some(points_uid) = set
            .find(StreamKind::Derived, |f| f == PixelFormat::Xyz32f)
            .map(Frame::unique_id)
        else {
            return;
        };
        if self.entry(points_uid).is_none() {
            return;
        }

        let texture = self.choose_texture(set);
        if let Some(entry) = self.entry_mut(points_uid)
            && let Renderable::Points(view) = &mut entry.view
        {
            trace!(
                points = points_uid,
                texture = ?texture.as_ref().map(|t| t.identity().format),
                "Attached point-cloud texture"
            );
            view.texture = texture;
        }
    }

    fn choose_texture(&mut self, set: &FrameSet) -> Option<Frame> {
        let color = |derived: bool| {
            set.iter().find(|f| {
                let id = f.identity();
                id.kind == StreamKind::Color && id.format.is_rgb() && id.is_derived() == derived
            })
        };
        if let Some(frame) = color(false).or_else(|| color(true)) {
            return Some(frame.clone());
        }
        if let Some(frame) = set.find(StreamKind::Depth, |f| f.is_rgb()) {
            return Some(frame.clone());
        }

        let depth = set.find(StreamKind::Depth, |f| f == PixelFormat::Z16)?;
        let options = self.depth_options;
        self.colorizer
            .get_or_insert_with(|| DepthColorizer::new(options))
            .colorize(depth)
    }

    /// Run one texture mapping pass over every point-cloud entry
    ///
    /// Attached textures are consumed and released. Entries whose cloud
    /// changed without a texture get the grayscale fallback. Returns the
    /// number of entries remapped.
    pub fn map_point_cloud_textures(&mut self, grayscale_max_range: f32) -> usize {
        let mut mapped = 0;
        for entry in &mut self.entries {
            if let Renderable::Points(view) = &mut entry.view
                && view.map(grayscale_max_range)
            {
                mapped += 1;
            }
        }
        mapped
    }

    /// Release every cached frame and texture and drop helper state
    ///
    /// Safe to call repeatedly or before anything was cached.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!(entries = self.entries.len(), "Clearing render cache");
        }
        self.entries.clear();
        self.colorizer = None;
    }
}
