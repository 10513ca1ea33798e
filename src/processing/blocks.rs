// SPDX-License-Identifier: GPL-3.0-only

//! CPU processing blocks
//!
//! Reference implementations of the four transforms the pipeline drives.
//! Each block keeps a map from source stream id to the derived profile it
//! publishes, so derived streams keep a stable unique id across ticks.

use std::collections::HashMap;

use tracing::debug;

use super::converters::{DepthVisualizationOptions, depth_to_rgb, packed_yuv_to_rgb};
use super::{BlockKind, ProcessingBlock, TextureTarget};
use crate::constants::{BASE_HEIGHT, BASE_WIDTH, CX, CY, DEPTH_UNITS_M, FX, FY};
use crate::frames::{
    Frame, FrameData, FrameSet, PixelFormat, PointCloud, StreamIdentity, StreamKind, TexCoord,
    Vertex, VideoFrame,
};

/// Pinhole intrinsics for a given resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl Intrinsics {
    /// Scale the base intrinsics to `width` x `height`
    pub fn for_resolution(width: u32, height: u32) -> Self {
        let sx = width as f32 / BASE_WIDTH;
        let sy = height as f32 / BASE_HEIGHT;
        Self {
            fx: FX * sx,
            fy: FY * sy,
            cx: CX * sx,
            cy: CY * sy,
        }
    }
}

/// Profile for the stream derived from `source`, created on first use
fn derived_profile(
    profiles: &mut HashMap<u32, StreamIdentity>,
    source: &StreamIdentity,
    kind: StreamKind,
    format: PixelFormat,
) -> StreamIdentity {
    *profiles.entry(source.unique_id).or_insert_with(|| {
        let derived = source.derive(kind, format);
        debug!(
            source = source.unique_id,
            derived = derived.unique_id,
            ?format,
            "Registered derived stream"
        );
        derived
    })
}

/// Build a new frame-set where `replace` may swap individual frames
///
/// Returns `None` if no frame was replaced.
fn map_frames<F>(input: &FrameSet, mut replace: F) -> Option<FrameSet>
where
    F: FnMut(&Frame) -> Option<Frame>,
{
    let mut replaced = false;
    let mut output = FrameSet::new();
    for frame in input.iter() {
        let next = match replace(frame) {
            Some(new_frame) => {
                replaced = true;
                new_frame
            }
            None => frame.clone(),
        };
        output.push(next).ok()?;
    }
    replaced.then_some(output)
}

/// Z16 depth → RGB visualization
pub struct DepthColorizer {
    options: DepthVisualizationOptions,
    profiles: HashMap<u32, StreamIdentity>,
}

impl DepthColorizer {
    pub fn new(options: DepthVisualizationOptions) -> Self {
        Self {
            options,
            profiles: HashMap::new(),
        }
    }

    /// Colorize a single depth frame
    pub fn colorize(&mut self, frame: &Frame) -> Option<Frame> {
        let id = frame.identity();
        if id.kind != StreamKind::Depth || id.format != PixelFormat::Z16 {
            return None;
        }
        let video = frame.as_video()?;
        let rgb = depth_to_rgb(&video.depth_u16(), &self.options);
        let out = VideoFrame::new(video.width, video.height, PixelFormat::Rgb8, rgb).ok()?;
        let profile = derived_profile(&mut self.profiles, id, StreamKind::Depth, PixelFormat::Rgb8);
        Frame::new(profile, frame.number(), FrameData::Video(out), frame.tracker()).ok()
    }
}

impl ProcessingBlock for DepthColorizer {
    fn derived_streams(&self) -> usize {
        self.profiles.len()
    }

    fn reset(&mut self) {
        self.profiles.clear();
    }

    fn kind(&self) -> BlockKind {
        BlockKind::ColorizeDepth
    }

    fn process(&mut self, input: &FrameSet) -> Option<FrameSet> {
        map_frames(input, |frame| self.colorize(frame))
    }
}

/// Packed YUV color → RGB
pub struct PackedColorDecoder {
    profiles: HashMap<u32, StreamIdentity>,
}

impl PackedColorDecoder {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    fn decode(&mut self, frame: &Frame) -> Option<Frame> {
        let id = frame.identity();
        if id.kind != StreamKind::Color || !id.format.is_packed_yuv() {
            return None;
        }
        let video = frame.as_video()?;
        let rgb = packed_yuv_to_rgb(video, id.format);
        let out = VideoFrame::new(video.width, video.height, PixelFormat::Rgb8, rgb).ok()?;
        let profile = derived_profile(&mut self.profiles, id, StreamKind::Color, PixelFormat::Rgb8);
        Frame::new(profile, frame.number(), FrameData::Video(out), frame.tracker()).ok()
    }
}

impl Default for PackedColorDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingBlock for PackedColorDecoder {
    fn derived_streams(&self) -> usize {
        self.profiles.len()
    }

    fn reset(&mut self) {
        self.profiles.clear();
    }

    fn kind(&self) -> BlockKind {
        BlockKind::DecodePackedColor
    }

    fn process(&mut self, input: &FrameSet) -> Option<FrameSet> {
        map_frames(input, |frame| self.decode(frame))
    }
}

/// Z16 depth → textured point cloud
///
/// Emits one vertex per depth pixel; pixels without depth become the origin
/// with texture coordinate (0, 0). The output frame-set is the input plus
/// the points frame.
pub struct PointCloudGenerator {
    target: TextureTarget,
    profiles: HashMap<u32, StreamIdentity>,
}

impl PointCloudGenerator {
    pub fn new(target: TextureTarget) -> Self {
        Self {
            target,
            profiles: HashMap::new(),
        }
    }

    pub fn set_target(&mut self, target: TextureTarget) {
        self.target = target;
    }

    pub fn target(&self) -> TextureTarget {
        self.target
    }

    /// Unproject `depth`, computing texture coordinates against a texture of
    /// `texture_size` seen through `texture_intrinsics` (same viewpoint)
    pub fn compute(
        depth: &VideoFrame,
        texture_size: (u32, u32),
        texture_intrinsics: Intrinsics,
    ) -> PointCloud {
        let depth_intrinsics = Intrinsics::for_resolution(depth.width, depth.height);
        let (tw, th) = (texture_size.0.max(1) as f32, texture_size.1.max(1) as f32);
        let samples = depth.depth_u16();

        let mut vertices = Vec::with_capacity(samples.len());
        let mut tex_coords = Vec::with_capacity(samples.len());

        for (i, &raw) in samples.iter().enumerate() {
            if raw == 0 {
                vertices.push(Vertex::default());
                tex_coords.push(TexCoord::default());
                continue;
            }
            let px = (i as u32 % depth.width) as f32;
            let py = (i as u32 / depth.width) as f32;
            let z = raw as f32 * DEPTH_UNITS_M;
            let x = (px - depth_intrinsics.cx) * z / depth_intrinsics.fx;
            let y = (py - depth_intrinsics.cy) * z / depth_intrinsics.fy;
            vertices.push(Vertex { x, y, z });

            let tx = x / z * texture_intrinsics.fx + texture_intrinsics.cx;
            let ty = y / z * texture_intrinsics.fy + texture_intrinsics.cy;
            tex_coords.push(TexCoord {
                u: tx / tw,
                v: ty / th,
            });
        }

        PointCloud {
            vertices,
            tex_coords,
        }
    }
}

impl ProcessingBlock for PointCloudGenerator {
    fn derived_streams(&self) -> usize {
        self.profiles.len()
    }

    fn reset(&mut self) {
        self.profiles.clear();
    }

    fn kind(&self) -> BlockKind {
        BlockKind::PointCloud(self.target)
    }

    fn process(&mut self, input: &FrameSet) -> Option<FrameSet> {
        let depth_frame = input.find(StreamKind::Depth, |f| f == PixelFormat::Z16)?;
        let depth = depth_frame.as_video()?;

        let color = match self.target {
            TextureTarget::Color => input
                .find(StreamKind::Color, |f| f.is_rgb())
                .and_then(|f| f.as_video()),
            TextureTarget::Depth => None,
        };
        let texture_size = match color {
            Some(c) => (c.width, c.height),
            None => (depth.width, depth.height),
        };
        let cloud = Self::compute(
            depth,
            texture_size,
            Intrinsics::for_resolution(texture_size.0, texture_size.1),
        );

        let profile = derived_profile(
            &mut self.profiles,
            depth_frame.identity(),
            StreamKind::Derived,
            PixelFormat::Xyz32f,
        );
        let points = Frame::new(
            profile,
            depth_frame.number(),
            FrameData::Points(cloud),
            depth_frame.tracker(),
        )
        .ok()?;

        let mut output = input.clone();
        output.push(points).ok()?;
        Some(output)
    }
}

/// Resample depth onto another stream's pixel grid
///
/// Assumes both sensors share a viewpoint, so alignment reduces to a
/// nearest-neighbour resize to the target resolution.
pub struct Aligner {
    target: StreamKind,
    profiles: HashMap<u32, StreamIdentity>,
}

impl Aligner {
    pub fn new(target: StreamKind) -> Self {
        Self {
            target,
            profiles: HashMap::new(),
        }
    }

    pub fn set_target(&mut self, target: StreamKind) {
        self.target = target;
    }

    fn resample(depth: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
        let samples = depth.depth_u16();
        let mut out = Vec::with_capacity((width * height * 2) as usize);
        for y in 0..height {
            let sy = (y as u64 * depth.height as u64 / height as u64) as u32;
            for x in 0..width {
                let sx = (x as u64 * depth.width as u64 / width as u64) as u32;
                let d = samples[(sy * depth.width + sx) as usize];
                out.extend_from_slice(&d.to_le_bytes());
            }
        }
        out
    }
}

impl ProcessingBlock for Aligner {
    fn derived_streams(&self) -> usize {
        self.profiles.len()
    }

    fn reset(&mut self) {
        self.profiles.clear();
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Align(self.target)
    }

    fn process(&mut self, input: &FrameSet) -> Option<FrameSet> {
        let target = input
            .iter()
            .find(|f| f.identity().kind == self.target && f.as_video().is_some())?;
        let (width, height) = target.as_video().map(|v| (v.width, v.height))?;
        if width == 0 || height == 0 {
            return None;
        }

        map_frames(input, |frame| {
            let id = frame.identity();
            if id.kind != StreamKind::Depth || id.format != PixelFormat::Z16 {
                return None;
            }
            let depth = frame.as_video()?;
            let data = Self::resample(depth, width, height);
            let out = VideoFrame::new(width, height, PixelFormat::Z16, data).ok()?;
            let profile = derived_profile(&mut self.profiles, id, StreamKind::Depth, PixelFormat::Z16);
            Frame::new(profile, frame.number(), FrameData::Video(out), frame.tracker()).ok()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::HandleTracker;

    fn video(
        tracker: &HandleTracker,
        kind: StreamKind,
        format: PixelFormat,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Frame {
        let identity = StreamIdentity::new(kind, format, 0, 30);
        let frame = VideoFrame::new(width, height, format, data).unwrap();
        Frame::new(identity, 1, FrameData::Video(frame), tracker).unwrap()
    }

    fn depth_bytes(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|d| d.to_le_bytes()).collect()
    }

    #[test]
    fn test_colorizer_replaces_depth_with_stable_profile() {
        let tracker = HandleTracker::new();
        let depth = video(
            &tracker,
            StreamKind::Depth,
            PixelFormat::Z16,
            2,
            1,
            depth_bytes(&[0, 1000]),
        );
        let depth_uid = depth.unique_id();
        let set = FrameSet::from_frames(vec![depth]).unwrap();

        let mut colorizer = DepthColorizer::new(DepthVisualizationOptions::default());
        let first = colorizer.process(&set).unwrap();
        let second = colorizer.process(&set).unwrap();

        let a = first.iter().next().unwrap();
        let b = second.iter().next().unwrap();
        assert_eq!(a.identity().format, PixelFormat::Rgb8);
        assert_eq!(a.identity().source, Some(depth_uid));
        assert_eq!(a.unique_id(), b.unique_id());
        // Zero depth renders black
        assert_eq!(&a.as_video().unwrap().data[0..3], &[0, 0, 0]);
    }

    #[test]
    fn test_colorizer_without_depth_yields_nothing() {
        let tracker = HandleTracker::new();
        let color = video(
            &tracker,
            StreamKind::Color,
            PixelFormat::Rgb8,
            1,
            1,
            vec![1, 2, 3],
        );
        let set = FrameSet::from_frames(vec![color]).unwrap();
        let mut colorizer = DepthColorizer::new(DepthVisualizationOptions::default());
        assert!(colorizer.process(&set).is_none());
    }

    #[test]
    fn test_decoder_outputs_rgb_color() {
        let tracker = HandleTracker::new();
        let yuyv = video(
            &tracker,
            StreamKind::Color,
            PixelFormat::Yuyv,
            2,
            1,
            vec![255, 128, 255, 128],
        );
        let set = FrameSet::from_frames(vec![yuyv]).unwrap();
        let mut decoder = PackedColorDecoder::new();
        let out = decoder.process(&set).unwrap();
        let frame = out.iter().next().unwrap();
        assert_eq!(frame.identity().kind, StreamKind::Color);
        assert_eq!(frame.identity().format, PixelFormat::Rgb8);
        assert_eq!(frame.as_video().unwrap().data.len(), 6);
    }

    #[test]
    fn test_point_cloud_appends_points_frame() {
        let tracker = HandleTracker::new();
        let depth = video(
            &tracker,
            StreamKind::Depth,
            PixelFormat::Z16,
            4,
            4,
            depth_bytes(&[1000; 16]),
        );
        let set = FrameSet::from_frames(vec![depth]).unwrap();
        let mut generator = PointCloudGenerator::new(TextureTarget::Depth);
        let out = generator.process(&set).unwrap();
        assert_eq!(out.len(), 2);

        let points = out
            .find(StreamKind::Derived, |f| f == PixelFormat::Xyz32f)
            .and_then(|f| f.as_points())
            .unwrap();
        assert_eq!(points.len(), 16);
        assert!(points.vertices.iter().all(|v| (v.z - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_point_cloud_depth_texcoords_hit_source_pixel() {
        let depth = VideoFrame::new(8, 6, PixelFormat::Z16, depth_bytes(&[500; 48])).unwrap();
        let cloud = PointCloudGenerator::compute(&depth, (8, 6), Intrinsics::for_resolution(8, 6));
        // Pixel (3, 2) is vertex 2*8 + 3
        let tc = cloud.tex_coords[19];
        assert_eq!((tc.u * 8.0).round() as i32, 3);
        assert_eq!((tc.v * 6.0).round() as i32, 2);
    }

    #[test]
    fn test_zero_depth_vertex_is_origin() {
        let depth = VideoFrame::new(2, 1, PixelFormat::Z16, depth_bytes(&[0, 800])).unwrap();
        let cloud = PointCloudGenerator::compute(&depth, (2, 1), Intrinsics::for_resolution(2, 1));
        assert_eq!(cloud.vertices[0], Vertex::default());
        assert!(cloud.vertices[1].z > 0.0);
    }

    #[test]
    fn test_aligner_resizes_depth_to_color() {
        let tracker = HandleTracker::new();
        let depth = video(
            &tracker,
            StreamKind::Depth,
            PixelFormat::Z16,
            2,
            1,
            depth_bytes(&[100, 200]),
        );
        let color = video(
            &tracker,
            StreamKind::Color,
            PixelFormat::Rgb8,
            4,
            2,
            vec![0; 24],
        );
        let set = FrameSet::from_frames(vec![depth, color]).unwrap();
        let mut aligner = Aligner::new(StreamKind::Color);
        let out = aligner.process(&set).unwrap();
        let aligned = out
            .find(StreamKind::Depth, |f| f == PixelFormat::Z16)
            .and_then(|f| f.as_video())
            .unwrap();
        assert_eq!((aligned.width, aligned.height), (4, 2));
        assert_eq!(aligned.depth_u16(), vec![100, 100, 200, 200, 100, 100, 200, 200]);
    }
}
