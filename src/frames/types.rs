// SPDX-License-Identifier: GPL-3.0-only

//! Stream identities and frame payload types

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::errors::FrameError;

/// Process-wide stream id counter, starts at 1 so 0 never names a stream
static NEXT_STREAM_UID: AtomicU32 = AtomicU32::new(1);

/// Allocate a unique id for a new stream profile
pub fn next_stream_uid() -> u32 {
    NEXT_STREAM_UID.fetch_add(1, Ordering::Relaxed)
}

/// Logical stream category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    Color,
    Depth,
    Infrared,
    Motion,
    /// Produced by a processing block (e.g. point cloud)
    Derived,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StreamKind::Color => "Color",
            StreamKind::Depth => "Depth",
            StreamKind::Infrared => "Infrared",
            StreamKind::Motion => "Motion",
            StreamKind::Derived => "Derived",
        };
        write!(f, "{}", name)
    }
}

/// Sample layout of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    Rgb8,
    Bgr8,
    Rgba8,
    /// Packed 4:2:2, Y0 U Y1 V
    Yuyv,
    /// Packed 4:2:2, U Y0 V Y1
    Uyvy,
    /// 8-bit luminance (infrared)
    Y8,
    /// 16-bit depth in device units
    Z16,
    /// Three f32 components (accelerometer / gyro)
    MotionXyz32f,
    /// Point-cloud vertices
    Xyz32f,
}

impl PixelFormat {
    /// Bytes per pixel for image formats, 0 for non-image formats
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Yuyv | PixelFormat::Uyvy | PixelFormat::Z16 => 2,
            PixelFormat::Y8 => 1,
            PixelFormat::MotionXyz32f | PixelFormat::Xyz32f => 0,
        }
    }

    pub fn is_packed_yuv(&self) -> bool {
        matches!(self, PixelFormat::Yuyv | PixelFormat::Uyvy)
    }

    /// True for formats usable directly as an RGB texture
    pub fn is_rgb(&self) -> bool {
        matches!(self, PixelFormat::Rgb8 | PixelFormat::Bgr8 | PixelFormat::Rgba8)
    }

    /// Renderable capability implied by this format
    pub fn capability(&self) -> Option<RenderKind> {
        match self {
            PixelFormat::Rgb8
            | PixelFormat::Bgr8
            | PixelFormat::Rgba8
            | PixelFormat::Yuyv
            | PixelFormat::Uyvy
            | PixelFormat::Y8
            | PixelFormat::Z16 => Some(RenderKind::Video),
            PixelFormat::MotionXyz32f => Some(RenderKind::Motion),
            PixelFormat::Xyz32f => Some(RenderKind::Points),
        }
    }
}

/// How a stream is drawn, fixed when the stream identity is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderKind {
    Video,
    Motion,
    Points,
}

/// Immutable identity of a stream profile
///
/// Two frames belong to the same logical stream iff their `unique_id` matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamIdentity {
    pub kind: StreamKind,
    pub format: PixelFormat,
    /// Index among streams of the same kind
    pub index: u32,
    pub unique_id: u32,
    pub fps: u32,
    /// Stream this profile was derived from, if produced by a processing block
    pub source: Option<u32>,
    /// `None` means the stream can't be rendered and is never cached
    pub capability: Option<RenderKind>,
}

impl StreamIdentity {
    /// Create an identity with a freshly allocated unique id
    pub fn new(kind: StreamKind, format: PixelFormat, index: u32, fps: u32) -> Self {
        Self::with_uid(kind, format, index, next_stream_uid(), fps)
    }

    /// Create an identity with an explicit unique id
    pub fn with_uid(kind: StreamKind, format: PixelFormat, index: u32, uid: u32, fps: u32) -> Self {
        Self {
            kind,
            format,
            index,
            unique_id: uid,
            fps,
            source: None,
            capability: format.capability(),
        }
    }

    /// Clone this profile into a new stream of a different kind/format
    pub fn derive(&self, kind: StreamKind, format: PixelFormat) -> Self {
        Self {
            source: Some(self.unique_id),
            ..Self::new(kind, format, self.index, self.fps)
        }
    }

    /// Override the capability tag (e.g. a vendor stream nothing can draw)
    pub fn with_capability(mut self, capability: Option<RenderKind>) -> Self {
        self.capability = capability;
        self
    }

    pub fn is_derived(&self) -> bool {
        self.source.is_some()
    }
}

impl std::fmt::Display for StreamIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} #{} {:?} @{}fps (uid {})",
            self.kind, self.index, self.format, self.fps, self.unique_id
        )
    }
}

/// 2-D image samples
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Row stride in bytes
    pub stride: u32,
    pub bytes_per_pixel: u32,
    pub data: Arc<[u8]>,
}

impl VideoFrame {
    /// Wrap tightly packed samples, checking the buffer covers the image
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self, FrameError> {
        let bytes_per_pixel = format.bytes_per_pixel();
        let stride = width * bytes_per_pixel;
        let needed = (stride * height) as usize;
        if bytes_per_pixel == 0 || data.len() < needed {
            return Err(FrameError::InvalidGeometry(format!(
                "{:?} {}x{} needs {} bytes, got {}",
                format,
                width,
                height,
                needed,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            bytes_per_pixel,
            data: data.into(),
        })
    }

    /// Read a Z16 image as u16 samples (little-endian)
    pub fn depth_u16(&self) -> Vec<u16> {
        let mut out = Vec::with_capacity((self.width * self.height) as usize);
        for y in 0..self.height as usize {
            let row = y * self.stride as usize;
            for x in 0..self.width as usize {
                let i = row + x * 2;
                out.push(u16::from_le_bytes([self.data[i], self.data[i + 1]]));
            }
        }
        out
    }

    /// Byte offset of pixel (x, y)
    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        (y * self.stride + x * self.bytes_per_pixel) as usize
    }
}

/// Motion sample (accelerometer in m/s² or gyro in rad/s)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub vector: [f32; 3],
}

impl MotionSample {
    pub fn magnitude(&self) -> f32 {
        let [x, y, z] = self.vector;
        (x * x + y * y + z * z).sqrt()
    }
}

/// 3-D vertex in meters, camera space (z forward)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Normalized texture coordinate into the texture-source image
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TexCoord {
    pub u: f32,
    pub v: f32,
}

/// Vertices plus one texture coordinate per vertex
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    pub vertices: Vec<Vertex>,
    pub tex_coords: Vec<TexCoord>,
}

impl PointCloud {
    pub fn new(vertices: Vec<Vertex>, tex_coords: Vec<TexCoord>) -> Result<Self, FrameError> {
        if vertices.len() != tex_coords.len() {
            return Err(FrameError::InvalidGeometry(format!(
                "{} vertices but {} texture coordinates",
                vertices.len(),
                tex_coords.len()
            )));
        }
        Ok(Self {
            vertices,
            tex_coords,
        })
    }

    /// Build from flat float arrays (xyz triples and uv pairs)
    pub fn from_floats(vertices: &[f32], tex_coords: &[f32]) -> Result<Self, FrameError> {
        if vertices.len() % 3 != 0 || tex_coords.len() % 2 != 0 {
            return Err(FrameError::InvalidGeometry(
                "vertex/texcoord arrays are not whole tuples".to_string(),
            ));
        }
        let vertices: Vec<Vertex> = bytemuck::cast_slice(vertices).to_vec();
        let tex_coords: Vec<TexCoord> = bytemuck::cast_slice(tex_coords).to_vec();
        Self::new(vertices, tex_coords)
    }

    pub fn vertex_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn tex_coord_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.tex_coords)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_from_format() {
        assert_eq!(PixelFormat::Z16.capability(), Some(RenderKind::Video));
        assert_eq!(PixelFormat::MotionXyz32f.capability(), Some(RenderKind::Motion));
        assert_eq!(PixelFormat::Xyz32f.capability(), Some(RenderKind::Points));
    }

    #[test]
    fn test_unique_ids_are_distinct() {
        let a = StreamIdentity::new(StreamKind::Color, PixelFormat::Rgb8, 0, 30);
        let b = StreamIdentity::new(StreamKind::Color, PixelFormat::Rgb8, 0, 30);
        assert_ne!(a.unique_id, b.unique_id);
        assert_eq!(a.capability, Some(RenderKind::Video));
    }

    #[test]
    fn test_derive_records_source() {
        let depth = StreamIdentity::new(StreamKind::Depth, PixelFormat::Z16, 0, 30);
        let colorized = depth.derive(StreamKind::Depth, PixelFormat::Rgb8);
        assert_eq!(colorized.source, Some(depth.unique_id));
        assert_ne!(colorized.unique_id, depth.unique_id);
        assert!(colorized.is_derived());
    }

    #[test]
    fn test_video_frame_rejects_short_buffer() {
        assert!(VideoFrame::new(4, 4, PixelFormat::Rgb8, vec![0; 47]).is_err());
        assert!(VideoFrame::new(4, 4, PixelFormat::Rgb8, vec![0; 48]).is_ok());
    }

    #[test]
    fn test_depth_u16_little_endian() {
        let frame = VideoFrame::new(2, 1, PixelFormat::Z16, vec![0x34, 0x12, 0xFF, 0x00]).unwrap();
        assert_eq!(frame.depth_u16(), vec![0x1234, 0x00FF]);
    }

    #[test]
    fn test_point_cloud_from_floats() {
        let cloud = PointCloud::from_floats(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], &[0.1, 0.2, 0.3, 0.4])
            .unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.vertices[1], Vertex { x: 3.0, y: 4.0, z: 5.0 });
        assert_eq!(cloud.tex_coord_floats(), &[0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_point_cloud_length_mismatch() {
        assert!(PointCloud::from_floats(&[0.0, 1.0, 2.0], &[]).is_err());
    }

    #[test]
    fn test_motion_magnitude() {
        let sample = MotionSample {
            vector: [3.0, 4.0, 0.0],
        };
        assert!((sample.magnitude() - 5.0).abs() < 1e-6);
    }
}
