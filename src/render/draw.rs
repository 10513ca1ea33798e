// SPDX-License-Identifier: GPL-3.0-only

//! Per-kind drawing into a canvas tile

use super::cache::{MotionView, PointsView, Renderable, VideoView};
use super::canvas::Canvas;
use super::layout::Rect;
use super::texture::TEXEL_BYTES;
use crate::config::Config;
use crate::processing::converters::sample_rgb;

const TILE_BACKGROUND: [u8; 4] = [0, 0, 0, 255];
const GIZMO_AXES: [([f32; 3], [u8; 4]); 3] = [
    ([1.0, 0.0, 0.0], [200, 60, 60, 255]),
    ([0.0, 1.0, 0.0], [60, 200, 60, 255]),
    ([0.0, 0.0, 1.0], [60, 90, 220, 255]),
];
const MOTION_COLOR: [u8; 4] = [255, 255, 255, 255];
/// Gizmo radius as a fraction of the shorter tile side
const GIZMO_SCALE: f32 = 0.4;
/// Points closer than this to the virtual camera are not drawn
const NEAR_PLANE_M: f32 = 0.05;

/// View parameters shared by every tile in one draw tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    /// Accumulated drag offset in viewport pixels (x, y)
    pub rotation: (f32, f32),
    pub degrees_per_pixel: f32,
    pub fov_degrees: f32,
    pub view_distance: f32,
    pub point_size: u32,
    pub noise_threshold: f32,
    pub full_scale: f32,
}

impl DrawParams {
    pub fn from_config(config: &Config, rotation: (f32, f32)) -> Self {
        Self {
            rotation,
            degrees_per_pixel: config.point_cloud.degrees_per_pixel,
            fov_degrees: config.point_cloud.fov_degrees,
            view_distance: config.point_cloud.view_distance_m,
            point_size: config.point_cloud.point_size.max(1),
            noise_threshold: config.motion.noise_threshold,
            full_scale: config.motion.full_scale,
        }
    }
}

impl Default for DrawParams {
    fn default() -> Self {
        Self::from_config(&Config::default(), (0.0, 0.0))
    }
}

/// Draw one cached stream into `rect`
pub fn draw(view: &Renderable, rect: Rect, canvas: &mut Canvas, params: &DrawParams) {
    canvas.fill_rect(rect, TILE_BACKGROUND);
    match view {
        Renderable::Video(video) => draw_video(video, rect, canvas),
        Renderable::Motion(motion) => draw_motion(motion, rect, canvas, params),
        Renderable::Points(points) => draw_points(points, rect, canvas, params),
    }
}

/// Letterboxed nearest-neighbour blit
fn draw_video(view: &VideoView, rect: Rect, canvas: &mut Canvas) {
    let Some(image) = view.image() else {
        return;
    };
    let format = view.frame().identity().format;
    let fit = rect.fit_aspect(image.width as f32, image.height as f32);
    if fit.area() <= 0.0 {
        return;
    }

    let (x0, y0, x1, y1) = fit.pixel_bounds();
    for y in y0..y1 {
        let sy = ((y as f32 + 0.5 - fit.y) / fit.height * image.height as f32) as u32;
        for x in x0..x1 {
            let sx = ((x as f32 + 0.5 - fit.x) / fit.width * image.width as f32) as u32;
            let [r, g, b] = sample_rgb(image, format, sx, sy);
            canvas.put_pixel(x, y, [r, g, b, 255]);
        }
    }
}

/// Oblique projection of a gizmo-space vector (y up) onto the tile
fn project_gizmo(v: [f32; 3], center: (f32, f32), radius: f32) -> (f32, f32) {
    (
        center.0 + (v[0] - 0.5 * v[2]) * radius,
        center.1 - (v[1] - 0.5 * v[2]) * radius,
    )
}

fn draw_motion(view: &MotionView, rect: Rect, canvas: &mut Canvas, params: &DrawParams) {
    let center = rect.center();
    let radius = rect.width.min(rect.height) * GIZMO_SCALE;

    for (axis, color) in GIZMO_AXES {
        let end = project_gizmo(axis, center, radius);
        canvas.draw_line(center, end, color, rect);
    }

    let Some(sample) = view.sample() else {
        return;
    };
    let magnitude = sample.magnitude();
    if magnitude < params.noise_threshold || params.full_scale <= 0.0 {
        let dot = Rect::new(center.0 - 1.5, center.1 - 1.5, 3.0, 3.0);
        canvas.fill_rect(dot, MOTION_COLOR);
        return;
    }

    let length = (magnitude / params.full_scale).min(1.0);
    let [x, y, z] = sample.vector;
    let unit = [x / magnitude * length, y / magnitude * length, z / magnitude * length];
    let end = project_gizmo(unit, center, radius);
    canvas.draw_line(center, end, MOTION_COLOR, rect);
}

/// Perspective projection with a per-tile depth buffer
///
/// The cloud rotates about a pivot `view_distance` in front of the camera.
fn draw_points(view: &PointsView, rect: Rect, canvas: &mut Canvas, params: &DrawParams) {
    let Some(cloud) = view.cloud() else {
        return;
    };
    let colors = view.colors();
    if cloud.is_empty() || colors.len() < cloud.len() * TEXEL_BYTES {
        return;
    }

    let (x0, y0, x1, y1) = rect.pixel_bounds();
    let (tile_w, tile_h) = ((x1 - x0).max(0) as usize, (y1 - y0).max(0) as usize);
    if tile_w == 0 || tile_h == 0 {
        return;
    }
    let mut depth_buffer = vec![f32::INFINITY; tile_w * tile_h];

    let yaw = (params.rotation.0 * params.degrees_per_pixel).to_radians();
    let pitch = (params.rotation.1 * params.degrees_per_pixel).to_radians();
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    let (sin_pitch, cos_pitch) = pitch.sin_cos();
    let focal = (tile_h as f32 / 2.0) / (params.fov_degrees.to_radians() / 2.0).tan();
    let (cx, cy) = rect.center();
    let pivot = params.view_distance;
    let size = params.point_size as i64;

    for (vertex, texel) in cloud.vertices.iter().zip(colors.chunks_exact(TEXEL_BYTES)) {
        if texel[3] == 0 {
            continue;
        }

        // Rotate about the pivot: yaw around y, then pitch around x
        let (x, y, z) = (vertex.x, vertex.y, vertex.z - pivot);
        let (x, z) = (x * cos_yaw + z * sin_yaw, -x * sin_yaw + z * cos_yaw);
        let (y, z) = (y * cos_pitch - z * sin_pitch, y * sin_pitch + z * cos_pitch);
        let z = z + pivot;
        if !(x.is_finite() && y.is_finite() && z.is_finite()) || z < NEAR_PLANE_M {
            continue;
        }

        let (fx, fy) = ((cx + x * focal / z).round(), (cy + y * focal / z).round());
        if !(fx.is_finite() && fy.is_finite()) {
            continue;
        }
        let (sx, sy) = (fx as i64, fy as i64);
        let color = [texel[0], texel[1], texel[2], 255];

        for py in sy..sy.saturating_add(size) {
            for px in sx..sx.saturating_add(size) {
                if px < x0 || py < y0 || px >= x1 || py >= y1 {
                    continue;
                }
                let slot = (py - y0) as usize * tile_w + (px - x0) as usize;
                if z < depth_buffer[slot] {
                    depth_buffer[slot] = z;
                    canvas.put_pixel(px, py, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{
        Frame, FrameData, FrameSet, HandleTracker, MotionSample, PixelFormat, PointCloud,
        StreamIdentity, StreamKind, TexCoord, Vertex, VideoFrame,
    };
    use crate::processing::converters::DepthVisualizationOptions;
    use crate::render::RenderCache;

    fn cache_with(frame: Frame) -> RenderCache {
        let mut cache = RenderCache::new(DepthVisualizationOptions::default());
        cache.update(&FrameSet::from_frames(vec![frame]).unwrap());
        cache.map_point_cloud_textures(1.2);
        cache
    }

    #[test]
    fn test_video_letterbox() {
        let tracker = HandleTracker::new();
        let identity = StreamIdentity::new(StreamKind::Color, PixelFormat::Rgb8, 0, 30);
        let video = VideoFrame::new(2, 1, PixelFormat::Rgb8, vec![255, 0, 0, 0, 0, 255]).unwrap();
        let cache = cache_with(Frame::new(identity, 1, FrameData::Video(video), &tracker).unwrap());

        let mut canvas = Canvas::new(8, 8);
        let rect = Rect::new(0.0, 0.0, 8.0, 8.0);
        draw(cache.entries()[0].view(), rect, &mut canvas, &DrawParams::default());

        // 2:1 image in a square tile: rows 2..6 hold the picture
        assert_eq!(canvas.get_pixel(1, 0), Some(TILE_BACKGROUND));
        assert_eq!(canvas.get_pixel(1, 3), Some([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(6, 4), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_motion_below_threshold_is_dot() {
        let tracker = HandleTracker::new();
        let identity = StreamIdentity::new(StreamKind::Motion, PixelFormat::MotionXyz32f, 0, 200);
        let sample = MotionSample {
            vector: [0.01, 0.0, 0.0],
        };
        let cache = cache_with(Frame::new(identity, 1, FrameData::Motion(sample), &tracker).unwrap());

        let mut canvas = Canvas::new(40, 40);
        let rect = Rect::new(0.0, 0.0, 40.0, 40.0);
        draw(cache.entries()[0].view(), rect, &mut canvas, &DrawParams::default());
        assert_eq!(canvas.get_pixel(20, 20), Some(MOTION_COLOR));
    }

    #[test]
    fn test_points_drawn_with_mapped_color() {
        let tracker = HandleTracker::new();
        let identity = StreamIdentity::new(StreamKind::Derived, PixelFormat::Xyz32f, 0, 30);
        let cloud = PointCloud::new(
            vec![Vertex { x: 0.0, y: 0.0, z: 1.2 }],
            vec![TexCoord::default()],
        )
        .unwrap();
        let cache = cache_with(Frame::new(identity, 1, FrameData::Points(cloud), &tracker).unwrap());

        let mut canvas = Canvas::new(20, 20);
        let rect = Rect::new(0.0, 0.0, 20.0, 20.0);
        draw(cache.entries()[0].view(), rect, &mut canvas, &DrawParams::default());
        // Grayscale fallback at max range is white, centered
        assert_eq!(canvas.get_pixel(10, 10), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_rotation_moves_points() {
        let tracker = HandleTracker::new();
        let identity = StreamIdentity::new(StreamKind::Derived, PixelFormat::Xyz32f, 0, 30);
        let cloud = PointCloud::new(
            vec![Vertex { x: 0.0, y: 0.0, z: 0.5 }],
            vec![TexCoord::default()],
        )
        .unwrap();
        let cache = cache_with(Frame::new(identity, 1, FrameData::Points(cloud), &tracker).unwrap());

        let mut canvas = Canvas::new(40, 40);
        let rect = Rect::new(0.0, 0.0, 40.0, 40.0);
        let params = DrawParams {
            rotation: (120.0, 0.0),
            ..DrawParams::default()
        };
        draw(cache.entries()[0].view(), rect, &mut canvas, &params);
        assert_eq!(canvas.get_pixel(20, 20), Some(TILE_BACKGROUND));
    }

    #[test]
    fn test_non_finite_points_are_skipped() {
        let tracker = HandleTracker::new();
        let identity = StreamIdentity::new(StreamKind::Derived, PixelFormat::Xyz32f, 0, 30);
        let cloud = PointCloud::new(
            vec![
                Vertex { x: f32::MAX, y: 0.0, z: 1.0 },
                Vertex { x: f32::INFINITY, y: 0.0, z: 1.0 },
                Vertex { x: 0.0, y: f32::NAN, z: 1.0 },
                Vertex { x: 0.0, y: 0.0, z: 1.2 },
            ],
            vec![TexCoord::default(); 4],
        )
        .unwrap();
        let cache = cache_with(Frame::new(identity, 1, FrameData::Points(cloud), &tracker).unwrap());

        let mut canvas = Canvas::new(20, 20);
        let rect = Rect::new(0.0, 0.0, 20.0, 20.0);
        let params = DrawParams {
            point_size: 3,
            ..DrawParams::default()
        };
        draw(cache.entries()[0].view(), rect, &mut canvas, &params);
        assert_eq!(
            canvas.get_pixel(10, 10),
            Some([255, 255, 255, 255]),
            "finite point still drawn"
        );
    }
}
