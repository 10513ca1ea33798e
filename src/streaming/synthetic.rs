// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic depth/color/motion sensor
//!
//! Produces synchronized frame-sets without hardware: an animated color
//! gradient (RGB or packed YUV), a Z16 scene of a tilted wall with a sphere
//! in front of it, and an accelerometer reading that slowly wobbles around
//! gravity.

use std::time::Duration;

use tracing::debug;

use crate::config::SensorSettings;
use crate::constants::{GRAVITY_MPS2, SYNTHETIC_HOLE_STRIDE};
use crate::errors::AppResult;
use crate::frames::{
    Frame, FrameData, FrameSet, HandleTracker, MotionSample, PixelFormat, StreamIdentity,
    StreamKind, VideoFrame,
};

/// Wall distance at the left edge, in millimeters
const WALL_NEAR_MM: f32 = 1800.0;
/// Extra wall distance at the right edge
const WALL_TILT_MM: f32 = 900.0;
const SPHERE_DEPTH_MM: f32 = 1100.0;

pub struct SyntheticSensor {
    settings: SensorSettings,
    color: Option<StreamIdentity>,
    depth: Option<StreamIdentity>,
    motion: Option<StreamIdentity>,
    tracker: HandleTracker,
    frame_number: u64,
}

impl SyntheticSensor {
    pub fn new(settings: &SensorSettings) -> Self {
        Self::with_tracker(settings, HandleTracker::new())
    }

    /// Report frame references to an existing tracker
    pub fn with_tracker(settings: &SensorSettings, tracker: HandleTracker) -> Self {
        let fps = settings.fps;
        let color = settings
            .enable_color
            .then(|| StreamIdentity::new(StreamKind::Color, settings.color_format, 0, fps));
        let depth = settings
            .enable_depth
            .then(|| StreamIdentity::new(StreamKind::Depth, PixelFormat::Z16, 0, fps));
        let motion = settings
            .enable_motion
            .then(|| StreamIdentity::new(StreamKind::Motion, PixelFormat::MotionXyz32f, 0, fps));

        Self {
            settings: settings.clone(),
            color,
            depth,
            motion,
            tracker,
            frame_number: 0,
        }
    }

    /// Profiles of the enabled streams
    pub fn streams(&self) -> Vec<StreamIdentity> {
        [self.color, self.depth, self.motion].into_iter().flatten().collect()
    }

    pub fn tracker(&self) -> &HandleTracker {
        &self.tracker
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.settings.fps.max(1) as f64)
    }

    /// Capture the next synchronized burst
    pub fn next_frame_set(&mut self) -> AppResult<FrameSet> {
        self.frame_number += 1;
        let n = self.frame_number;
        let (w, h) = (self.settings.width, self.settings.height);
        let mut set = FrameSet::new();

        if let Some(identity) = self.color {
            let data = color_image(w, h, identity.format, n);
            let video = VideoFrame::new(w, h, identity.format, data)?;
            set.push(Frame::new(identity, n, FrameData::Video(video), &self.tracker)?)?;
        }
        if let Some(identity) = self.depth {
            let video = VideoFrame::new(w, h, PixelFormat::Z16, depth_image(w, h, n))?;
            set.push(Frame::new(identity, n, FrameData::Video(video), &self.tracker)?)?;
        }
        if let Some(identity) = self.motion {
            let sample = accelerometer(n);
            set.push(Frame::new(identity, n, FrameData::Motion(sample), &self.tracker)?)?;
        }

        if n == 1 {
            debug!(streams = set.len(), width = w, height = h, "First synthetic frame-set");
        }
        Ok(set)
    }
}

fn gradient_rgb(x: u32, y: u32, w: u32, h: u32, n: u64) -> [u8; 3] {
    let r = ((x * 255 / w.max(1)) as u64 + n * 2) % 256;
    let g = y * 255 / h.max(1);
    let b = 255 - (x + y) * 255 / (w + h).max(1);
    [r as u8, g as u8, b as u8]
}

/// BT.601 RGB → YUV, inverse of the decoder's conversion
fn rgb_to_yuv([r, g, b]: [u8; 3]) -> (u8, u8, u8) {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = (b - y) * 0.564 + 128.0;
    let v = (r - y) * 0.713 + 128.0;
    (
        y.clamp(0.0, 255.0) as u8,
        u.clamp(0.0, 255.0) as u8,
        v.clamp(0.0, 255.0) as u8,
    )
}

fn color_image(w: u32, h: u32, format: PixelFormat, n: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity((w * h * format.bytes_per_pixel()) as usize);
    for y in 0..h {
        if format.is_packed_yuv() {
            for x in (0..w).step_by(2) {
                let (y0, u, v) = rgb_to_yuv(gradient_rgb(x, y, w, h, n));
                let (y1, _, _) = rgb_to_yuv(gradient_rgb(x + 1, y, w, h, n));
                match format {
                    PixelFormat::Uyvy => data.extend_from_slice(&[u, y0, v, y1]),
                    _ => data.extend_from_slice(&[y0, u, y1, v]),
                }
            }
        } else {
            for x in 0..w {
                let [r, g, b] = gradient_rgb(x, y, w, h, n);
                match format {
                    PixelFormat::Bgr8 => data.extend_from_slice(&[b, g, r]),
                    PixelFormat::Rgba8 => data.extend_from_slice(&[r, g, b, 255]),
                    _ => data.extend_from_slice(&[r, g, b]),
                }
            }
        }
    }
    data
}

/// Tilted wall with a sphere drifting left and right, plus a sparse grid of
/// holes (zero depth)
fn depth_image(w: u32, h: u32, n: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity((w * h * 2) as usize);
    let radius = w.min(h) as f32 / 4.0;
    let phase = n as f32 * 0.05;
    let sphere_x = w as f32 / 2.0 + phase.sin() * w as f32 / 4.0;
    let sphere_y = h as f32 / 2.0;

    for y in 0..h {
        for x in 0..w {
            let mut depth = WALL_NEAR_MM + WALL_TILT_MM * x as f32 / w.max(1) as f32;
            let (dx, dy) = (x as f32 - sphere_x, y as f32 - sphere_y);
            let d2 = dx * dx + dy * dy;
            if d2 < radius * radius {
                let bulge = (radius * radius - d2).sqrt() / radius;
                depth = depth.min(SPHERE_DEPTH_MM - bulge * 200.0);
            }
            if (x + y * 3) % SYNTHETIC_HOLE_STRIDE == 0 {
                depth = 0.0;
            }
            data.extend_from_slice(&(depth as u16).to_le_bytes());
        }
    }
    data
}

fn accelerometer(n: u64) -> MotionSample {
    let t = n as f32 * 0.03;
    let tilt = t.sin() * 0.3;
    MotionSample {
        vector: [
            GRAVITY_MPS2 * tilt.sin(),
            GRAVITY_MPS2 * tilt.cos(),
            (t * 1.7).sin() * 0.5,
        ],
    }
}
