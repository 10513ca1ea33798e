// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline-wide constants
//!
//! Defaults for configurable values live here so the config module and the
//! rendering code agree on a single source of truth.

/// Maximum number of frames a single synchronized burst may carry
pub const MAX_FRAMES_PER_SET: usize = 16;

/// Depth unit of Z16 samples (meters per count)
pub const DEPTH_UNITS_M: f32 = 0.001;

/// Depth range used by the colorizer (millimeters)
pub const DEPTH_MIN_MM: u16 = 300;
pub const DEPTH_MAX_MM: u16 = 4000;

/// Values at or above this are treated as invalid depth
pub const DEPTH_INVALID_MM: u16 = 10_000;

/// Default number of colormap bands (0 disables quantization)
pub const DEPTH_COLORMAP_BANDS: u32 = 0;

/// Maximum range (meters) for the grayscale point-cloud fallback texture
pub const POINT_CLOUD_GRAYSCALE_MAX_RANGE_M: f32 = 1.2;

/// Point-cloud camera defaults
pub const POINT_CLOUD_FOV_DEGREES: f32 = 60.0;
pub const POINT_CLOUD_VIEW_DISTANCE_M: f32 = 1.5;
pub const POINT_CLOUD_DEGREES_PER_PIXEL: f32 = 0.25;
pub const POINT_CLOUD_POINT_SIZE: u32 = 1;

/// Motion vectors shorter than this (m/s²) are drawn as a dot
pub const MOTION_NOISE_THRESHOLD: f32 = 0.1;

/// Standard gravity (m/s²)
pub const GRAVITY_MPS2: f32 = 9.81;

/// Motion vector magnitude mapped to the full gizmo radius (2 g)
pub const MOTION_FULL_SCALE: f32 = GRAVITY_MPS2 * 2.0;

/// Pinhole intrinsics at the base resolution, scaled to the real stream size
pub const BASE_WIDTH: f32 = 640.0;
pub const BASE_HEIGHT: f32 = 480.0;
pub const FX: f32 = 594.21;
pub const FY: f32 = 591.04;
pub const CX: f32 = 339.5;
pub const CY: f32 = 242.7;

/// Synthetic sensor defaults
pub const SENSOR_WIDTH: u32 = 320;
pub const SENSOR_HEIGHT: u32 = 240;
pub const SENSOR_FPS: u32 = 30;

/// Every Nth pixel (diagonal pattern) of synthetic depth is a hole
pub const SYNTHETIC_HOLE_STRIDE: u32 = 37;

/// Headless viewport defaults
pub const VIEWPORT_WIDTH: u32 = 960;
pub const VIEWPORT_HEIGHT: u32 = 360;

/// Background of the composited viewport (RGBA)
pub const BACKGROUND_RGBA: [u8; 4] = [16, 16, 20, 255];

/// Build information
pub mod app_info {
    /// Version string baked in at build time
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
