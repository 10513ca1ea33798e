// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON under the user's config directory. Every field has a
//! default, so partial files are accepted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{
    DEPTH_COLORMAP_BANDS, DEPTH_MAX_MM, DEPTH_MIN_MM, MOTION_FULL_SCALE, MOTION_NOISE_THRESHOLD,
    POINT_CLOUD_DEGREES_PER_PIXEL, POINT_CLOUD_FOV_DEGREES, POINT_CLOUD_GRAYSCALE_MAX_RANGE_M,
    POINT_CLOUD_POINT_SIZE, POINT_CLOUD_VIEW_DISTANCE_M, SENSOR_FPS, SENSOR_HEIGHT, SENSOR_WIDTH,
    VIEWPORT_HEIGHT, VIEWPORT_WIDTH,
};
use crate::errors::{AppError, AppResult};
use crate::frames::PixelFormat;
use crate::processing::converters::DepthVisualizationOptions;

const CONFIG_DIR: &str = "stream-compositor";
const CONFIG_FILE: &str = "config.json";

/// Point-cloud view settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointCloudSettings {
    /// Start with the point-cloud view active
    pub enabled_on_start: bool,
    /// Depth (meters) mapped to white by the grayscale fallback texture
    pub grayscale_max_range_m: f32,
    pub fov_degrees: f32,
    /// Distance from the virtual camera to the rotation pivot
    pub view_distance_m: f32,
    /// Rotation applied per dragged pixel
    pub degrees_per_pixel: f32,
    /// Side of the square splat drawn per vertex, in pixels
    pub point_size: u32,
}

impl Default for PointCloudSettings {
    fn default() -> Self {
        Self {
            enabled_on_start: false,
            grayscale_max_range_m: POINT_CLOUD_GRAYSCALE_MAX_RANGE_M,
            fov_degrees: POINT_CLOUD_FOV_DEGREES,
            view_distance_m: POINT_CLOUD_VIEW_DISTANCE_M,
            degrees_per_pixel: POINT_CLOUD_DEGREES_PER_PIXEL,
            point_size: POINT_CLOUD_POINT_SIZE,
        }
    }
}

/// Motion gizmo settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Vectors shorter than this are drawn as a dot
    pub noise_threshold: f32,
    /// Magnitude drawn at the full gizmo radius
    pub full_scale: f32,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            noise_threshold: MOTION_NOISE_THRESHOLD,
            full_scale: MOTION_FULL_SCALE,
        }
    }
}

/// Depth colorizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthSettings {
    pub min_depth_mm: u16,
    /// 0 selects auto-ranging
    pub max_depth_mm: u16,
    pub grayscale: bool,
    pub quantize_bands: u32,
}

impl Default for DepthSettings {
    fn default() -> Self {
        Self {
            min_depth_mm: DEPTH_MIN_MM,
            max_depth_mm: DEPTH_MAX_MM,
            grayscale: false,
            quantize_bands: DEPTH_COLORMAP_BANDS,
        }
    }
}

impl DepthSettings {
    pub fn visualization(&self) -> DepthVisualizationOptions {
        DepthVisualizationOptions {
            grayscale: self.grayscale,
            quantize_bands: self.quantize_bands,
            min_depth_mm: self.min_depth_mm,
            max_depth_mm: self.max_depth_mm,
        }
    }
}

/// Synthetic sensor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// `Rgb8` or a packed YUV format
    pub color_format: PixelFormat,
    pub enable_color: bool,
    pub enable_depth: bool,
    pub enable_motion: bool,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            width: SENSOR_WIDTH,
            height: SENSOR_HEIGHT,
            fps: SENSOR_FPS,
            color_format: PixelFormat::Yuyv,
            enable_color: true,
            enable_depth: true,
            enable_motion: true,
        }
    }
}

/// Viewport used for headless rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub point_cloud: PointCloudSettings,
    pub motion: MotionSettings,
    pub depth: DepthSettings,
    pub sensor: SensorSettings,
    pub viewport: ViewportSettings,
}

impl Config {
    /// Default location: `<config dir>/stream-compositor/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Read and validate a config file
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from `path` (or the default location), falling back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Self::default(),
            },
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring invalid configuration");
                Self::default()
            }
        }
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject values the pipeline can't work with
    pub fn validate(&self) -> AppResult<()> {
        if self.point_cloud.grayscale_max_range_m <= 0.0 {
            return Err(AppError::Config(
                "point_cloud.grayscale_max_range_m must be positive".to_string(),
            ));
        }
        if !(1.0..180.0).contains(&self.point_cloud.fov_degrees) {
            return Err(AppError::Config(
                "point_cloud.fov_degrees must be within 1..180".to_string(),
            ));
        }
        if self.sensor.width == 0 || self.sensor.height == 0 || self.sensor.fps == 0 {
            return Err(AppError::Config(
                "sensor width, height and fps must be non-zero".to_string(),
            ));
        }
        if self.sensor.width % 2 != 0 && self.sensor.color_format.is_packed_yuv() {
            return Err(AppError::Config(
                "packed YUV color needs an even sensor width".to_string(),
            ));
        }
        if !(self.sensor.color_format.is_rgb() || self.sensor.color_format.is_packed_yuv()) {
            return Err(AppError::Config(format!(
                "unsupported color format {:?}",
                self.sensor.color_format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "point_cloud": { "enabled_on_start": true } }"#).unwrap();
        assert!(config.point_cloud.enabled_on_start);
        assert_eq!(
            config.point_cloud.grayscale_max_range_m,
            POINT_CLOUD_GRAYSCALE_MAX_RANGE_M
        );
        assert_eq!(config.sensor, SensorSettings::default());
    }

    #[test]
    fn test_validate_rejects_bad_range() {
        let mut config = Config::default();
        config.point_cloud.grayscale_max_range_m = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_odd_yuv_width() {
        let mut config = Config::default();
        config.sensor.width = 321;
        assert!(config.validate().is_err());
        config.sensor.color_format = PixelFormat::Rgb8;
        assert!(config.validate().is_ok());
    }
}
