// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the compositor

use std::fmt;

use crate::frames::{PixelFormat, RenderKind};

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Frame construction errors
    Frame(FrameError),
    /// Configuration errors
    Config(String),
    /// Rendering or terminal errors
    Render(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Errors raised while building frames and frame-sets
///
/// Absent data (a missing stream, a block with no output) is never reported
/// through this type.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    /// A frame-set already holds its maximum number of frames
    FrameSetFull { capacity: usize },
    /// The payload kind does not match the stream's capability
    PayloadMismatch {
        uid: u32,
        format: PixelFormat,
        expected: Option<RenderKind>,
        found: RenderKind,
    },
    /// Sample buffer does not cover the declared dimensions
    InvalidGeometry(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Frame(e) => write!(f, "Frame error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Render(msg) => write!(f, "Render error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::FrameSetFull { capacity } => {
                write!(f, "Frame-set is full ({} frames)", capacity)
            }
            FrameError::PayloadMismatch {
                uid,
                format,
                expected,
                found,
            } => write!(
                f,
                "Stream {} ({:?}) expects {:?} payload, got {:?}",
                uid, format, expected, found
            ),
            FrameError::InvalidGeometry(msg) => write!(f, "Invalid geometry: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for FrameError {}

impl From<FrameError> for AppError {
    fn from(err: FrameError) -> Self {
        AppError::Frame(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Storage(err.to_string())
    }
}
