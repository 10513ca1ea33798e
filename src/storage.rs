// SPDX-License-Identifier: GPL-3.0-only

//! Snapshot files

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::render::Canvas;

const SNAPSHOT_DIR: &str = "stream-compositor";

/// Directory snapshots go to when no path is given
///
/// `~/Pictures/stream-compositor`, or the working directory if the system
/// has no pictures directory.
pub fn snapshot_directory() -> PathBuf {
    dirs::picture_dir()
        .map(|dir| dir.join(SNAPSHOT_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// PNG file name stamped with `now`
pub fn snapshot_filename(now: DateTime<Local>) -> String {
    format!("SNAP_{}.png", now.format("%Y%m%d_%H%M%S"))
}

/// Encode `canvas` to `output`, or a timestamped file in `directory`
pub fn save_snapshot(canvas: &Canvas, output: Option<&Path>, directory: &Path) -> AppResult<PathBuf> {
    let image = canvas
        .to_image()
        .filter(|image| image.width() > 0 && image.height() > 0)
        .ok_or_else(|| AppError::Storage("canvas has no pixels".to_string()))?;

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => directory.join(snapshot_filename(Local::now())),
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    image.save(&path)?;

    info!(path = %path.display(), "Snapshot saved");
    Ok(path)
}
