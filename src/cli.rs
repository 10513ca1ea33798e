// SPDX-License-Identifier: GPL-3.0-only

//! Headless CLI commands
//!
//! - Printing the streams a sensor exposes and the pipeline chosen for them
//! - Rendering a composited snapshot to a PNG file

use std::path::PathBuf;

use stream_compositor::compositor::Compositor;
use stream_compositor::config::Config;
use stream_compositor::processing::{PipelineFlags, select_pipeline};
use stream_compositor::render::Canvas;
use stream_compositor::storage;
use stream_compositor::streaming::SyntheticSensor;

/// Print the sensor's streams and the blocks selected in both view modes
pub fn show_pipeline(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut sensor = SyntheticSensor::new(&config.sensor);
    let set = sensor.next_frame_set()?;

    println!("Streams:");
    for frame in set.iter() {
        println!("  {}", frame.identity());
    }
    println!();

    for (label, point_cloud) in [("2-D view", false), ("point cloud", true)] {
        let flags = PipelineFlags::inspect(&set, point_cloud);
        let blocks = select_pipeline(&flags);
        let names: Vec<String> = blocks.iter().map(ToString::to_string).collect();
        let chain = if names.is_empty() {
            "(none)".to_string()
        } else {
            names.join(" -> ")
        };
        println!("  {:<12} {}", label, chain);
    }

    set.release();
    Ok(())
}

/// Options for [`snapshot`]
pub struct SnapshotOptions {
    pub ticks: u32,
    pub output: Option<PathBuf>,
    pub point_cloud: bool,
    pub rotate: (f32, f32),
}

/// Run the pipeline headless for a few ticks and save the composited view
pub fn snapshot(config: &Config, options: SnapshotOptions) -> Result<(), Box<dyn std::error::Error>> {
    let compositor = Compositor::new(config.clone());
    compositor.set_point_cloud_mode(options.point_cloud);
    compositor.on_user_drag(options.rotate.0, options.rotate.1);

    let mut sensor = SyntheticSensor::new(&config.sensor);
    for _ in 0..options.ticks.max(1) {
        compositor.on_frame_set_arrived(sensor.next_frame_set()?);
    }

    let mut canvas = Canvas::default();
    let stats = compositor.on_draw_tick(&mut canvas);
    let path = storage::save_snapshot(
        &canvas,
        options.output.as_deref(),
        &storage::snapshot_directory(),
    )?;

    println!(
        "Rendered {} tiles ({} video, {} motion, {} point cloud) at {}x{}",
        stats.tiles,
        stats.video,
        stats.motion,
        stats.points,
        canvas.width(),
        canvas.height()
    );
    println!("Saved: {}", path.display());

    compositor.reset();
    Ok(())
}
