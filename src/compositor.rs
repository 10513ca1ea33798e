// SPDX-License-Identifier: GPL-3.0-only

//! Compositor entry points
//!
//! The streaming thread hands every captured frame-set to
//! [`Compositor::on_frame_set_arrived`]; the render side calls
//! [`Compositor::on_draw_tick`]. The render cache, the rotation accumulator,
//! the viewport size and the point-cloud switch live behind one mutex so
//! neither side can observe a half-applied update.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, trace};

use crate::config::Config;
use crate::constants::BACKGROUND_RGBA;
use crate::frames::{FrameSet, RenderKind};
use crate::processing::{BlockKind, FilterChain, PipelineFlags, ProcessingBlocks, select_pipeline};
use crate::render::{Canvas, DrawParams, RenderCache, compute_layout, draw};

/// What one draw tick produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub tiles: usize,
    pub video: usize,
    pub motion: usize,
    pub points: usize,
}

struct CompositorState {
    cache: RenderCache,
    /// Accumulated drag offset in pixels
    rotation: (f32, f32),
    viewport: (u32, u32),
    point_cloud: bool,
}

pub struct Compositor {
    config: Config,
    state: Mutex<CompositorState>,
    /// Only touched from the streaming thread
    blocks: Mutex<ProcessingBlocks>,
}

impl Compositor {
    pub fn new(config: Config) -> Arc<Self> {
        let state = CompositorState {
            cache: RenderCache::new(config.depth.visualization()),
            rotation: (0.0, 0.0),
            viewport: (config.viewport.width, config.viewport.height),
            point_cloud: config.point_cloud.enabled_on_start,
        };
        Arc::new(Self {
            blocks: Mutex::new(ProcessingBlocks::new(&config)),
            state: Mutex::new(state),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, CompositorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks that would run on `set` under the current point-cloud mode
    pub fn selected_pipeline(&self, set: &FrameSet) -> Vec<BlockKind> {
        select_pipeline(&PipelineFlags::inspect(set, self.point_cloud_mode()))
    }

    /// Process a captured frame-set and cache the result
    ///
    /// Takes ownership of `set`; it and every intermediate are released
    /// before returning.
    pub fn on_frame_set_arrived(&self, set: FrameSet) {
        let point_cloud = self.point_cloud_mode();
        let pipeline = select_pipeline(&PipelineFlags::inspect(&set, point_cloud));

        let processed = {
            let mut blocks = self.blocks.lock().unwrap_or_else(PoisonError::into_inner);
            FilterChain::run(&mut blocks, &set, &pipeline)
        };
        set.release();

        {
            let mut state = self.lock_state();
            if state.point_cloud != point_cloud {
                trace!("Point-cloud mode changed mid-tick, dropping frame-set");
            } else {
                state.cache.update(&processed);
                state.cache.attach_point_cloud_texture(&processed, point_cloud);
                state
                    .cache
                    .map_point_cloud_textures(self.config.point_cloud.grayscale_max_range_m);
            }
        }

        processed.release();
    }

    pub fn on_viewport_resized(&self, width: u32, height: u32) {
        let mut state = self.lock_state();
        if state.viewport != (width, height) {
            debug!(width, height, "Viewport resized");
            state.viewport = (width, height);
        }
    }

    /// Draw every cached stream into `canvas`, resized to the viewport
    pub fn on_draw_tick(&self, canvas: &mut Canvas) -> DrawStats {
        let state = self.lock_state();
        let (width, height) = state.viewport;
        canvas.resize(width, height);
        canvas.clear(BACKGROUND_RGBA);

        let params = DrawParams::from_config(&self.config, state.rotation);
        let rects = compute_layout(state.cache.len(), width, height);
        let mut stats = DrawStats::default();

        for (entry, rect) in state.cache.entries().iter().zip(rects) {
            draw(entry.view(), rect, canvas, &params);
            stats.tiles += 1;
            match entry.view().kind() {
                RenderKind::Video => stats.video += 1,
                RenderKind::Motion => stats.motion += 1,
                RenderKind::Points => stats.points += 1,
            }
        }
        stats
    }

    /// Accumulate a drag into the point-cloud rotation
    pub fn on_user_drag(&self, dx: f32, dy: f32) {
        let mut state = self.lock_state();
        state.rotation.0 += dx;
        state.rotation.1 += dy;
    }

    pub fn rotation(&self) -> (f32, f32) {
        self.lock_state().rotation
    }

    pub fn reset_rotation(&self) {
        self.lock_state().rotation = (0.0, 0.0);
    }

    /// Drop every cached frame and derived stream profile (stream stop or
    /// reconfiguration)
    pub fn reset(&self) {
        self.lock_state().cache.clear();
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
    }

    /// Switch point-cloud mode; the cache is cleared on every change
    pub fn set_point_cloud_mode(&self, enabled: bool) {
        let mut state = self.lock_state();
        if state.point_cloud == enabled {
            return;
        }
        info!(enabled, "Point-cloud mode changed");
        state.point_cloud = enabled;
        state.cache.clear();
    }

    pub fn point_cloud_mode(&self) -> bool {
        self.lock_state().point_cloud
    }

    pub fn stream_count(&self) -> usize {
        self.lock_state().cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{
        Frame, FrameData, HandleTracker, MotionSample, PixelFormat, StreamIdentity, StreamKind,
        VideoFrame,
    };

    fn motion_set(tracker: &HandleTracker, identity: StreamIdentity) -> FrameSet {
        let frame = Frame::new(
            identity,
            1,
            FrameData::Motion(MotionSample {
                vector: [0.0, 9.81, 0.0],
            }),
            tracker,
        )
        .unwrap();
        FrameSet::from_frames(vec![frame]).unwrap()
    }

    #[test]
    fn test_reset_before_any_frame() {
        let compositor = Compositor::new(Config::default());
        compositor.reset();
        compositor.reset();
        assert_eq!(compositor.stream_count(), 0);
    }

    #[test]
    fn test_drag_accumulates() {
        let compositor = Compositor::new(Config::default());
        compositor.on_user_drag(3.0, -1.0);
        compositor.on_user_drag(2.0, 4.0);
        assert_eq!(compositor.rotation(), (5.0, 3.0));
        compositor.reset_rotation();
        assert_eq!(compositor.rotation(), (0.0, 0.0));
    }

    #[test]
    fn test_mode_change_clears_cache() {
        let tracker = HandleTracker::new();
        let compositor = Compositor::new(Config::default());
        let imu = StreamIdentity::new(StreamKind::Motion, PixelFormat::MotionXyz32f, 0, 200);

        compositor.on_frame_set_arrived(motion_set(&tracker, imu));
        assert_eq!(compositor.stream_count(), 1);
        assert_eq!(tracker.live(), 1);

        compositor.set_point_cloud_mode(false);
        assert_eq!(compositor.stream_count(), 1, "no change, no clear");

        compositor.set_point_cloud_mode(true);
        assert_eq!(compositor.stream_count(), 0);
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn test_draw_tick_uses_viewport() {
        let tracker = HandleTracker::new();
        let compositor = Compositor::new(Config::default());
        let imu = StreamIdentity::new(StreamKind::Motion, PixelFormat::MotionXyz32f, 0, 200);
        compositor.on_frame_set_arrived(motion_set(&tracker, imu));
        compositor.on_viewport_resized(64, 32);

        let mut canvas = Canvas::default();
        let stats = compositor.on_draw_tick(&mut canvas);
        assert_eq!((canvas.width(), canvas.height()), (64, 32));
        assert_eq!(
            stats,
            DrawStats {
                tiles: 1,
                motion: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_reset_forgets_derived_streams() {
        let tracker = HandleTracker::new();
        let compositor = Compositor::new(Config::default());
        let derived = || {
            compositor
                .blocks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .derived_streams()
        };

        // Each reconfiguration brings a packed color stream with a new id
        for _ in 0..50 {
            let identity = StreamIdentity::new(StreamKind::Color, PixelFormat::Yuyv, 0, 30);
            let video = VideoFrame::new(2, 1, PixelFormat::Yuyv, vec![128, 128, 128, 128]).unwrap();
            let frame = Frame::new(identity, 1, FrameData::Video(video), &tracker).unwrap();
            compositor.on_frame_set_arrived(FrameSet::from_frames(vec![frame]).unwrap());
            assert_eq!(derived(), 1, "one decoded stream per configuration");
            compositor.reset();
            assert_eq!(derived(), 0);
        }
        assert_eq!(tracker.live(), 0);
    }
}
