// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle for the streaming side
//!
//! A capture loop runs on its own named thread and calls one closure per
//! iteration until the closure asks to stop or the controller is stopped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::synthetic::SyntheticSensor;
use crate::compositor::Compositor;
use crate::errors::{AppError, AppResult};

/// Returned by the loop closure after each iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Stop,
}

/// Owns a capture thread and its stop signal
///
/// Dropping the controller stops the loop and joins the thread.
pub struct CaptureLoopController {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl CaptureLoopController {
    /// Spawn `loop_fn` on a thread called `name`
    pub fn start<F>(name: &str, mut loop_fn: F) -> AppResult<Self>
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_signal);
        let thread_name = name.to_string();

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %thread_name, "Capture loop thread started");
                while !thread_stop.load(Ordering::SeqCst) {
                    if loop_fn() == LoopAction::Stop {
                        debug!(name = %thread_name, "Loop requested stop");
                        break;
                    }
                }
                info!(name = %thread_name, "Capture loop thread exiting");
            })
            .map_err(|e| AppError::Other(format!("failed to spawn {}: {}", name, e)))?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        })
    }

    /// Stream `sensor` into `compositor` at the sensor's frame rate
    ///
    /// Stops after `max_ticks` frame-sets when given.
    pub fn stream(
        mut sensor: SyntheticSensor,
        compositor: Arc<Compositor>,
        max_ticks: Option<u64>,
    ) -> AppResult<Self> {
        let period = sensor.frame_period();
        let mut ticks = 0u64;
        Self::start("synthetic-capture", move || {
            if max_ticks.is_some_and(|max| ticks >= max) {
                return LoopAction::Stop;
            }
            let started = Instant::now();
            match sensor.next_frame_set() {
                Ok(set) => compositor.on_frame_set_arrived(set),
                Err(e) => {
                    warn!(error = %e, "Failed to produce frame-set");
                    return LoopAction::Stop;
                }
            }
            ticks += 1;
            if let Some(rest) = period.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
            LoopAction::Continue
        })
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Shared stop flag, for long-running work inside the loop
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_signal)
    }

    /// Signal the loop to stop without waiting
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Signal and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread without signalling it
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take()
            && let Err(e) = handle.join()
        {
            warn!(name = %self.name, "Capture loop thread panicked: {:?}", e);
        }
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "Capture loop controller dropped, stopping loop");
            self.stop();
        }
    }
}
