// SPDX-License-Identifier: GPL-3.0-only

//! Streaming side: frame-set producers and the capture thread

pub mod frame_loop;
pub mod synthetic;

pub use frame_loop::{CaptureLoopController, LoopAction};
pub use synthetic::SyntheticSensor;
