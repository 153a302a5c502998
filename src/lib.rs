//! capture-fps: frame-rate benchmark for adb screen capture pipelines
//!
//! This library repeatedly runs a capture-and-encode command on an Android
//! device over adb, stores every frame locally and reports the average
//! frames per second achieved over the run.

pub mod bench;
pub mod capture;
pub mod error;
pub mod model;
pub mod perf;
pub mod util;
