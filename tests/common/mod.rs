//! Shared test utilities for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Sorted file names in `dir`
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("output dir should exist")
        .map(|entry| entry.expect("readable entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Expected frame file names for a run of `count` frames, sorted like
/// [`file_names`]
pub fn expected_frames(count: u32) -> Vec<String> {
    let mut names: Vec<String> = (0..count).map(|i| format!("{i}.jpg")).collect();
    names.sort();
    names
}

/// Contents of frame `index` under `dir`
pub fn read_frame(dir: &Path, index: u32) -> Vec<u8> {
    std::fs::read(frame_path(dir, index)).expect("frame should exist")
}

pub fn frame_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("{index}.jpg"))
}

/// Parses `Captured N frames in X seconds, approx FPS = Y`
pub fn parse_summary_line(line: &str) -> Option<(u32, f64, f64)> {
    let rest = line.strip_prefix("Captured ")?;
    let (frames, rest) = rest.split_once(" frames in ")?;
    let (elapsed, rest) = rest.split_once(" seconds, approx FPS = ")?;
    Some((frames.parse().ok()?, elapsed.parse().ok()?, rest.trim().parse().ok()?))
}
