//! Data models for capture benchmark runs
//!
//! This module defines the types shared between the benchmark loop, the
//! frame sources and the command-line front end:
//! - [`RunConfig`]: the immutable parameters of one run
//! - [`ExitPolicy`]: how the capture command's exit status is treated
//! - [`FrameArtifact`] / [`FrameTiming`]: per-iteration results
//! - [`RunSummary`]: the aggregate report printed at the end of a run

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};

/// Default capture width passed to the encoder
pub const DEFAULT_WIDTH: i32 = 1080;
/// Default capture height passed to the encoder
pub const DEFAULT_HEIGHT: i32 = 2376;
/// Default JPEG quality passed to the encoder
pub const DEFAULT_QUALITY: i32 = 60;
/// Default downsample factor passed to the encoder
pub const DEFAULT_DOWNSAMPLE: i32 = 1;
/// Default number of frames captured per run
pub const DEFAULT_FRAME_COUNT: u32 = 20;
/// Default directory for captured frames
pub const DEFAULT_OUTPUT_DIR: &str = "tmp_frames";
/// Bytes requested per read from the capture pipe
pub const DEFAULT_CHUNK_SIZE: usize = 8192;
/// Extension given to every frame file
pub const FRAME_EXTENSION: &str = "jpg";

/// How the capture command's exit status is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitPolicy {
    /// Exit status and frame size are not checked; failures only log a warning
    #[default]
    Ignore,
    /// Non-zero exit or an empty frame aborts the run
    Strict,
}

/// Encoder parameters embedded in the remote capture command
///
/// Values are passed through uninterpreted; the encoder on the device is the
/// only component that validates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeParams {
    /// Capture width in pixels
    pub width:      i32,
    /// Capture height in pixels
    pub height:     i32,
    /// JPEG quality
    pub quality:    i32,
    /// Integer divisor applied to the resolution before encoding
    pub downsample: i32,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            width:      DEFAULT_WIDTH,
            height:     DEFAULT_HEIGHT,
            quality:    DEFAULT_QUALITY,
            downsample: DEFAULT_DOWNSAMPLE,
        }
    }
}

impl EncodeParams {
    /// Renders the four values as positional arguments, in encoder order
    pub fn as_args(&self) -> [String; 4] {
        [
            self.width.to_string(),
            self.height.to_string(),
            self.quality.to_string(),
            self.downsample.to_string(),
        ]
    }
}

/// Parameters of a single benchmark run
///
/// Build with [`RunConfig::builder`]; the builder rejects a zero frame count
/// or chunk size, everything else passes through as given.
///
/// # Examples
///
/// ```
/// use capture_fps::model::RunConfig;
///
/// let config = RunConfig::builder().frame_count(5).output_dir("frames").build().unwrap();
/// assert_eq!(config.frame_count(), 5);
/// assert_eq!(config.frame_path(3), std::path::Path::new("frames/3.jpg"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    encode:        EncodeParams,
    frame_count:   u32,
    output_dir:    PathBuf,
    chunk_size:    usize,
    exit_policy:   ExitPolicy,
    frame_timeout: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            encode:        EncodeParams::default(),
            frame_count:   DEFAULT_FRAME_COUNT,
            output_dir:    PathBuf::from(DEFAULT_OUTPUT_DIR),
            chunk_size:    DEFAULT_CHUNK_SIZE,
            exit_policy:   ExitPolicy::Ignore,
            frame_timeout: None,
        }
    }
}

impl RunConfig {
    /// Starts a builder seeded with the default run parameters
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: RunConfig::default(),
        }
    }

    /// Encoder parameters for the remote command
    pub fn encode(&self) -> &EncodeParams {
        &self.encode
    }

    /// Number of frames to capture
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Directory receiving the frame files
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Bytes requested per pipe read
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Exit-status policy
    pub fn exit_policy(&self) -> ExitPolicy {
        self.exit_policy
    }

    /// Optional per-frame timeout
    pub fn frame_timeout(&self) -> Option<Duration> {
        self.frame_timeout
    }

    /// Destination path for the frame at `index`: `{output_dir}/{index}.jpg`
    pub fn frame_path(&self, index: u32) -> PathBuf {
        self.output_dir.join(format!("{index}.{FRAME_EXTENSION}"))
    }

    /// Checks the invariants the builder enforces
    ///
    /// Exposed so that configs assembled elsewhere can be rechecked before a
    /// run starts.
    pub fn validate(&self) -> BenchResult<()> {
        if self.frame_count == 0 {
            return Err(BenchError::InvalidParameter {
                parameter: "frame_count".to_string(),
                reason:    "must be greater than zero".to_string(),
            });
        }
        if self.chunk_size == 0 {
            return Err(BenchError::InvalidParameter {
                parameter: "chunk_size".to_string(),
                reason:    "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for [`RunConfig`]
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Sets the capture width
    pub fn width(mut self, width: i32) -> Self {
        self.config.encode.width = width;
        self
    }

    /// Sets the capture height
    pub fn height(mut self, height: i32) -> Self {
        self.config.encode.height = height;
        self
    }

    /// Sets the encoder quality
    pub fn quality(mut self, quality: i32) -> Self {
        self.config.encode.quality = quality;
        self
    }

    /// Sets the downsample factor
    pub fn downsample(mut self, downsample: i32) -> Self {
        self.config.encode.downsample = downsample;
        self
    }

    /// Replaces all four encoder parameters at once
    pub fn encode(mut self, encode: EncodeParams) -> Self {
        self.config.encode = encode;
        self
    }

    /// Sets the number of frames to capture
    pub fn frame_count(mut self, frame_count: u32) -> Self {
        self.config.frame_count = frame_count;
        self
    }

    /// Sets the output directory
    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = output_dir.into();
        self
    }

    /// Sets the pipe read size
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Sets the exit-status policy
    pub fn exit_policy(mut self, exit_policy: ExitPolicy) -> Self {
        self.config.exit_policy = exit_policy;
        self
    }

    /// Sets a per-frame timeout
    pub fn frame_timeout(mut self, frame_timeout: Option<Duration>) -> Self {
        self.config.frame_timeout = frame_timeout;
        self
    }

    /// Validates and returns the config
    pub fn build(self) -> BenchResult<RunConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// A frame file written by one iteration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameArtifact {
    /// Zero-based iteration index
    pub index: u32,
    /// File the bytes were written to
    pub path:  PathBuf,
    /// Number of bytes written
    pub bytes: u64,
}

/// Timing and outcome of one iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameTiming {
    /// Frame written by this iteration
    pub artifact:  FrameArtifact,
    /// Wall time from file open to child exit
    #[serde(with = "duration_secs")]
    pub duration:  Duration,
    /// Exit code of the capture command, `None` when killed by a signal
    pub exit_code: Option<i32>,
}

/// Aggregate result of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of frames captured
    pub frame_count: u32,
    /// Time between loop start and the last child exiting
    #[serde(with = "duration_secs")]
    pub elapsed:     Duration,
    /// Average frames per second over the whole run
    pub fps:         f64,
    /// Wall-clock time the loop started
    pub started_at:  DateTime<Utc>,
    /// Directory the frames were written to
    pub output_dir:  PathBuf,
    /// Per-iteration timings, in index order
    pub frames:      Vec<FrameTiming>,
}

impl RunSummary {
    /// Builds a summary, deriving FPS from the frame count and elapsed time
    pub fn new(
        frame_count: u32,
        elapsed: Duration,
        started_at: DateTime<Utc>,
        output_dir: PathBuf,
        frames: Vec<FrameTiming>,
    ) -> Self {
        Self {
            frame_count,
            elapsed,
            fps: frames_per_second(frame_count, elapsed),
            started_at,
            output_dir,
            frames,
        }
    }

    /// Total bytes written across all frames
    pub fn total_bytes(&self) -> u64 {
        self.frames.iter().map(|f| f.artifact.bytes).sum()
    }

    /// Number of frames whose capture command exited non-zero
    pub fn failed_exits(&self) -> usize {
        self.frames.iter().filter(|f| f.exit_code != Some(0)).count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Captured {} frames in {:.2} seconds, approx FPS = {:.2}",
            self.frame_count,
            self.elapsed.as_secs_f64(),
            self.fps
        )
    }
}

/// `frames / elapsed`, infinite when no measurable time passed
pub fn frames_per_second(frames: u32, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        return f64::INFINITY;
    }
    f64::from(frames) / secs
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_constants() {
        let config = RunConfig::default();
        assert_eq!(config.encode().width, 1080);
        assert_eq!(config.encode().height, 2376);
        assert_eq!(config.encode().quality, 60);
        assert_eq!(config.encode().downsample, 1);
        assert_eq!(config.frame_count(), 20);
        assert_eq!(config.output_dir(), Path::new("tmp_frames"));
        assert_eq!(config.chunk_size(), 8192);
        assert_eq!(config.exit_policy(), ExitPolicy::Ignore);
        assert!(config.frame_timeout().is_none());
    }

    #[test]
    fn test_frame_path_uses_index_and_extension() {
        let config = RunConfig::builder().output_dir("out").build().unwrap();
        assert_eq!(config.frame_path(0), PathBuf::from("out/0.jpg"));
        assert_eq!(config.frame_path(19), PathBuf::from("out/19.jpg"));
    }

    #[test]
    fn test_builder_rejects_zero_frames() {
        let err = RunConfig::builder().frame_count(0).build().unwrap_err();
        assert!(matches!(
            err,
            BenchError::InvalidParameter { ref parameter, .. } if parameter == "frame_count"
        ));
    }

    #[test]
    fn test_builder_rejects_zero_chunk() {
        let err = RunConfig::builder().chunk_size(0).build().unwrap_err();
        assert!(matches!(
            err,
            BenchError::InvalidParameter { ref parameter, .. } if parameter == "chunk_size"
        ));
    }

    #[test]
    fn test_builder_passes_negative_dimensions_through() {
        let config = RunConfig::builder()
            .width(-1)
            .height(-2)
            .quality(500)
            .downsample(3)
            .build()
            .unwrap();
        assert_eq!(config.encode().as_args(), ["-1", "-2", "500", "3"]);
    }

    #[test]
    fn test_summary_line_format() {
        let summary = RunSummary::new(
            20,
            Duration::from_millis(4000),
            Utc::now(),
            PathBuf::from("tmp_frames"),
            Vec::new(),
        );

        assert_eq!(summary.to_string(), "Captured 20 frames in 4.00 seconds, approx FPS = 5.00");
    }

    #[test]
    fn test_summary_line_rounds_to_two_places() {
        let summary =
            RunSummary::new(7, Duration::from_millis(3333), Utc::now(), PathBuf::new(), Vec::new());

        assert_eq!(summary.to_string(), "Captured 7 frames in 3.33 seconds, approx FPS = 2.10");
    }

    #[test]
    fn test_frames_per_second_zero_elapsed() {
        assert!(frames_per_second(3, Duration::ZERO).is_infinite());
        assert!((frames_per_second(5, Duration::from_millis(500)) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_counts() {
        let frame = |index: u32, bytes: u64, exit_code: Option<i32>| FrameTiming {
            artifact: FrameArtifact {
                index,
                path: PathBuf::from(format!("{index}.jpg")),
                bytes,
            },
            duration: Duration::from_millis(10),
            exit_code,
        };
        let summary = RunSummary::new(
            3,
            Duration::from_millis(30),
            Utc::now(),
            PathBuf::new(),
            vec![frame(0, 100, Some(0)), frame(1, 50, Some(1)), frame(2, 0, None)],
        );

        assert_eq!(summary.total_bytes(), 150);
        assert_eq!(summary.failed_exits(), 2);
    }

    #[test]
    fn test_summary_serializes_durations_as_seconds() {
        let summary = RunSummary::new(
            2,
            Duration::from_millis(1500),
            Utc::now(),
            PathBuf::from("f"),
            Vec::new(),
        );
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["frame_count"], 2);
        assert!((json["elapsed"].as_f64().unwrap() - 1.5).abs() < 1e-9);
        assert_eq!(json["output_dir"], "f");
    }

    #[test]
    fn test_exit_policy_serialization() {
        assert_eq!(serde_json::to_string(&ExitPolicy::Ignore).unwrap(), r#""ignore""#);
        assert_eq!(serde_json::to_string(&ExitPolicy::Strict).unwrap(), r#""strict""#);
    }
}
