//! Performance measurement utilities for capture runs
//!
//! ## Key Components
//!
//! - [`measure_operation`]: Async timing with success tracking via [`TimingResult`]
//! - [`time_async`]: Simple async duration measurement
//! - [`LatencyStats`]: Min/mean/max and percentiles over per-frame durations
//! - [`FpsThreshold`]: Pass/fail check for the achieved frame rate
//! - [`BenchReport`]: Serializable report combining summary and statistics
//! - [`print_latency_summary`]: Human-readable latency table on stderr

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::model::RunSummary;

/// Minimum acceptable frame rate for a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsThreshold {
    /// Lowest FPS that still counts as a pass
    pub min_fps: f64,
}

impl FpsThreshold {
    /// Creates a threshold
    pub fn new(min_fps: f64) -> Self {
        Self { min_fps }
    }

    /// Checks if `fps` meets the threshold
    pub fn check(&self, fps: f64) -> bool {
        fps >= self.min_fps
    }
}

/// Distribution of per-frame capture durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    /// Fastest frame
    pub min:  Duration,
    /// Slowest frame
    pub max:  Duration,
    /// Arithmetic mean over all frames
    pub mean: Duration,
    /// Median (nearest rank)
    pub p50:  Duration,
    /// 95th percentile (nearest rank)
    pub p95:  Duration,
    /// 99th percentile (nearest rank)
    pub p99:  Duration,
}

impl LatencyStats {
    /// Computes statistics, or `None` for an empty input
    pub fn from_durations(durations: &[Duration]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }

        let mut sorted = durations.to_vec();
        sorted.sort();

        let total: Duration = sorted.iter().sum();
        let mean = total / sorted.len() as u32;

        Some(Self {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean,
            p50: calculate_percentile(&sorted, 50.0),
            p95: calculate_percentile(&sorted, 95.0),
            p99: calculate_percentile(&sorted, 99.0),
        })
    }

    /// Statistics over the frames of a finished run
    pub fn from_summary(summary: &RunSummary) -> Option<Self> {
        let durations: Vec<Duration> = summary.frames.iter().map(|f| f.duration).collect();
        Self::from_durations(&durations)
    }
}

/// Nearest-rank percentile over an ascending slice
pub fn calculate_percentile(sorted_durations: &[Duration], percentile: f64) -> Duration {
    if sorted_durations.is_empty() {
        return Duration::ZERO;
    }

    let index = (percentile / 100.0 * sorted_durations.len() as f64).ceil() as usize;
    let index = index.min(sorted_durations.len()).saturating_sub(1);
    sorted_durations[index]
}

/// Timing of a single measured operation
///
/// Returned by [`measure_operation`]. The benchmark loop records one per
/// frame, named `frame {index}`.
#[derive(Debug, Clone)]
pub struct TimingResult {
    /// Human-readable operation name
    pub operation: String,

    /// Elapsed duration of the operation
    pub duration: Duration,

    /// Whether the operation returned `Ok`
    pub success: bool,
}

impl TimingResult {
    /// Creates a new timing result
    pub fn new(operation: impl Into<String>, duration: Duration, success: bool) -> Self {
        Self {
            operation: operation.into(),
            duration,
            success,
        }
    }

    /// Returns duration in milliseconds
    pub fn duration_ms(&self) -> u128 {
        self.duration.as_millis()
    }

    /// Returns duration in seconds (floating point)
    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// Measures a fallible async operation
///
/// The timing is logged at trace level whether or not the operation
/// succeeds; on success it is returned alongside the value.
///
/// ## Example
///
/// ```ignore
/// use capture_fps::perf::measure_operation;
///
/// let (frame, timing) = measure_operation("frame 0", capture(0)).await?;
/// println!("Frame took {}ms", timing.duration_ms());
/// ```
pub async fn measure_operation<F, T, E>(
    operation_name: &str,
    operation: F,
) -> Result<(T, TimingResult), E>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let (result, duration) = time_async(operation).await;
    let timing = TimingResult::new(operation_name, duration, result.is_ok());

    tracing::trace!(
        operation = %timing.operation,
        duration_ms = timing.duration_ms() as u64,
        success = timing.success,
        "operation timed"
    );

    result.map(|value| (value, timing))
}

/// Measures the duration of an async operation
///
/// Unlike [`measure_operation`], this does not track success or failure.
///
/// ## Example
///
/// ```ignore
/// use capture_fps::perf::time_async;
///
/// let (result, duration) = time_async(async { expensive_computation().await }).await;
/// println!("Computation took {:.3}s", duration.as_secs_f64());
/// ```
pub async fn time_async<F, T>(operation: F) -> (T, Duration)
where
    F: std::future::Future<Output = T>,
{
    let start = Instant::now();
    let result = operation.await;
    let duration = start.elapsed();
    (result, duration)
}

/// Machine-readable run report printed by `--json`
///
/// Latency fields are whole milliseconds and are 0 when the run recorded no
/// frames. A non-finite `fps` (zero elapsed time) is written as the string
/// `"inf"` since JSON numbers cannot represent it.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    /// Description of the frame source (the command line for adb)
    pub source:        String,
    /// Frames captured
    pub frame_count:   u32,
    /// Wall-clock time of the capture loop in seconds
    pub elapsed_secs:  f64,
    /// `frame_count / elapsed_secs`
    #[serde(serialize_with = "serialize_fps")]
    pub fps:           f64,
    /// When the capture loop started
    pub started_at:    DateTime<Utc>,
    /// Directory holding the frame files
    pub output_dir:    String,
    /// Bytes written across all frames
    pub total_bytes:   u64,
    /// Frames whose producer exited unsuccessfully
    pub failed_exits:  usize,
    /// Fastest frame
    pub min_ms:        u128,
    /// Mean frame duration
    pub mean_ms:       u128,
    /// Median frame duration
    pub p50_ms:        u128,
    /// 95th percentile frame duration
    pub p95_ms:        u128,
    /// 99th percentile frame duration
    pub p99_ms:        u128,
    /// Slowest frame
    pub max_ms:        u128,
    /// Result of the `--min-fps` check, `None` when no threshold was given
    pub threshold_met: Option<bool>,
}

fn serialize_fps<S: Serializer>(fps: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if fps.is_finite() {
        serializer.serialize_f64(*fps)
    } else if fps.is_nan() {
        serializer.serialize_str("nan")
    } else if fps.is_sign_positive() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

impl BenchReport {
    /// Builds the report for a finished run
    pub fn new(
        source: impl Into<String>,
        summary: &RunSummary,
        threshold: Option<FpsThreshold>,
    ) -> Self {
        let stats = LatencyStats::from_summary(summary);
        let ms = |pick: fn(&LatencyStats) -> Duration| {
            stats.as_ref().map(|s| pick(s).as_millis()).unwrap_or(0)
        };

        Self {
            source:        source.into(),
            frame_count:   summary.frame_count,
            elapsed_secs:  summary.elapsed.as_secs_f64(),
            fps:           summary.fps,
            started_at:    summary.started_at,
            output_dir:    summary.output_dir.display().to_string(),
            total_bytes:   summary.total_bytes(),
            failed_exits:  summary.failed_exits(),
            min_ms:        ms(|s| s.min),
            mean_ms:       ms(|s| s.mean),
            p50_ms:        ms(|s| s.p50),
            p95_ms:        ms(|s| s.p95),
            p99_ms:        ms(|s| s.p99),
            max_ms:        ms(|s| s.max),
            threshold_met: threshold.map(|t| t.check(summary.fps)),
        }
    }
}

/// Prints per-frame latency statistics to stderr
///
/// Output format:
///
/// ```text
/// === Frame Latency ===
///   Frames: 20 (412.3 KiB, 0 non-zero exits)
///   Min: 180ms
///   ...
/// =====================
/// ```
pub fn print_latency_summary(summary: &RunSummary) {
    let Some(stats) = LatencyStats::from_summary(summary) else {
        return;
    };

    eprintln!("\n=== Frame Latency ===");
    eprintln!(
        "  Frames: {} ({:.1} KiB, {} non-zero exits)",
        summary.frames.len(),
        summary.total_bytes() as f64 / 1024.0,
        summary.failed_exits()
    );
    eprintln!("  Min: {}ms", stats.min.as_millis());
    eprintln!("  Mean: {}ms", stats.mean.as_millis());
    eprintln!("  P50: {}ms", stats.p50.as_millis());
    eprintln!("  P95: {}ms", stats.p95.as_millis());
    eprintln!("  P99: {}ms", stats.p99.as_millis());
    eprintln!("  Max: {}ms", stats.max.as_millis());
    eprintln!("=====================\n");
}
