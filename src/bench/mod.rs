//! Capture-loop benchmark
//!
//! [`run_benchmark`] captures `frame_count` frames one after another. For
//! each index it opens `{output_dir}/{index}.jpg` (truncating), spawns the
//! capture, copies the producer's output into the file in fixed-size chunks
//! until end-of-stream, and waits for the producer to exit before starting
//! the next index. Elapsed time covers the whole loop; FPS is
//! `frame_count / elapsed`.
//!
//! Under [`ExitPolicy::Ignore`] the producer's exit status is only logged.
//! Under [`ExitPolicy::Strict`] a non-zero exit or an empty frame aborts the
//! run. Any other failure aborts the run in both modes; frames written
//! before the failure stay on disk.

use std::{path::Path, time::Instant};

use chrono::Utc;
use tokio::{fs, fs::File, io::AsyncWriteExt, time::timeout};
use tracing::{debug, info, warn};

use crate::{
    capture::{ExitOutcome, FrameSource},
    error::{BenchError, BenchResult, encoder_exit_hint},
    model::{ExitPolicy, FrameArtifact, FrameTiming, RunConfig, RunSummary},
    perf::measure_operation,
    util::sink::{CopyError, copy_chunked},
};

/// Runs the benchmark described by `config` against `source`
///
/// Creates the output directory (and missing parents) before timing starts.
/// Existing files in it are left alone except for the `{index}.jpg` files
/// this run writes.
pub async fn run_benchmark<S>(config: &RunConfig, source: &S) -> BenchResult<RunSummary>
where
    S: FrameSource + ?Sized,
{
    config.validate()?;

    let output_dir = config.output_dir();
    fs::create_dir_all(output_dir)
        .await
        .map_err(|source| BenchError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

    info!(
        frames = config.frame_count(),
        source = %source.describe(),
        output_dir = %output_dir.display(),
        policy = ?config.exit_policy(),
        "starting capture benchmark"
    );

    let started_at = Utc::now();
    let start = Instant::now();
    let mut frames = Vec::with_capacity(config.frame_count() as usize);

    for index in 0..config.frame_count() {
        let label = format!("frame {index}");
        let ((artifact, outcome), timing) =
            measure_operation(&label, capture_frame(config, source, index)).await?;

        debug!(
            index,
            bytes = artifact.bytes,
            exit_code = ?outcome.code,
            duration_ms = timing.duration_ms() as u64,
            "frame captured"
        );

        frames.push(FrameTiming {
            artifact,
            duration: timing.duration,
            exit_code: outcome.code,
        });
    }

    let elapsed = start.elapsed();
    let summary = RunSummary::new(
        config.frame_count(),
        elapsed,
        started_at,
        output_dir.to_path_buf(),
        frames,
    );

    info!(
        frames = summary.frame_count,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        fps = summary.fps,
        total_bytes = summary.total_bytes(),
        "capture benchmark finished"
    );

    Ok(summary)
}

/// One iteration: open, spawn, drain, wait, close
async fn capture_frame<S>(
    config: &RunConfig,
    source: &S,
    index: u32,
) -> BenchResult<(FrameArtifact, ExitOutcome)>
where
    S: FrameSource + ?Sized,
{
    let path = config.frame_path(index);
    let write_error = |source| BenchError::FrameWrite {
        index,
        path: path.clone(),
        source,
    };

    let mut file = File::create(&path).await.map_err(write_error)?;

    let drained = drain_frame(source, index, &mut file, &path, config.chunk_size());
    let (bytes, outcome) = match config.frame_timeout() {
        Some(limit) => timeout(limit, drained)
            .await
            .map_err(|_| BenchError::CaptureTimeout {
                index,
                duration_ms: limit.as_millis() as u64,
            })??,
        None => drained.await?,
    };

    file.flush().await.map_err(write_error)?;
    drop(file);

    check_outcome(config.exit_policy(), index, bytes, outcome)?;

    Ok((FrameArtifact { index, path, bytes }, outcome))
}

/// Spawns the producer, copies its output into `file` and waits for it
///
/// Dropping this future early (timeout) drops the child handle, which kills
/// the producer.
async fn drain_frame<S>(
    source: &S,
    index: u32,
    file: &mut File,
    path: &Path,
    chunk_size: usize,
) -> BenchResult<(u64, ExitOutcome)>
where
    S: FrameSource + ?Sized,
{
    let mut stream = source.spawn(index).await?;

    let bytes = copy_chunked(stream.reader_mut(), file, chunk_size)
        .await
        .map_err(|e| match e {
            CopyError::Read(source) => BenchError::StreamRead { index, source },
            CopyError::Write(source) => BenchError::FrameWrite {
                index,
                path: path.to_path_buf(),
                source,
            },
        })?;

    let outcome = stream.wait().await?;
    Ok((bytes, outcome))
}

fn check_outcome(
    policy: ExitPolicy,
    index: u32,
    bytes: u64,
    outcome: ExitOutcome,
) -> BenchResult<()> {
    match policy {
        ExitPolicy::Strict => {
            if !outcome.is_success() {
                return Err(BenchError::CaptureFailed {
                    index,
                    code: outcome.code,
                });
            }
            if bytes == 0 {
                return Err(BenchError::EmptyFrame { index });
            }
        }
        ExitPolicy::Ignore => {
            if !outcome.is_success() {
                let hint = outcome
                    .code
                    .and_then(encoder_exit_hint)
                    .unwrap_or("unknown failure");
                warn!(
                    index,
                    exit_code = ?outcome.code,
                    bytes,
                    hint,
                    "capture exited unsuccessfully"
                );
            } else if bytes == 0 {
                warn!(index, "capture produced no data");
            }
        }
    }
    Ok(())
}
