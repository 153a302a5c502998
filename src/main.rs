//! capture-fps: measure adb screen capture throughput
//!
//! Captures a fixed number of frames from a connected device, writes them to
//! `{output_dir}/{index}.jpg` and prints one summary line:
//!
//! ```text
//! Captured 20 frames in 4.12 seconds, approx FPS = 4.85
//! ```
//!
//! Logging goes to stderr and respects `RUST_LOG` (default
//! `capture_fps=info`).

use std::{path::PathBuf, process, time::Duration};

use anyhow::Result;
use capture_fps::{
    bench::run_benchmark,
    capture::{AdbSource, FrameSource, ShellSource, adb},
    model::{self, ExitPolicy, RunConfig},
    perf::{BenchReport, FpsThreshold, print_latency_summary},
};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "capture-fps")]
#[command(about = "Measure the frame rate of an adb screencap + encoder pipeline")]
#[command(version)]
struct Cli {
    /// Capture width passed to the encoder
    #[arg(long, default_value_t = model::DEFAULT_WIDTH, allow_negative_numbers = true)]
    width: i32,
    /// Capture height passed to the encoder
    #[arg(long, default_value_t = model::DEFAULT_HEIGHT, allow_negative_numbers = true)]
    height: i32,
    /// JPEG quality passed to the encoder
    #[arg(long, default_value_t = model::DEFAULT_QUALITY, allow_negative_numbers = true)]
    quality: i32,
    /// Downsample factor passed to the encoder (1, 2 or 4)
    #[arg(long, default_value_t = model::DEFAULT_DOWNSAMPLE, allow_negative_numbers = true)]
    downsample: i32,
    /// Number of frames to capture
    #[arg(short = 'n', long, default_value_t = model::DEFAULT_FRAME_COUNT)]
    frames: u32,
    /// Directory receiving the frame files
    #[arg(short, long, default_value = model::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
    /// Bytes requested per read from the capture pipe
    #[arg(long, default_value_t = model::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    /// adb executable
    #[arg(long, default_value = adb::DEFAULT_ADB)]
    adb: PathBuf,
    /// Device serial (adb -s)
    #[arg(short, long)]
    serial: Option<String>,
    /// Encoder path on the device
    #[arg(long, default_value = adb::DEFAULT_ENCODER)]
    encoder: String,
    /// Encoder mode argument
    #[arg(long, default_value = adb::DEFAULT_ENCODER_MODE)]
    encoder_mode: String,
    /// Run this local shell command per frame instead of adb
    #[arg(long, conflicts_with_all = ["serial", "adb"])]
    command: Option<String>,
    /// Fail on a non-zero exit status or an empty frame
    #[arg(long)]
    strict: bool,
    /// Per-frame timeout in seconds
    #[arg(long)]
    frame_timeout: Option<f64>,
    /// Exit with status 1 when the achieved FPS is below this value
    #[arg(long)]
    min_fps: Option<f64>,
    /// Print a JSON report instead of the summary line
    #[arg(long)]
    json: bool,
    /// Print per-frame latency statistics to stderr
    #[arg(long)]
    stats: bool,
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig> {
        let frame_timeout = self
            .frame_timeout
            .map(Duration::try_from_secs_f64)
            .transpose()
            .map_err(|e| anyhow::anyhow!("invalid --frame-timeout: {e}"))?;

        let config = RunConfig::builder()
            .width(self.width)
            .height(self.height)
            .quality(self.quality)
            .downsample(self.downsample)
            .frame_count(self.frames)
            .output_dir(&self.output_dir)
            .chunk_size(self.chunk_size)
            .exit_policy(if self.strict { ExitPolicy::Strict } else { ExitPolicy::Ignore })
            .frame_timeout(frame_timeout)
            .build()?;
        Ok(config)
    }

    fn threshold(&self) -> Result<Option<FpsThreshold>> {
        match self.min_fps {
            Some(min_fps) if !min_fps.is_finite() || min_fps < 0.0 => {
                anyhow::bail!("invalid --min-fps: expected a finite value >= 0, got {min_fps}")
            }
            min_fps => Ok(min_fps.map(FpsThreshold::new)),
        }
    }

    fn source(&self, config: &RunConfig) -> Box<dyn FrameSource> {
        match &self.command {
            Some(command_line) => {
                Box::new(ShellSource::new(command_line.clone(), *config.encode()))
            }
            None => Box::new(
                AdbSource::new(*config.encode())
                    .with_adb(&self.adb)
                    .with_serial(self.serial.clone())
                    .with_encoder(self.encoder.clone())
                    .with_encoder_mode(self.encoder_mode.clone()),
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    // Respects RUST_LOG environment variable
    // Default level: info
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("capture_fps=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.run_config()?;
    let threshold = cli.threshold()?;
    let source = cli.source(&config);

    let summary = match run_benchmark(&config, source.as_ref()).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("hint: {}", e.remediation_hint());
            return Err(e.into());
        }
    };

    if cli.json {
        let report = BenchReport::new(source.describe(), &summary, threshold);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{summary}");
    }

    if cli.stats {
        print_latency_summary(&summary);
    }

    if let Some(threshold) = threshold {
        if !threshold.check(summary.fps) {
            eprintln!(
                "FPS {:.2} is below the required minimum of {:.2}",
                summary.fps, threshold.min_fps
            );
            process::exit(1);
        }
    }

    Ok(())
}
