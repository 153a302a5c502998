//! Mock frame source for testing
//!
//! [`MockSource`] produces frames in-process, without adb or a device. It
//! supports the knobs the benchmark tests need:
//!
//! - **Payloads:** a fixed byte pattern per index, or a custom generator
//! - **Configurable Delay:** sleep before each frame to simulate capture time
//! - **Exit Codes:** report a non-zero exit for every frame or a single index
//! - **Spawn Failures:** fail to start the producer at a given index
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use capture_fps::capture::{FrameSource, mock::MockSource};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = MockSource::new().with_delay(Duration::from_millis(10));
//!     let stream = source.spawn(0).await.unwrap();
//!     assert!(stream.wait().await.unwrap().is_success());
//!     assert_eq!(source.calls(), vec![0]);
//! }
//! ```

use std::{
    fmt, io,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::sleep;

use super::{ExitOutcome, FrameSource, FrameStream};
use crate::error::{BenchError, BenchResult};

type PayloadFn = dyn Fn(u32) -> Vec<u8> + Send + Sync;

/// In-process frame producer for tests
///
/// `MockSource` is thread-safe; the call log sits behind a mutex so it can
/// be shared through `Arc`.
#[derive(Clone)]
pub struct MockSource {
    /// Optional delay applied before each frame
    delay:         Option<Duration>,
    /// Exit code reported for every frame
    exit_code:     i32,
    /// Exit code override for a single index
    exit_override: Option<(u32, i32)>,
    /// Index at which spawning fails
    fail_at:       Option<u32>,
    /// Frame bytes by index
    payload:       Arc<PayloadFn>,
    /// Indices passed to `spawn`, in call order
    calls:         Arc<Mutex<Vec<u32>>>,
}

impl MockSource {
    /// Creates a mock whose frame `i` is [`MockSource::default_payload`]`(i)`
    pub fn new() -> Self {
        Self {
            delay:         None,
            exit_code:     0,
            exit_override: None,
            fail_at:       None,
            payload:       Arc::new(Self::default_payload),
            calls:         Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// JPEG start-of-image marker followed by a per-index tag
    pub fn default_payload(index: u32) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF];
        bytes.extend_from_slice(format!("mock-frame-{index}").as_bytes());
        bytes.extend_from_slice(&[0xFF, 0xD9]);
        bytes
    }

    /// Sleeps for `delay` before returning each frame
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Uses a custom payload generator
    pub fn with_payload<F>(mut self, payload: F) -> Self
    where
        F: Fn(u32) -> Vec<u8> + Send + Sync + 'static,
    {
        self.payload = Arc::new(payload);
        self
    }

    /// Reports `code` as the exit code of every frame
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Reports `code` as the exit code of frame `index` only
    pub fn with_exit_code_at(mut self, index: u32, code: i32) -> Self {
        self.exit_override = Some((index, code));
        self
    }

    /// Fails to spawn the producer for frame `index`
    pub fn with_spawn_failure_at(mut self, index: u32) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Indices requested so far
    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn exit_code_for(&self, index: u32) -> i32 {
        match self.exit_override {
            Some((at, code)) if at == index => code,
            _ => self.exit_code,
        }
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSource")
            .field("delay", &self.delay)
            .field("exit_code", &self.exit_code)
            .field("exit_override", &self.exit_override)
            .field("fail_at", &self.fail_at)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FrameSource for MockSource {
    async fn spawn(&self, index: u32) -> BenchResult<FrameStream> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(index);
        }

        if self.fail_at == Some(index) {
            return Err(BenchError::SpawnFailed {
                program: "mock".to_string(),
                source:  io::Error::new(io::ErrorKind::NotFound, "injected spawn failure"),
            });
        }

        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        let bytes = (self.payload)(index);
        Ok(FrameStream::from_reader(
            io::Cursor::new(bytes),
            ExitOutcome::with_code(self.exit_code_for(index)),
        ))
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
