//! Frame sources for the capture benchmark
//!
//! A [`FrameSource`] launches one capture per frame index and hands back a
//! [`FrameStream`]: the bytes of the encoded frame plus a way to wait for the
//! producer to finish. Implementations:
//!
//! - [`AdbSource`]: runs `screencap | <encoder>` on the device through
//!   `adb exec-out`
//! - [`ShellSource`]: runs an arbitrary local command line through the shell
//! - [`MockSource`]: in-process producer for tests

use std::{fmt, io, process::Stdio};

use async_trait::async_trait;
use tokio::{
    io::AsyncRead,
    process::{Child, Command},
};

use crate::error::{BenchError, BenchResult};

pub mod adb;
pub mod mock;
pub mod shell;

pub use adb::AdbSource;
pub use mock::MockSource;
pub use shell::ShellSource;

/// Something that can produce one encoded frame per call
///
/// The benchmark calls [`spawn`](FrameSource::spawn) once per iteration and
/// drains the returned stream to end-of-file before waiting on it. It never
/// holds two streams at once.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Starts producing the frame with the given zero-based index.
    async fn spawn(&self, index: u32) -> BenchResult<FrameStream>;

    /// Human-readable description used in logs and reports.
    fn describe(&self) -> String;
}

/// Exit information of a finished producer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Process exit code, `None` when it was terminated by a signal
    pub code: Option<i32>,
}

impl ExitOutcome {
    /// A successful exit
    pub fn success() -> Self {
        Self { code: Some(0) }
    }

    /// An exit with the given code
    pub fn with_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Whether the producer exited with status zero
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

enum Waiter {
    Child(Child),
    Finished(ExitOutcome),
}

/// The byte stream of one frame and the handle used to wait for its producer
pub struct FrameStream {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    waiter: Waiter,
}

impl FrameStream {
    /// Wraps a spawned child whose stdout was piped
    pub fn from_child(mut child: Child, program: &str) -> BenchResult<Self> {
        let stdout = child.stdout.take().ok_or_else(|| BenchError::SpawnFailed {
            program: program.to_string(),
            source:  io::Error::other("child stdout was not piped"),
        })?;

        Ok(Self {
            reader: Box::new(stdout),
            waiter: Waiter::Child(child),
        })
    }

    /// Wraps an in-memory reader whose producer has already finished
    pub fn from_reader(
        reader: impl AsyncRead + Send + Unpin + 'static,
        outcome: ExitOutcome,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            waiter: Waiter::Finished(outcome),
        }
    }

    /// The frame bytes
    pub fn reader_mut(&mut self) -> &mut (dyn AsyncRead + Send + Unpin) {
        self.reader.as_mut()
    }

    /// Closes the read side and waits for the producer to exit
    pub async fn wait(self) -> io::Result<ExitOutcome> {
        let Self { reader, waiter } = self;
        drop(reader);

        match waiter {
            Waiter::Child(mut child) => {
                let status = child.wait().await?;
                Ok(ExitOutcome {
                    code: status.code(),
                })
            }
            Waiter::Finished(outcome) => Ok(outcome),
        }
    }
}

impl fmt::Debug for FrameStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let waiter = match &self.waiter {
            Waiter::Child(child) => format!("Child({:?})", child.id()),
            Waiter::Finished(outcome) => format!("Finished({outcome:?})"),
        };
        f.debug_struct("FrameStream").field("waiter", &waiter).finish_non_exhaustive()
    }
}

/// Spawns `command` with stdout piped, stdin closed and stderr inherited
///
/// The child is killed if its handle is dropped before it was waited on, so
/// an aborted iteration does not leave a capture running.
pub(crate) fn spawn_piped(mut command: Command, program: &str) -> BenchResult<FrameStream> {
    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| BenchError::SpawnFailed {
            program: program.to_string(),
            source,
        })?;

    FrameStream::from_child(child, program)
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[test]
    fn test_exit_outcome_success() {
        assert!(ExitOutcome::success().is_success());
        assert!(!ExitOutcome::with_code(1).is_success());
        assert!(!ExitOutcome { code: None }.is_success());
    }

    #[tokio::test]
    async fn test_frame_stream_from_reader() {
        let reader = std::io::Cursor::new(b"jpeg".to_vec());
        let mut stream = FrameStream::from_reader(reader, ExitOutcome::with_code(3));

        let mut buf = Vec::new();
        stream.reader_mut().read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"jpeg");

        let outcome = stream.wait().await.unwrap();
        assert_eq!(outcome.code, Some(3));
    }

    #[tokio::test]
    async fn test_spawn_piped_missing_program() {
        let command = Command::new("capture-fps-definitely-missing-binary");
        let err = spawn_piped(command, "capture-fps-definitely-missing-binary").unwrap_err();

        assert!(matches!(err, BenchError::SpawnFailed { .. }));
    }
}
