//! Error types for capture benchmark runs
//!
//! Every failure the benchmark can hit maps to a [`BenchError`] variant. Each
//! variant carries the frame index or path involved and offers an actionable
//! remediation hint through [`BenchError::remediation_hint`].

use std::path::PathBuf;

/// Result type alias for benchmark operations
pub type BenchResult<T> = Result<T, BenchError>;

/// Error type for capture benchmark runs
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// The capture command could not be started
    #[error("Failed to spawn '{program}': {source}")]
    SpawnFailed {
        /// Program that failed to launch
        program: String,
        /// Underlying launch error
        #[source]
        source:  std::io::Error,
    },

    /// Output directory could not be created
    #[error("Failed to create output directory {path:?}: {source}")]
    OutputDir {
        /// Directory that could not be created
        path:   PathBuf,
        /// Underlying filesystem error
        #[source]
        source: std::io::Error,
    },

    /// Frame file could not be opened or written
    #[error("Failed to write frame {index} to {path:?}: {source}")]
    FrameWrite {
        /// Zero-based frame index
        index:  u32,
        /// Destination file
        path:   PathBuf,
        /// Underlying filesystem error
        #[source]
        source: std::io::Error,
    },

    /// Reading the capture pipe failed
    #[error("Failed to read capture output for frame {index}: {source}")]
    StreamRead {
        /// Zero-based frame index
        index:  u32,
        /// Underlying pipe error
        #[source]
        source: std::io::Error,
    },

    /// Capture command exited unsuccessfully (strict mode only)
    #[error("Capture for frame {index} exited with {}", describe_code(.code))]
    CaptureFailed {
        /// Zero-based frame index
        index: u32,
        /// Exit code, `None` when terminated by a signal
        code:  Option<i32>,
    },

    /// Capture command produced no bytes (strict mode only)
    #[error("Capture for frame {index} produced no data")]
    EmptyFrame {
        /// Zero-based frame index
        index: u32,
    },

    /// A single frame exceeded the configured timeout
    #[error("Capture for frame {index} timed out after {duration_ms}ms")]
    CaptureTimeout {
        /// Zero-based frame index
        index:       u32,
        /// Timeout duration in milliseconds
        duration_ms: u64,
    },

    /// Invalid parameter provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: String,
        /// Reason why it's invalid
        reason:    String,
    },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Returns a short explanation for exit codes of the on-device encoder.
///
/// The encoder reports 2 when stdin was empty, 5 when the PNG could not be
/// decoded, 6 when the JPEG could not be written and 7 for an unsupported
/// downsample factor. adb itself exits with 1 when no device is reachable.
pub fn encoder_exit_hint(code: i32) -> Option<&'static str> {
    match code {
        1 => Some("adb or the remote shell failed; check `adb devices` and the encoder path"),
        2 => Some("encoder received no data; screencap produced nothing"),
        5 => Some("encoder could not decode the screencap PNG"),
        6 => Some("encoder failed to write the JPEG output"),
        7 => Some("unsupported downsample factor; the encoder accepts 1, 2 or 4"),
        127 => Some("command not found; check the adb or encoder path"),
        _ => None,
    }
}

impl BenchError {
    /// Returns an actionable remediation hint for this error
    ///
    /// # Examples
    ///
    /// ```
    /// use capture_fps::error::BenchError;
    ///
    /// let error = BenchError::EmptyFrame { index: 3 };
    /// assert!(error.remediation_hint().contains("screencap"));
    /// ```
    pub fn remediation_hint(&self) -> &str {
        match self {
            BenchError::SpawnFailed { .. } => {
                "Could not launch the capture command. Ensure adb is installed and on PATH, or \
                 pass --adb with the full path to the binary."
            }
            BenchError::OutputDir { .. } => {
                "Check that the output directory path is writable and not an existing file."
            }
            BenchError::FrameWrite { .. } => {
                "Writing a frame file failed. Check file permissions and free disk space in the \
                 output directory."
            }
            BenchError::StreamRead { .. } => {
                "The capture pipe broke mid-frame. The device may have disconnected; check \
                 `adb devices` and the USB connection."
            }
            BenchError::CaptureFailed { code, .. } => code
                .and_then(encoder_exit_hint)
                .unwrap_or(
                    "The capture pipeline exited unsuccessfully. Run the remote command by hand \
                     with `adb exec-out` to see its stderr, or drop --strict to ignore exit \
                     status.",
                ),
            BenchError::EmptyFrame { .. } => {
                "The capture produced zero bytes. Verify that screencap works on the device and \
                 that the encoder is pushed to the configured path and executable."
            }
            BenchError::CaptureTimeout { .. } => {
                "A frame took longer than --frame-timeout. The device may be locked or the \
                 transport stalled; raise the timeout or reconnect the device."
            }
            BenchError::InvalidParameter { parameter, .. } => match parameter.as_str() {
                "frame_count" => "Frame count must be at least 1.",
                "chunk_size" => "Chunk size must be at least 1 byte.",
                _ => "Check the parameter value against --help.",
            },
            BenchError::IoError(_) => {
                "An I/O error occurred. Check file permissions, disk space, and system resources."
            }
        }
    }

    /// Whether a fresh attempt could plausibly succeed
    ///
    /// Informational only; the benchmark never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BenchError::StreamRead { .. }
                | BenchError::CaptureTimeout { .. }
                | BenchError::CaptureFailed { .. }
                | BenchError::EmptyFrame { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_failed_message() {
        let error = BenchError::SpawnFailed {
            program: "adb".to_string(),
            source:  std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };

        let msg = error.to_string();
        assert!(msg.contains("Failed to spawn"));
        assert!(msg.contains("adb"));
        assert!(error.remediation_hint().contains("PATH"));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_capture_failed_uses_encoder_hint() {
        let error = BenchError::CaptureFailed {
            index: 4,
            code:  Some(7),
        };

        let msg = error.to_string();
        assert!(msg.contains("frame 4"));
        assert!(msg.contains("status 7"));
        assert!(error.remediation_hint().contains("1, 2 or 4"));
        assert!(error.is_retryable());
    }

    #[test]
    fn test_capture_failed_unknown_code_falls_back() {
        let error = BenchError::CaptureFailed {
            index: 0,
            code:  Some(42),
        };

        assert!(error.remediation_hint().contains("--strict"));
    }

    #[test]
    fn test_capture_failed_signal() {
        let error = BenchError::CaptureFailed {
            index: 2,
            code:  None,
        };

        assert!(error.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_capture_timeout_message() {
        let error = BenchError::CaptureTimeout {
            index:       1,
            duration_ms: 5000,
        };

        let msg = error.to_string();
        assert!(msg.contains("timed out"));
        assert!(msg.contains("5000"));
        assert!(error.remediation_hint().contains("--frame-timeout"));
    }

    #[test]
    fn test_invalid_parameter_frame_count() {
        let error = BenchError::InvalidParameter {
            parameter: "frame_count".to_string(),
            reason:    "must be greater than zero".to_string(),
        };

        assert!(error.to_string().contains("frame_count"));
        assert!(error.remediation_hint().contains("at least 1"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error: BenchError = io_error.into();

        assert!(error.to_string().contains("I/O error"));
        assert!(error.remediation_hint().contains("disk space"));
    }

    #[test]
    fn test_encoder_exit_hint_known_codes() {
        assert!(encoder_exit_hint(2).is_some());
        assert!(encoder_exit_hint(5).is_some());
        assert!(encoder_exit_hint(6).is_some());
        assert!(encoder_exit_hint(0).is_none());
        assert!(encoder_exit_hint(99).is_none());
    }
}
