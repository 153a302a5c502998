//! adb-backed frame source
//!
//! Each frame runs `screencap | <encoder> <mode> W H Q D` on the device. The
//! pipeline is handed to `adb exec-out` as a single argument so both stages
//! run on the device and only the encoded JPEG crosses the transport:
//!
//! ```text
//! adb [-s SERIAL] exec-out "screencap | /data/local/tmp/png2jpg r 1080 2376 60 1"
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{FrameSource, FrameStream, spawn_piped};
use crate::{error::BenchResult, model::EncodeParams};

/// Default adb executable, resolved through PATH
pub const DEFAULT_ADB: &str = "adb";
/// Default location of the encoder on the device
pub const DEFAULT_ENCODER: &str = "/data/local/tmp/png2jpg";
/// Encoder mode argument: read PNG from stdin, write JPEG to stdout
pub const DEFAULT_ENCODER_MODE: &str = "r";

/// Captures frames from an Android device over adb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdbSource {
    adb:          PathBuf,
    serial:       Option<String>,
    encoder:      String,
    encoder_mode: String,
    params:       EncodeParams,
}

impl AdbSource {
    /// Creates a source using `adb` from PATH and the default encoder path
    pub fn new(params: EncodeParams) -> Self {
        Self {
            adb: PathBuf::from(DEFAULT_ADB),
            serial: None,
            encoder: DEFAULT_ENCODER.to_string(),
            encoder_mode: DEFAULT_ENCODER_MODE.to_string(),
            params,
        }
    }

    /// Uses a specific adb binary
    pub fn with_adb(mut self, adb: impl Into<PathBuf>) -> Self {
        self.adb = adb.into();
        self
    }

    /// Targets a specific device (`adb -s SERIAL`)
    pub fn with_serial(mut self, serial: Option<String>) -> Self {
        self.serial = serial;
        self
    }

    /// Uses a different encoder path on the device
    pub fn with_encoder(mut self, encoder: impl Into<String>) -> Self {
        self.encoder = encoder.into();
        self
    }

    /// Uses a different encoder mode argument
    pub fn with_encoder_mode(mut self, mode: impl Into<String>) -> Self {
        self.encoder_mode = mode.into();
        self
    }

    /// The pipeline executed on the device
    pub fn remote_command(&self) -> String {
        let [width, height, quality, downsample] = self.params.as_args();
        format!(
            "screencap | {} {} {width} {height} {quality} {downsample}",
            self.encoder, self.encoder_mode
        )
    }

    /// Arguments passed to the adb binary
    pub fn adb_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(4);
        if let Some(serial) = &self.serial {
            args.push("-s".to_string());
            args.push(serial.clone());
        }
        args.push("exec-out".to_string());
        args.push(self.remote_command());
        args
    }

    fn program(&self) -> String {
        self.adb.display().to_string()
    }
}

#[async_trait]
impl FrameSource for AdbSource {
    async fn spawn(&self, index: u32) -> BenchResult<FrameStream> {
        let args = self.adb_args();
        debug!(index, adb = %self.program(), ?args, "spawning adb capture");

        let mut command = Command::new(&self.adb);
        command.args(&args);
        spawn_piped(command, &self.program())
    }

    fn describe(&self) -> String {
        match &self.serial {
            Some(serial) => format!("adb -s {serial} exec-out \"{}\"", self.remote_command()),
            None => format!("adb exec-out \"{}\"", self.remote_command()),
        }
    }
}
