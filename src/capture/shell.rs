//! Shell-command frame source
//!
//! Runs an arbitrary command line through the platform shell once per frame
//! and treats its stdout as the frame. The frame index and encoder parameters
//! are exported as environment variables so the command can use them:
//! `FRAME_INDEX`, `FRAME_WIDTH`, `FRAME_HEIGHT`, `FRAME_QUALITY`,
//! `FRAME_DOWNSAMPLE`.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{FrameSource, FrameStream, spawn_piped};
use crate::{error::BenchResult, model::EncodeParams};

#[cfg(unix)]
const SHELL: (&str, &str) = ("sh", "-c");
#[cfg(windows)]
const SHELL: (&str, &str) = ("cmd", "/C");

/// Runs a local command line for every frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSource {
    command_line: String,
    params:       EncodeParams,
}

impl ShellSource {
    /// Creates a source for the given command line
    pub fn new(command_line: impl Into<String>, params: EncodeParams) -> Self {
        Self {
            command_line: command_line.into(),
            params,
        }
    }

    /// The command line run for every frame
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    fn command(&self, index: u32) -> Command {
        let (shell, flag) = SHELL;
        let [width, height, quality, downsample] = self.params.as_args();

        let mut command = Command::new(shell);
        command
            .arg(flag)
            .arg(&self.command_line)
            .env("FRAME_INDEX", index.to_string())
            .env("FRAME_WIDTH", width)
            .env("FRAME_HEIGHT", height)
            .env("FRAME_QUALITY", quality)
            .env("FRAME_DOWNSAMPLE", downsample);
        command
    }
}

#[async_trait]
impl FrameSource for ShellSource {
    async fn spawn(&self, index: u32) -> BenchResult<FrameStream> {
        debug!(index, command = %self.command_line, "spawning shell capture");
        spawn_piped(self.command(index), SHELL.0)
    }

    fn describe(&self) -> String {
        format!("{} {} \"{}\"", SHELL.0, SHELL.1, self.command_line)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    async fn run(source: &ShellSource, index: u32) -> (Vec<u8>, Option<i32>) {
        let mut stream = source.spawn(index).await.unwrap();
        let mut buf = Vec::new();
        stream.reader_mut().read_to_end(&mut buf).await.unwrap();
        let outcome = stream.wait().await.unwrap();
        (buf, outcome.code)
    }

    #[tokio::test]
    async fn test_shell_source_exports_frame_env() {
        let source = ShellSource::new(
            concat!(
                r#"printf '%s:%s:%s:%s:%s' "$FRAME_INDEX" "$FRAME_WIDTH" "$FRAME_HEIGHT" "#,
                r#""$FRAME_QUALITY" "$FRAME_DOWNSAMPLE""#,
            ),
            EncodeParams::default(),
        );

        let (bytes, code) = run(&source, 7).await;
        assert_eq!(bytes, b"7:1080:2376:60:1");
        assert_eq!(code, Some(0));
    }

    #[tokio::test]
    async fn test_shell_source_reports_exit_code() {
        let source = ShellSource::new("printf partial; exit 3", EncodeParams::default());

        let (bytes, code) = run(&source, 0).await;
        assert_eq!(bytes, b"partial");
        assert_eq!(code, Some(3));
    }

    #[test]
    fn test_describe_includes_command() {
        let source = ShellSource::new("cat frame.jpg", EncodeParams::default());
        assert_eq!(source.describe(), "sh -c \"cat frame.jpg\"");
        assert_eq!(source.command_line(), "cat frame.jpg");
    }
}
