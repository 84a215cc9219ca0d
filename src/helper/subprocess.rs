//! Helper subprocess execution.
//!
//! Runs the helper with:
//! - No shell interpretation (direct exec, or the fixed PowerShell launcher)
//! - The request bytes on stdin
//! - Captured stdout, inherited stderr
//! - The install directory as working directory

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{BridgeError, HelperErrorKind};

use super::HelperProgram;

/// Result of a helper run that exited successfully.
#[derive(Debug, Clone)]
pub struct HelperOutput {
    /// The exit status (always a success).
    pub status: ExitStatus,
    /// Everything the helper wrote to stdout.
    pub stdout: Vec<u8>,
}

/// Builder for a helper invocation.
pub struct HelperCommand {
    program: OsString,
    args: Vec<OsString>,
    current_dir: PathBuf,
    input: Vec<u8>,
}

impl HelperCommand {
    /// Create a builder for an arbitrary program run inside `current_dir`.
    pub fn new(program: impl Into<OsString>, current_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: current_dir.into(),
            input: Vec::new(),
        }
    }

    /// Create a builder for a discovered helper.
    pub fn for_helper(helper: &HelperProgram, install_dir: &Path) -> Self {
        Self::new(helper.program(), install_dir).args(helper.args())
    }

    /// Add arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Bytes written to the helper's stdin.
    pub fn input(mut self, input: &[u8]) -> Self {
        self.input = input.to_vec();
        self
    }

    fn display_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Run the helper to completion.
    ///
    /// Stdin is fed while stdout is drained, and the exit status is only
    /// collected once stdout reaches EOF, so a helper that writes more than a
    /// pipe buffer before reading its input cannot deadlock the exchange.
    /// No timeout is applied.
    pub async fn run(self) -> Result<HelperOutput, BridgeError> {
        let name = self.display_name();
        debug!(
            program = %name,
            args = ?self.args,
            cwd = %self.current_dir.display(),
            input_bytes = self.input.len(),
            "Executing helper"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.current_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BridgeError::Helper {
                kind: HelperErrorKind::SpawnFailed {
                    program: name.clone(),
                    message: e.to_string(),
                },
            })?;

        let start = Instant::now();
        let io_error = |e: std::io::Error| BridgeError::Helper {
            kind: HelperErrorKind::Io {
                program: name.clone(),
                message: e.to_string(),
            },
        };

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io_error(std::io::Error::other("stdin not captured")))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| io_error(std::io::Error::other("stdout not captured")))?;

        let input = &self.input;
        let feed = async move {
            let result = stdin.write_all(input).await;
            // Closing stdin signals end of request
            drop(stdin);
            match result {
                // The helper may answer without reading its input
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };
        let drain = async move {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).await.map(|_| buf)
        };

        let (fed, drained) = tokio::join!(feed, drain);

        let stdout = match drained {
            Ok(buf) => buf,
            Err(e) => {
                warn!(program = %name, error = %e, "Failed to read helper output, killing");
                if let Err(kill_err) = child.kill().await {
                    warn!(error = %kill_err, "Failed to kill helper");
                }
                return Err(io_error(e));
            }
        };

        let status = child.wait().await.map_err(io_error)?;

        debug!(
            success = status.success(),
            exit_code = ?status.code(),
            stdout_bytes = stdout.len(),
            duration_ms = start.elapsed().as_millis(),
            "Helper completed"
        );

        if !status.success() {
            return Err(BridgeError::Helper {
                kind: HelperErrorKind::Failed {
                    program: name.clone(),
                    status,
                },
            });
        }

        fed.map_err(io_error)?;

        Ok(HelperOutput { status, stdout })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_cat_echoes_input() {
        let dir = TempDir::new().unwrap();
        let output = HelperCommand::new("cat", dir.path())
            .input(b"hello helper")
            .run()
            .await
            .unwrap();

        assert!(output.status.success());
        assert_eq!(output.stdout, b"hello helper");
    }

    #[tokio::test]
    async fn test_runs_in_current_dir() {
        let dir = TempDir::new().unwrap();
        let output = HelperCommand::new("sh", dir.path())
            .args(["-c", "pwd -P"])
            .run()
            .await
            .unwrap();

        let reported = String::from_utf8(output.stdout).unwrap();
        assert_eq!(
            PathBuf::from(reported.trim()),
            dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let dir = TempDir::new().unwrap();
        let result = HelperCommand::new("sh", dir.path())
            .args(["-c", "exit 3"])
            .run()
            .await;

        match result {
            Err(BridgeError::Helper {
                kind: HelperErrorKind::Failed { status, .. },
            }) => assert_eq!(status.code(), Some(3)),
            other => panic!("expected helper failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_nonexistent_program() {
        let dir = TempDir::new().unwrap();
        let result = HelperCommand::new("nonexistent_helper_12345", dir.path())
            .run()
            .await;

        assert!(matches!(
            result,
            Err(BridgeError::Helper {
                kind: HelperErrorKind::SpawnFailed { .. }
            })
        ));
    }

    #[tokio::test]
    async fn test_helper_ignoring_stdin() {
        let dir = TempDir::new().unwrap();
        let input = vec![b'x'; 1024 * 1024];
        let output = HelperCommand::new("sh", dir.path())
            .args(["-c", "echo done"])
            .input(&input)
            .run()
            .await
            .unwrap();

        assert_eq!(output.stdout, b"done\n");
    }

    #[tokio::test]
    async fn test_large_output_does_not_deadlock() {
        let dir = TempDir::new().unwrap();
        // Writes well past a pipe buffer before touching stdin
        let output = HelperCommand::new("sh", dir.path())
            .args(["-c", "head -c 1000000 /dev/zero; cat > /dev/null"])
            .input(&vec![b'y'; 512 * 1024])
            .run()
            .await
            .unwrap();

        assert_eq!(output.stdout.len(), 1_000_000);
    }
}
