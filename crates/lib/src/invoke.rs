//! Build invocation.
//!
//! Runs the build tool as a subprocess in the project directory and captures
//! its console output. Standard output and standard error share one pipe, so
//! the captured text keeps the order the tool wrote it in.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tracing::{debug, info};

use crate::decode::decode_console_output;
use crate::toolchain::Toolchain;

#[derive(Debug, Error)]
pub enum InvokeError {
  #[error("failed to run build tool {}: {source}", program.display())]
  Spawn { program: PathBuf, source: io::Error },

  #[error("failed to capture build tool output: {0}")]
  Capture(#[source] io::Error),
}

/// Result of a finished build-tool run.
#[derive(Debug)]
pub struct InvokeOutput {
  pub status: ExitStatus,
  /// Standard output and standard error interleaved as written, undecoded.
  pub output: Vec<u8>,
}

impl InvokeOutput {
  pub fn success(&self) -> bool {
    self.status.success()
  }

  /// Console output transcoded to UTF-8.
  pub fn decoded_output(&self) -> String {
    decode_console_output(&self.output)
  }
}

/// Run the build tool against `project_dir` and wait for it to exit.
///
/// There is no timeout. A non-zero exit is reported through
/// [`InvokeOutput::success`], not as an error; only failing to spawn the
/// process or to collect its output is an error.
pub async fn invoke(toolchain: &Toolchain, project_dir: &Path) -> Result<InvokeOutput, InvokeError> {
  let (mut reader, writer) = io::pipe().map_err(InvokeError::Capture)?;
  let writer_err = writer.try_clone().map_err(InvokeError::Capture)?;

  let mut command = toolchain.command(project_dir);
  command.stdin(Stdio::null()).stdout(writer).stderr(writer_err);

  debug!(program = %toolchain.program().display(), dir = %project_dir.display(), "spawning build tool");

  let mut child = command.spawn().map_err(|e| InvokeError::Spawn {
    program: toolchain.program().to_path_buf(),
    source: e,
  })?;
  // The command still owns the parent's write ends; the reader sees EOF only
  // once they are closed.
  drop(command);

  let capture = tokio::task::spawn_blocking(move || {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).map(|_| buf)
  });

  let (captured, status) = tokio::join!(capture, child.wait());
  let status = status.map_err(InvokeError::Capture)?;
  let output = captured
    .map_err(|e| InvokeError::Capture(io::Error::other(e)))?
    .map_err(InvokeError::Capture)?;

  info!(status = %status, bytes = output.len(), "build tool exited");

  Ok(InvokeOutput { status, output })
}
