//! Build-tool resolution.
//!
//! The build tool is resolved once at startup: a bundled Maven under the
//! resources directory is preferred, falling back to `mvn` on `PATH`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{info, warn};

use crate::consts::{BUILD_TOOL_ARGS, BUILD_TOOL_HOME_VAR};

/// Name used when falling back to the ambient search path.
const PATH_FALLBACK: &str = "mvn";

/// A resolved build-tool command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
  program: PathBuf,
  /// Arguments placed before the fixed build arguments.
  leading_args: Vec<OsString>,
  home: PathBuf,
}

impl Toolchain {
  /// Use an explicit program with the given tool home.
  pub fn new(program: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      leading_args: Vec::new(),
      home: home.into(),
    }
  }

  /// Run `program` through an interpreter, e.g. `cmd /c mvn.cmd` or `sh mvn`.
  pub fn interpreted(
    interpreter: impl Into<PathBuf>,
    interpreter_args: &[&str],
    program: &Path,
    home: impl Into<PathBuf>,
  ) -> Self {
    let mut leading_args: Vec<OsString> = interpreter_args.iter().map(OsString::from).collect();
    leading_args.push(program.as_os_str().to_owned());
    Self {
      program: interpreter.into(),
      leading_args,
      home: home.into(),
    }
  }

  /// Resolve the build tool for a Maven home directory.
  ///
  /// Prefers `<home>/bin/mvn` (`mvn.cmd`, then `mvn.bat` on Windows). On
  /// Unix a bundled binary missing its executable bit is repaired.
  pub fn resolve(home: &Path) -> Self {
    let bundled = bundled_candidates(&home.join("bin"))
      .into_iter()
      .find(|p| p.is_file());

    let Some(program) = bundled else {
      info!(home = %home.display(), "bundled Maven not found, using mvn from PATH");
      return Self::new(PATH_FALLBACK, home);
    };

    #[cfg(unix)]
    {
      match ensure_executable(&program) {
        Ok(true) => info!(path = %program.display(), "restored executable permission on bundled Maven"),
        Ok(false) => {}
        Err(e) => warn!(path = %program.display(), error = %e, "failed to make bundled Maven executable"),
      }
    }

    info!(path = %program.display(), "using bundled Maven");
    if is_batch_script(&program) {
      Self::interpreted("cmd", &["/c"], &program, home)
    } else {
      Self::new(program, home)
    }
  }

  pub fn program(&self) -> &Path {
    &self.program
  }

  pub fn home(&self) -> &Path {
    &self.home
  }

  pub fn leading_args(&self) -> &[OsString] {
    &self.leading_args
  }

  /// Build the package command for a project directory.
  pub fn command(&self, project_dir: &Path) -> Command {
    let mut command = Command::new(&self.program);
    command
      .args(&self.leading_args)
      .args(BUILD_TOOL_ARGS)
      .current_dir(project_dir)
      .env(BUILD_TOOL_HOME_VAR, &self.home);
    command
  }
}

/// Windows batch wrappers (`.cmd`/`.bat`) have to run via `cmd /c`.
fn is_batch_script(path: &Path) -> bool {
  cfg!(windows)
    && path
      .extension()
      .is_some_and(|ext| ext.eq_ignore_ascii_case("cmd") || ext.eq_ignore_ascii_case("bat"))
}

#[cfg(windows)]
fn bundled_candidates(bin: &Path) -> Vec<PathBuf> {
  vec![bin.join("mvn.cmd"), bin.join("mvn.bat")]
}

#[cfg(not(windows))]
fn bundled_candidates(bin: &Path) -> Vec<PathBuf> {
  vec![bin.join("mvn")]
}

/// Set `0o755` when no execute bit is present. Returns whether the mode changed.
#[cfg(unix)]
fn ensure_executable(path: &Path) -> std::io::Result<bool> {
  use std::os::unix::fs::PermissionsExt;

  let mode = std::fs::metadata(path)?.permissions().mode();
  if mode & 0o111 != 0 {
    return Ok(false);
  }

  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
  Ok(true)
}
