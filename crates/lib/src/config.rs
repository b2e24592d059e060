//! Service configuration.
//!
//! Every path derives from the directory holding the running executable:
//!
//! ```text
//! <program_dir>/resources         static UI files
//! <program_dir>/resources/maven   bundled Maven
//! <program_dir>/builds            per-request project trees
//! ```
//!
//! Each location can be overridden through the environment.

use std::io;
use std::path::{Path, PathBuf};

/// Overrides the resources directory (static files and bundled Maven).
pub const RESOURCES_DIR_VAR: &str = "REDSTONE_RESOURCES_DIR";
/// Overrides the workspace root where project trees are materialized.
pub const BUILD_DIR_VAR: &str = "REDSTONE_BUILD_DIR";
/// Overrides the Maven home directory.
pub const MAVEN_HOME_VAR: &str = "REDSTONE_MAVEN_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
  pub program_dir: PathBuf,
  pub resources_dir: PathBuf,
  /// Root of the static file server.
  pub static_dir: PathBuf,
  pub workspace_root: PathBuf,
  pub maven_home: PathBuf,
}

impl ServiceConfig {
  /// Configuration for the running executable, with environment overrides applied.
  pub fn current() -> io::Result<Self> {
    let exe = std::env::current_exe()?;
    let program_dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(Self::from_program_dir(program_dir))
  }

  /// Configuration rooted at `program_dir`, with environment overrides applied.
  pub fn from_program_dir(program_dir: impl Into<PathBuf>) -> Self {
    let program_dir = program_dir.into();

    let resources_dir = env_path(RESOURCES_DIR_VAR).unwrap_or_else(|| program_dir.join("resources"));
    let workspace_root = env_path(BUILD_DIR_VAR).unwrap_or_else(|| program_dir.join("builds"));
    let maven_home = env_path(MAVEN_HOME_VAR).unwrap_or_else(|| resources_dir.join("maven"));

    Self {
      static_dir: resources_dir.clone(),
      program_dir,
      resources_dir,
      workspace_root,
      maven_home,
    }
  }

  /// Point static files and the bundled Maven at a different resources directory.
  ///
  /// The Maven home follows unless it was overridden through the environment.
  pub fn with_resources_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    let dir = dir.into();
    if env_path(MAVEN_HOME_VAR).is_none() {
      self.maven_home = dir.join("maven");
    }
    self.static_dir = dir.clone();
    self.resources_dir = dir;
    self
  }

  pub fn with_workspace_root(mut self, dir: impl Into<PathBuf>) -> Self {
    self.workspace_root = dir.into();
    self
  }

  /// Create the workspace root if it does not exist.
  pub fn ensure_workspace(&self) -> io::Result<()> {
    std::fs::create_dir_all(&self.workspace_root)
  }
}

fn env_path(var: &str) -> Option<PathBuf> {
  std::env::var_os(var).filter(|v| !v.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
#[cfg(not(windows))]
mod tests {
  use super::*;
  use serial_test::serial;
  use temp_env::with_vars;
  use tempfile::TempDir;

  const NO_OVERRIDES: [(&str, Option<&str>); 3] = [
    (RESOURCES_DIR_VAR, None),
    (BUILD_DIR_VAR, None),
    (MAVEN_HOME_VAR, None),
  ];

  #[test]
  #[serial]
  fn defaults_derive_from_program_dir() {
    with_vars(NO_OVERRIDES, || {
      let config = ServiceConfig::from_program_dir("/opt/redstone");

      assert_eq!(config.resources_dir, PathBuf::from("/opt/redstone/resources"));
      assert_eq!(config.static_dir, PathBuf::from("/opt/redstone/resources"));
      assert_eq!(config.workspace_root, PathBuf::from("/opt/redstone/builds"));
      assert_eq!(config.maven_home, PathBuf::from("/opt/redstone/resources/maven"));
    });
  }

  #[test]
  #[serial]
  fn env_vars_override_defaults() {
    with_vars(
      [
        (RESOURCES_DIR_VAR, Some("/srv/res")),
        (BUILD_DIR_VAR, Some("/var/tmp/builds")),
        (MAVEN_HOME_VAR, None),
      ],
      || {
        let config = ServiceConfig::from_program_dir("/opt/redstone");

        assert_eq!(config.resources_dir, PathBuf::from("/srv/res"));
        assert_eq!(config.workspace_root, PathBuf::from("/var/tmp/builds"));
        assert_eq!(config.maven_home, PathBuf::from("/srv/res/maven"));
      },
    );
  }

  #[test]
  #[serial]
  fn maven_home_override_survives_resources_change() {
    with_vars(
      [
        (RESOURCES_DIR_VAR, None),
        (BUILD_DIR_VAR, None),
        (MAVEN_HOME_VAR, Some("/usr/share/maven")),
      ],
      || {
        let config = ServiceConfig::from_program_dir("/opt/redstone").with_resources_dir("/elsewhere");

        assert_eq!(config.static_dir, PathBuf::from("/elsewhere"));
        assert_eq!(config.maven_home, PathBuf::from("/usr/share/maven"));
      },
    );
  }

  #[test]
  #[serial]
  fn empty_env_var_is_ignored() {
    with_vars(
      [
        (RESOURCES_DIR_VAR, None),
        (BUILD_DIR_VAR, Some("")),
        (MAVEN_HOME_VAR, None),
      ],
      || {
        let config = ServiceConfig::from_program_dir("/opt/redstone");
        assert_eq!(config.workspace_root, PathBuf::from("/opt/redstone/builds"));
      },
    );
  }

  #[test]
  #[serial]
  fn ensure_workspace_creates_directory() {
    let temp = TempDir::new().unwrap();
    with_vars(NO_OVERRIDES, || {
      let config = ServiceConfig::from_program_dir(temp.path()).with_workspace_root(temp.path().join("a").join("b"));

      config.ensure_workspace().unwrap();

      assert!(config.workspace_root.is_dir());
    });
  }
}
