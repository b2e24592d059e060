//! Build coordination.
//!
//! [`BuildCoordinator`] runs the materialize → build → select pipeline for
//! one request at a time. Requests wait on a single slot; there is no
//! queue ordering, priority or timeout.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use crate::artifact::{Artifact, ArtifactError, load_artifact};
use crate::config::ServiceConfig;
use crate::invoke::{InvokeError, invoke};
use crate::project::{ProjectError, cleanup, materialize};
use crate::request::BuildRequest;
use crate::toolchain::Toolchain;

/// Errors surfaced to the HTTP boundary.
#[derive(Debug, Error)]
pub enum BuildError {
  /// Bad method or unparsable payload. Raised before the slot is taken.
  #[error("invalid request: {0}")]
  InvalidRequest(String),

  /// Materializing the project tree failed.
  #[error(transparent)]
  Filesystem(#[from] ProjectError),

  /// The build tool could not be started.
  #[error(transparent)]
  ToolUnavailable(#[from] InvokeError),

  /// The build tool exited unsuccessfully. `output` is already transcoded.
  #[error("Maven build failed: {status}\n{output}")]
  BuildToolFailure { status: ExitStatus, output: String },

  /// The build reported success but left no archive behind.
  #[error("build succeeded but no jar artifact was found")]
  NoArtifact { dir: PathBuf },

  #[error("failed to read artifact {}: {source}", path.display())]
  ReadArtifact { path: PathBuf, source: std::io::Error },

  /// A blocking pipeline step panicked or was cancelled.
  #[error("build task failed: {0}")]
  TaskFailed(#[from] tokio::task::JoinError),
}

impl From<ArtifactError> for BuildError {
  fn from(err: ArtifactError) -> Self {
    match err {
      ArtifactError::NoArtifact { dir } => BuildError::NoArtifact { dir },
      ArtifactError::Read { path, source } => BuildError::ReadArtifact { path, source },
    }
  }
}

/// Pipeline position of the build currently holding the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
  Idle,
  Materializing,
  Building,
  Selecting,
  Streaming,
}

/// Owns the build slot, the workspace root and the resolved toolchain.
pub struct BuildCoordinator {
  workspace_root: PathBuf,
  toolchain: Toolchain,
  slot: Mutex<()>,
  phase: watch::Sender<BuildPhase>,
}

impl BuildCoordinator {
  pub fn new(workspace_root: impl Into<PathBuf>, toolchain: Toolchain) -> Self {
    let (phase, _) = watch::channel(BuildPhase::Idle);
    Self {
      workspace_root: workspace_root.into(),
      toolchain,
      slot: Mutex::new(()),
      phase,
    }
  }

  /// Resolve the toolchain from the configured Maven home.
  pub fn from_config(config: &ServiceConfig) -> Self {
    Self::new(&config.workspace_root, Toolchain::resolve(&config.maven_home))
  }

  pub fn workspace_root(&self) -> &Path {
    &self.workspace_root
  }

  pub fn toolchain(&self) -> &Toolchain {
    &self.toolchain
  }

  pub fn phase(&self) -> BuildPhase {
    *self.phase.borrow()
  }

  /// Observe phase transitions.
  pub fn subscribe(&self) -> watch::Receiver<BuildPhase> {
    self.phase.subscribe()
  }

  /// Build `request` and return the artifact bytes.
  ///
  /// Waits for any build in progress to finish first. On success the project
  /// tree is removed before the slot is released, so a following build with
  /// the same plugin name cannot race the removal. Failed trees are left in
  /// place and replaced by the next build with that name.
  pub async fn build(&self, request: &BuildRequest) -> Result<Artifact, BuildError> {
    let _slot = self.slot.lock().await;

    let result = self.run(request).await;
    self.phase.send_replace(BuildPhase::Idle);

    if let Err(e) = &result {
      warn!(plugin = %request.plugin_name, error = %e, "build failed");
    }
    result
  }

  async fn run(&self, request: &BuildRequest) -> Result<Artifact, BuildError> {
    self.phase.send_replace(BuildPhase::Materializing);
    let tree = {
      let request = request.clone();
      let workspace_root = self.workspace_root.clone();
      tokio::task::spawn_blocking(move || materialize(&request, &workspace_root)).await??
    };

    self.phase.send_replace(BuildPhase::Building);
    info!(plugin = %request.plugin_name, "running build tool");
    let output = invoke(&self.toolchain, &tree.root).await?;
    if !output.success() {
      return Err(BuildError::BuildToolFailure {
        status: output.status,
        output: output.decoded_output(),
      });
    }

    self.phase.send_replace(BuildPhase::Selecting);
    let artifact = load_artifact(&tree.root).await?;
    info!(
      plugin = %request.plugin_name,
      path = %artifact.path.display(),
      bytes = artifact.size(),
      "selected artifact"
    );

    self.phase.send_replace(BuildPhase::Streaming);
    cleanup(&tree.root).await;

    Ok(artifact)
  }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::testutil::{fake_toolchain, producing_toolchain};
  use tempfile::TempDir;

  fn request(name: &str) -> BuildRequest {
    BuildRequest {
      plugin_name: name.to_string(),
      package_name: "com.example".to_string(),
      main_class: "Main".to_string(),
      version: "1.0.0".to_string(),
      java_code: "public class Main {}".to_string(),
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn successful_build_returns_primary_artifact_and_cleans_up() {
    let temp = TempDir::new().unwrap();
    let toolchain = producing_toolchain(temp.path(), &["hello-1.0.jar", "hello-1.0-sources.jar"]);
    let workspace = temp.path().join("builds");
    let coordinator = BuildCoordinator::new(&workspace, toolchain);

    let artifact = coordinator.build(&request("Hello")).await.unwrap();

    assert_eq!(artifact.bytes, b"hello-1.0.jar");
    assert!(!workspace.join("Hello").exists(), "project tree should be removed");
    assert_eq!(coordinator.phase(), BuildPhase::Idle);
  }

  #[tokio::test]
  async fn tool_failure_carries_diagnostics_and_releases_slot() {
    let temp = TempDir::new().unwrap();
    let script = r#"
      if [ "$(basename "$PWD")" = "Broken" ]; then
        echo "[ERROR] cannot find symbol"
        exit 1
      fi
      mkdir -p target
      printf ok > target/ok.jar
    "#;
    let coordinator = BuildCoordinator::new(temp.path().join("builds"), fake_toolchain(temp.path(), script));

    let err = coordinator.build(&request("Broken")).await.unwrap_err();
    match &err {
      BuildError::BuildToolFailure { status, output } => {
        assert_eq!(status.code(), Some(1));
        assert!(output.contains("cannot find symbol"));
      }
      other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("Maven build failed"));

    let artifact = coordinator.build(&request("Working")).await.unwrap();
    assert_eq!(artifact.bytes, b"ok");
  }

  #[tokio::test]
  async fn missing_artifact_is_reported() {
    let temp = TempDir::new().unwrap();
    let coordinator = BuildCoordinator::new(temp.path().join("builds"), fake_toolchain(temp.path(), "exit 0"));

    let err = coordinator.build(&request("Empty")).await.unwrap_err();

    assert!(matches!(err, BuildError::NoArtifact { .. }));
    assert_eq!(coordinator.phase(), BuildPhase::Idle);
  }

  #[tokio::test]
  async fn repeat_build_never_sees_previous_output() {
    let temp = TempDir::new().unwrap();
    // Fails, leaving a stale jar, when config.yml is present; succeeds otherwise.
    let script = r#"
      mkdir -p target
      if [ -f src/main/resources/config.yml ]; then
        printf stale > target/a-stale.jar
        exit 1
      fi
      printf fresh > target/b-fresh.jar
    "#;
    let coordinator = BuildCoordinator::new(temp.path().join("builds"), fake_toolchain(temp.path(), script));

    let first = BuildRequest {
      config_yml: "x: 1".to_string(),
      ..request("Same")
    };
    assert!(coordinator.build(&first).await.is_err());

    let artifact = coordinator.build(&request("Same")).await.unwrap();

    assert_eq!(artifact.bytes, b"fresh");
  }

  #[tokio::test]
  async fn filesystem_failure_releases_slot() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("builds");
    std::fs::write(&blocker, b"").unwrap();
    let coordinator = BuildCoordinator::new(&blocker, producing_toolchain(temp.path(), &["x.jar"]));

    let err = coordinator.build(&request("Any")).await.unwrap_err();
    assert!(matches!(err, BuildError::Filesystem(_)));

    // The slot is free again: a second attempt fails the same way instead of hanging.
    let again = tokio::time::timeout(std::time::Duration::from_secs(5), coordinator.build(&request("Any"))).await;
    assert!(matches!(again, Ok(Err(BuildError::Filesystem(_)))));
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
  async fn concurrent_builds_run_serially() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("build.log");
    let script = format!(
      r#"
      name="$(basename "$PWD")"
      echo "start $name" >> '{log}'
      sleep 0.3
      echo "end $name" >> '{log}'
      mkdir -p target
      printf "$name" > target/out.jar
    "#,
      log = log.display()
    );
    let coordinator = Arc::new(BuildCoordinator::new(
      temp.path().join("builds"),
      fake_toolchain(temp.path(), &script),
    ));

    let a = {
      let c = Arc::clone(&coordinator);
      tokio::spawn(async move { c.build(&request("Alpha")).await })
    };
    let b = {
      let c = Arc::clone(&coordinator);
      tokio::spawn(async move { c.build(&request("Beta")).await })
    };

    assert_eq!(a.await.unwrap().unwrap().bytes, b"Alpha");
    assert_eq!(b.await.unwrap().unwrap().bytes, b"Beta");

    let lines: Vec<String> = std::fs::read_to_string(&log)
      .unwrap()
      .lines()
      .map(str::to_string)
      .collect();
    assert_eq!(lines.len(), 4);
    for pair in lines.chunks(2) {
      let started = pair[0].strip_prefix("start ").expect("expected a start line");
      let ended = pair[1].strip_prefix("end ").expect("expected an end line");
      assert_eq!(started, ended, "build phases overlapped: {lines:?}");
    }
  }

  #[tokio::test]
  async fn phases_are_published_in_order() {
    let temp = TempDir::new().unwrap();
    let coordinator = BuildCoordinator::new(temp.path().join("builds"), producing_toolchain(temp.path(), &["x.jar"]));
    let mut rx = coordinator.subscribe();

    let watcher = tokio::spawn(async move {
      let mut seen = Vec::new();
      while rx.changed().await.is_ok() {
        let phase = *rx.borrow_and_update();
        seen.push(phase);
        if phase == BuildPhase::Idle {
          break;
        }
      }
      seen
    });

    coordinator.build(&request("Phased")).await.unwrap();
    let seen = watcher.await.unwrap();

    // Updates may coalesce, but whatever is observed follows pipeline order.
    let order = [
      BuildPhase::Materializing,
      BuildPhase::Building,
      BuildPhase::Selecting,
      BuildPhase::Streaming,
      BuildPhase::Idle,
    ];
    let ranks: Vec<usize> = seen
      .iter()
      .map(|p| order.iter().position(|o| o == p).unwrap())
      .collect();
    assert!(ranks.windows(2).all(|w| w[0] < w[1]), "out of order: {seen:?}");
    assert_eq!(seen.last(), Some(&BuildPhase::Idle));
  }
}
