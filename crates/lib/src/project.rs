//! Project materialization.
//!
//! Turns a [`BuildRequest`] into a Maven project tree under the workspace
//! root:
//!
//! ```text
//! <workspace>/<pluginName>/
//!   pom.xml
//!   src/main/resources/plugin.yml
//!   src/main/resources/config.yml      (only when supplied)
//!   src/main/java/<package/path>/<MainClass>.java
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consts::{MANIFEST_FILE, PLUGIN_METADATA_FILE, RESOURCE_ROOT, SECONDARY_CONFIG_FILE, SOURCE_EXT, SOURCE_ROOT};
use crate::request::BuildRequest;
use crate::template::{DescriptorKind, render_descriptor};

/// Errors that can occur while materializing a project tree.
#[derive(Debug, Error)]
pub enum ProjectError {
  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: io::Error },
}

/// Paths of a materialized project tree.
#[derive(Debug, Clone)]
pub struct ProjectTree {
  /// `<workspace>/<pluginName>`
  pub root: PathBuf,
  pub manifest: PathBuf,
  pub plugin_metadata: PathBuf,
  /// Present only when the request carried a `config.yml` override.
  pub secondary_config: Option<PathBuf>,
  pub source_file: PathBuf,
}

/// Directory a request's project lives in.
pub fn project_dir(workspace_root: &Path, request: &BuildRequest) -> PathBuf {
  workspace_root.join(&request.plugin_name)
}

/// Source directory for a package: dots become path separators.
pub fn source_dir(project_root: &Path, package_name: &str) -> PathBuf {
  package_name
    .split('.')
    .filter(|segment| !segment.is_empty())
    .fold(project_root.join(SOURCE_ROOT), |dir, segment| dir.join(segment))
}

/// Materialize the project tree for `request` under `workspace_root`.
///
/// Any existing directory with the same plugin name is removed first, or
/// renamed aside if removal fails. All writes stay inside the project
/// directory.
///
/// # Errors
///
/// Returns an error if a directory cannot be created or a file cannot be
/// written. Reconciling a previous tree never fails the call.
pub fn materialize(request: &BuildRequest, workspace_root: &Path) -> Result<ProjectTree, ProjectError> {
  materialize_with(request, workspace_root, &StdReconcile)
}

/// Filesystem operations used to clear a previous project tree.
trait ReconcileOps {
  fn remove_tree(&self, path: &Path) -> io::Result<()>;
  fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

struct StdReconcile;

impl ReconcileOps for StdReconcile {
  fn remove_tree(&self, path: &Path) -> io::Result<()> {
    fs::remove_dir_all(path)
  }

  fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
  }
}

fn materialize_with(
  request: &BuildRequest,
  workspace_root: &Path,
  ops: &dyn ReconcileOps,
) -> Result<ProjectTree, ProjectError> {
  let root = project_dir(workspace_root, request);

  reconcile_existing(&root, ops);

  let src_dir = source_dir(&root, &request.package_name);
  let res_dir = root.join(RESOURCE_ROOT);

  create_dir(&root)?;
  create_dir(&src_dir)?;
  create_dir(&res_dir)?;

  let manifest = root.join(MANIFEST_FILE);
  match request.pom_override() {
    Some(text) => write_file(&manifest, text)?,
    None => write_file(&manifest, &render_descriptor(DescriptorKind::Manifest, request))?,
  }

  let plugin_metadata = res_dir.join(PLUGIN_METADATA_FILE);
  match request.plugin_yml_override() {
    Some(text) => write_file(&plugin_metadata, text)?,
    None => write_file(
      &plugin_metadata,
      &render_descriptor(DescriptorKind::PluginMetadata, request),
    )?,
  }

  let secondary_config = match request.config_yml_override() {
    Some(text) => {
      let path = res_dir.join(SECONDARY_CONFIG_FILE);
      write_file(&path, text)?;
      Some(path)
    }
    None => None,
  };

  let source_file = src_dir.join(format!("{}.{}", request.main_class, SOURCE_EXT));
  write_file(&source_file, &request.java_code)?;

  info!(plugin = %request.plugin_name, path = %root.display(), "materialized project");

  Ok(ProjectTree {
    root,
    manifest,
    plugin_metadata,
    secondary_config,
    source_file,
  })
}

/// Clear the way for a fresh project tree.
///
/// Removal is attempted first. If that fails the old tree is renamed aside
/// with a timestamp suffix; if the rename fails too, the failure is logged
/// and the build proceeds.
fn reconcile_existing(root: &Path, ops: &dyn ReconcileOps) {
  if !root.exists() {
    return;
  }

  let Err(remove_err) = ops.remove_tree(root) else {
    debug!(path = %root.display(), "removed previous project tree");
    return;
  };

  let aside = stale_path(root);
  warn!(
    path = %root.display(),
    error = %remove_err,
    aside = %aside.display(),
    "failed to remove previous project tree, renaming aside"
  );

  if let Err(e) = ops.rename(root, &aside) {
    warn!(path = %root.display(), error = %e, "failed to rename previous project tree");
  }
}

fn stale_path(root: &Path) -> PathBuf {
  let millis = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis();
  let name = root
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  root.with_file_name(format!("{name}.stale-{millis}"))
}

/// Best-effort removal of a finished project tree.
pub async fn cleanup(root: &Path) {
  match tokio::fs::remove_dir_all(root).await {
    Ok(()) => debug!(path = %root.display(), "removed project tree"),
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(e) => warn!(path = %root.display(), error = %e, "failed to remove project tree"),
  }
}

fn create_dir(path: &Path) -> Result<(), ProjectError> {
  fs::create_dir_all(path).map_err(|e| ProjectError::CreateDir {
    path: path.to_path_buf(),
    source: e,
  })
}

fn write_file(path: &Path, content: &str) -> Result<(), ProjectError> {
  fs::write(path, content).map_err(|e| ProjectError::WriteFile {
    path: path.to_path_buf(),
    source: e,
  })
}
