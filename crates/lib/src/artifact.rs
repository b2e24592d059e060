//! Artifact selection.
//!
//! A successful build leaves one primary archive in `target/`, possibly next
//! to auxiliary variants such as `-sources.jar` or the pre-shading
//! `original-*.jar`. Selection prefers the primary archive.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::consts::{ARTIFACT_EXT, AUXILIARY_MARKERS, OUTPUT_DIR};

#[derive(Debug, Error)]
pub enum ArtifactError {
  #[error("no jar artifact found in {}", dir.display())]
  NoArtifact { dir: PathBuf },

  #[error("failed to read artifact {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },
}

/// The selected build output, read into memory.
#[derive(Debug, Clone)]
pub struct Artifact {
  pub path: PathBuf,
  pub bytes: Vec<u8>,
}

impl Artifact {
  pub fn size(&self) -> usize {
    self.bytes.len()
  }
}

/// Archive candidates directly inside `dir`, sorted by file name.
///
/// A missing or unreadable directory yields no candidates.
pub fn candidates(dir: &Path) -> Vec<PathBuf> {
  WalkDir::new(dir)
    .min_depth(1)
    .max_depth(1)
    .sort_by_file_name()
    .into_iter()
    .filter_map(Result::ok)
    .filter(|entry| entry.file_type().is_file())
    .map(|entry| entry.into_path())
    .filter(|path| path.extension().is_some_and(|ext| ext == ARTIFACT_EXT))
    .collect()
}

fn is_auxiliary(path: &Path) -> bool {
  let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
  AUXILIARY_MARKERS.iter().any(|marker| name.contains(*marker))
}

/// Pick the artifact from `<project>/target`.
///
/// The first candidate (by file name) without an auxiliary marker wins. If
/// every candidate is auxiliary, the first one by file name is returned.
pub fn select_artifact(project_dir: &Path) -> Result<PathBuf, ArtifactError> {
  let dir = project_dir.join(OUTPUT_DIR);
  let found = candidates(&dir);
  debug!(dir = %dir.display(), count = found.len(), "artifact candidates");

  let primary = found.iter().find(|p| !is_auxiliary(p)).or_else(|| found.first());

  primary.cloned().ok_or(ArtifactError::NoArtifact { dir })
}

/// Select the artifact and read it fully into memory.
pub async fn load_artifact(project_dir: &Path) -> Result<Artifact, ArtifactError> {
  let path = select_artifact(project_dir)?;
  let bytes = tokio::fs::read(&path).await.map_err(|e| ArtifactError::Read {
    path: path.clone(),
    source: e,
  })?;
  Ok(Artifact { path, bytes })
}
