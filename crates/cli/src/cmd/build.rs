use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use redstone_lib::coordinator::BuildCoordinator;
use redstone_lib::request::BuildRequest;

use crate::cmd::serve::load_config;
use crate::output::{format_bytes, format_duration, print_info, print_success};

/// Build a plugin from a request file without starting the server.
pub async fn cmd_build(
  request_path: &Path,
  output: Option<PathBuf>,
  resources_dir: Option<PathBuf>,
  build_dir: Option<PathBuf>,
) -> Result<()> {
  let start = Instant::now();

  let content = tokio::fs::read(request_path)
    .await
    .with_context(|| format!("Failed to read request file {}", request_path.display()))?;
  let request: BuildRequest = serde_json::from_slice(&content)
    .with_context(|| format!("Failed to parse request file {}", request_path.display()))?;

  let config = load_config(resources_dir, build_dir)?;
  config
    .ensure_workspace()
    .with_context(|| format!("Failed to create build directory {}", config.workspace_root.display()))?;

  print_info(&format!("Building {}", request.plugin_name));

  let coordinator = BuildCoordinator::from_config(&config);
  let artifact = coordinator.build(&request).await?;

  let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.jar", request.plugin_name)));
  tokio::fs::write(&output, &artifact.bytes)
    .await
    .with_context(|| format!("Failed to write {}", output.display()))?;

  print_success(&format!(
    "Wrote {} ({}) in {}",
    output.display(),
    format_bytes(artifact.size() as u64),
    format_duration(start.elapsed())
  ));
  Ok(())
}
