use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use redstone_lib::config::ServiceConfig;
use redstone_lib::coordinator::BuildCoordinator;
use redstone_lib::launch::Launcher;
use redstone_lib::server::{router, start_server, wait_until_ready};

use crate::output::{print_info, print_success, print_warning};

const READY_ATTEMPTS: u32 = 20;
const READY_INTERVAL: Duration = Duration::from_millis(100);

pub struct ServeOptions {
  pub bind: IpAddr,
  pub port: u16,
  pub resources_dir: Option<PathBuf>,
  pub build_dir: Option<PathBuf>,
  pub headless: bool,
}

pub async fn cmd_serve(options: ServeOptions) -> Result<()> {
  let config = load_config(options.resources_dir, options.build_dir)?;
  config
    .ensure_workspace()
    .with_context(|| format!("Failed to create build directory {}", config.workspace_root.display()))?;

  let coordinator = Arc::new(BuildCoordinator::from_config(&config));
  print_info(&format!(
    "Maven: {}",
    coordinator.toolchain().program().display()
  ));

  let app = router(coordinator, &config.static_dir);
  let server = start_server(SocketAddr::new(options.bind, options.port), app)
    .await
    .context("Failed to start server")?;

  if !wait_until_ready(server.local_addr(), READY_ATTEMPTS, READY_INTERVAL).await {
    warn!(addr = %server.local_addr(), "server did not report ready, continuing");
  }

  let url = server.url();
  print_success(&format!("Studio running at {}", url));

  let launcher = Launcher::detect(options.headless);
  if launcher == Launcher::Headless {
    print_warning(&format!("No browser will be opened, visit {} manually", url));
  }
  print_info("Press Ctrl+C to exit");

  launcher.launch(&url).await;

  server.shutdown().await;
  print_info("Stopped");
  Ok(())
}

pub(crate) fn load_config(resources_dir: Option<PathBuf>, build_dir: Option<PathBuf>) -> Result<ServiceConfig> {
  let mut config = ServiceConfig::current().context("Failed to locate program directory")?;
  if let Some(dir) = resources_dir {
    config = config.with_resources_dir(dir);
  }
  if let Some(dir) = build_dir {
    config = config.with_workspace_root(dir);
  }
  Ok(config)
}
