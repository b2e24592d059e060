//! UI launching.
//!
//! Once the server is ready its URL is handed to a [`Launcher`], which
//! blocks until the user asks the process to exit.

use std::io;

use tokio::process::Command;
use tracing::{info, warn};

/// Forces the headless launcher when set to anything but `0` or empty.
pub const HEADLESS_VAR: &str = "REDSTONE_HEADLESS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launcher {
  /// Open the URL in the system browser.
  Browser,
  /// Only log the URL.
  Headless,
}

impl Launcher {
  /// Pick a launcher from the runtime environment.
  ///
  /// Headless when forced by flag or `REDSTONE_HEADLESS`, or on Linux
  /// without a display server.
  pub fn detect(force_headless: bool) -> Self {
    let env_headless = std::env::var(HEADLESS_VAR).is_ok_and(|v| !v.is_empty() && v != "0");

    if force_headless || env_headless || !has_display() {
      Launcher::Headless
    } else {
      Launcher::Browser
    }
  }

  /// Present `url`, then wait for Ctrl-C or SIGTERM.
  ///
  /// Failing to open a browser is logged and otherwise ignored.
  pub async fn launch(&self, url: &str) {
    match self {
      Launcher::Browser => match open_browser(url) {
        Ok(()) => info!(url, "opened browser"),
        Err(e) => warn!(url, error = %e, "failed to open browser, open the URL manually"),
      },
      Launcher::Headless => info!(url, "running headless"),
    }

    wait_for_exit().await;
    info!("exit requested");
  }
}

#[cfg(target_os = "linux")]
fn has_display() -> bool {
  ["DISPLAY", "WAYLAND_DISPLAY"]
    .iter()
    .any(|var| std::env::var_os(var).is_some_and(|v| !v.is_empty()))
}

#[cfg(not(target_os = "linux"))]
fn has_display() -> bool {
  true
}

/// Program and arguments that open `url` with the platform's URL handler.
pub fn opener_command(url: &str) -> (&'static str, Vec<String>) {
  if cfg!(windows) {
    (
      "rundll32",
      vec!["url.dll,FileProtocolHandler".to_string(), url.to_string()],
    )
  } else if cfg!(target_os = "macos") {
    ("open", vec![url.to_string()])
  } else {
    ("xdg-open", vec![url.to_string()])
  }
}

fn open_browser(url: &str) -> io::Result<()> {
  let (program, args) = opener_command(url);
  Command::new(program).args(&args).spawn()?;
  Ok(())
}

/// Resolve when the process receives Ctrl-C, or SIGTERM on Unix.
pub async fn wait_for_exit() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      warn!(error = %e, "failed to listen for ctrl-c");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        warn!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {}
    _ = terminate => {}
  }
}
