//! Axum HTTP server.
//!
//! Routes: `POST /api/build` and static file serving for everything else.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
  Json, Router,
  body::Bytes,
  extract::State,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
  routing::post,
};
use serde::Serialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{debug, error, info};

use crate::artifact::Artifact;
use crate::consts::{ARTIFACT_CONTENT_TYPE, ARTIFACT_EXT};
use crate::coordinator::{BuildCoordinator, BuildError};
use crate::request::BuildRequest;

#[derive(Debug, Serialize)]
struct ErrorBody {
  error: String,
}

impl BuildError {
  pub fn status_code(&self) -> StatusCode {
    match self {
      BuildError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for BuildError {
  fn into_response(self) -> Response {
    let status = self.status_code();
    (status, Json(ErrorBody { error: self.to_string() })).into_response()
  }
}

/// Build the application router.
pub fn router(coordinator: Arc<BuildCoordinator>, static_dir: &Path) -> Router {
  Router::new()
    .route("/api/build", post(build_handler))
    .fallback_service(ServeDir::new(static_dir))
    .with_state(coordinator)
}

async fn build_handler(State(coordinator): State<Arc<BuildCoordinator>>, body: Bytes) -> Result<Response, BuildError> {
  let request: BuildRequest =
    serde_json::from_slice(&body).map_err(|e| BuildError::InvalidRequest(format!("invalid JSON: {e}")))?;

  info!(plugin = %request.plugin_name, "build requested");

  let artifact = coordinator.build(&request).await?;
  Ok(artifact_response(&request.plugin_name, artifact))
}

fn artifact_response(plugin_name: &str, artifact: Artifact) -> Response {
  info!(plugin = %plugin_name, bytes = artifact.size(), "sending artifact");

  (
    [
      (header::CONTENT_TYPE, HeaderValue::from_static(ARTIFACT_CONTENT_TYPE)),
      (header::CONTENT_DISPOSITION, content_disposition(plugin_name)),
    ],
    artifact.bytes,
  )
    .into_response()
}

/// `attachment; filename="<name>.jar"`.
///
/// Characters that cannot appear in a quoted header value are replaced with
/// `_`; non-ASCII names also get an RFC 5987 `filename*` parameter.
pub fn content_disposition(plugin_name: &str) -> HeaderValue {
  let file_name = format!("{plugin_name}.{ARTIFACT_EXT}");
  let ascii: String = file_name
    .chars()
    .map(|c| {
      if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
        c
      } else {
        '_'
      }
    })
    .collect();

  let mut value = format!("attachment; filename=\"{ascii}\"");
  if !file_name.is_ascii() {
    value.push_str("; filename*=UTF-8''");
    value.push_str(&percent_encode(&file_name));
  }

  HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Percent-encode everything outside the RFC 5987 `attr-char` set.
fn percent_encode(s: &str) -> String {
  let mut out = String::with_capacity(s.len() * 3);
  for b in s.bytes() {
    if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
      out.push(b as char);
    } else {
      out.push_str(&format!("%{b:02X}"));
    }
  }
  out
}

/// A running server.
pub struct ServerHandle {
  addr: SocketAddr,
  shutdown_tx: oneshot::Sender<()>,
  task: JoinHandle<()>,
}

impl ServerHandle {
  pub fn local_addr(&self) -> SocketAddr {
    self.addr
  }

  pub fn url(&self) -> String {
    format!("http://{}", self.addr)
  }

  /// Stop accepting connections and wait for in-flight requests.
  pub async fn shutdown(self) {
    let _ = self.shutdown_tx.send(());
    if let Err(e) = self.task.await {
      error!(error = %e, "server task failed");
    }
  }
}

/// Bind `addr` and serve `app` in the background.
///
/// Binding port 0 lets the OS pick a free port; the returned handle reports
/// the actual address.
pub async fn start_server(addr: SocketAddr, app: Router) -> std::io::Result<ServerHandle> {
  let listener = TcpListener::bind(addr).await?;
  let bound = listener.local_addr()?;
  let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

  let task = tokio::spawn(async move {
    if let Err(e) = axum::serve(listener, app)
      .with_graceful_shutdown(async {
        let _ = shutdown_rx.await;
        info!("server shutting down");
      })
      .await
    {
      error!(error = %e, "server error");
    }
  });

  info!(addr = %bound, "server listening");
  Ok(ServerHandle {
    addr: bound,
    shutdown_tx,
    task,
  })
}

/// Poll `addr` until it accepts a connection. Returns whether it became ready.
pub async fn wait_until_ready(addr: SocketAddr, attempts: u32, interval: Duration) -> bool {
  for attempt in 1..=attempts {
    match TcpStream::connect(addr).await {
      Ok(_) => return true,
      Err(e) => debug!(attempt, error = %e, "server not ready yet"),
    }
    tokio::time::sleep(interval).await;
  }
  false
}
