mod cmd;
mod output;

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{ServeOptions, cmd_build, cmd_serve};
use output::print_error;

/// redstone - local build studio for Bukkit/Spigot plugins
#[derive(Parser)]
#[command(name = "redstone")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Directory holding the UI files and the bundled Maven
  #[arg(long, global = true)]
  resources_dir: Option<PathBuf>,

  /// Directory where plugin projects are materialized
  #[arg(long, global = true)]
  build_dir: Option<PathBuf>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Start the studio server and open the UI (default)
  Serve {
    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    bind: IpAddr,

    /// Port to listen on (0 picks a free port)
    #[arg(short, long, default_value_t = 0)]
    port: u16,

    /// Do not open a browser
    #[arg(long)]
    headless: bool,
  },

  /// Build a plugin from a JSON request file and write the jar
  Build {
    /// Path to the request JSON (same shape as POST /api/build)
    request: PathBuf,

    /// Output jar path (default: <pluginName>.jar)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
}

#[tokio::main]
async fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(format!("redstone_lib={default_level},redstone={default_level}")));
  tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

  if let Err(e) = run(cli).await {
    print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}

async fn run(cli: Cli) -> Result<()> {
  match cli.command {
    None => {
      cmd_serve(ServeOptions {
        bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        resources_dir: cli.resources_dir,
        build_dir: cli.build_dir,
        headless: false,
      })
      .await
    }
    Some(Commands::Serve { bind, port, headless }) => {
      cmd_serve(ServeOptions {
        bind,
        port,
        resources_dir: cli.resources_dir,
        build_dir: cli.build_dir,
        headless,
      })
      .await
    }
    Some(Commands::Build { request, output }) => {
      cmd_build(&request, output, cli.resources_dir, cli.build_dir).await
    }
  }
}
