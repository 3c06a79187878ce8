//! tally-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus any
//! `TALLY_*` environment overrides, loads the three source tables, and serves
//! the query API over HTTP.
//!
//! # Validating data
//!
//! To load the configured tables once, print a summary, and exit:
//!
//! ```
//! cargo run -p tally-server -- --check
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tally_engine::SnapshotHandle;
use tally_server::{AppState, ServerConfig, SnapshotSummary, source::FileSource};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tally outbreak time-series server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Load the configured tables, print a summary, and exit.
  #[arg(long)]
  check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TALLY").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let source = FileSource::new(
    expand_tilde(&server_cfg.confirmed_path),
    expand_tilde(&server_cfg.deaths_path),
    expand_tilde(&server_cfg.recovered_path),
  );

  // Initial load. Without it there is nothing to serve.
  let handle = SnapshotHandle::bootstrap(&source)
    .await
    .context("initial load failed")?;

  if cli.check {
    let summary = SnapshotSummary::new(&handle.current());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    return Ok(());
  }

  let state = AppState { handle: Arc::new(handle), source: Arc::new(source) };

  if let Some(every) = server_cfg.refresh_interval() {
    tracing::info!(interval_secs = every.as_secs(), "scheduled refresh enabled");
    tally_server::spawn_refresh_loop(state.clone(), every);
  }

  let app = tally_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
