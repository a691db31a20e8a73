//! arcade-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) overlaid with
//! `ARCADE_*` environment variables, opens an in-process SQLite ledger, and
//! serves the storefront API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use arcade_core::Storefront;
use arcade_server::ServerConfig;
use arcade_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Arcade storefront server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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
    .add_source(config::Environment::with_prefix("ARCADE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let sender = server_cfg
    .sender()
    .context("failed to set up invoice notifications")?;
  if server_cfg.notify_relay_url.is_none() {
    tracing::warn!("notify_relay_url is not set; invoice emails will be dropped");
  }

  let front = Storefront::new(Arc::new(store), sender, server_cfg.commerce())
    .context("invalid commerce configuration")?;

  let app = arcade_server::app(Arc::new(front));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(
    tax_rate = %server_cfg.tax_rate.value(),
    drain_batch = server_cfg.drain_batch,
    "Listening on http://{address}"
  );
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
