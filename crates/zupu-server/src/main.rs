//! zupu server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), overlays
//! `ZUPU_*` environment variables, opens the SQLite store and serves the
//! JSON API under `/api`.
//!
//! # Bootstrapping an administrator
//!
//! Sign up through the API, then grant the role from the host:
//!
//! ```
//! cargo run -p zupu-server -- --promote-admin you@example.com
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use zupu_server::{ServerConfig, config::expand_tilde};
use zupu_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "zupu family register server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Grant the ADMIN role to the account with this e-mail and exit.
  #[arg(long, value_name = "EMAIL")]
  promote_admin: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ZUPU").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let mut store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  match server_cfg.session_ttl() {
    Some(ttl) => store = store.with_session_ttl(ttl),
    None => tracing::warn!(
      hours = server_cfg.session_ttl_hours,
      "ignoring invalid session_ttl_hours, keeping the default"
    ),
  }

  if let Some(email) = cli.promote_admin {
    let profile = zupu_server::promote_admin(&store, &email)
      .await
      .context("failed to update role")?
      .with_context(|| format!("no account registered under {email}"))?;
    println!("{} is now {}", email, profile.role);
    return Ok(());
  }

  let app = zupu_server::app(Arc::new(store), server_cfg.api_settings());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
