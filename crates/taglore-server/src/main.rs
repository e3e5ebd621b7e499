//! The taglore binary.
//!
//! Two modes:
//!
//! - `taglore-server serve` (the default when no subcommand is given): load
//!   configuration, open the SQLite store, and serve the JSON API.
//! - `taglore-server hash-password`: read a password from stdin and print
//!   the argon2 PHC string to paste into `auth_password_hash`.
//!
//! Configuration comes from a TOML file (`taglore.toml` by default) with
//! `TAGLORE_*` environment variables layered on top; `serve` additionally
//! accepts `--port` and `--store` overrides for one-off runs.

use std::{
  io::{self, Write as _},
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::{Parser, Subcommand};
use rand_core::OsRng;
use taglore_server::{AppState, ServerConfig, auth::AuthConfig};
use taglore_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "taglore learning-engine server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "taglore.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Run the HTTP server.
  Serve {
    /// Listen on this port instead of the configured one.
    #[arg(long)]
    port: Option<u16>,

    /// Use this SQLite file instead of the configured one.
    #[arg(long)]
    store: Option<PathBuf>,
  },

  /// Hash a password read from stdin and print the PHC string.
  HashPassword,
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
  match cli.command.unwrap_or(Command::Serve { port: None, store: None }) {
    Command::HashPassword => hash_password(),
    Command::Serve { port, store } => {
      let mut cfg = load_config(&cli.config)?;
      if let Some(port) = port {
        cfg.port = port;
      }
      if let Some(store) = store {
        cfg.store_path = store;
      }
      serve(cfg).await
    }
  }
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store {:?}", cfg.store_path))?;

  let auth = AuthConfig {
    username:      cfg.auth_username.clone(),
    password_hash: cfg.auth_password_hash.clone(),
  };

  let address = format!("{}:{}", cfg.host, cfg.port);
  let state = AppState {
    store:  Arc::new(store),
    auth:   Arc::new(auth),
    config: Arc::new(cfg),
  };

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("listening on http://{address}");

  axum::serve(listener, taglore_server::router(state))
    .await
    .context("server error")
}

/// TOML file (optional) layered under `TAGLORE_*` environment variables,
/// with `~` in the store path expanded.
fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  let mut cfg: ServerConfig = config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix("TAGLORE"))
    .build()
    .and_then(config::Config::try_deserialize)
    .with_context(|| format!("invalid configuration ({})", path.display()))?;

  if let Ok(rest) = cfg.store_path.strip_prefix("~")
    && let Ok(home) = std::env::var("HOME")
  {
    cfg.store_path = Path::new(&home).join(rest);
  }

  Ok(cfg)
}

fn hash_password() -> anyhow::Result<()> {
  eprint!("password: ");
  io::stderr().flush()?;
  let mut password = String::new();
  io::stdin().read_line(&mut password)?;

  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.trim_end().as_bytes(), &salt)
    .map_err(|e| anyhow::anyhow!("hashing failed: {e}"))?;
  println!("{hash}");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cli_definition_is_consistent() {
    use clap::CommandFactory as _;
    Cli::command().debug_assert();
  }

  #[test]
  fn bare_invocation_defaults_to_serve() {
    let cli = Cli::try_parse_from(["taglore-server"]).unwrap();
    assert!(cli.command.is_none());
  }

  #[test]
  fn serve_accepts_port_and_store_overrides() {
    let cli = Cli::try_parse_from([
      "taglore-server",
      "serve",
      "--port",
      "9090",
      "--store",
      "/tmp/taglore.db",
    ])
    .unwrap();

    match cli.command {
      Some(Command::Serve { port, store }) => {
        assert_eq!(port, Some(9090));
        assert_eq!(store.as_deref(), Some(Path::new("/tmp/taglore.db")));
      }
      _ => panic!("expected the serve subcommand"),
    }
  }
}
