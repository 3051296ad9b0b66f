use clap::Parser;
use cookbook::db::{DocumentStore, SqliteBackend};
use cookbook::server::{Daemon, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "cookbook", about = "Recipe sharing site", version)]
struct Args {
  #[arg(short, long)]
  port: Option<u16>,
  #[arg(long)]
  host: Option<String>,
  /// SQLite database file
  #[arg(long, env = "COOKBOOK_DATABASE")]
  database: Option<String>,
  /// Directory uploaded images are written to
  #[arg(long)]
  uploads: Option<String>,
  #[arg(short, long)]
  config: Option<String>,
  #[arg(long)]
  log_level: Option<String>,
}

impl Args {
  /// `--config`, else `cookbook.yaml` in the working directory, else defaults;
  /// flags then win over whatever was loaded.
  fn into_config(self) -> Result<ServerConfig, anyhow::Error> {
    let mut config = match &self.config {
      Some(path) => ServerConfig::from_file(path)?,
      None => ServerConfig::find_and_load()?.unwrap_or_default(),
    };
    if let Some(port) = self.port {
      config.server.port = port;
    }
    if let Some(host) = self.host {
      config.server.host = host;
    }
    if let Some(path) = self.database {
      config.database.path = path;
    }
    if let Some(dir) = self.uploads {
      config.uploads.dir = dir;
    }
    if let Some(level) = self.log_level {
      config.logging.level = level;
    }
    Ok(config)
  }
}

/// `RUST_LOG` takes precedence over `logging.level`.
fn init_tracing(level: &str) {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
  let config = Args::parse().into_config()?;
  init_tracing(&config.logging.level);

  tracing::info!("Recipe database at {}", config.database.path);
  let store: Arc<dyn DocumentStore> = Arc::new(SqliteBackend::new(&config.database.path).await?);
  let site = Arc::new(Daemon::new(config, store));

  let stopper = site.clone();
  tokio::spawn(async move {
    shutdown_signal().await;
    stopper.shutdown();

    // let open uploads and form posts finish before exiting
    tokio::time::sleep(Duration::from_secs(5)).await;
    tracing::info!("Cookbook stopped");
    std::process::exit(0);
  });

  site.run().await
}

async fn shutdown_signal() {
  let ctrl_c = async {
    tokio::signal::ctrl_c()
      .await
      .expect("Failed to install Ctrl+C handler");
  };

  #[cfg(unix)]
  let terminate = async {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
      .expect("Failed to install SIGTERM handler")
      .recv()
      .await;
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => tracing::info!("Received SIGINT"),
    _ = terminate => tracing::info!("Received SIGTERM"),
  }
}
