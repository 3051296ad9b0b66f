use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use super::{build_router, AppState, ServerConfig};
use crate::db::DocumentStore;
use crate::models::{Category, Collection};
use crate::types::Filter;

pub struct Daemon {
  config: ServerConfig,
  store: Arc<dyn DocumentStore>,
  shutdown_tx: broadcast::Sender<()>,
}

impl Daemon {
  pub fn new(config: ServerConfig, store: Arc<dyn DocumentStore>) -> Self {
    let (shutdown_tx, _) = broadcast::channel(1);
    Self {
      config,
      store,
      shutdown_tx,
    }
  }

  /// Trigger graceful shutdown
  pub fn shutdown(&self) {
    tracing::info!("Initiating graceful shutdown...");
    let _ = self.shutdown_tx.send(());
  }

  /// Schema, seed data and upload directory; everything the router needs.
  pub async fn prepare(&self) -> Result<AppState, anyhow::Error> {
    tracing::info!("Initializing database schema...");
    self.store.init_schema().await?;

    if self.config.seed.categories {
      let seeded = seed_categories(self.store.clone()).await?;
      if seeded > 0 {
        tracing::info!("Seeded {} default categories", seeded);
      }
    }

    let state = AppState::new(self.store.clone(), self.config.clone());
    state.uploads.init().await?;
    tracing::info!("Uploads stored in {}", state.uploads.dir().display());
    Ok(state)
  }

  pub async fn run(&self) -> Result<(), anyhow::Error> {
    let state = self.prepare().await?;

    // Expired session sweep
    let store = self.store.clone();
    let interval = Duration::from_secs(self.config.session.cleanup_interval_secs.max(1));
    let mut cleanup_shutdown = self.shutdown_tx.subscribe();
    tokio::spawn(async move {
      loop {
        tokio::select! {
          _ = tokio::time::sleep(interval) => {}
          _ = cleanup_shutdown.recv() => break,
        }
        match store.cleanup_expired_sessions().await {
          Ok(0) => {}
          Ok(n) => tracing::debug!("Removed {} expired sessions", n),
          Err(e) => tracing::warn!("Session cleanup failed: {}", e),
        }
      }
    });

    let app = build_router(state);
    let addr = self.config.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Cookbook on http://{}", addr);

    let mut shutdown_rx = self.shutdown_tx.subscribe();
    axum::serve(listener, app)
      .with_graceful_shutdown(async move {
        let _ = shutdown_rx.recv().await;
        tracing::info!("HTTP server shutting down");
      })
      .await?;
    Ok(())
  }
}

/// Insert the default categories into an empty collection. Returns how
/// many were written.
pub async fn seed_categories(store: Arc<dyn DocumentStore>) -> Result<usize, anyhow::Error> {
  let categories = Collection::<Category>::new(store);
  if categories.count(&Filter::All).await? > 0 {
    return Ok(0);
  }
  let defaults = Category::defaults();
  let n = defaults.len();
  for category in defaults {
    categories.create(category).await?;
  }
  Ok(n)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::SqliteBackend;

  #[tokio::test]
  async fn test_seed_is_idempotent() {
    let backend = SqliteBackend::in_memory().await.unwrap();
    backend.init_schema().await.unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(backend);

    assert_eq!(seed_categories(store.clone()).await.unwrap(), 6);
    assert_eq!(seed_categories(store.clone()).await.unwrap(), 0);
    assert_eq!(store.count("categories", &Filter::All).await.unwrap(), 6);
  }

  #[tokio::test]
  async fn test_prepare_creates_upload_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = ServerConfig::default();
    config.uploads.dir = tmp.path().join("uploads").display().to_string();
    let backend = SqliteBackend::in_memory().await.unwrap();

    let daemon = Daemon::new(config, Arc::new(backend));
    let state = daemon.prepare().await.unwrap();
    assert!(state.uploads.dir().is_dir());
  }
}
