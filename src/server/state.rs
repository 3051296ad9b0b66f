use std::sync::Arc;

use super::config::ServerConfig;
use super::upload::UploadStore;
use crate::db::DocumentStore;
use crate::models::{Category, Collection, Contact, Recipe, User};

/// Shared application state. Everything mutable lives in the store.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn DocumentStore>,
  pub uploads: Arc<UploadStore>,
  pub config: Arc<ServerConfig>,
}

impl AppState {
  pub fn new(store: Arc<dyn DocumentStore>, config: ServerConfig) -> Self {
    Self {
      store,
      uploads: Arc::new(UploadStore::new(&config.uploads.dir)),
      config: Arc::new(config),
    }
  }

  pub fn categories(&self) -> Collection<Category> {
    Collection::new(self.store.clone())
  }

  pub fn recipes(&self) -> Collection<Recipe> {
    Collection::new(self.store.clone())
  }

  pub fn users(&self) -> Collection<User> {
    Collection::new(self.store.clone())
  }

  pub fn contacts(&self) -> Collection<Contact> {
    Collection::new(self.store.clone())
  }
}
