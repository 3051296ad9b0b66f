use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Document, Filter, Query};

/// A visitor session as stored (the raw cookie token is never persisted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
  pub token_hash: String,
  pub user_id: Option<Uuid>,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

/// Abstract document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
  async fn init_schema(&self) -> Result<(), anyhow::Error>;

  async fn insert(
    &self,
    collection: &str,
    data: serde_json::Value,
  ) -> Result<Document, anyhow::Error>;
  async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, anyhow::Error>;
  /// Replace the body of an existing document. `None` if `id` is absent.
  async fn update(
    &self,
    collection: &str,
    id: Uuid,
    data: serde_json::Value,
  ) -> Result<Option<Document>, anyhow::Error>;
  async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, anyhow::Error>;
  async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, anyhow::Error>;

  async fn find_one(
    &self,
    collection: &str,
    query: &Query,
  ) -> Result<Option<Document>, anyhow::Error> {
    let query = query.clone().limit(1);
    Ok(self.find(collection, &query).await?.into_iter().next())
  }

  // Sessions
  async fn create_session(
    &self,
    token_hash: &str,
    user_id: Option<Uuid>,
    expires_at: DateTime<Utc>,
  ) -> Result<SessionRecord, anyhow::Error>;
  /// Expired sessions are reported as absent
  async fn get_session(&self, token_hash: &str) -> Result<Option<SessionRecord>, anyhow::Error>;
  /// Delete a session together with its queued flash messages
  async fn delete_session(&self, token_hash: &str) -> Result<bool, anyhow::Error>;
  async fn cleanup_expired_sessions(&self) -> Result<u64, anyhow::Error>;

  // Flash messages
  async fn push_flash(
    &self,
    token_hash: &str,
    kind: &str,
    message: &str,
  ) -> Result<(), anyhow::Error>;
  /// Pop every queued message of `kind`, oldest first
  async fn take_flash(&self, token_hash: &str, kind: &str) -> Result<Vec<String>, anyhow::Error>;
}
