use std::marker::PhantomData;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use super::{Entity, Record, SchemaError};
use crate::db::DocumentStore;
use crate::types::{Filter, Query};

#[derive(Debug, Error)]
pub enum SaveError {
  #[error(transparent)]
  Schema(#[from] SchemaError),
  #[error(transparent)]
  Store(#[from] anyhow::Error),
}

/// Typed access to one entity's collection. Values are validated before
/// every write and decoded on every read.
pub struct Collection<T> {
  store: Arc<dyn DocumentStore>,
  _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
  fn clone(&self) -> Self {
    Self {
      store: self.store.clone(),
      _entity: PhantomData,
    }
  }
}

impl<T: Entity> Collection<T> {
  pub fn new(store: Arc<dyn DocumentStore>) -> Self {
    Self {
      store,
      _entity: PhantomData,
    }
  }

  pub async fn find(&self, query: &Query) -> Result<Vec<Record<T>>, anyhow::Error> {
    self
      .store
      .find(T::COLLECTION, query)
      .await?
      .into_iter()
      .map(Record::from_document)
      .collect()
  }

  pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Record<T>>, anyhow::Error> {
    self
      .store
      .get(T::COLLECTION, id)
      .await?
      .map(Record::from_document)
      .transpose()
  }

  pub async fn find_one(&self, query: &Query) -> Result<Option<Record<T>>, anyhow::Error> {
    self
      .store
      .find_one(T::COLLECTION, query)
      .await?
      .map(Record::from_document)
      .transpose()
  }

  pub async fn count(&self, filter: &Filter) -> Result<u64, anyhow::Error> {
    self.store.count(T::COLLECTION, filter).await
  }

  pub async fn create(&self, value: T) -> Result<Record<T>, SaveError> {
    value.validate()?;
    let data = serde_json::to_value(&value).map_err(anyhow::Error::from)?;
    let doc = self.store.insert(T::COLLECTION, data).await?;
    tracing::debug!(collection = T::COLLECTION, id = %doc.id, "Created record");
    Ok(Record {
      id: doc.id,
      created_at: doc.created_at,
      updated_at: doc.updated_at,
      value,
    })
  }

  /// Overwrite an existing record. `None` when `id` is absent.
  pub async fn replace(&self, id: Uuid, value: T) -> Result<Option<Record<T>>, SaveError> {
    value.validate()?;
    let data = serde_json::to_value(&value).map_err(anyhow::Error::from)?;
    let Some(doc) = self.store.update(T::COLLECTION, id, data).await? else {
      return Ok(None);
    };
    tracing::debug!(collection = T::COLLECTION, id = %doc.id, "Replaced record");
    Ok(Some(Record {
      id: doc.id,
      created_at: doc.created_at,
      updated_at: doc.updated_at,
      value,
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::SqliteBackend;
  use crate::models::{Category, Contact, Recipe, RecipeCategory};

  async fn store() -> Arc<dyn DocumentStore> {
    let backend = SqliteBackend::in_memory().await.unwrap();
    backend.init_schema().await.unwrap();
    Arc::new(backend)
  }

  fn recipe(name: &str, category: RecipeCategory) -> Recipe {
    Recipe {
      name: name.into(),
      description: format!("How to make {}", name),
      email: "cook@example.com".into(),
      ingredients: vec!["Salt".into()],
      category,
      image: "1.jpg".into(),
    }
  }

  #[tokio::test]
  async fn test_create_and_find_by_id() {
    let recipes = Collection::<Recipe>::new(store().await);
    let created = recipes
      .create(recipe("Pad Thai", RecipeCategory::Thai))
      .await
      .unwrap();
    let fetched = recipes.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.value, created.value);
    assert_eq!(fetched.category, RecipeCategory::Thai);
  }

  #[tokio::test]
  async fn test_invalid_value_is_not_written() {
    let contacts = Collection::<Contact>::new(store().await);
    let err = contacts.create(Contact::default()).await.unwrap_err();
    assert!(matches!(err, SaveError::Schema(_)));
    assert_eq!(contacts.count(&Filter::All).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_replace_missing_returns_none() {
    let recipes = Collection::<Recipe>::new(store().await);
    let out = recipes
      .replace(Uuid::new_v4(), recipe("Tacos", RecipeCategory::Mexican))
      .await
      .unwrap();
    assert!(out.is_none());
    assert_eq!(recipes.count(&Filter::All).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_find_by_category_newest_first() {
    let store = store().await;
    let recipes = Collection::<Recipe>::new(store.clone());
    for name in ["Green Curry", "Burger", "Tom Yum"] {
      let category = if name == "Burger" {
        RecipeCategory::American
      } else {
        RecipeCategory::Thai
      };
      recipes.create(recipe(name, category)).await.unwrap();
    }

    let thai = recipes
      .find(&Query::eq("category", "Thai").newest_first().limit(5))
      .await
      .unwrap();
    let names: Vec<_> = thai.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Tom Yum", "Green Curry"]);

    // other collections are untouched
    let categories = Collection::<Category>::new(store);
    assert_eq!(categories.count(&Filter::All).await.unwrap(), 0);
  }
}
