//! Entity schemas for the four record kinds and a typed view over the store.

mod category;
mod collection;
mod contact;
mod recipe;
mod user;

pub use category::Category;
pub use collection::{Collection, SaveError};
pub use contact::Contact;
pub use recipe::{Recipe, RecipeCategory, RecipeDraft, UnknownCategory};
pub use user::User;

use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::types::Document;

pub const REQUIRED: &str = "This field is required.";

/// A record kind persisted as a JSON document in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
  const COLLECTION: &'static str;
  /// Display name used in schema error messages
  const NAME: &'static str;

  fn validate(&self) -> Result<(), SchemaError>;
}

/// A stored entity together with the store-assigned fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
  pub id: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub value: T,
}

impl<T: Entity> Record<T> {
  pub fn from_document(doc: Document) -> Result<Self, anyhow::Error> {
    let value = serde_json::from_value(doc.data).map_err(|e| {
      anyhow::anyhow!("malformed {} document {}: {}", T::COLLECTION, doc.id, e)
    })?;
    Ok(Self {
      id: doc.id,
      created_at: doc.created_at,
      updated_at: doc.updated_at,
      value,
    })
  }
}

impl<T> Deref for Record<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.value
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
  pub field: &'static str,
  pub message: String,
}

impl fmt::Display for FieldIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.field, self.message)
  }
}

/// Schema validation failure, one issue per offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} validation failed: {}", join_issues(.issues))]
pub struct SchemaError {
  pub entity: &'static str,
  pub issues: Vec<FieldIssue>,
}

impl SchemaError {
  /// One line per issue, for flashing back to the form.
  pub fn messages(&self) -> Vec<String> {
    self.issues.iter().map(|i| i.to_string()).collect()
  }
}

fn join_issues(issues: &[FieldIssue]) -> String {
  issues
    .iter()
    .map(|i| i.to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

/// Collects field issues while an entity is checked.
#[derive(Debug, Default)]
pub(crate) struct Issues(Vec<FieldIssue>);

impl Issues {
  pub fn required(&mut self, field: &'static str, value: &str) -> &mut Self {
    if value.trim().is_empty() {
      self.invalid(field, REQUIRED);
    }
    self
  }

  pub fn required_list(&mut self, field: &'static str, values: &[String]) -> &mut Self {
    if values.iter().all(|v| v.trim().is_empty()) {
      self.invalid(field, REQUIRED);
    }
    self
  }

  pub fn invalid(&mut self, field: &'static str, message: impl Into<String>) -> &mut Self {
    self.0.push(FieldIssue {
      field,
      message: message.into(),
    });
    self
  }

  pub fn finish(self, entity: &'static str) -> Result<(), SchemaError> {
    if self.0.is_empty() {
      Ok(())
    } else {
      Err(SchemaError {
        entity,
        issues: self.0,
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_schema_error_display() {
    let mut issues = Issues::default();
    issues.required("name", "  ").invalid("category", "'Korean' is not a valid category.");
    let err = issues.finish("Recipe").unwrap_err();
    assert_eq!(
      err.to_string(),
      "Recipe validation failed: name: This field is required., category: 'Korean' is not a valid category."
    );
    assert_eq!(err.messages().len(), 2);
  }

  #[test]
  fn test_required_list_ignores_blank_entries() {
    let mut issues = Issues::default();
    issues.required_list("ingredients", &["".into(), " ".into()]);
    assert!(issues.finish("Recipe").is_err());

    let mut issues = Issues::default();
    issues.required_list("ingredients", &["".into(), "Limes".into()]);
    assert!(issues.finish("Recipe").is_ok());
  }

  #[test]
  fn test_record_from_malformed_document() {
    let doc = Document {
      id: Uuid::new_v4(),
      collection: "contacts".into(),
      data: serde_json::json!({"name": 42}),
      created_at: Utc::now(),
      updated_at: Utc::now(),
    };
    assert!(Record::<Contact>::from_document(doc).is_err());
  }
}
