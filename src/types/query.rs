use serde::{Deserialize, Serialize};

/// Which documents of a collection a query selects.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Filter {
  #[default]
  All,
  /// Top-level string field equals `value` (exact, case-sensitive).
  Eq { field: String, value: String },
  /// Full-text match against the recipe text index.
  Text { term: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  /// Insertion order, oldest first.
  #[default]
  Inserted,
  /// Insertion order, newest first.
  Newest,
}

/// Filter plus paging for a collection read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
  #[serde(default)]
  pub filter: Filter,
  #[serde(default)]
  pub order: SortOrder,
  pub limit: Option<usize>,
  pub offset: Option<usize>,
}

impl Query {
  pub fn all() -> Self {
    Self::default()
  }

  pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      filter: Filter::Eq {
        field: field.into(),
        value: value.into(),
      },
      ..Self::default()
    }
  }

  pub fn text(term: impl Into<String>) -> Self {
    Self {
      filter: Filter::Text { term: term.into() },
      ..Self::default()
    }
  }

  pub fn newest_first(mut self) -> Self {
    self.order = SortOrder::Newest;
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn skip(mut self, offset: usize) -> Self {
    self.offset = Some(offset);
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_builder_chains() {
    let q = Query::eq("category", "Thai").newest_first().limit(5).skip(2);
    assert_eq!(
      q.filter,
      Filter::Eq {
        field: "category".into(),
        value: "Thai".into()
      }
    );
    assert_eq!(q.order, SortOrder::Newest);
    assert_eq!(q.limit, Some(5));
    assert_eq!(q.offset, Some(2));
  }

  #[test]
  fn test_default_is_match_all() {
    let q = Query::all();
    assert_eq!(q.filter, Filter::All);
    assert_eq!(q.order, SortOrder::Inserted);
    assert!(q.limit.is_none());
  }
}
