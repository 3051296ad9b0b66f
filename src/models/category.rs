use serde::{Deserialize, Serialize};

use super::{Entity, Issues, SchemaError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub name: String,
  pub image: String,
}

impl Category {
  pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      image: image.into(),
    }
  }

  /// The categories a fresh database is seeded with.
  pub fn defaults() -> Vec<Self> {
    vec![
      Self::new("Thai", "thai-food.jpg"),
      Self::new("American", "american-food.jpg"),
      Self::new("Chinese", "chinese-food.jpg"),
      Self::new("Mexican", "mexican-food.jpg"),
      Self::new("Indian", "indian-food.jpg"),
      Self::new("Spanish", "spanish-food.jpg"),
    ]
  }
}

impl Entity for Category {
  const COLLECTION: &'static str = "categories";
  const NAME: &'static str = "Category";

  fn validate(&self) -> Result<(), SchemaError> {
    let mut issues = Issues::default();
    issues
      .required("name", &self.name)
      .required("image", &self.image);
    issues.finish(Self::NAME)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::RecipeCategory;

  #[test]
  fn test_defaults_cover_every_recipe_category() {
    let defaults = Category::defaults();
    assert_eq!(defaults.len(), RecipeCategory::ALL.len());
    for (category, tag) in defaults.iter().zip(RecipeCategory::ALL) {
      assert_eq!(category.name, tag.as_str());
      assert!(category.validate().is_ok());
    }
  }
}
