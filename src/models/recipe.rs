use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Entity, FieldIssue, Issues, SchemaError, REQUIRED};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipeCategory {
  Thai,
  American,
  Chinese,
  Mexican,
  Indian,
  Spanish,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid category.")]
pub struct UnknownCategory(pub String);

impl RecipeCategory {
  pub const ALL: [Self; 6] = [
    Self::Thai,
    Self::American,
    Self::Chinese,
    Self::Mexican,
    Self::Indian,
    Self::Spanish,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Thai => "Thai",
      Self::American => "American",
      Self::Chinese => "Chinese",
      Self::Mexican => "Mexican",
      Self::Indian => "Indian",
      Self::Spanish => "Spanish",
    }
  }
}

/// Exact, case-sensitive match on the tag name.
impl FromStr for RecipeCategory {
  type Err = UnknownCategory;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|c| c.as_str() == s)
      .ok_or_else(|| UnknownCategory(s.to_string()))
  }
}

impl fmt::Display for RecipeCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
  pub name: String,
  pub description: String,
  pub email: String,
  pub ingredients: Vec<String>,
  pub category: RecipeCategory,
  /// File name inside the upload directory
  pub image: String,
}

impl Entity for Recipe {
  const COLLECTION: &'static str = "recipes";
  const NAME: &'static str = "Recipe";

  fn validate(&self) -> Result<(), SchemaError> {
    let mut issues = Issues::default();
    check_text(
      &mut issues,
      &self.name,
      &self.description,
      &self.email,
      &self.ingredients,
    );
    issues.required("image", &self.image);
    issues.finish(Self::NAME)
  }
}

/// Recipe fields as they arrive from the submit and edit forms, before the
/// category has been checked against the enum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeDraft {
  pub name: String,
  pub description: String,
  pub email: String,
  pub ingredients: Vec<String>,
  pub category: String,
  pub image: Option<String>,
}

impl RecipeDraft {
  /// Validate the draft and turn it into a storable recipe. Blank
  /// ingredient rows are dropped.
  pub fn into_recipe(self) -> Result<Recipe, SchemaError> {
    let mut issues = Issues::default();
    check_text(
      &mut issues,
      &self.name,
      &self.description,
      &self.email,
      &self.ingredients,
    );
    let category = if self.category.trim().is_empty() {
      Err(REQUIRED.to_string())
    } else {
      self
        .category
        .parse::<RecipeCategory>()
        .map_err(|e| e.to_string())
    };
    if let Err(message) = &category {
      issues.invalid("category", message.clone());
    }
    let image = self.image.unwrap_or_default();
    issues.required("image", &image);
    issues.finish(Recipe::NAME)?;

    let category = category.map_err(|message| SchemaError {
      entity: Recipe::NAME,
      issues: vec![FieldIssue {
        field: "category",
        message,
      }],
    })?;
    Ok(Recipe {
      name: self.name,
      description: self.description,
      email: self.email,
      ingredients: self
        .ingredients
        .into_iter()
        .filter(|i| !i.trim().is_empty())
        .collect(),
      category,
      image,
    })
  }
}

fn check_text(
  issues: &mut Issues,
  name: &str,
  description: &str,
  email: &str,
  ingredients: &[String],
) {
  issues
    .required("name", name)
    .required("description", description)
    .required("email", email)
    .required_list("ingredients", ingredients);
}

#[cfg(test)]
mod tests {
  use super::*;

  fn draft() -> RecipeDraft {
    RecipeDraft {
      name: "Key Lime Pie".into(),
      description: "Tart and creamy.".into(),
      email: "baker@example.com".into(),
      ingredients: vec!["Limes".into(), "".into(), "Condensed milk".into()],
      category: "American".into(),
      image: Some("1700000000000pie.jpg".into()),
    }
  }

  #[test]
  fn test_category_parse_is_exact() {
    assert_eq!("Thai".parse::<RecipeCategory>(), Ok(RecipeCategory::Thai));
    assert!("thai".parse::<RecipeCategory>().is_err());
    assert!(" Thai".parse::<RecipeCategory>().is_err());
    assert_eq!(
      "Korean".parse::<RecipeCategory>().unwrap_err().to_string(),
      "'Korean' is not a valid category."
    );
  }

  #[test]
  fn test_category_serializes_as_tag() {
    let json = serde_json::to_value(RecipeCategory::Mexican).unwrap();
    assert_eq!(json, serde_json::json!("Mexican"));
  }

  #[test]
  fn test_draft_into_recipe() {
    let recipe = draft().into_recipe().unwrap();
    assert_eq!(recipe.category, RecipeCategory::American);
    assert_eq!(recipe.ingredients, vec!["Limes", "Condensed milk"]);
    assert!(recipe.validate().is_ok());
  }

  #[test]
  fn test_draft_rejects_unknown_category() {
    let err = RecipeDraft {
      category: "Korean".into(),
      ..draft()
    }
    .into_recipe()
    .unwrap_err();
    assert_eq!(
      err.messages(),
      vec!["category: 'Korean' is not a valid category.".to_string()]
    );
  }

  #[test]
  fn test_draft_requires_image_and_ingredients() {
    let err = RecipeDraft {
      image: None,
      ingredients: vec!["  ".into()],
      ..draft()
    }
    .into_recipe()
    .unwrap_err();
    let fields: Vec<_> = err.issues.iter().map(|i| i.field).collect();
    assert_eq!(fields, ["ingredients", "image"]);
  }
}
