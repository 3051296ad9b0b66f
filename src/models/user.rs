use serde::{Deserialize, Serialize};

use super::{Entity, Issues, SchemaError};

/// A registered account. `password` holds the argon2 PHC string, never the
/// plain password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub name: String,
  pub email: String,
  pub password: String,
}

impl Entity for User {
  const COLLECTION: &'static str = "users";
  const NAME: &'static str = "User";

  fn validate(&self) -> Result<(), SchemaError> {
    let mut issues = Issues::default();
    issues
      .required("name", &self.name)
      .required("email", &self.email)
      .required("password", &self.password);
    issues.finish(Self::NAME)
  }
}
