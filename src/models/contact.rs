use serde::{Deserialize, Serialize};

use super::{Entity, Issues, SchemaError};

/// A message left through the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub name: String,
  pub email: String,
  pub subject: String,
  pub message: String,
}

impl Entity for Contact {
  const COLLECTION: &'static str = "contacts";
  const NAME: &'static str = "Contact";

  fn validate(&self) -> Result<(), SchemaError> {
    let mut issues = Issues::default();
    issues
      .required("name", &self.name)
      .required("email", &self.email)
      .required("subject", &self.subject)
      .required("message", &self.message);
    issues.finish(Self::NAME)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_all_fields_required() {
    let err = Contact::default().validate().unwrap_err();
    let fields: Vec<_> = err.issues.iter().map(|i| i.field).collect();
    assert_eq!(fields, ["name", "email", "subject", "message"]);
  }
}
