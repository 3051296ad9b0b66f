//! Declarative field rules attached to the write routes.
//!
//! A failing rule set is answered with 422 and the list of failures in the
//! shape `{"type":"field","value":..,"msg":..,"path":..,"location":"body"}`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
  /// Field was sent at all
  Exists,
  /// Field holds something other than whitespace
  NotEmpty,
  /// At least this many characters
  MinLength(usize),
  Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
  /// Trim and lowercase an email address
  Email,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
  pub field: &'static str,
  pub message: &'static str,
  pub checks: &'static [Check],
  pub normalize: Option<Normalize>,
}

#[derive(Debug, Clone, Copy)]
pub struct RuleSet(pub &'static [FieldRule]);

const NAME_RULE: FieldRule = FieldRule {
  field: "name",
  message: "The Name must be at least 3+ characters long",
  checks: &[Check::Exists, Check::MinLength(3)],
  normalize: None,
};

const EMAIL_RULE: FieldRule = FieldRule {
  field: "email",
  message: "Email is not valid",
  checks: &[Check::Email],
  normalize: Some(Normalize::Email),
};

/// Recipe submit and edit.
pub const RECIPE_RULES: RuleSet = RuleSet(&[NAME_RULE, EMAIL_RULE]);
pub const CONTACT_RULES: RuleSet = RuleSet(&[NAME_RULE, EMAIL_RULE]);
pub const REGISTER_RULES: RuleSet = RuleSet(&[
  FieldRule {
    field: "name",
    message: "Name is required",
    checks: &[Check::Exists, Check::NotEmpty],
    normalize: None,
  },
  FieldRule {
    field: "email",
    message: "Email is required",
    checks: &[Check::Exists, Check::NotEmpty],
    normalize: None,
  },
  FieldRule {
    field: "password",
    message: "Password is required",
    checks: &[Check::Exists, Check::NotEmpty],
    normalize: None,
  },
]);

/// Named access to a submitted form. `None` means the field was not sent.
pub trait FormFields {
  fn field(&self, name: &str) -> Option<&str>;
  fn field_mut(&mut self, name: &str) -> Option<&mut String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  #[serde(rename = "type")]
  pub kind: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub value: Option<String>,
  pub msg: &'static str,
  pub path: &'static str,
  pub location: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl RuleSet {
  /// Run every rule against `form`. Each failing check is reported on its
  /// own. Normalisers rewrite the field in place.
  pub fn apply<F: FormFields>(&self, form: &mut F) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    for rule in self.0 {
      let value = form.field(rule.field);
      for check in rule.checks {
        if !passes(*check, value) {
          errors.push(FieldError {
            kind: "field",
            value: value.map(str::to_string),
            msg: rule.message,
            path: rule.field,
            location: "body",
          });
        }
      }

      if let (Some(Normalize::Email), Some(value)) = (rule.normalize, form.field_mut(rule.field)) {
        *value = value.trim().to_lowercase();
      }
    }

    if errors.is_empty() {
      Ok(())
    } else {
      Err(ValidationErrors(errors))
    }
  }
}

fn passes(check: Check, value: Option<&str>) -> bool {
  match check {
    Check::Exists => value.is_some(),
    Check::NotEmpty => value.is_some_and(|v| !v.trim().is_empty()),
    Check::MinLength(min) => value.unwrap_or_default().chars().count() >= min,
    Check::Email => value.is_some_and(is_email),
  }
}

fn email_regex() -> &'static Regex {
  static EMAIL: OnceLock<Regex> = OnceLock::new();
  EMAIL.get_or_init(|| {
    Regex::new(
      r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern compiles")
  })
}

pub fn is_email(value: &str) -> bool {
  value.len() <= 254 && email_regex().is_match(value.trim())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Default)]
  struct Form {
    name: Option<String>,
    email: Option<String>,
  }

  impl FormFields for Form {
    fn field(&self, name: &str) -> Option<&str> {
      match name {
        "name" => self.name.as_deref(),
        "email" => self.email.as_deref(),
        _ => None,
      }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
      match name {
        "name" => self.name.as_mut(),
        "email" => self.email.as_mut(),
        _ => None,
      }
    }
  }

  #[test]
  fn test_valid_form_is_normalised() {
    let mut form = Form {
      name: Some("Key Lime Pie".into()),
      email: Some(" Baker@Example.COM ".into()),
    };
    RECIPE_RULES.apply(&mut form).unwrap();
    assert_eq!(form.email.as_deref(), Some("baker@example.com"));
  }

  #[test]
  fn test_short_name_and_bad_email() {
    let mut form = Form {
      name: Some("Pi".into()),
      email: Some("not-an-email".into()),
    };
    let errors = CONTACT_RULES.apply(&mut form).unwrap_err();
    let json = serde_json::to_value(&errors).unwrap();
    assert_eq!(
      json,
      serde_json::json!([
        {
          "type": "field",
          "value": "Pi",
          "msg": "The Name must be at least 3+ characters long",
          "path": "name",
          "location": "body"
        },
        {
          "type": "field",
          "value": "not-an-email",
          "msg": "Email is not valid",
          "path": "email",
          "location": "body"
        }
      ])
    );
  }

  #[test]
  fn test_missing_field_reports_each_check() {
    let mut form = Form {
      name: None,
      email: Some("a@b.co".into()),
    };
    let errors = RECIPE_RULES.apply(&mut form).unwrap_err();
    assert_eq!(errors.0.len(), 2);
    assert!(errors.0.iter().all(|e| e.path == "name" && e.value.is_none()));
  }

  #[test]
  fn test_min_length_counts_characters() {
    assert!(passes(Check::MinLength(3), Some("ñoñ")));
    assert!(!passes(Check::MinLength(3), Some("ño")));
  }

  #[test]
  fn test_email_shapes() {
    assert!(is_email("cook@example.com"));
    assert!(is_email("first.last+tag@sub.example.co.uk"));
    assert!(!is_email("cook@localhost"));
    assert!(!is_email("cook@@example.com"));
    assert!(!is_email("@example.com"));
    assert!(!is_email("cook example@example.com"));
  }
}
